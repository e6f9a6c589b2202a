// Payload rendering module
// Builds the status document served to clients

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::notes::Note;
use crate::config::PayloadFormat;
use crate::error::SnapshotError;

const STARTED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything a status page needs, at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDocument {
    pub online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,
    pub players: Vec<String>,
    pub updates: Vec<String>,
}

impl StatusDocument {
    pub fn new(
        online: bool,
        version: Option<&str>,
        started: Option<NaiveDateTime>,
        players: Vec<String>,
        notes: &[Note],
    ) -> Self {
        Self {
            online,
            version: version.map(str::to_string),
            started: started.map(|t| t.format(STARTED_FORMAT).to_string()),
            players,
            updates: notes.iter().map(format_update).collect(),
        }
    }

    pub fn render(&self, format: PayloadFormat) -> Result<Vec<u8>, SnapshotError> {
        match format {
            PayloadFormat::Xml => Ok(self.to_xml().into_bytes()),
            PayloadFormat::Json => {
                serde_json::to_vec(self).map_err(|e| SnapshotError::Render(e.to_string()))
            }
        }
    }

    /// `<info>` document; booleans are written `True` / `False`
    fn to_xml(&self) -> String {
        let mut xml = String::from("<info>");
        xml.push_str(&element("online", if self.online { "True" } else { "False" }));
        if let Some(version) = &self.version {
            xml.push_str(&element("version", version));
        }
        if let Some(started) = &self.started {
            xml.push_str(&element("started", started));
        }

        xml.push_str("<players>");
        for player in &self.players {
            xml.push_str(&element("player", player));
        }
        xml.push_str("</players>");

        xml.push_str("<updates>");
        for update in &self.updates {
            xml.push_str(&element("update", update));
        }
        xml.push_str("</updates>");

        xml.push_str("</info>");
        xml
    }
}

/// `dd.mm.YYYY - HH:MM, text`
fn format_update(note: &Note) -> String {
    format!("{}, {}", note.date.format("%d.%m.%Y - %H:%M"), note.text)
}

fn element(name: &str, text: &str) -> String {
    format!("<{name}>{}</{name}>", escape_xml(text))
}

/// Escape special characters for XML text
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
