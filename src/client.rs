// Status client module
// Fetches the payload from a running daemon and reads it back into a document

use std::fmt::Write as _;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::status::StatusDocument;

/// Default bound on connect plus read
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no complete answer within {0:?}")]
    Timeout(Duration),

    #[error("server has no payload yet")]
    Empty,

    #[error("malformed status document: {0}")]
    Malformed(String),

    #[error("malformed JSON status: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect, read until the server closes the connection, return the bytes.
pub async fn fetch_raw(addr: impl ToSocketAddrs, limit: Duration) -> Result<Vec<u8>, ClientError> {
    let read = async {
        let mut stream = TcpStream::connect(addr).await?;
        let mut payload = Vec::new();
        stream.read_to_end(&mut payload).await?;
        Ok::<_, ClientError>(payload)
    };

    tokio::time::timeout(limit, read)
        .await
        .map_err(|_| ClientError::Timeout(limit))?
}

/// Fetch and parse the status document, whichever format the server uses.
pub async fn fetch_status(
    addr: impl ToSocketAddrs,
    limit: Duration,
) -> Result<StatusDocument, ClientError> {
    parse_status(&fetch_raw(addr, limit).await?)
}

/// Parse an `<info>` XML or a JSON status payload.
pub fn parse_status(payload: &[u8]) -> Result<StatusDocument, ClientError> {
    let text = String::from_utf8_lossy(payload);
    let text = text.trim();

    if text.is_empty() {
        return Err(ClientError::Empty);
    }
    if text.starts_with('{') {
        return Ok(serde_json::from_str(text)?);
    }
    parse_xml(text)
}

fn parse_xml(text: &str) -> Result<StatusDocument, ClientError> {
    let info = inner(text, "info").ok_or_else(|| missing("info"))?;

    let online = match inner(info, "online").ok_or_else(|| missing("online"))? {
        "True" => true,
        "False" => false,
        other => {
            return Err(ClientError::Malformed(format!(
                "online must be True or False, got {other:?}"
            )))
        }
    };

    let players = inner(info, "players").ok_or_else(|| missing("players"))?;
    let updates = inner(info, "updates").ok_or_else(|| missing("updates"))?;

    Ok(StatusDocument {
        online,
        version: inner(info, "version").map(unescape_xml),
        started: inner(info, "started").map(unescape_xml),
        players: repeated(players, "player"),
        updates: repeated(updates, "update"),
    })
}

fn missing(tag: &str) -> ClientError {
    ClientError::Malformed(format!("missing <{tag}> element"))
}

/// Text between the first `<tag>` and the matching `</tag>`.
fn inner<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = text.find(&open)? + open.len();
    let len = text[start..].find(&close)?;
    Some(&text[start..start + len])
}

/// Every `<tag>…</tag>` child, in document order.
fn repeated(mut text: &str, tag: &str) -> Vec<String> {
    let close = format!("</{tag}>");
    let mut items = Vec::new();
    while let Some(item) = inner(text, tag) {
        items.push(unescape_xml(item));
        let Some(end) = text.find(&close) else {
            break;
        };
        text = &text[end + close.len()..];
    }
    items
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Human readable rendering for the `fetch` command line mode.
pub fn summary(doc: &StatusDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "online:  {}", if doc.online { "yes" } else { "no" });
    if let Some(version) = &doc.version {
        let _ = writeln!(out, "version: {version}");
    }
    if let Some(started) = &doc.started {
        let _ = writeln!(out, "started: {started}");
    }

    let _ = writeln!(out, "players: {}", doc.players.len());
    for player in &doc.players {
        let _ = writeln!(out, "  {player}");
    }

    if !doc.updates.is_empty() {
        let _ = writeln!(out, "updates:");
        for update in &doc.updates {
            let _ = writeln!(out, "  {update}");
        }
    }
    out.trim_end().to_string()
}
