// Line classifier module
// Maps one raw log line to the event it describes

use chrono::NaiveDateTime;

use crate::error::TailError;

/// Fixed timestamp layout at the start of every log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_LEN: usize = 19;

/// Marker token that precedes player names in the stock server log.
pub const DEFAULT_MARKER: &str = "[INFO]";

/// Semantic interpretation of one log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEvent {
    Login { player: String, at: NaiveDateTime },
    Logout { player: String, at: NaiveDateTime },
    ServerStart { version: Option<String>, at: NaiveDateTime },
    Ignored,
}

/// Pure line classifier. Rules are checked in priority order, first match wins:
/// chat (`<`), login, logout, server start, everything else ignored.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    marker: String,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl LineClassifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn classify(&self, line: &str) -> Result<ClassifiedEvent, TailError> {
        // Chat text may quote anything, so it must never reach the other rules
        if line.contains('<') {
            return Ok(ClassifiedEvent::Ignored);
        }

        if let Some(player) = self.player_before(line, "logged in") {
            return Ok(ClassifiedEvent::Login {
                player: player.to_string(),
                at: parse_timestamp(line)?,
            });
        }

        if let Some(player) = self.player_before(line, "lost connection") {
            return Ok(ClassifiedEvent::Logout {
                player: player.to_string(),
                at: parse_timestamp(line)?,
            });
        }

        if line.contains("Starting") {
            return Ok(ClassifiedEvent::ServerStart {
                version: server_version(line).map(str::to_string),
                at: parse_timestamp(line)?,
            });
        }

        Ok(ClassifiedEvent::Ignored)
    }

    /// Find `<marker><ws><name><ws>...<phrase>` and return the name.
    fn player_before<'a>(&self, line: &'a str, phrase: &str) -> Option<&'a str> {
        line.match_indices(self.marker.as_str()).find_map(|(idx, _)| {
            let rest = &line[idx + self.marker.len()..];
            let rest = strip_one_whitespace(rest)?;

            let name_len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if name_len == 0 {
                return None;
            }

            let (name, tail) = rest.split_at(name_len);
            let tail = strip_one_whitespace(tail)?;
            tail.contains(phrase).then_some(name)
        })
    }
}

fn strip_one_whitespace(s: &str) -> Option<&str> {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => Some(chars.as_str()),
        _ => None,
    }
}

/// Token following `server version ` up to the next whitespace.
fn server_version(line: &str) -> Option<&str> {
    const KEY: &str = "server version ";
    let start = line.find(KEY)? + KEY.len();
    let token = line[start..].split_whitespace().next()?;
    // split_whitespace skips leading blanks; the token must follow the key directly
    line[start..].starts_with(token).then_some(token)
}

/// Parse the fixed-width timestamp prefix of a log line.
pub fn parse_timestamp(line: &str) -> Result<NaiveDateTime, TailError> {
    let prefix = line.get(..TIMESTAMP_LEN).ok_or_else(|| TailError::Timestamp {
        line: line.to_string(),
        reason: "line shorter than timestamp prefix".to_string(),
    })?;

    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).map_err(|e| TailError::Timestamp {
        line: line.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 11, 30)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_login_line() {
        let c = LineClassifier::default();
        let event = c
            .classify("2010-11-30 19:56:42 [INFO] user_test [/188.60.36.18:61540] logged in with entity id 24")
            .unwrap();
        assert_eq!(
            event,
            ClassifiedEvent::Login {
                player: "user_test".to_string(),
                at: at(19, 56, 42),
            }
        );
    }

    #[test]
    fn test_logout_line() {
        let c = LineClassifier::default();
        let event = c
            .classify("2010-11-30 20:22:07 [INFO] anotheruser lost connection: Quitting")
            .unwrap();
        assert_eq!(
            event,
            ClassifiedEvent::Logout {
                player: "anotheruser".to_string(),
                at: at(20, 22, 7),
            }
        );
    }

    #[test]
    fn test_start_line_with_version() {
        let c = LineClassifier::default();
        let event = c
            .classify("2010-11-30 19:55:15 [INFO] Starting craftinfo server version 0.2.6_02")
            .unwrap();
        assert_eq!(
            event,
            ClassifiedEvent::ServerStart {
                version: Some("0.2.6_02".to_string()),
                at: at(19, 55, 15),
            }
        );
    }

    #[test]
    fn test_start_line_without_version() {
        let c = LineClassifier::default();
        let event = c
            .classify("2010-11-30 19:55:16 [INFO] Starting Minecraft server on *:25565")
            .unwrap();
        assert_eq!(
            event,
            ClassifiedEvent::ServerStart {
                version: None,
                at: at(19, 55, 16),
            }
        );
    }

    #[test]
    fn test_chat_wins_over_everything() {
        let c = LineClassifier::default();
        for line in [
            "2010-11-30 20:18:30 [INFO] <user> chit chat",
            "2010-11-30 20:18:30 [INFO] <user> bob logged in",
            "2010-11-30 20:18:30 [INFO] <user> Starting server version 9",
            "garbage <user> lost connection",
        ] {
            assert_eq!(c.classify(line).unwrap(), ClassifiedEvent::Ignored, "{line}");
        }
    }

    #[test]
    fn test_unmatched_lines_are_ignored() {
        let c = LineClassifier::default();
        for line in [
            "",
            "2010-11-30 20:00:37 [WARNING] Can't keep up! Did the system time change, or is the server overloaded?",
            "random noise",
            "2010-11-30 20:00:37 [INFO] Done loading",
        ] {
            assert_eq!(c.classify(line).unwrap(), ClassifiedEvent::Ignored, "{line}");
        }
    }

    #[test]
    fn test_marker_must_precede_name() {
        let c = LineClassifier::default();
        // No marker token: not a login even though the phrase is present
        assert_eq!(
            c.classify("2010-11-30 19:56:42 [WARNING] bob logged in").unwrap(),
            ClassifiedEvent::Ignored
        );
        assert_eq!(
            c.classify("2010-11-30 19:56:42 [INFO]bob logged in").unwrap(),
            ClassifiedEvent::Ignored
        );
    }

    #[test]
    fn test_custom_marker() {
        let c = LineClassifier::new("[Server thread/INFO]:");
        let event = c
            .classify("2010-11-30 19:56:42 [Server thread/INFO]: alex joined, logged in")
            .unwrap();
        assert!(matches!(event, ClassifiedEvent::Login { ref player, .. } if player == "alex"));
    }

    #[test]
    fn test_malformed_timestamp_on_recognised_line_fails() {
        let c = LineClassifier::default();
        let err = c.classify("30.11.2010 19:56 [INFO] bob logged in").unwrap_err();
        assert!(matches!(err, TailError::Timestamp { .. }));

        let err = c.classify("Starting").unwrap_err();
        assert!(matches!(err, TailError::Timestamp { .. }));
    }

    #[test]
    fn test_parse_timestamp_handles_multibyte_prefix() {
        assert!(parse_timestamp("ääääääääääääääääää logged").is_err());
    }
}
