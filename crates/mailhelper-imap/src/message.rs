//! Inbound message types

use mail_parser::{HeaderName, MessageParser};
use serde::Serialize;

use crate::body;

/// Server-side message flags this crate mutates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Message has been read
    Seen,
    /// Message is marked for deletion
    Deleted,
}

impl Flag {
    /// IMAP system flag name for STORE commands
    pub fn as_imap(&self) -> &'static str {
        match self {
            Flag::Seen => "\\Seen",
            Flag::Deleted => "\\Deleted",
        }
    }
}

/// A message fetched from a folder and decoded for display
///
/// Nothing here is cached; the record goes stale as soon as the remote
/// message is deleted or its flags change elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InboundMessage {
    /// Server UID, unique within the folder
    pub id: String,
    /// Decoded subject line
    pub subject: Option<String>,
    /// Raw From header
    pub from: Option<String>,
    /// Raw To header
    pub to: Option<String>,
    /// Raw Date header, not parsed
    pub date: Option<String>,
    /// Decoded plain-text body
    pub body: String,
}

impl InboundMessage {
    /// Decode a full RFC 5322 message as fetched by UID
    pub fn from_raw(uid: u32, raw: &[u8]) -> Self {
        let id = uid.to_string();

        let Some(message) = MessageParser::default().parse(raw) else {
            return Self {
                id,
                subject: None,
                from: None,
                to: None,
                date: None,
                body: body::decode_lossy(raw).trim().to_string(),
            };
        };

        Self {
            id,
            subject: message.subject().map(|s| s.to_string()),
            from: trimmed(message.header_raw(HeaderName::From)),
            to: trimmed(message.header_raw(HeaderName::To)),
            date: trimmed(message.header_raw(HeaderName::Date)),
            body: body::extract_body(&message),
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}
