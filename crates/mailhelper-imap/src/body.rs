//! Plain-text body extraction
//!
//! Multipart messages prefer the first inline `text/plain` part and fall
//! back to the first `text/html` part with its tags removed. The tag
//! removal is a plain pattern match, not an HTML parser: entities, scripts
//! and malformed markup pass through untouched.

use std::sync::OnceLock;

use mail_parser::{Message, MessagePart, MimeHeaders, PartType};
use regex::Regex;

/// Extract the readable body of a parsed message, trimmed
pub fn extract_body(message: &Message<'_>) -> String {
    let body = match message.parts.first() {
        Some(root) if matches!(root.body, PartType::Multipart(_)) => {
            multipart_body(&message.parts[1..])
        }
        Some(root) => part_text(root),
        None => String::new(),
    };

    body.trim().to_string()
}

fn multipart_body(parts: &[MessagePart<'_>]) -> String {
    if let Some(plain) = parts
        .iter()
        .find(|part| is_content_type(part, "text", "plain") && !is_attachment(part))
    {
        return part_text(plain);
    }

    parts
        .iter()
        .find(|part| is_content_type(part, "text", "html"))
        .map(|html| strip_tags(&part_text(html)))
        .unwrap_or_default()
}

/// Remove anything that looks like a tag
pub fn strip_tags(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new("<[^<]+?>").expect("tag pattern is valid"));
    tag.replace_all(html, "").into_owned()
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of failing
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

fn part_text(part: &MessagePart<'_>) -> String {
    match &part.body {
        // Charset decoders substitute U+FFFD for bytes they cannot decode
        PartType::Text(text) | PartType::Html(text) => {
            text.replace(char::REPLACEMENT_CHARACTER, "")
        }
        PartType::Binary(bytes) | PartType::InlineBinary(bytes) => decode_lossy(bytes),
        PartType::Message(_) | PartType::Multipart(_) => String::new(),
    }
}

fn is_content_type(part: &MessagePart<'_>, ctype: &str, subtype: &str) -> bool {
    match part.content_type() {
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case(ctype)
                && ct
                    .subtype()
                    .is_some_and(|s| s.eq_ignore_ascii_case(subtype))
        }
        // RFC 2045 default
        None => ctype == "text" && subtype == "plain",
    }
}

fn is_attachment(part: &MessagePart<'_>) -> bool {
    part.content_disposition()
        .is_some_and(|d| d.ctype().eq_ignore_ascii_case("attachment"))
}
