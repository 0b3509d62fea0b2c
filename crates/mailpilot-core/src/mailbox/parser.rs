use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

use crate::mailbox::types::MessagePart;

/// Maximum depth for MIME tree traversal to prevent stack overflow from malicious emails
const MAX_MIME_DEPTH: usize = 50;

/// Returns the first `text/plain` leaf of the payload tree, depth-first. For a
/// single-part message without a recognizable mime type the root body is taken
/// as-is, matching what the provider returns for plain messages.
pub fn plain_text_body(payload: &MessagePart) -> Option<String> {
    if let Some(text) = find_plain_text(payload, 0) {
        return Some(text);
    }

    if payload.parts.is_empty() {
        if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_ref()) {
            return decode_body(data);
        }
    }

    None
}

/// First header whose name matches exactly; provider headers use canonical
/// casing ("Subject", "From").
pub fn header_value<'a>(payload: &'a MessagePart, name: &str) -> Option<&'a str> {
    payload
        .headers
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.as_str())
}

fn find_plain_text(part: &MessagePart, depth: usize) -> Option<String> {
    if depth > MAX_MIME_DEPTH {
        return None;
    }

    if part
        .mime_type
        .as_deref()
        .is_some_and(|m| m.eq_ignore_ascii_case("text/plain"))
    {
        if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_ref()) {
            if let Some(decoded) = decode_body(data) {
                return Some(decoded);
            }
        }
    }

    for child in &part.parts {
        if let Some(text) = find_plain_text(child, depth + 1) {
            return Some(text);
        }
    }

    None
}

fn decode_body(data: &str) -> Option<String> {
    if let Ok(bytes) = URL_SAFE_NO_PAD.decode(data) {
        return Some(String::from_utf8_lossy(&bytes).into_owned());
    }

    if let Ok(bytes) = STANDARD.decode(data) {
        return Some(String::from_utf8_lossy(&bytes).into_owned());
    }

    None
}
