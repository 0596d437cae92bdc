//! Grammars of the MIME header fields the streaming reader needs to decide
//! the structure of an entity.

/// Transfer-Encoding representation
pub mod mechanism;

/// Content-Type representation
pub mod r#type;

/// MIME-Version and Content-Length
pub mod version;

use mechanism::Mechanism;
use r#type::ContentType;
use version::Version;

/// Parses a Content-Type value, `None` when the media type itself is broken.
pub fn content_type(raw: &[u8]) -> Option<ContentType> {
    r#type::content_type(raw).ok().map(|(_, ct)| ct)
}

pub fn mechanism(raw: &[u8]) -> Option<Mechanism> {
    mechanism::mechanism(raw).ok().map(|(_, m)| m)
}

pub fn version(raw: &[u8]) -> Option<Version> {
    version::version(raw).ok().map(|(_, v)| v)
}

pub fn content_length(raw: &[u8]) -> Option<u64> {
    match version::content_length(raw) {
        Ok((rest, len)) if rest.is_empty() => Some(len),
        _ => None,
    }
}

/// A multipart that can be split: it needs a non-empty boundary.
pub fn is_multipart(ct: &ContentType) -> bool {
    ct.is_multipart() && ct.boundary().is_some()
}

/// Whether the part body is itself a message to be parsed.
///
/// Only `message/rfc822`, `message/news` and `message/global` qualify, and
/// only when they are not transfer encoded.
pub fn is_message_part(ct: &ContentType, encoding: Option<&Mechanism>) -> bool {
    let encapsulated = ct.is("message", "rfc822")
        || ct.is("message", "news")
        || ct.is("message", "global");
    encapsulated && encoding.map_or(true, Mechanism::is_identity)
}
