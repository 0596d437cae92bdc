use bounded_static::{IntoBoundedStatic, ToStatic};
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EMLError, Position, Result};
use crate::mime::r#type::ContentType;
use crate::stream::compliance::ComplianceIssue;
use crate::text::whitespace::unfold;

/// Line terminators found in a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ToStatic)]
pub enum NewLineFormat {
    /// `\n` only
    Unix,
    /// `\r\n` only, also reported when no line terminator was seen
    Dos,
    Mixed,
}

impl NewLineFormat {
    pub fn from_counts(crlf: u64, lf: u64) -> Self {
        match (crlf, lf) {
            (_, 0) => Self::Dos,
            (0, _) => Self::Unix,
            _ => Self::Mixed,
        }
    }
}

/// One header line, as found in the stream.
#[derive(Clone, PartialEq, Eq, ToStatic)]
pub struct HeaderField<'a> {
    /// Field name, or the whole line when it is not a header.
    pub name: Cow<'a, [u8]>,
    /// Bytes after the colon, folding kept, final line terminator removed.
    pub raw_value: Cow<'a, [u8]>,
    pub at: Position,
    /// The line has no field name.
    pub invalid: bool,
}

impl<'a> HeaderField<'a> {
    pub fn is(&self, name: &str) -> bool {
        !self.invalid && self.name.eq_ignore_ascii_case(name.as_bytes())
    }

    pub fn name_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Unfolded and trimmed value, bytes that are not UTF-8 replaced.
    pub fn value(&self) -> String {
        let unfolded = unfold(&self.raw_value);
        let (text, _) = encoding_rs::UTF_8.decode_without_bom_handling(&unfolded);
        text.trim_matches(|c| c == ' ' || c == '\t').to_string()
    }
}

impl<'a> fmt::Debug for HeaderField<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("HeaderField")
            .field("name", &String::from_utf8_lossy(&self.name))
            .field("raw_value", &String::from_utf8_lossy(&self.raw_value))
            .field("at", &self.at)
            .field("invalid", &self.invalid)
            .finish()
    }
}

/// Everything the parser reports, in stream order.
///
/// `*Read` events borrow from the parser buffers; use
/// [`IntoBoundedStatic::into_static`] to keep them.
#[derive(Debug, Clone, PartialEq, Eq, ToStatic)]
pub enum Event<'a> {
    MboxMarkerBegin { at: Position },
    /// The separator line, without its line terminator.
    MboxMarkerRead(Cow<'a, [u8]>),
    MboxMarkerEnd { at: Position },

    MimeMessageBegin { at: Position },
    MimeMessageEnd { at: Position },

    HeadersBegin { at: Position },
    HeaderRead(HeaderField<'a>),
    HeadersEnd { at: Position },

    /// A leaf entity. `at` is the start of its header block.
    MimePartBegin { content_type: ContentType, at: Position },
    MimePartContentBegin { at: Position },
    MimePartContentRead(Cow<'a, [u8]>),
    MimePartContentEnd { at: Position, lines: u64, newline: NewLineFormat },
    MimePartEnd { at: Position },

    MultipartBegin { content_type: ContentType, at: Position },
    MultipartPreambleBegin { at: Position },
    MultipartPreambleRead(Cow<'a, [u8]>),
    MultipartPreambleEnd { at: Position },
    MultipartBoundary { at: Position },
    MultipartEndBoundary { at: Position },
    MultipartEpilogueBegin { at: Position },
    MultipartEpilogueRead(Cow<'a, [u8]>),
    MultipartEpilogueEnd { at: Position },
    MultipartEnd { at: Position },

    /// An encapsulated `message/*` entity, its message events follow.
    MessagePartBegin { content_type: ContentType, at: Position },
    MessagePartEnd { at: Position },

    ComplianceIssue(ComplianceIssue),
}

/// Receives the events of a parse.
pub trait Handler {
    fn handle(&mut self, event: Event<'_>);
}

impl<F> Handler for F
where
    F: FnMut(Event<'_>),
{
    fn handle(&mut self, event: Event<'_>) {
        self(event)
    }
}

/// Records owned copies of the events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorder(pub Vec<Event<'static>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_events(self) -> Vec<Event<'static>> {
        self.0
    }
}

impl Handler for Recorder {
    fn handle(&mut self, event: Event<'_>) {
        self.0.push(event.into_static())
    }
}

/// Cooperative cancellation, checked at every refill and after every event.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(EMLError::Cancelled);
        }
        Ok(())
    }
}

pub(crate) fn emit<H: Handler>(handler: &mut H, cancel: &CancelToken, event: Event<'_>) -> Result<()> {
    #[cfg(feature = "tracing")]
    tracing::trace!(?event, "emit");

    handler.handle(event);
    cancel.check()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(raw: &'static [u8]) -> HeaderField<'static> {
        HeaderField {
            name: Cow::Borrowed(b"Subject"),
            raw_value: Cow::Borrowed(raw),
            at: Position::default(),
            invalid: false,
        }
    }

    #[test]
    fn test_header_value() {
        assert_eq!(field(b" hi").value(), "hi");
        assert_eq!(field(b" a\r\n\tlong\r\n subject ").value(), "a\tlong subject");
        assert_eq!(field(b"\xE2\x82\xAC \xFF").value(), "\u{20ac} \u{fffd}");
        assert!(field(b"").is("subject"));
        assert!(!field(b"").is("subjects"));
    }

    #[test]
    fn test_newline_format() {
        assert_eq!(NewLineFormat::from_counts(3, 0), NewLineFormat::Dos);
        assert_eq!(NewLineFormat::from_counts(0, 3), NewLineFormat::Unix);
        assert_eq!(NewLineFormat::from_counts(1, 3), NewLineFormat::Mixed);
        assert_eq!(NewLineFormat::from_counts(0, 0), NewLineFormat::Dos);
    }

    #[test]
    fn test_recording_handler() {
        let mut events = Recorder::new();
        let data = b"borrowed".to_vec();
        events.handle(Event::MimePartContentRead(Cow::Borrowed(&data[..])));
        drop(data);
        assert_eq!(
            events.into_events(),
            vec![Event::MimePartContentRead(Cow::Owned(b"borrowed".to_vec()))]
        );
    }

    #[test]
    fn test_cancel() {
        let token = CancelToken::new();
        let mut count = 0;
        let mut handler = |_: Event<'_>| count += 1;
        let ev = Event::HeadersBegin { at: Position::default() };
        assert!(emit(&mut handler, &token, ev.clone()).is_ok());
        token.clone().cancel();
        assert!(matches!(emit(&mut handler, &token, ev), Err(EMLError::Cancelled)));
        assert_eq!(count, 2);
    }
}
