use std::io::Read;

use futures::executor::block_on;

use crate::error::{Position, Result};
use crate::stream::compliance::ComplianceStatus;
use crate::stream::engine::Engine;
use crate::stream::event::{CancelToken, Handler};
use crate::stream::options::ParserOptions;
use crate::stream::source::{AsyncSource, BlockingSource, Refill};
use crate::stream::state::ParserState;

/// Streaming parser over a blocking [`std::io::Read`].
///
/// ```rust
/// use eml_stream::{Event, MimeParser};
///
/// let mut parser = MimeParser::new(&b"Subject: hi\r\n\r\nbody"[..]);
/// let mut subject = None;
/// parser
///     .read_entity(&mut |ev: Event<'_>| {
///         if let Event::HeaderRead(h) = ev {
///             if h.is("subject") {
///                 subject = Some(h.value());
///             }
///         }
///     })
///     .unwrap();
/// assert_eq!(subject.as_deref(), Some("hi"));
/// ```
pub struct MimeParser<R> {
    engine: Engine<BlockingSource<R>>,
}

impl<R: Read> MimeParser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParserOptions::default())
    }

    pub fn with_options(reader: R, options: ParserOptions) -> Self {
        Self {
            engine: Engine::new(BlockingSource(reader), options),
        }
    }

    /// See [`Engine::step`].
    pub fn step<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        block_on(self.engine.step(handler))
    }

    /// See [`Engine::read_headers`].
    pub fn read_headers<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        block_on(self.engine.read_headers(handler))
    }

    /// See [`Engine::read_entity`].
    pub fn read_entity<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        block_on(self.engine.read_entity(handler))
    }

    /// See [`Engine::read_message`].
    pub fn read_message<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        block_on(self.engine.read_message(handler))
    }

    pub fn state(&self) -> ParserState {
        self.engine.state()
    }

    /// Issues found by the last top-level call.
    pub fn compliance(&self) -> &ComplianceStatus {
        self.engine.compliance()
    }

    pub fn position(&self) -> Position {
        self.engine.position()
    }

    pub fn options(&self) -> &ParserOptions {
        self.engine.options()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.engine.cancel_token()
    }

    /// Gives the reader back. Bytes already buffered are lost.
    pub fn into_inner(self) -> R {
        self.engine.into_source().0
    }
}

/// Streaming parser over an asynchronous source.
///
/// It yields exactly the events of [`MimeParser`] on the same bytes.
pub struct AsyncMimeParser<S> {
    engine: Engine<S>,
}

impl<R: futures::io::AsyncRead + Unpin> AsyncMimeParser<AsyncSource<R>> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParserOptions::default())
    }

    pub fn with_options(reader: R, options: ParserOptions) -> Self {
        Self::from_source(AsyncSource(reader), options)
    }
}

#[cfg(feature = "tokio")]
impl<R: tokio::io::AsyncRead + Unpin> AsyncMimeParser<crate::stream::source::TokioSource<R>> {
    pub fn tokio(reader: R) -> Self {
        Self::tokio_with_options(reader, ParserOptions::default())
    }

    pub fn tokio_with_options(reader: R, options: ParserOptions) -> Self {
        Self::from_source(crate::stream::source::TokioSource(reader), options)
    }
}

impl<S: Refill> AsyncMimeParser<S> {
    pub fn from_source(source: S, options: ParserOptions) -> Self {
        Self {
            engine: Engine::new(source, options),
        }
    }

    pub async fn step<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        self.engine.step(handler).await
    }

    pub async fn read_headers<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        self.engine.read_headers(handler).await
    }

    pub async fn read_entity<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        self.engine.read_entity(handler).await
    }

    pub async fn read_message<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        self.engine.read_message(handler).await
    }

    pub fn state(&self) -> ParserState {
        self.engine.state()
    }

    pub fn compliance(&self) -> &ComplianceStatus {
        self.engine.compliance()
    }

    pub fn position(&self) -> Position {
        self.engine.position()
    }

    pub fn options(&self) -> &ParserOptions {
        self.engine.options()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.engine.cancel_token()
    }

    pub fn into_source(self) -> S {
        self.engine.into_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EMLError, ParseErrorKind};
    use crate::mime::r#type::ContentType;
    use crate::stream::compliance::ComplianceKind;
    use crate::stream::event::{Event, NewLineFormat, Recorder};
    use crate::stream::options::MimeFormat;
    use pretty_assertions::assert_eq;
    use std::borrow::Cow;

    fn pos(offset: u64, line: u64) -> Position {
        Position { offset, line }
    }

    fn entity(input: &[u8], options: ParserOptions) -> (Result<ParserState>, Vec<Event<'static>>) {
        let mut parser = MimeParser::with_options(input, options);
        let mut rec = Recorder::new();
        let res = parser.read_entity(&mut rec);
        (res, rec.into_events())
    }

    fn contains(events: &[Event<'_>], kind: ComplianceKind) -> bool {
        events
            .iter()
            .any(|e| matches!(e, Event::ComplianceIssue(i) if i.kind == kind))
    }

    #[test]
    fn test_header_only() {
        let mut parser = MimeParser::new(&b"Subject: hi\r\n\r\n"[..]);
        let mut rec = Recorder::new();
        assert_eq!(parser.read_headers(&mut rec).unwrap(), ParserState::Complete);
        let events = rec.into_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], Event::HeadersBegin { at: pos(0, 1) });
        match &events[1] {
            Event::HeaderRead(h) => {
                assert!(h.is("subject"));
                assert_eq!(h.value(), "hi");
                assert_eq!(h.at, pos(0, 1));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(events[2], Event::HeadersEnd { at: pos(15, 3) });
        assert!(parser.compliance().is_empty());

        let err = parser.read_headers(&mut Recorder::new()).unwrap_err();
        assert_eq!(err.kind(), Some(ParseErrorKind::UnexpectedEof));
        assert_eq!(parser.state(), ParserState::Eos);
    }

    #[test]
    fn test_read_headers_leaves_body() {
        let mut parser = MimeParser::new(&b"To: a\r\n\r\nbody"[..]);
        let mut rec = Recorder::new();
        assert_eq!(parser.read_headers(&mut rec).unwrap(), ParserState::Complete);
        assert_eq!(parser.position(), pos(9, 3));
    }

    #[test]
    fn test_leaf_body() {
        let (res, events) = entity(b"Subject: hi\r\n\r\nline one\r\nline two", ParserOptions::default());
        assert_eq!(res.unwrap(), ParserState::Eos);
        assert_eq!(
            &events[3..],
            &[
                Event::MimePartBegin {
                    content_type: ContentType::default(),
                    at: pos(0, 1)
                },
                Event::MimePartContentBegin { at: pos(15, 3) },
                Event::MimePartContentRead(Cow::Owned(b"line one".to_vec())),
                Event::MimePartContentRead(Cow::Owned(b"\r\nline two".to_vec())),
                Event::MimePartContentEnd {
                    at: pos(33, 4),
                    lines: 2,
                    newline: NewLineFormat::Dos
                },
                Event::MimePartEnd { at: pos(33, 4) },
            ]
        );
    }

    #[test]
    fn test_missing_separator() {
        let (res, events) = entity(b"Subject: hi\r\nnot a header\r\n", ParserOptions::default());
        assert_eq!(res.unwrap(), ParserState::Eos);
        assert!(contains(&events, ComplianceKind::InvalidHeader));
        assert!(contains(&events, ComplianceKind::MissingBodySeparator));
    }

    #[test]
    fn test_invalid_first_header() {
        let mut parser = MimeParser::new(&b"garbage\r\n\r\n"[..]);
        let err = parser.read_entity(&mut Recorder::new()).unwrap_err();
        assert_eq!(err.kind(), Some(ParseErrorKind::InvalidHeader));
        assert_eq!(parser.state(), ParserState::Error);

        // the failure is reported again
        let again = parser.read_entity(&mut Recorder::new()).unwrap_err();
        assert_eq!(again.kind(), Some(ParseErrorKind::InvalidHeader));
    }

    #[test]
    fn test_empty_input() {
        let mut parser = MimeParser::new(&b""[..]);
        let err = parser.read_entity(&mut Recorder::new()).unwrap_err();
        assert_eq!(err.kind(), Some(ParseErrorKind::UnexpectedEof));
        assert_eq!(parser.state(), ParserState::Eos);
    }

    #[test]
    fn test_bare_linefeeds() {
        let (_, events) = entity(b"To: a\n\nx\ny\r\n", ParserOptions::default());
        assert!(contains(&events, ComplianceKind::BareLinefeedInHeader));
        assert!(contains(&events, ComplianceKind::BareLinefeedInBody));
        let end = events.iter().find_map(|e| match e {
            Event::MimePartContentEnd { newline, lines, .. } => Some((*newline, *lines)),
            _ => None,
        });
        assert_eq!(end, Some((NewLineFormat::Mixed, 2)));
    }

    #[test]
    fn test_entity_mbox_marker() {
        let (res, events) = entity(b"From a@b Sat\r\nTo: a\r\n\r\n", ParserOptions::default());
        assert!(res.is_ok());
        assert_eq!(events[1], Event::MboxMarkerBegin { at: pos(0, 1) });
        assert_eq!(events[2], Event::MboxMarkerRead(Cow::Owned(b"From a@b Sat".to_vec())));
    }

    #[test]
    fn test_mbox_two_messages() {
        let input = b"From a Sat\r\nSubject: one\r\n\r\nfirst\r\nFrom b Sun\r\nSubject: two\r\n\r\nsecond\r\n";
        let mut parser = MimeParser::with_options(&input[..], ParserOptions::mbox());

        let mut first = Recorder::new();
        assert_eq!(parser.read_message(&mut first).unwrap(), ParserState::MboxMarker);
        let first = first.into_events();
        assert!(first.contains(&Event::MimePartContentRead(Cow::Owned(b"first".to_vec()))));
        assert_eq!(first.last(), Some(&Event::MimeMessageEnd { at: pos(33, 4) }));

        let mut second = Recorder::new();
        assert_eq!(parser.read_message(&mut second).unwrap(), ParserState::Eos);
        let second = second.into_events();
        assert_eq!(second[0], Event::MboxMarkerBegin { at: pos(35, 5) });
        assert!(second.contains(&Event::MimePartContentRead(Cow::Owned(b"second".to_vec()))));

        let err = parser.read_message(&mut Recorder::new()).unwrap_err();
        assert_eq!(err.kind(), Some(ParseErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_mbox_without_marker() {
        let options = ParserOptions {
            format: MimeFormat::Mbox,
            ..Default::default()
        };
        let mut parser = MimeParser::with_options(&b"Subject: x\r\n\r\n"[..], options);
        let err = parser.read_message(&mut Recorder::new()).unwrap_err();
        assert_eq!(err.kind(), Some(ParseErrorKind::MissingMboxMarker));
    }

    /// States reached by stepping until the state settles or a call fails.
    fn walk(
        input: &[u8],
        options: ParserOptions,
    ) -> (Vec<ParserState>, Option<ParseErrorKind>, Vec<Event<'static>>) {
        let mut parser = MimeParser::with_options(input, options);
        let mut rec = Recorder::new();
        let mut states = vec![];
        let failure = loop {
            match parser.step(&mut rec) {
                Ok(state) if states.last() == Some(&state) => break None,
                Ok(state) => states.push(state),
                Err(e) => {
                    assert_eq!(parser.state(), ParserState::Error);
                    break e.kind();
                }
            }
        };
        (states, failure, rec.into_events())
    }

    #[test]
    fn test_step_mbox() {
        let input = b"From a Sat\r\nSubject: one\r\n\r\nbody\r\n";
        let (states, failure, events) = walk(input, ParserOptions::mbox());
        assert_eq!(
            states,
            [ParserState::MboxMarker, ParserState::MessageHeaders, ParserState::Content]
        );
        assert_eq!(failure, None);
        assert_eq!(events[0], Event::MboxMarkerBegin { at: pos(0, 1) });
        assert_eq!(events[1], Event::MboxMarkerRead(Cow::Owned(b"From a Sat".to_vec())));
        assert_eq!(events[3], Event::HeadersBegin { at: pos(12, 2) });
        assert!(matches!(&events[4], Event::HeaderRead(h) if h.is("subject")));
    }

    #[test]
    fn test_step_entity() {
        let (states, failure, events) = walk(b"Subject: hi\r\n\r\nbody", ParserOptions::default());
        assert_eq!(states, [ParserState::Headers, ParserState::Content]);
        assert_eq!(failure, None);
        assert_eq!(events.last(), Some(&Event::HeadersEnd { at: pos(15, 3) }));
    }

    #[test]
    fn test_step_end_of_stream() {
        let (states, ..) = walk(b"", ParserOptions::default());
        assert_eq!(states, [ParserState::Eos]);

        let (states, ..) = walk(b"\xEF\xBB\xBF", ParserOptions::mbox());
        assert_eq!(states, [ParserState::Eos]);

        // separator right before the end: no header block
        let (states, failure, _) = walk(b"From a\r\n", ParserOptions::mbox());
        assert_eq!(
            states,
            [ParserState::MboxMarker, ParserState::MessageHeaders, ParserState::Eos]
        );
        assert_eq!(failure, None);

        let (states, _, events) = walk(b"Subject: x\r\n", ParserOptions::default());
        assert_eq!(states, [ParserState::Headers, ParserState::Content]);
        assert!(contains(&events, ComplianceKind::MissingBodySeparator));
    }

    #[test]
    fn test_step_failures() {
        let (states, failure, _) = walk(b"Subject: x\r\n\r\n", ParserOptions::mbox());
        assert_eq!(states, [ParserState::MboxMarker]);
        assert_eq!(failure, Some(ParseErrorKind::MissingMboxMarker));

        let (states, failure, _) = walk(b"garbage\r\n\r\n", ParserOptions::default());
        assert_eq!(states, [ParserState::Headers]);
        assert_eq!(failure, Some(ParseErrorKind::InvalidHeader));
    }

    #[test]
    fn test_mbox_munged_marker() {
        let input = b"From a Sat\r\n>From b Sun\r\nSubject: x\r\n\r\nbody\r\n";
        let mut parser = MimeParser::with_options(&input[..], ParserOptions::mbox());
        let mut rec = Recorder::new();
        assert_eq!(parser.read_message(&mut rec).unwrap(), ParserState::Eos);
        let events = rec.into_events();
        assert!(events.contains(&Event::MboxMarkerRead(Cow::Owned(b">From b Sun".to_vec()))));
        assert!(!contains(&events, ComplianceKind::InvalidHeader));
        assert!(events.contains(&Event::MimePartContentRead(Cow::Owned(b"body".to_vec()))));
    }

    #[test]
    fn test_cancel() {
        let mut parser = MimeParser::new(&b"Subject: hi\r\n\r\nbody\r\n"[..]);
        let token = parser.cancel_token();
        let mut seen = 0;
        let res = parser.read_entity(&mut |_: Event<'_>| {
            seen += 1;
            token.cancel();
        });
        assert!(matches!(res, Err(EMLError::Cancelled)));
        assert_eq!(seen, 1);
        assert_eq!(parser.state(), ParserState::Error);
    }

    #[test]
    fn test_async_matches_blocking() {
        let input = b"Content-Type: multipart/mixed; boundary=x\r\n\r\n--x\r\n\r\na\r\n--x--\r\n";
        let (_, blocking) = entity(input, ParserOptions::default());

        let mut parser = AsyncMimeParser::new(futures::io::Cursor::new(input.to_vec()));
        let mut rec = Recorder::new();
        block_on(parser.read_entity(&mut rec)).unwrap();
        assert_eq!(rec.into_events(), blocking);
    }
}
