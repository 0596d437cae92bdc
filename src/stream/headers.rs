use std::borrow::Cow;

use crate::error::{EMLError, ParseErrorKind, Position, Result};
use crate::mime;
use crate::mime::mechanism::Mechanism;
use crate::mime::r#type::ContentType;
use crate::mime::version::Version;
use crate::stream::compliance::ComplianceKind;
use crate::stream::engine::Engine;
use crate::stream::event::{emit, Event, HeaderField, Handler};
use crate::stream::scan::{self, FieldName};
use crate::stream::source::Refill;
use crate::stream::state::ParserState;
use crate::text::ascii;

/// What the parser keeps from a header block to decide how to read the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    pub begin: Position,
    pub end: Position,
    /// Header lines, invalid ones included.
    pub count: usize,
    pub bare_linefeed: bool,
    pub has_content_type: bool,
    /// Last Content-Type that could be parsed.
    pub content_type: Option<ContentType>,
    pub encoding: Option<Mechanism>,
    pub content_length: Option<u64>,
    /// `Some(None)` when the header is present but cannot be parsed.
    pub mime_version: Option<Option<Version>>,
}

impl HeaderBlock {
    fn new(begin: Position) -> Self {
        Self {
            begin,
            end: begin,
            ..Default::default()
        }
    }

    fn learn(&mut self, name: &[u8], value: &[u8]) {
        match name.to_ascii_lowercase().as_slice() {
            b"content-type" => {
                self.has_content_type = true;
                self.content_type = mime::content_type(value);
            }
            b"content-transfer-encoding" => self.encoding = mime::mechanism(value),
            b"content-length" => self.content_length = mime::content_length(value),
            b"mime-version" => self.mime_version = Some(mime::version(value)),
            _ => (),
        }
    }
}

/// How a header line that is not a header is read.
enum Stray {
    /// The block ends early at this line, a boundary of an open multipart.
    Boundary,
    MboxMarker,
    Invalid,
}

impl<S: Refill> Engine<S> {
    /// Reads a header block, reporting each header as soon as it is read.
    ///
    /// A top-level block starting at the end of the stream leaves the parser
    /// in [`ParserState::Eos`] without any event. Otherwise the state is
    /// `Content`, or `Boundary` when the block was cut short by the boundary
    /// line of an open multipart.
    pub(crate) async fn scan_header_block<H: Handler>(
        &mut self,
        handler: &mut H,
        top_level: bool,
    ) -> Result<HeaderBlock> {
        let begin = self.cursor.position();
        let mut block = HeaderBlock::new(begin);

        if top_level && self.cursor.read_ahead(1, 0).await? == 0 {
            self.state = ParserState::Eos;
            return Ok(block);
        }
        emit(handler, &self.cancel, Event::HeadersBegin { at: begin })?;

        let mut bare_at = None;
        self.state = loop {
            let left = self.cursor.read_ahead(2, 0).await?;
            if left == 0 {
                self.raise(handler, ComplianceKind::MissingBodySeparator, self.cursor.position())?;
                break ParserState::Content;
            }
            if let Some(n) = scan::empty_line(self.cursor.peek()) {
                if n == 1 {
                    bare_at.get_or_insert(self.cursor.position());
                }
                self.cursor.consume(n);
                break ParserState::Content;
            }

            let at = self.cursor.position();
            match self.field_name().await? {
                FieldName::Valid { name_len, colon } => {
                    self.read_field(&mut bare_at).await?;
                    let term = scan::terminator_len(&self.scratch);
                    let value_end = (self.scratch.len() - term).max(colon + 1);
                    let field = HeaderField {
                        name: Cow::Borrowed(&self.scratch[..name_len]),
                        raw_value: Cow::Borrowed(&self.scratch[colon + 1..value_end]),
                        at,
                        invalid: false,
                    };
                    block.learn(&field.name, &field.raw_value);
                    emit(handler, &self.cancel, Event::HeaderRead(field))?;
                    block.count += 1;
                }
                FieldName::Invalid | FieldName::Incomplete => match self.stray(handler, top_level, &block).await? {
                    Stray::Boundary => {
                        self.raise(handler, ComplianceKind::MissingBodySeparator, at)?;
                        break ParserState::Boundary;
                    }
                    Stray::MboxMarker => {
                        self.report_marker_line(handler).await?;
                    }
                    Stray::Invalid => {
                        if top_level && block.count == 0 {
                            return Err(EMLError::parse(ParseErrorKind::InvalidHeader, at));
                        }
                        self.raise(handler, ComplianceKind::InvalidHeader, at)?;
                        self.read_field(&mut bare_at).await?;
                        let term = scan::terminator_len(&self.scratch);
                        let field = HeaderField {
                            name: Cow::Borrowed(&self.scratch[..self.scratch.len() - term]),
                            raw_value: Cow::Borrowed(&[]),
                            at,
                            invalid: true,
                        };
                        emit(handler, &self.cancel, Event::HeaderRead(field))?;
                        block.count += 1;
                    }
                },
            }
        };

        if let Some(at) = bare_at {
            block.bare_linefeed = true;
            self.raise(handler, ComplianceKind::BareLinefeedInHeader, at)?;
        }

        block.end = self.cursor.position();
        emit(handler, &self.cancel, Event::HeadersEnd { at: block.end })?;

        #[cfg(feature = "tracing")]
        tracing::trace!(headers = block.count, begin = %block.begin, end = %block.end, "header block");

        Ok(block)
    }

    /// Looks for the field name of the line at the cursor, reading ahead as
    /// much as needed but no further than the longest allowed name.
    async fn field_name(&mut self) -> Result<FieldName> {
        let mut want = 64;
        loop {
            self.cursor.read_ahead(want, 0).await?;
            match scan::field_name(self.cursor.peek(), self.cursor.eos()) {
                FieldName::Incomplete if want <= scan::MAX_FIELD_NAME => want *= 2,
                FieldName::Incomplete => return Ok(FieldName::Invalid),
                found => return Ok(found),
            }
        }
    }

    /// Decides what a line without field name is.
    async fn stray<H: Handler>(
        &mut self,
        handler: &mut H,
        top_level: bool,
        block: &HeaderBlock,
    ) -> Result<Stray> {
        let first = self.cursor.peek().first().copied();
        let candidate = match first {
            Some(ascii::MINUS) => !self.bounds.is_empty(),
            Some(b'F') => self.mbox_active(),
            _ => false,
        };
        if candidate && self.check_boundary(handler, 0).await?.is_boundary() {
            return Ok(Stray::Boundary);
        }

        // a separator opening the block is skipped, munged or not; in an
        // active mailbox a plain one already ended the block above
        if top_level && block.count == 0 && matches!(first, Some(b'F') | Some(b'>')) {
            self.cursor.read_ahead(ascii::MBOX_FROM.len() + 1, 0).await?;
            if scan::is_mbox_like(self.cursor.peek()) {
                return Ok(Stray::MboxMarker);
            }
        }
        Ok(Stray::Invalid)
    }

    /// Copies a header line and its continuation lines into the scratch
    /// buffer and consumes them, recording the position of the first bare
    /// line feed.
    async fn read_field(&mut self, bare_at: &mut Option<Position>) -> Result<()> {
        self.scratch.clear();
        loop {
            if !self.read_line().await? {
                return Ok(());
            }
            let len = self.scratch.len();
            if len < 2 || self.scratch[len - 2] != ascii::CR {
                let end = self.cursor.position();
                bare_at.get_or_insert(Position {
                    offset: end.offset - 1,
                    line: end.line - 1,
                });
            }

            if self.cursor.read_ahead(1, 0).await? == 0 || !ascii::is_wsp(self.cursor.peek()[0]) {
                return Ok(());
            }
        }
    }

    /// Appends the line at the cursor to the scratch buffer, line feed
    /// included, and consumes it. Returns `false` when the stream ended
    /// before a line feed.
    pub(crate) async fn read_line(&mut self) -> Result<bool> {
        loop {
            let left = self.cursor.read_ahead(1, 0).await?;
            if left == 0 {
                return Ok(false);
            }
            match scan::line_len(self.cursor.peek()) {
                Some(n) => {
                    self.scratch.extend_from_slice(&self.cursor.peek()[..n]);
                    self.cursor.consume(n);
                    return Ok(true);
                }
                None => {
                    self.scratch.extend_from_slice(self.cursor.peek());
                    self.cursor.consume(left);
                }
            }
        }
    }

    /// Reports the line at the cursor as an mbox separator and consumes it.
    pub(crate) async fn report_marker_line<H: Handler>(&mut self, handler: &mut H) -> Result<()> {
        let at = self.cursor.position();
        emit(handler, &self.cancel, Event::MboxMarkerBegin { at })?;

        self.scratch.clear();
        self.read_line().await?;
        let term = scan::terminator_len(&self.scratch);
        let line = &self.scratch[..self.scratch.len() - term];
        emit(handler, &self.cancel, Event::MboxMarkerRead(Cow::Borrowed(line)))?;

        emit(handler, &self.cancel, Event::MboxMarkerEnd { at: self.cursor.position() })
    }
}
