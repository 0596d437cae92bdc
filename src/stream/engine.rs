use crate::error::{EMLError, ParseErrorKind, Position, Result};
use crate::mime::r#type::ContentType;
use crate::stream::buffer::ByteCursor;
use crate::stream::compliance::{ComplianceIssue, ComplianceKind, ComplianceStatus};
use crate::stream::event::{emit, CancelToken, Event, Handler};
use crate::stream::headers::HeaderBlock;
use crate::stream::options::{MimeFormat, ParserOptions};
use crate::stream::scan;
use crate::stream::source::Refill;
use crate::stream::state::ParserState;
use crate::text::ascii;
use crate::text::boundary::{BoundaryClassification, BoundaryStack};

/// The parsing algorithm, shared by the blocking and the async parsers.
///
/// Every operation is an `async fn` whose only suspension point is the
/// refill of the read-ahead buffer.
pub struct Engine<S> {
    pub(crate) cursor: ByteCursor<S>,
    pub(crate) options: ParserOptions,
    pub(crate) state: ParserState,
    pub(crate) bounds: BoundaryStack,
    pub(crate) compliance: ComplianceStatus,
    pub(crate) cancel: CancelToken,
    /// Header line being assembled.
    pub(crate) scratch: Vec<u8>,
    /// Header block read by the last `step`, not yet turned into a node.
    pub(crate) pending: Option<HeaderBlock>,
    /// Header state entered once the byte-order mark is skipped.
    entry: ParserState,
    /// Offset before which mbox separators are ignored.
    pub(crate) content_end: Option<u64>,
    failure: Option<(ParseErrorKind, Position)>,
}

impl<S: Refill> Engine<S> {
    pub fn new(source: S, options: ParserOptions) -> Self {
        let cancel = CancelToken::new();
        let mbox = options.format == MimeFormat::Mbox;
        let mut bounds = BoundaryStack::new();
        bounds.set_mbox(mbox);
        Self {
            cursor: ByteCursor::new(source, options.block_size, cancel.clone()),
            options,
            state: ParserState::Initialized,
            bounds,
            compliance: ComplianceStatus::default(),
            cancel,
            scratch: Vec::new(),
            pending: None,
            entry: match mbox {
                true => ParserState::MessageHeaders,
                false => ParserState::Headers,
            },
            content_end: None,
            failure: None,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn compliance(&self) -> &ComplianceStatus {
        &self.compliance
    }

    pub fn position(&self) -> Position {
        self.cursor.position()
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn into_source(self) -> S {
        self.cursor.into_source()
    }

    /// Performs one structural step: skip the byte-order mark, find an mbox
    /// separator, or read one header block. Other states are left as is.
    ///
    /// A fresh parser in mbox format steps through messages, otherwise
    /// through entity headers.
    pub async fn step<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        let res = self.advance(handler).await;
        self.settle(res)
    }

    async fn advance<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        match self.state {
            ParserState::Initialized => self.scan_bom().await?,
            ParserState::MboxMarker => self.scan_mbox_marker(handler).await?,
            state if state.is_headers() => {
                let block = self.scan_header_block(handler, true).await?;
                self.pending = Some(block);
            }
            _ => (),
        }
        Ok(self.state)
    }

    /// Reads one header block and stops before its body, in
    /// [`ParserState::Complete`].
    pub async fn read_headers<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        let res = self.read_headers_inner(handler).await;
        self.settle(res)
    }

    async fn read_headers_inner<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        self.begin(ParserState::Headers).await?;
        self.advance(handler).await?;
        self.take_pending()?;
        self.state = ParserState::Complete;
        Ok(self.state)
    }

    /// Reads a header block and the entity it introduces, down to the end of
    /// the stream.
    pub async fn read_entity<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        let res = self.read_entity_inner(handler).await;
        self.settle(res)
    }

    async fn read_entity_inner<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        self.begin(ParserState::Headers).await?;
        self.advance(handler).await?;
        let block = self.take_pending()?;

        let ctype = ContentType::resolve(block.content_type.clone(), None);
        self.construct_entity(handler, block, ctype, 0).await?;
        self.state = ParserState::Eos;
        Ok(self.state)
    }

    /// Reads one message. In mbox format, its separator line comes first and
    /// the parser stops at the next one, in [`ParserState::MboxMarker`].
    pub async fn read_message<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        let res = self.read_message_inner(handler).await;
        self.settle(res)
    }

    async fn read_message_inner<H: Handler>(&mut self, handler: &mut H) -> Result<ParserState> {
        let mbox = self.options.format == MimeFormat::Mbox;
        self.begin(ParserState::MessageHeaders).await?;
        if self.state == ParserState::MboxMarker {
            self.advance(handler).await?;
        }

        let at = self.cursor.position();
        if self.cursor.read_ahead(1, 0).await? == 0 {
            if !mbox {
                self.state = ParserState::Eos;
                return Err(EMLError::parse(ParseErrorKind::UnexpectedEof, at));
            }
            // separator line right before the end of the mailbox
            emit(handler, &self.cancel, Event::MimeMessageBegin { at })?;
            emit(handler, &self.cancel, Event::MimeMessageEnd { at })?;
            self.state = ParserState::Eos;
            return Ok(self.state);
        }

        emit(handler, &self.cancel, Event::MimeMessageBegin { at })?;
        self.advance(handler).await?;
        let block = self.take_pending()?;
        self.check_mime_version(handler, &block)?;

        if mbox && self.options.respect_content_length {
            self.content_end = block.content_length.map(|len| self.cursor.offset() + len);
        }

        let ctype = ContentType::resolve(block.content_type.clone(), None);
        let scanned = self.construct_entity(handler, block, ctype, 0).await?;
        emit(handler, &self.cancel, Event::MimeMessageEnd { at: scanned.end })?;
        self.content_end = None;

        self.state = match scanned.class {
            BoundaryClassification::Eos => ParserState::Eos,
            _ => ParserState::MboxMarker,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(state = ?self.state, end = %scanned.end, "message read");

        Ok(self.state)
    }

    /// Prepares a top-level call.
    async fn begin(&mut self, entry: ParserState) -> Result<()> {
        match self.state {
            ParserState::Error => {
                let (kind, at) = self
                    .failure
                    .unwrap_or((ParseErrorKind::UnexpectedEof, self.cursor.position()));
                return Err(EMLError::parse(kind, at));
            }
            ParserState::Eos => {
                return Err(EMLError::parse(
                    ParseErrorKind::UnexpectedEof,
                    self.cursor.position(),
                ))
            }
            _ => (),
        }

        self.compliance.reset();
        self.bounds.clear();
        self.bounds
            .set_mbox(entry == ParserState::MessageHeaders && self.options.format == MimeFormat::Mbox);
        self.content_end = None;
        self.pending = None;
        self.entry = entry;

        match self.state {
            ParserState::Initialized => self.scan_bom().await?,
            ParserState::MboxMarker if self.bounds.is_mbox() => (),
            _ => self.state = entry,
        }

        if self.state == ParserState::Eos {
            return Err(EMLError::parse(
                ParseErrorKind::UnexpectedEof,
                self.cursor.position(),
            ));
        }
        Ok(())
    }

    fn take_pending(&mut self) -> Result<HeaderBlock> {
        match self.pending.take() {
            Some(block) if self.state != ParserState::Eos => Ok(block),
            _ => {
                self.state = ParserState::Eos;
                Err(EMLError::parse(
                    ParseErrorKind::UnexpectedEof,
                    self.cursor.position(),
                ))
            }
        }
    }

    /// Records the outcome of a top-level call. An error leaves the parser
    /// in [`ParserState::Error`], except running out of input, which leaves
    /// it at [`ParserState::Eos`].
    fn settle(&mut self, res: Result<ParserState>) -> Result<ParserState> {
        if let Err(e) = &res {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %e, "parse stopped");

            match e {
                EMLError::Parse {
                    kind: ParseErrorKind::UnexpectedEof,
                    ..
                } if self.state == ParserState::Eos => (),
                EMLError::Parse { kind, position } => {
                    self.state = ParserState::Error;
                    self.failure = Some((*kind, *position));
                }
                _ => self.state = ParserState::Error,
            }
        }
        res
    }

    async fn scan_bom(&mut self) -> Result<()> {
        let left = self.cursor.read_ahead(ascii::UTF8_BOM.len(), 0).await?;
        let n = scan::bom(self.cursor.peek());
        self.cursor.consume(n);

        if left == n && self.cursor.read_ahead(1, 0).await? == 0 {
            self.state = ParserState::Eos;
            return Ok(());
        }
        self.state = match self.entry {
            ParserState::MessageHeaders if self.options.format == MimeFormat::Mbox => {
                ParserState::MboxMarker
            }
            entry => entry,
        };
        Ok(())
    }

    /// Skips lines up to the next `From ` separator and reports it.
    async fn scan_mbox_marker<H: Handler>(&mut self, handler: &mut H) -> Result<()> {
        loop {
            let left = self.cursor.read_ahead(ascii::MBOX_FROM.len(), 0).await?;
            if left == 0 {
                return Err(EMLError::parse(
                    ParseErrorKind::MissingMboxMarker,
                    self.cursor.position(),
                ));
            }
            if scan::is_mbox_marker(self.cursor.peek()) {
                break;
            }

            #[cfg(feature = "tracing-discard")]
            tracing::trace!(at = %self.cursor.position(), "skipping line before mbox separator");

            self.skip_line().await?;
        }

        self.report_marker_line(handler).await?;
        self.state = ParserState::MessageHeaders;
        Ok(())
    }

    /// Records an issue and reports it, once per kind and offset.
    pub(crate) fn raise<H: Handler>(
        &mut self,
        handler: &mut H,
        kind: ComplianceKind,
        position: Position,
    ) -> Result<()> {
        if self.compliance.record(kind, position) {
            let issue = ComplianceIssue { kind, position };
            emit(handler, &self.cancel, Event::ComplianceIssue(issue))?;
        }
        Ok(())
    }

    /// MIME-Version checks of a message header block.
    pub(crate) fn check_mime_version<H: Handler>(
        &mut self,
        handler: &mut H,
        block: &HeaderBlock,
    ) -> Result<()> {
        match (&block.mime_version, block.has_content_type) {
            (None, true) => self.raise(handler, ComplianceKind::MissingMimeVersion, block.begin),
            (Some(None), _) => self.raise(handler, ComplianceKind::InvalidMimeVersion, block.begin),
            _ => Ok(()),
        }
    }
}
