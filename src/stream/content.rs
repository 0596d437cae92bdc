use std::borrow::Cow;

use crate::error::{Position, Result};
use crate::stream::compliance::ComplianceKind;
use crate::stream::engine::Engine;
use crate::stream::event::{emit, Event, Handler, NewLineFormat};
use crate::stream::scan::{self, BOUNDARY_SLACK, CHUNK};
use crate::stream::source::Refill;
use crate::text::ascii;
use crate::text::boundary::BoundaryClassification;

/// Which body section a content scan reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentKind {
    Part,
    Preamble,
    Epilogue,
}

impl ContentKind {
    fn begin(self, at: Position) -> Event<'static> {
        match self {
            Self::Part => Event::MimePartContentBegin { at },
            Self::Preamble => Event::MultipartPreambleBegin { at },
            Self::Epilogue => Event::MultipartEpilogueBegin { at },
        }
    }

    fn read(self, data: &[u8]) -> Event<'_> {
        let data = Cow::Borrowed(data);
        match self {
            Self::Part => Event::MimePartContentRead(data),
            Self::Preamble => Event::MultipartPreambleRead(data),
            Self::Epilogue => Event::MultipartEpilogueRead(data),
        }
    }

    fn end(self, at: Position, lines: u64, newline: NewLineFormat) -> Event<'static> {
        match self {
            Self::Part => Event::MimePartContentEnd { at, lines, newline },
            Self::Preamble => Event::MultipartPreambleEnd { at },
            Self::Epilogue => Event::MultipartEpilogueEnd { at },
        }
    }
}

/// How a body section ended: the classification of the line that stopped
/// it, and where its content ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scanned {
    pub class: BoundaryClassification,
    pub end: Position,
}

impl<S: Refill> Engine<S> {
    /// Whether `From ` lines currently end a message.
    pub(crate) fn mbox_active(&self) -> bool {
        self.bounds.is_mbox()
            && self
                .content_end
                .map_or(true, |end| self.cursor.offset() >= end)
    }

    /// Classifies the line at the cursor without consuming it, keeping the
    /// `save` bytes before the cursor.
    pub(crate) async fn check_boundary<H: Handler>(
        &mut self,
        handler: &mut H,
        save: usize,
    ) -> Result<BoundaryClassification> {
        let left = self.cursor.read_ahead(1, save).await?;
        if left == 0 {
            return Ok(BoundaryClassification::Eos);
        }

        let want = match self.cursor.peek()[0] {
            ascii::MINUS if !self.bounds.is_empty() => {
                self.bounds.max_len() + 4 + BOUNDARY_SLACK
            }
            b'F' if self.mbox_active() => ascii::MBOX_FROM.len(),
            _ => return Ok(BoundaryClassification::None),
        };

        let left = self.cursor.read_ahead(want, save).await?;
        let window = &self.cursor.peek()[..left.min(want)];
        let line = match scan::line_len(window) {
            Some(n) => &window[..n],
            None => window,
        };
        let (class, sloppy) = self.bounds.classify(line, self.options.loose());

        if sloppy {
            #[cfg(feature = "tracing-discard")]
            tracing::trace!(at = %self.cursor.position(), "text after boundary ignored");

            self.raise(handler, ComplianceKind::InvalidBoundaryLine, self.cursor.position())?;
        }
        Ok(class)
    }

    /// Consumes the line at the cursor, line feed included.
    pub(crate) async fn skip_line(&mut self) -> Result<()> {
        loop {
            let left = self.cursor.read_ahead(1, 0).await?;
            if left == 0 {
                return Ok(());
            }
            match scan::line_len(self.cursor.peek()) {
                Some(n) => {
                    self.cursor.consume(n);
                    return Ok(());
                }
                None => self.cursor.consume(left),
            }
        }
    }

    /// Reports body content up to the next line that is a boundary for the
    /// open multiparts, or to the end of the stream.
    ///
    /// Content is reported one line at a time, lines longer than [`CHUNK`]
    /// in pieces of that size, so events do not depend on how the source
    /// delivers bytes. A line terminator is reported with the line after it:
    /// the one before a boundary belongs to the boundary and is dropped.
    pub(crate) async fn scan_content<H: Handler>(
        &mut self,
        handler: &mut H,
        kind: ContentKind,
    ) -> Result<Scanned> {
        emit(handler, &self.cancel, kind.begin(self.cursor.position()))?;

        // visited bytes right before the cursor not reported yet
        let mut unemitted = 0usize;
        let mut prev = 0u8;
        let mut line_started = false;
        let (mut lines, mut crlf, mut lf) = (0u64, 0u64, 0u64);

        let scanned = 'lines: loop {
            let class = self.check_boundary(handler, unemitted).await?;
            match class {
                BoundaryClassification::None => (),
                BoundaryClassification::Eos => {
                    if unemitted > 0 {
                        let data = self.cursor.behind(unemitted);
                        emit(handler, &self.cancel, kind.read(data))?;
                    }
                    break Scanned {
                        class,
                        end: self.cursor.position(),
                    };
                }
                _ => {
                    // unemitted is the previous line terminator
                    let here = self.cursor.position();
                    let end = match unemitted {
                        0 => here,
                        n => Position {
                            offset: here.offset - n as u64,
                            line: here.line - 1,
                        },
                    };
                    break Scanned { class, end };
                }
            }

            loop {
                let left = self.cursor.read_ahead(1, unemitted).await?;
                if left == 0 {
                    if line_started {
                        lines += 1;
                    }
                    if unemitted > 0 {
                        let data = self.cursor.behind(unemitted);
                        emit(handler, &self.cancel, kind.read(data))?;
                    }
                    break 'lines Scanned {
                        class: BoundaryClassification::Eos,
                        end: self.cursor.position(),
                    };
                }

                let room = CHUNK - unemitted;
                let window = &self.cursor.peek()[..left.min(room)];
                match scan::line_len(window) {
                    Some(n) => {
                        let is_crlf = match n {
                            1 => prev == ascii::CR,
                            _ => window[n - 2] == ascii::CR,
                        };
                        self.cursor.consume(n);
                        unemitted += n;
                        prev = ascii::LF;
                        line_started = false;
                        lines += 1;

                        let term = if is_crlf && unemitted >= 2 { 2 } else { 1 };
                        if unemitted > term {
                            let data = &self.cursor.behind(unemitted)[..unemitted - term];
                            emit(handler, &self.cancel, kind.read(data))?;
                        }
                        unemitted = term;

                        if is_crlf {
                            crlf += 1;
                        } else {
                            lf += 1;
                            if lf == 1 {
                                let here = self.cursor.position();
                                let at = Position {
                                    offset: here.offset - 1,
                                    line: here.line - 1,
                                };
                                self.raise(handler, ComplianceKind::BareLinefeedInBody, at)?;
                            }
                        }
                        continue 'lines;
                    }
                    None => {
                        let n = window.len();
                        prev = window[n - 1];
                        self.cursor.consume(n);
                        unemitted += n;
                        line_started = true;
                        if unemitted == CHUNK {
                            // a CR stays with the LF that may follow it
                            let held = usize::from(prev == ascii::CR);
                            let data = &self.cursor.behind(unemitted)[..unemitted - held];
                            emit(handler, &self.cancel, kind.read(data))?;
                            unemitted = held;
                        }
                    }
                }
            }
        };

        let newline = NewLineFormat::from_counts(crlf, lf);
        emit(handler, &self.cancel, kind.end(scanned.end, lines, newline))?;
        Ok(scanned)
    }
}
