use crate::error::Result;
use crate::mime;
use crate::mime::r#type::ContentType;
use crate::stream::compliance::ComplianceKind;
use crate::stream::content::{ContentKind, Scanned};
use crate::stream::engine::Engine;
use crate::stream::event::{emit, Event, Handler};
use crate::stream::headers::HeaderBlock;
use crate::stream::source::Refill;
use crate::text::boundary::BoundaryClassification;

/// Shape of the body announced by a header block.
enum Node {
    Leaf,
    Multipart(Vec<u8>),
    Message,
}

/// An entity whose body is still being read. Its boundary, if any, is on
/// the boundary stack.
enum Frame {
    Multipart { ctype: ContentType, depth: usize },
    Message,
}

/// What follows a boundary line or the start of a message part.
enum Opened {
    Entity(HeaderBlock, ContentType),
    Ended(Scanned),
}

impl<S: Refill> Engine<S> {
    /// Reads the body of an entity whose headers were just read, then
    /// returns how it ended. `depth` counts the enclosing multiparts and
    /// messages.
    ///
    /// Nested entities are kept on an explicit frame stack, so the depth of
    /// the input never grows the call stack.
    pub(crate) async fn construct_entity<H: Handler>(
        &mut self,
        handler: &mut H,
        block: HeaderBlock,
        ctype: ContentType,
        depth: usize,
    ) -> Result<Scanned> {
        let mut frames: Vec<Frame> = vec![];
        let mut entity = (block, ctype, depth);

        loop {
            let (block, ctype, depth) = entity;
            let node = self.node_kind(handler, &block, &ctype, depth)?;

            #[cfg(feature = "tracing")]
            tracing::trace!(%ctype, depth, at = %block.begin, "entity");

            let mut scanned = match node {
                Node::Leaf => self.construct_leaf(handler, block, ctype).await?,
                Node::Multipart(boundary) => {
                    let scanned = self.open_multipart(handler, &block, &ctype, &boundary).await?;
                    frames.push(Frame::Multipart { ctype, depth });
                    scanned
                }
                Node::Message => match self.open_message_part(handler, block, ctype).await? {
                    Opened::Entity(inner, inner_type) => {
                        frames.push(Frame::Message);
                        entity = (inner, inner_type, depth + 1);
                        continue;
                    }
                    Opened::Ended(scanned) => scanned,
                },
            };

            // hand the end of the body to the enclosing entities
            loop {
                match frames.last() {
                    None => return Ok(scanned),
                    Some(Frame::Message) => {
                        frames.pop();
                        emit(handler, &self.cancel, Event::MimeMessageEnd { at: scanned.end })?;
                        emit(handler, &self.cancel, Event::MessagePartEnd { at: scanned.end })?;
                    }
                    Some(Frame::Multipart { ctype, depth }) => {
                        if scanned.class == BoundaryClassification::ImmediateBoundary {
                            match self.next_multipart_child(handler, ctype).await? {
                                Opened::Entity(child, child_type) => {
                                    entity = (child, child_type, depth + 1);
                                    break;
                                }
                                Opened::Ended(eos) => scanned = eos,
                            }
                        } else {
                            frames.pop();
                            scanned = self.close_multipart(handler, scanned).await?;
                        }
                    }
                }
            }
        }
    }

    fn node_kind<H: Handler>(
        &mut self,
        handler: &mut H,
        block: &HeaderBlock,
        ctype: &ContentType,
        depth: usize,
    ) -> Result<Node> {
        let too_deep = depth >= self.options.max_mime_depth;

        if ctype.is_multipart() {
            if !mime::is_multipart(ctype) {
                self.raise(handler, ComplianceKind::MissingMultipartBoundaryParameter, block.begin)?;
                return Ok(Node::Leaf);
            }
            if too_deep {
                self.raise(handler, ComplianceKind::NestingDepthExceeded, block.begin)?;
                return Ok(Node::Leaf);
            }
            let boundary = ctype.boundary().unwrap_or_default();
            return Ok(Node::Multipart(boundary.to_vec()));
        }

        let encapsulated = mime::is_message_part(ctype, None);
        if encapsulated && !mime::is_message_part(ctype, block.encoding.as_ref()) {
            self.raise(handler, ComplianceKind::InvalidContentTransferEncoding, block.begin)?;
            return Ok(Node::Leaf);
        }
        if encapsulated {
            if too_deep {
                self.raise(handler, ComplianceKind::NestingDepthExceeded, block.begin)?;
                return Ok(Node::Leaf);
            }
            return Ok(Node::Message);
        }
        Ok(Node::Leaf)
    }

    async fn construct_leaf<H: Handler>(
        &mut self,
        handler: &mut H,
        block: HeaderBlock,
        ctype: ContentType,
    ) -> Result<Scanned> {
        emit(handler, &self.cancel, Event::MimePartBegin { content_type: ctype, at: block.begin })?;
        let scanned = self.scan_content(handler, ContentKind::Part).await?;
        emit(handler, &self.cancel, Event::MimePartEnd { at: scanned.end })?;
        Ok(scanned)
    }

    /// Starts a multipart: pushes its boundary and reads the preamble.
    async fn open_multipart<H: Handler>(
        &mut self,
        handler: &mut H,
        block: &HeaderBlock,
        ctype: &ContentType,
        boundary: &[u8],
    ) -> Result<Scanned> {
        emit(
            handler,
            &self.cancel,
            Event::MultipartBegin { content_type: ctype.clone(), at: block.begin },
        )?;
        if block.encoding.as_ref().is_some_and(|e| !e.is_identity()) {
            self.raise(handler, ComplianceKind::InvalidContentTransferEncoding, block.begin)?;
        }

        self.bounds.push(boundary);
        self.scan_content(handler, ContentKind::Preamble).await
    }

    /// Consumes a boundary line and reads the header block of the part after
    /// it. The stream may end right after the boundary.
    async fn next_multipart_child<H: Handler>(
        &mut self,
        handler: &mut H,
        ctype: &ContentType,
    ) -> Result<Opened> {
        let at = self.cursor.position();
        self.skip_line().await?;
        emit(handler, &self.cancel, Event::MultipartBoundary { at })?;

        if self.cursor.read_ahead(1, 0).await? == 0 {
            return Ok(Opened::Ended(Scanned {
                class: BoundaryClassification::Eos,
                end: self.cursor.position(),
            }));
        }

        let child = self.scan_header_block(handler, false).await?;
        let child_type = ContentType::resolve(child.content_type.clone(), Some(ctype));
        Ok(Opened::Entity(child, child_type))
    }

    /// Ends the innermost multipart, given how its last part ended.
    async fn close_multipart<H: Handler>(
        &mut self,
        handler: &mut H,
        scanned: Scanned,
    ) -> Result<Scanned> {
        let scanned = match scanned.class {
            BoundaryClassification::ImmediateEndBoundary => {
                let at = self.cursor.position();
                self.skip_line().await?;
                emit(handler, &self.cancel, Event::MultipartEndBoundary { at })?;
                self.bounds.pop();
                self.scan_content(handler, ContentKind::Epilogue).await?
            }
            _ => {
                self.bounds.pop();
                self.raise(handler, ComplianceKind::MissingMultipartBoundary, scanned.end)?;
                // the line is seen again, this time from the parent
                let class = self.check_boundary(handler, 0).await?;
                Scanned { class, end: scanned.end }
            }
        };

        emit(handler, &self.cancel, Event::MultipartEnd { at: scanned.end })?;
        Ok(scanned)
    }

    /// Starts an encapsulated message and reads its header block. A part
    /// that is empty is closed right away and its end is returned instead.
    async fn open_message_part<H: Handler>(
        &mut self,
        handler: &mut H,
        block: HeaderBlock,
        ctype: ContentType,
    ) -> Result<Opened> {
        emit(handler, &self.cancel, Event::MessagePartBegin { content_type: ctype, at: block.begin })?;

        let class = self.check_boundary(handler, 0).await?;
        if class != BoundaryClassification::None {
            let scanned = Scanned { class, end: self.cursor.position() };
            emit(handler, &self.cancel, Event::MessagePartEnd { at: scanned.end })?;
            return Ok(Opened::Ended(scanned));
        }

        let at = self.cursor.position();
        emit(handler, &self.cancel, Event::MimeMessageBegin { at })?;
        let inner = self.scan_header_block(handler, false).await?;
        self.check_mime_version(handler, &inner)?;

        let inner_type = ContentType::resolve(inner.content_type.clone(), None);
        Ok(Opened::Entity(inner, inner_type))
    }
}
