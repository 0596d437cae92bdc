/// Where the structural state machine stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParserState {
    #[default]
    Initialized,
    /// Looking for an mbox `From ` line.
    MboxMarker,
    /// Reading the header block of a message.
    MessageHeaders,
    /// Reading the header block of an entity.
    Headers,
    /// A header block was read, its body follows.
    Content,
    /// A header block was cut short by a boundary line of an ancestor.
    Boundary,
    /// `read_headers` returned.
    Complete,
    Eos,
    Error,
}

impl ParserState {
    pub fn is_headers(self) -> bool {
        matches!(self, Self::MessageHeaders | Self::Headers)
    }
}
