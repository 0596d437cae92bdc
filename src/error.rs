use bounded_static::ToStatic;
use std::fmt;
use std::io;

use thiserror::Error;

/// Byte offset and 1-based line number in the parsed stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ToStatic)]
pub struct Position {
    pub offset: u64,
    pub line: u64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} (offset {})", self.line, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("no mbox separator line found")]
    MissingMboxMarker,
    #[error("the first header line is not a header")]
    InvalidHeader,
}

#[derive(Debug, Error)]
pub enum EMLError {
    #[error("{kind} at {position}")]
    Parse {
        kind: ParseErrorKind,
        position: Position,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("parsing was cancelled")]
    Cancelled,
}

impl EMLError {
    pub fn parse(kind: ParseErrorKind, position: Position) -> Self {
        Self::Parse { kind, position }
    }

    pub fn kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EMLError>;
