//! Streaming reader: a read-ahead buffer over a byte source, and the state
//! machine that turns it into [`Event`]s.

/// Read-ahead buffer with position tracking
pub mod buffer;
pub mod compliance;
mod content;
/// Parsing algorithm shared by the blocking and async parsers
pub mod engine;
pub mod event;
pub mod headers;
mod multipart;
pub mod options;
pub mod parser;
pub mod scan;
/// Byte sources
pub mod source;
pub mod state;

pub use compliance::{ComplianceIssue, ComplianceKind, ComplianceStatus};
pub use engine::Engine;
pub use event::{CancelToken, Event, Handler, HeaderField, NewLineFormat, Recorder};
pub use options::{ComplianceMode, MimeFormat, ParserOptions};
pub use parser::{AsyncMimeParser, MimeParser};
pub use source::{AsyncSource, BlockingSource, Refill};
#[cfg(feature = "tokio")]
pub use source::TokioSource;
pub use state::ParserState;
