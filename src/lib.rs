#![doc = include_str!("../README.md")]

pub mod error;
pub mod mime;
pub mod stream;
pub mod text;

use bounded_static::IntoBoundedStatic;

pub use error::{EMLError, ParseErrorKind, Position};
pub use stream::{
    AsyncMimeParser, CancelToken, ComplianceIssue, ComplianceKind, ComplianceMode,
    ComplianceStatus, Event, Handler, HeaderField, MimeFormat, MimeParser, NewLineFormat,
    ParserOptions, ParserState, Recorder,
};

/// Parses a whole entity held in memory and returns its events.
pub fn entity(input: &[u8]) -> Result<Vec<Event<'static>>, EMLError> {
    let mut parser = MimeParser::new(input);
    let mut rec = Recorder::new();
    parser.read_entity(&mut rec)?;
    Ok(rec.into_events())
}

/// Reads the first header block of `input`.
pub fn headers(input: &[u8]) -> Result<Vec<HeaderField<'static>>, EMLError> {
    let mut parser = MimeParser::new(input);
    let mut fields = vec![];
    parser.read_headers(&mut |ev: Event<'_>| {
        if let Event::HeaderRead(field) = ev {
            fields.push(field.into_static());
        }
    })?;
    Ok(fields)
}

/// Splits an mbox held in memory into the events of each message.
pub fn mbox(input: &[u8]) -> Result<Vec<Vec<Event<'static>>>, EMLError> {
    let mut parser = MimeParser::with_options(input, ParserOptions::mbox());
    let mut messages = vec![];
    loop {
        let mut rec = Recorder::new();
        let state = parser.read_message(&mut rec)?;
        messages.push(rec.into_events());
        if state == ParserState::Eos {
            return Ok(messages);
        }
    }
}
