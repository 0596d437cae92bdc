use std::io;

use eml_stream::{MimeParser, ParserOptions, Recorder};

/// Parses a message from stdin with logging enabled, for instance with
/// `RUST_LOG=eml_stream=trace`.
pub fn main() -> Result<(), eml_stream::EMLError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut parser = MimeParser::with_options(io::stdin().lock(), ParserOptions::default());
    let mut events = Recorder::new();
    let state = parser.read_message(&mut events)?;
    println!(
        "{state:?}: {} events, {} compliance issue(s)",
        events.0.len(),
        parser.compliance().issues().len()
    );
    Ok(())
}
