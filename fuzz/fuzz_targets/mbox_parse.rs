#![no_main]

use eml_stream::{MimeParser, ParserOptions, ParserState, Recorder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut parser = MimeParser::with_options(data, ParserOptions::mbox());
    let mut events = Recorder::new();
    while let Ok(ParserState::MboxMarker) = parser.read_message(&mut events) {}
});
