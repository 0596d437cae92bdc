#![no_main]

use eml_stream::{MimeParser, ParserOptions, Recorder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut whole = Recorder::new();
    let whole_res = MimeParser::new(data).read_entity(&mut whole);

    // the events must not depend on how the input is buffered
    let options = ParserOptions {
        block_size: 1 + data.len() % 7,
        ..Default::default()
    };
    let mut split = Recorder::new();
    let split_res = MimeParser::with_options(data, options).read_entity(&mut split);

    assert_eq!(whole, split);
    assert_eq!(whole_res.map_err(|e| e.kind()), split_res.map_err(|e| e.kind()));
});
