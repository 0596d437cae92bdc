use std::fs::File;
use std::io::BufReader;

use eml_stream::{Event, MimeParser, ParserOptions, ParserState};

/// Lists the messages of a mailbox with their subject and the number of
/// compliance issues found in each.
pub fn main() -> Result<(), eml_stream::EMLError> {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: mbox <mailbox>");
        return Ok(());
    };

    let file = BufReader::new(File::open(path)?);
    let mut parser = MimeParser::with_options(file, ParserOptions::mbox());
    let mut index = 0;
    loop {
        let mut top = true;
        let mut subject = None;
        let state = parser.read_message(&mut |ev: Event<'_>| match ev {
            Event::HeaderRead(h) if top && h.is("subject") => subject = Some(h.value()),
            Event::HeadersEnd { .. } => top = false,
            _ => (),
        })?;

        index += 1;
        println!(
            "{index:>6} {:>3} issue(s)  {}",
            parser.compliance().issues().len(),
            subject.as_deref().unwrap_or("(no subject)"),
        );
        if state == ParserState::Eos {
            return Ok(());
        }
    }
}
