use std::fs::File;
use std::io::{self, BufReader, Read};

use eml_stream::{Event, MimeParser};

/// Prints the header fields of every entity of a message read from the
/// file given as argument, or from stdin.
pub fn main() -> Result<(), eml_stream::EMLError> {
    let input: Box<dyn Read> = match std::env::args().nth(1) {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut parser = MimeParser::new(input);
    let mut depth = 0usize;
    parser.read_message(&mut |ev: Event<'_>| match ev {
        Event::MultipartBegin { content_type, .. } => {
            println!("{:indent$}{content_type}", "", indent = depth * 2);
            depth += 1;
        }
        Event::MultipartEnd { .. } => depth -= 1,
        Event::HeaderRead(h) if !h.invalid => {
            println!("{:indent$}{}: {}", "", h.name_str(), h.value(), indent = depth * 2);
        }
        Event::ComplianceIssue(issue) => {
            eprintln!("{} at {}", issue.kind, issue.position);
        }
        _ => (),
    })?;
    Ok(())
}
