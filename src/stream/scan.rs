//! Token scanners over the unread part of the buffer.
//!
//! They never consume: each one reports what it recognized and how far, or
//! that more bytes are needed.

use crate::text::ascii;
use crate::text::words::is_ftext;

/// Longest field name looked at before a line is declared invalid, the
/// RFC 5322 line length limit.
pub const MAX_FIELD_NAME: usize = 998;

/// Bytes the multipart content scanner emits at most per event.
pub const CHUNK: usize = 4096;

/// Room left after a boundary for trailing blanks on a candidate line.
pub const BOUNDARY_SLACK: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    /// `name_len` bytes of name, colon at `colon`.
    Valid { name_len: usize, colon: usize },
    Invalid,
    /// The input ended before the colon or an invalid byte.
    Incomplete,
}

/// Recognizes `ftext+ WSP* ":"` at the start of a line.
///
/// `complete` tells that no more bytes will come.
pub fn field_name(input: &[u8], complete: bool) -> FieldName {
    let window = &input[..input.len().min(MAX_FIELD_NAME)];
    let name_len = window.iter().take_while(|c| is_ftext(**c)).count();
    let blanks = window[name_len..]
        .iter()
        .take_while(|c| ascii::is_wsp(**c))
        .count();

    match window.get(name_len + blanks) {
        Some(&ascii::COL) if name_len > 0 => FieldName::Valid {
            name_len,
            colon: name_len + blanks,
        },
        Some(_) => FieldName::Invalid,
        None if complete || window.len() == MAX_FIELD_NAME => FieldName::Invalid,
        None => FieldName::Incomplete,
    }
}

/// Length of the UTF-8 byte-order mark at the start of `input`, if any.
pub fn bom(input: &[u8]) -> usize {
    if input.starts_with(ascii::UTF8_BOM) {
        ascii::UTF8_BOM.len()
    } else {
        0
    }
}

/// `From ` separator line of an mbox.
pub fn is_mbox_marker(line: &[u8]) -> bool {
    line.starts_with(ascii::MBOX_FROM)
}

/// A separator line a mailer escaped with `>`, or a plain one.
pub fn is_mbox_like(line: &[u8]) -> bool {
    is_mbox_marker(line) || line.strip_prefix(b">").is_some_and(is_mbox_marker)
}

/// Length of the first line of `input`, line feed included.
pub fn line_len(input: &[u8]) -> Option<usize> {
    memchr::memchr(ascii::LF, input).map(|i| i + 1)
}

/// Length of the line terminator at the end of `line`.
pub fn terminator_len(line: &[u8]) -> usize {
    if line.ends_with(ascii::CRLF) {
        2
    } else if line.ends_with(&[ascii::LF]) {
        1
    } else {
        0
    }
}

/// `Some(len)` when `input` starts with an empty line, `None` when it
/// starts with anything else or is too short to tell.
pub fn empty_line(input: &[u8]) -> Option<usize> {
    match input {
        [ascii::LF, ..] => Some(1),
        [ascii::CR, ascii::LF, ..] => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_name() {
        assert_eq!(
            field_name(b"Subject: hi\r\n", false),
            FieldName::Valid { name_len: 7, colon: 7 }
        );
        assert_eq!(
            field_name(b"Subject \t: hi\r\n", false),
            FieldName::Valid { name_len: 7, colon: 9 }
        );
        assert_eq!(field_name(b": hi\r\n", false), FieldName::Invalid);
        assert_eq!(field_name(b"no colon here\r\n", false), FieldName::Invalid);
        assert_eq!(field_name(b"--boundary\r\n", false), FieldName::Invalid);
        assert_eq!(field_name(b"From a@b Sat\n", false), FieldName::Invalid);
        assert_eq!(field_name(b"Subj", false), FieldName::Incomplete);
        assert_eq!(field_name(b"Subj", true), FieldName::Invalid);
        assert_eq!(field_name(&[b'X'; 2000], false), FieldName::Invalid);
    }

    #[test]
    fn test_bom() {
        assert_eq!(bom(b"\xEF\xBB\xBFFrom: a"), 3);
        assert_eq!(bom(b"From: a"), 0);
        assert_eq!(bom(b"\xEF\xBB"), 0);
    }

    #[test]
    fn test_mbox() {
        assert!(is_mbox_marker(b"From someone@example.com Sat Jan  3 01:05:34 1996\n"));
        assert!(!is_mbox_marker(b"From: someone\n"));
        assert!(!is_mbox_marker(b">From someone\n"));
        assert!(is_mbox_like(b">From someone\n"));
    }

    #[test]
    fn test_lines() {
        assert_eq!(line_len(b"abc\r\ndef"), Some(5));
        assert_eq!(line_len(b"abc"), None);
        assert_eq!(terminator_len(b"abc\r\n"), 2);
        assert_eq!(terminator_len(b"abc\n"), 1);
        assert_eq!(terminator_len(b"abc\r"), 0);
        assert_eq!(empty_line(b"\r\nbody"), Some(2));
        assert_eq!(empty_line(b"\nbody"), Some(1));
        assert_eq!(empty_line(b"\rbody"), None);
        assert_eq!(empty_line(b"To: x"), None);
    }
}
