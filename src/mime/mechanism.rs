use nom::{combinator::map, IResult};

use crate::text::words::mime_atom as token;

/// Content-Transfer-Encoding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mechanism {
    #[default]
    _7Bit,
    _8Bit,
    Binary,
    QuotedPrintable,
    Base64,
    UUEncode,
    Other(Vec<u8>),
}

impl Mechanism {
    pub fn from_token(tok: &[u8]) -> Self {
        use Mechanism::*;
        match tok.to_ascii_lowercase().as_slice() {
            b"7bit" => _7Bit,
            b"8bit" => _8Bit,
            b"binary" => Binary,
            b"quoted-printable" => QuotedPrintable,
            b"base64" => Base64,
            b"x-uuencode" | b"uuencode" | b"x-uue" => UUEncode,
            _ => Other(tok.to_vec()),
        }
    }

    /// Identity encodings, the only ones allowed on multiparts and
    /// encapsulated messages.
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::_7Bit | Self::_8Bit | Self::Binary)
    }
}

pub fn mechanism(input: &[u8]) -> IResult<&[u8], Mechanism> {
    map(token, Mechanism::from_token)(input)
}
