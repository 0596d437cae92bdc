use crate::text::ascii;
use crate::text::whitespace::cfws;
use nom::{
    bytes::complete::take_while1,
    character::is_alphanumeric,
    combinator::opt,
    sequence::delimited,
    IResult,
};

/// ASCII printable characters
pub fn is_vchar(c: u8) -> bool {
    (ascii::EXCLAMATION..=ascii::TILDE).contains(&c)
}

/// MIME Token allowed characters
///
/// forbidden: ()<>@,;:\"/[]?=
pub fn is_mime_atom_text(c: u8) -> bool {
    is_alphanumeric(c)
        || c == ascii::EXCLAMATION
        || c == ascii::NUM
        || c == ascii::DOLLAR
        || c == ascii::PERCENT
        || c == ascii::AMPERSAND
        || c == ascii::SQUOTE
        || c == ascii::ASTERISK
        || c == ascii::PLUS
        || c == ascii::MINUS
        || c == ascii::PERIOD
        || c == ascii::CARRET
        || c == ascii::UNDERSCORE
        || c == ascii::GRAVE
        || c == ascii::LEFT_CURLY
        || c == ascii::PIPE
        || c == ascii::RIGHT_CURLY
        || c == ascii::TILDE
}

/// MIME Token
///
/// `[CFWS] 1*token_text [CFWS]`
pub fn mime_atom(input: &[u8]) -> IResult<&[u8], &[u8]> {
    delimited(opt(cfws), mime_atom_plain, opt(cfws))(input)
}

/// `1*token_text`
pub fn mime_atom_plain(input: &[u8]) -> IResult<&[u8], &[u8]> {
    take_while1(is_mime_atom_text)(input)
}

/// Header field name character: any printable byte but the colon.
///
/// ```abnf
///   ftext           =   %d33-57 /          ; Printable US-ASCII
///                       %d59-126           ;  characters not including
///                                          ;  ":".
/// ```
pub fn is_ftext(c: u8) -> bool {
    is_vchar(c) && c != ascii::COL
}
