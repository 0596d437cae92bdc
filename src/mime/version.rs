use nom::{
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{map_res, opt},
    sequence::{delimited, tuple},
    IResult,
};

use crate::text::whitespace::cfws;

/// MIME-Version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
}

pub fn version(input: &[u8]) -> IResult<&[u8], Version> {
    let (rest, (_, major, _, _, _, minor, _)) = tuple((
        opt(cfws),
        number,
        opt(cfws),
        tag(b"."),
        opt(cfws),
        number,
        opt(cfws),
    ))(input)?;
    Ok((rest, Version { major, minor }))
}

/// Content-Length, a plain decimal byte count.
pub fn content_length(input: &[u8]) -> IResult<&[u8], u64> {
    delimited(opt(cfws), number, opt(cfws))(input)
}

fn number(input: &[u8]) -> IResult<&[u8], u64> {
    map_res(digit1, |d: &[u8]| {
        std::str::from_utf8(d)
            .map_err(|_| ())
            .and_then(|s| s.parse::<u64>().map_err(|_| ()))
    })(input)
}
