use bounded_static::ToStatic;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::{map, opt},
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};
use std::fmt;

use crate::text::ascii;
use crate::text::quoted::quoted_string;
use crate::text::whitespace::cfws;
use crate::text::words::{is_mime_atom_text, mime_atom, mime_atom_plain};

/// A `name=value` pair of a Content-Type, name lowercased.
#[derive(Debug, Clone, PartialEq, Eq, ToStatic)]
pub struct Parameter {
    pub name: String,
    pub value: Vec<u8>,
}

/// A parsed Content-Type, media type and subtype lowercased.
#[derive(Debug, Clone, PartialEq, Eq, ToStatic)]
pub struct ContentType {
    pub media_type: String,
    pub subtype: String,
    pub params: Vec<Parameter>,
}

impl Default for ContentType {
    fn default() -> Self {
        Self::new("text", "plain")
    }
}

impl ContentType {
    pub fn new(media_type: &str, subtype: &str) -> Self {
        Self {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            params: vec![],
        }
    }

    /// Implicit type of a part without Content-Type.
    pub fn implicit(parent: Option<&ContentType>) -> Self {
        match parent {
            Some(p) if p.is("multipart", "digest") => Self::new("message", "rfc822"),
            _ => Self::default(),
        }
    }

    /// The parsed type of a part, or the implicit one.
    pub fn resolve(parsed: Option<ContentType>, parent: Option<&ContentType>) -> Self {
        parsed.unwrap_or_else(|| Self::implicit(parent))
    }

    pub fn is(&self, media_type: &str, subtype: &str) -> bool {
        self.media_type.eq_ignore_ascii_case(media_type)
            && self.subtype.eq_ignore_ascii_case(subtype)
    }

    pub fn param(&self, name: &str) -> Option<&[u8]> {
        self.params
            .iter()
            .rev()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_slice())
    }

    /// The `boundary` parameter, if present and not empty.
    pub fn boundary(&self) -> Option<&[u8]> {
        self.param("boundary").filter(|b| !b.is_empty())
    }

    pub fn is_multipart(&self) -> bool {
        self.media_type == "multipart"
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media_type, self.subtype)?;
        for p in &self.params {
            let value = String::from_utf8_lossy(&p.value);
            if !p.value.is_empty() && p.value.iter().all(|c| is_mime_atom_text(*c)) {
                write!(f, "; {}={}", p.name, value)?;
            } else {
                write!(f, "; {}=\"{}\"", p.name, value.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

// ---- grammar

/// ```abnf
///  content := "Content-Type" ":" type "/" subtype *(";" parameter)
/// ```
///
/// Parameters are parsed as long as they are well formed: a broken
/// parameter ends the list but keeps the ones before it.
pub fn content_type(input: &[u8]) -> IResult<&[u8], ContentType> {
    let (input, (media_type, _, subtype, raw)) =
        tuple((mime_atom, tag("/"), mime_atom, parameter_list))(input)?;
    let ct = ContentType {
        media_type: String::from_utf8_lossy(media_type).to_ascii_lowercase(),
        subtype: String::from_utf8_lossy(subtype).to_ascii_lowercase(),
        params: merge_continuations(raw),
    };
    Ok((input, ct))
}

#[derive(Debug, PartialEq)]
struct RawParameter<'a> {
    name: &'a [u8],
    value: Vec<u8>,
}

fn parameter_list(input: &[u8]) -> IResult<&[u8], Vec<RawParameter<'_>>> {
    many0(preceded(tuple((opt(cfws), tag(";"), opt(cfws))), parameter))(input)
}

fn parameter(input: &[u8]) -> IResult<&[u8], RawParameter<'_>> {
    map(
        tuple((mime_atom_plain, opt(cfws), tag("="), parameter_value)),
        |(name, _, _, value)| RawParameter { name, value },
    )(input)
}

fn parameter_value(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    alt((
        map(quoted_string, |q| q.to_bytes()),
        map(
            tuple((opt(cfws), take_while1(is_lenient_value), opt(cfws))),
            |(_, v, _): (_, &[u8], _)| v.to_vec(),
        ),
    ))(input)
}

// Mailers emit tokens with tspecials in them (`boundary=----=_Part_1`),
// so anything up to the next separator is taken.
fn is_lenient_value(c: u8) -> bool {
    !(c == ascii::SEM_COL
        || c == ascii::DQUOTE
        || c == ascii::SP
        || c == ascii::HT
        || c == ascii::CR
        || c == ascii::LF
        || c == ascii::LEFT_PAR)
}

/// Splits `name*3*` into (`name`, Some(3), true).
fn split_extended(name: &[u8]) -> (&[u8], Option<u32>, bool) {
    let (name, extended) = match name.strip_suffix(b"*") {
        Some(n) => (n, true),
        None => (name, false),
    };
    if let Some(star) = name.iter().rposition(|c| *c == ascii::ASTERISK) {
        let digits = &name[star + 1..];
        if !digits.is_empty() && digits.iter().all(u8::is_ascii_digit) {
            let section = std::str::from_utf8(digits)
                .ok()
                .and_then(|d| d.parse().ok());
            if section.is_some() {
                return (&name[..star], section, extended);
            }
        }
    }
    (name, None, extended)
}

fn percent_decode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == ascii::PERCENT && i + 2 < input.len() {
            let hex = std::str::from_utf8(&input[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

/// Drops the `charset'language'` prefix of an extended value.
fn strip_language(value: &[u8]) -> &[u8] {
    let mut quotes = value
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == ascii::SQUOTE)
        .map(|(i, _)| i);
    match (quotes.next(), quotes.next()) {
        (Some(_), Some(second)) => &value[second + 1..],
        _ => value,
    }
}

/// RFC 2231 parameter continuations and extended values.
fn merge_continuations(raw: Vec<RawParameter<'_>>) -> Vec<Parameter> {
    // (name, sections (index, extended, value))
    let mut groups: Vec<(String, Vec<(u32, bool, Vec<u8>)>)> = vec![];
    for p in raw {
        let (base, section, extended) = split_extended(p.name);
        let name = String::from_utf8_lossy(base).to_ascii_lowercase();
        let entry = (section.unwrap_or(0), extended, p.value);
        match groups.iter_mut().find(|(n, _)| *n == name) {
            Some((_, sections)) if section.is_some() => sections.push(entry),
            Some((_, sections)) => *sections = vec![entry],
            None => groups.push((name, vec![entry])),
        }
    }

    groups
        .into_iter()
        .map(|(name, mut sections)| {
            sections.sort_by_key(|(idx, _, _)| *idx);
            let mut value = vec![];
            for (idx, extended, v) in sections {
                match (idx, extended) {
                    (0, true) => value.extend(percent_decode(strip_language(&v))),
                    (_, true) => value.extend(percent_decode(&v)),
                    (_, false) => value.extend(v),
                }
            }
            Parameter { name, value }
        })
        .collect()
}
