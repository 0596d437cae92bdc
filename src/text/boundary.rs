use nom::{
    bytes::complete::tag,
    combinator::opt,
    sequence::tuple,
    IResult,
};

use crate::text::ascii;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Next,
    Last,
}

/// What a line means to the stack of open multiparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryClassification {
    None,
    /// `--b` of the innermost multipart
    ImmediateBoundary,
    /// `--b--` of the innermost multipart
    ImmediateEndBoundary,
    /// `--b` of an enclosing multipart
    ParentBoundary,
    /// `--b--` of an enclosing multipart, or an mbox separator
    ParentEndBoundary,
    Eos,
}

impl BoundaryClassification {
    pub fn is_boundary(self) -> bool {
        !matches!(self, Self::None | Self::Eos)
    }
}

/// Result of matching one line against a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub delimiter: Delimiter,
    /// Non blank bytes were found after the delimiter.
    pub sloppy: bool,
}

fn is_trailing_ws(c: u8) -> bool {
    c == ascii::SP || c == ascii::HT || c == ascii::CR
}

/// Matches `"--" boundary ["--"]` at the start of a line.
pub fn delimiter<'a>(
    boundary: &'a [u8],
) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], Delimiter> + 'a {
    move |input: &'a [u8]| {
        let (rest, (_, _, last)) = tuple((tag(b"--"), tag(boundary), opt(tag(b"--"))))(input)?;
        match last {
            Some(_) => Ok((rest, Delimiter::Last)),
            None => Ok((rest, Delimiter::Next)),
        }
    }
}

/// Checks `line` against a single boundary.
///
/// The delimiter must be followed by blanks only. When `loose` is set,
/// anything separated from the delimiter by a blank is tolerated and the
/// candidate is marked sloppy; text glued to the delimiter never matches, so
/// that `--ab` is not taken for the boundary `a`.
pub fn candidate(line: &[u8], boundary: &[u8], loose: bool) -> Option<Candidate> {
    let (rest, delimiter) = delimiter(boundary)(line).ok()?;
    let trailer = match memchr::memchr(ascii::LF, rest) {
        Some(i) => &rest[..i],
        None => rest,
    };
    let blanks = trailer.iter().take_while(|c| is_trailing_ws(**c)).count();

    if blanks == trailer.len() {
        return Some(Candidate {
            delimiter,
            sloppy: false,
        });
    }
    if !loose || blanks == 0 {
        return None;
    }
    Some(Candidate {
        delimiter,
        sloppy: true,
    })
}

/// Boundaries of the open multipart ancestors, outermost first.
///
/// The mbox separator is not stored in the list: when enabled it acts as an
/// extra outermost entry, so the list length stays equal to the multipart
/// nesting depth.
#[derive(Debug, Default, Clone)]
pub struct BoundaryStack {
    bounds: Vec<Vec<u8>>,
    max_len: usize,
    mbox: bool,
}

impl BoundaryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, boundary: &[u8]) {
        self.max_len = self.max_len.max(boundary.len());
        self.bounds.push(boundary.to_vec());
    }

    pub fn pop(&mut self) -> Option<Vec<u8>> {
        let popped = self.bounds.pop();
        self.max_len = self.bounds.iter().map(Vec::len).max().unwrap_or(0);
        popped
    }

    pub fn clear(&mut self) {
        self.bounds.clear();
        self.max_len = 0;
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Length of the longest open boundary.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn set_mbox(&mut self, on: bool) {
        self.mbox = on;
    }

    pub fn is_mbox(&self) -> bool {
        self.mbox
    }

    /// Classifies a line, from its first byte up to and including its line
    /// feed if any.
    ///
    /// The innermost boundary is tried first. The boolean is set when the
    /// match was only accepted thanks to `loose`.
    pub fn classify(&self, line: &[u8], loose: bool) -> (BoundaryClassification, bool) {
        if line.starts_with(b"--") {
            for (depth, bound) in self.bounds.iter().rev().enumerate() {
                let Some(c) = candidate(line, bound, loose) else {
                    continue;
                };
                let class = match (depth, c.delimiter) {
                    (0, Delimiter::Next) => BoundaryClassification::ImmediateBoundary,
                    (0, Delimiter::Last) => BoundaryClassification::ImmediateEndBoundary,
                    (_, Delimiter::Next) => BoundaryClassification::ParentBoundary,
                    (_, Delimiter::Last) => BoundaryClassification::ParentEndBoundary,
                };
                return (class, c.sloppy);
            }
        }

        if self.mbox && line.starts_with(ascii::MBOX_FROM) {
            let class = if self.bounds.is_empty() {
                BoundaryClassification::ImmediateEndBoundary
            } else {
                BoundaryClassification::ParentEndBoundary
            };
            return (class, false);
        }

        (BoundaryClassification::None, false)
    }
}
