use bounded_static::ToStatic;
use std::fmt;

use crate::error::Position;

/// A deviation from the RFCs the parser recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ToStatic)]
pub enum ComplianceKind {
    /// A header line without a field name and colon.
    InvalidHeader,
    /// The header block did not end with an empty line.
    MissingBodySeparator,
    BareLinefeedInHeader,
    BareLinefeedInBody,
    /// A message with a Content-Type but no MIME-Version.
    MissingMimeVersion,
    InvalidMimeVersion,
    /// A multipart ended without its end boundary.
    MissingMultipartBoundary,
    /// A multipart without a usable `boundary` parameter, read as a leaf.
    MissingMultipartBoundaryParameter,
    /// A multipart or message part declared a transfer encoding other than
    /// 7bit, 8bit or binary.
    InvalidContentTransferEncoding,
    /// A boundary line followed by non blank text.
    InvalidBoundaryLine,
    /// An entity nested too deep, read as a leaf.
    NestingDepthExceeded,
}

impl fmt::Display for ComplianceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match self {
            Self::InvalidHeader => "invalid header line",
            Self::MissingBodySeparator => "missing empty line after headers",
            Self::BareLinefeedInHeader => "bare linefeed in header",
            Self::BareLinefeedInBody => "bare linefeed in body",
            Self::MissingMimeVersion => "missing MIME-Version",
            Self::InvalidMimeVersion => "invalid MIME-Version",
            Self::MissingMultipartBoundary => "missing multipart end boundary",
            Self::MissingMultipartBoundaryParameter => "missing multipart boundary parameter",
            Self::InvalidContentTransferEncoding => "invalid Content-Transfer-Encoding",
            Self::InvalidBoundaryLine => "invalid boundary line",
            Self::NestingDepthExceeded => "nesting depth exceeded",
        };
        f.write_str(txt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ToStatic)]
pub struct ComplianceIssue {
    pub kind: ComplianceKind,
    pub position: Position,
}

/// Issues raised during one top-level call, in the order they were found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ComplianceStatus {
    issues: Vec<ComplianceIssue>,
}

impl ComplianceStatus {
    /// Records an issue, returns `false` when the same kind was already
    /// recorded at the same offset.
    pub fn record(&mut self, kind: ComplianceKind, position: Position) -> bool {
        let duplicate = self
            .issues
            .iter()
            .any(|i| i.kind == kind && i.position.offset == position.offset);
        if duplicate {
            return false;
        }

        #[cfg(feature = "tracing-recover")]
        tracing::warn!(%kind, line = position.line, offset = position.offset, "recovered");

        self.issues.push(ComplianceIssue { kind, position });
        true
    }

    pub fn contains(&self, kind: ComplianceKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }

    pub fn issues(&self) -> &[ComplianceIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub(crate) fn reset(&mut self) {
        self.issues.clear();
    }
}
