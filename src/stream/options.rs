/// Layout of the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MimeFormat {
    /// A single entity or message.
    #[default]
    Entity,
    /// Messages separated by `From ` lines (RFC 4155).
    Mbox,
}

/// How strictly lines are recognized as boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComplianceMode {
    /// Boundary lines with trailing garbage still count, and are reported.
    #[default]
    Loose,
    Strict,
}

/// Configuration of the streaming parser.
///
/// ```rust
/// use eml_stream::{MimeFormat, ParserOptions};
///
/// let options = ParserOptions {
///     format: MimeFormat::Mbox,
///     respect_content_length: true,
///     ..Default::default()
/// };
/// assert_eq!(options.max_mime_depth, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Whether the stream is a single entity or an mbox.
    ///
    /// # Default
    ///
    /// `MimeFormat::Entity`
    pub format: MimeFormat,

    /// Deepest multipart or message nesting that is still split into
    /// children. Deeper entities are read as leaves.
    ///
    /// # Default
    ///
    /// `1024`
    pub max_mime_depth: usize,

    /// In mbox format, do not look for the next `From ` separator before the
    /// number of bytes announced by a message's Content-Length has been read.
    ///
    /// # Default
    ///
    /// `false`
    pub respect_content_length: bool,

    /// # Default
    ///
    /// `ComplianceMode::Loose`
    pub compliance_mode: ComplianceMode,

    /// Number of bytes requested from the source at each refill. Any value
    /// yields the same events; `0` is treated as `1`.
    ///
    /// # Default
    ///
    /// `4096`
    pub block_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            format: MimeFormat::Entity,
            max_mime_depth: 1024,
            respect_content_length: false,
            compliance_mode: ComplianceMode::Loose,
            block_size: 4096,
        }
    }
}

impl ParserOptions {
    /// Default options for reading an mbox.
    pub fn mbox() -> Self {
        Self {
            format: MimeFormat::Mbox,
            ..Default::default()
        }
    }

    pub(crate) fn loose(&self) -> bool {
        self.compliance_mode == ComplianceMode::Loose
    }
}
