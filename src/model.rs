/// A parsed `KEY=VALUE` entry from a `.env` file or input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub line: u32,
}

/// Variable expansion behavior for loader values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Keep values as parsed with no expansion.
    Disabled,
    /// Expand `$VAR` and `${VAR}` placeholders against the loader environment.
    #[default]
    Expand,
}

/// What the parser does with a line that is neither blank, a comment, nor an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedLines {
    /// Stop at the first malformed line and record a parse error.
    #[default]
    Abort,
    /// Drop the line with a warning and keep going.
    Skip,
}
