use std::path::PathBuf;

use thiserror::Error;

/// Failure recorded by a store when its source cannot be loaded.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Error handling file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid UTF-8 input in {}: {source}", .path.display())]
    InvalidEncoding {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl Error {
    /// Whether the source file itself could not be read.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::InvalidEncoding { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: u32, column: u32, kind: ParseErrorKind) -> Self {
        Self { line, column, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid syntax")]
    InvalidSyntax,
    #[error("missing key")]
    MissingKey,
}

/// Rejection from the restricted literal parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid literal at offset {offset}: {kind}")]
pub struct LiteralError {
    pub offset: usize,
    pub kind: LiteralErrorKind,
}

impl LiteralError {
    pub(crate) fn new(offset: usize, kind: LiteralErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unknown name `{0}`")]
    UnknownName(String),
    #[error("invalid number")]
    InvalidNumber,
    #[error("integer out of range")]
    IntegerOverflow,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unhashable mapping key")]
    UnhashableKey,
    #[error("nesting too deep")]
    TooDeep,
    #[error("trailing characters")]
    TrailingCharacters,
}

/// A type name outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type name `{0}`")]
pub struct UnknownKind(pub String);
