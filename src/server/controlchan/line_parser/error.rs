use derive_more::Display;
use thiserror::Error;

/// The error type returned by the line parser.
#[derive(Debug, Error)]
#[error("parse error: {kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
}

/// A list specifying categories of parse errors.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// The client issued a command we know about, but in an invalid way.
    #[display("Invalid command")]
    InvalidCommand,
    /// The line was not correctly terminated.
    #[display("Invalid end-of-line")]
    InvalidEol,
    /// A token contained a byte outside the printable ASCII range.
    #[display("Invalid token: {:#x}", token)]
    InvalidToken {
        /// The offending byte.
        token: u8,
    },
    /// The command contained invalid UTF-8.
    #[display("Invalid UTF-8")]
    InvalidUtf8,
}

impl ParseError {
    /// Return the inner error kind of this error.
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }
}

impl From<ParseErrorKind> for ParseError {
    fn from(kind: ParseErrorKind) -> ParseError {
        ParseError { kind }
    }
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(_: std::str::Utf8Error) -> ParseError {
        ParseError {
            kind: ParseErrorKind::InvalidUtf8,
        }
    }
}

/// Result type used by the line parser.
pub type Result<T> = std::result::Result<T, ParseError>;
