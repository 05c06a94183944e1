//! Error types for the unrtf library.

use std::io;
use thiserror::Error;

/// Result type alias for unrtf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the unrtf library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as RTF.
    #[error("Unknown file format")]
    UnknownFormat,

    /// Invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A token was constructed with an out-of-range field.
    #[error("Invalid token: {0}")]
    BadToken(String),

    /// The parser was constructed without source text.
    #[error("Parser constructed with no source text")]
    MissingSource,

    /// The token following a group open (and optional `\*`) is not a
    /// control word.
    #[error("Unexpected token after group open at offset {offset}")]
    UnexpectedAfterOpen { offset: usize },

    /// A non-ignorable destination has no registered handler.
    #[error("No handler registered for destination '{path}' at offset {offset}")]
    UnhandledDestination { path: String, offset: usize },

    /// A closing brace appeared with no group open.
    #[error("Closing brace with no open group at offset {offset}")]
    TooManyCloses { offset: usize },

    /// A non-data token appeared inside a plain-text destination.
    #[error("Unexpected token in text destination '{path}' at offset {offset}")]
    UnexpectedInPcData { path: String, offset: usize },

    /// An unknown control word appeared inside the color table.
    #[error("Unrecognized control word \\{name} in color table at offset {offset}")]
    UnrecognizedInColorTable { name: String, offset: usize },

    /// The conversion entry point was asked for an HTML version other
    /// than the one it produces.
    #[error("Unsupported HTML version: {0}")]
    UnsupportedHtmlVersion(u32),

    /// Embedded OLE Package payload failed to decode.
    #[error("Package decode error at offset {offset}: {message}")]
    PackageDecode { offset: usize, message: String },

    /// Text encoding error.
    #[error("Text encoding error: {0}")]
    Encoding(String),
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::Encoding(err.to_string())
    }
}
