//! Error results that can be returned from the parser

use thiserror::Error;

/// Parse error enriched with the context of where it happened: the source being read, and
/// the line the lexer was positioned on.
#[derive(Debug, Error)]
#[error("{message} ({source_id}, line {line}: {line_text})")]
pub struct ParseError {
    /// Parse error message
    pub message: String,
    /// URL or other identifier of the source being parsed
    pub source_id: String,
    /// Line number, starting with 1
    pub line: usize,
    /// Text of the offending line
    pub line_text: String,
    /// Underlying error, if any
    #[source]
    pub cause: Option<Box<Error>>,
}

/// Serious errors that cannot be recovered from while scanning
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported charset: {0}")]
    Charset(String),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("encoding changed from {from} to {to}")]
    EncodingChange { from: String, to: String },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Result that can be returned which holds either T or an Error
pub type Result<T> = std::result::Result<T, Error>;
