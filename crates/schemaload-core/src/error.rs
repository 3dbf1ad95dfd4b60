use thiserror::Error;

/// Errors raised while turning operator text into a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The text is not well-formed JSON.
    #[error("invalid document syntax: {0}")]
    InvalidSyntax(String),
    /// The JSON does not have the shape of a schema document.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// Convenience alias for results returned by document parsing.
pub type Result<T> = std::result::Result<T, Error>;
