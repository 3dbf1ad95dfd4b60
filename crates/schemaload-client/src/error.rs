use thiserror::Error;

/// Failure to get a document accepted by the backend loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The request never produced a usable response (connect, timeout, decode).
    #[error("network error: {0}")]
    Network(String),
    /// The backend answered and refused the document.
    #[error("{message}")]
    Rejected { message: String },
}

impl LoadError {
    /// Message surfaced to the operator.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LoadError::Network(format!("request timed out: {err}"))
        } else {
            LoadError::Network(err.to_string())
        }
    }
}
