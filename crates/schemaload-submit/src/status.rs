use std::fmt;

/// Externally observable state of the current submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Parsing,
    Validating,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionStatus {
    /// True while an attempt is running; `submit()` is ignored in these states.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Parsing | SubmissionStatus::Validating | SubmissionStatus::Submitting
        )
    }

    /// Failure message, if the attempt failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SubmissionStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Idle => f.write_str("idle"),
            SubmissionStatus::Parsing => f.write_str("parsing"),
            SubmissionStatus::Validating => f.write_str("validating"),
            SubmissionStatus::Submitting => f.write_str("submitting"),
            SubmissionStatus::Succeeded => f.write_str("succeeded"),
            SubmissionStatus::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}
