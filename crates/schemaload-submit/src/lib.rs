//! Submission state machine: parse, validate, transmit, resolve.

pub mod machine;
pub mod proceed;
pub mod status;

pub use machine::{Submission, SubmitOutcome};
pub use proceed::Proceed;
pub use status::SubmissionStatus;
