//! Core contracts for schemaload.
//!
//! This crate defines the schema document model, text parsing, the
//! referential validator, and helpers shared by the client, the submission
//! state machine, and the CLI.

pub mod document;
pub mod error;
pub mod graph;
pub mod parse;
pub mod redaction;
pub mod report;
pub mod template;
pub mod validation;

mod de;

pub use document::{DatabaseConnection, Relation, SchemaDocument, TableDefinition};
pub use error::{Error, Result};
pub use graph::{RelationGraphReport, RelationGraphSummary, build_relation_graph_report};
pub use parse::{document_from_value, parse_document};
pub use redaction::{RedactedConnection, redact_connection, redact_document};
pub use report::{IssueSeverity, ValidationIssue, ValidationReport};
pub use template::STARTER_DOCUMENT;
pub use validation::{ValidatedDocument, check_document, validate_document};
