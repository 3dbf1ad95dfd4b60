use serde::de::IgnoredAny;
use serde_json::Value;
use serde_json::error::Category;

use crate::document::SchemaDocument;
use crate::error::{Error, Result};

/// Parse operator text into a schema document.
///
/// The whole text is checked for JSON syntax before its shape is inspected, so
/// a truncated document is always reported as a syntax error even when the
/// readable prefix is also malformed.
pub fn parse_document(text: &str) -> Result<SchemaDocument> {
    serde_json::from_str::<IgnoredAny>(text)
        .map_err(|err| Error::InvalidSyntax(err.to_string()))?;

    serde_json::from_str::<SchemaDocument>(text).map_err(classify)
}

/// Build a schema document from an already parsed JSON value.
///
/// Duplicate object keys cannot be detected here; `serde_json::Value` keeps
/// only the last occurrence.
pub fn document_from_value(value: Value) -> Result<SchemaDocument> {
    serde_json::from_value(value).map_err(classify)
}

fn classify(err: serde_json::Error) -> Error {
    match err.classify() {
        Category::Syntax | Category::Eof | Category::Io => Error::InvalidSyntax(err.to_string()),
        Category::Data => Error::MalformedDocument(err.to_string()),
    }
}
