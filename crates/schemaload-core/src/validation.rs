use std::collections::HashSet;

use crate::document::SchemaDocument;
use crate::report::{IssueSeverity, ValidationIssue, ValidationReport};

/// A document that passed validation, with any non-blocking warnings.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub document: SchemaDocument,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate the referential integrity of a schema document.
///
/// This checks, in order and collecting every issue:
/// - each table's `db` names a defined database alias
/// - each relation's `table` names a defined table
/// - each relation's `foreign_key` is a column of the owning table
/// - each relation's `reference` is a column of the target table
///
/// Database aliases that no table uses are reported as warnings.
pub fn validate_document(document: &SchemaDocument) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_table_databases(document, &mut report);
    validate_relation_targets(document, &mut report);
    validate_foreign_keys(document, &mut report);
    validate_references(document, &mut report);
    warn_unused_databases(document, &mut report);

    report
}

/// Validate a document, handing it back on success.
pub fn check_document(document: SchemaDocument) -> Result<ValidatedDocument, ValidationReport> {
    let report = validate_document(&document);
    if !report.is_ok() {
        return Err(report);
    }

    Ok(ValidatedDocument {
        document,
        warnings: report.warnings,
    })
}

fn validate_table_databases(document: &SchemaDocument, report: &mut ValidationReport) {
    for (table_name, table) in &document.tables {
        if !document.databases.contains_key(&table.db) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "unresolved_database",
                format!("tables.{table_name}.db"),
                format!(
                    "table '{}' references undefined database alias '{}'",
                    table_name, table.db
                ),
                Some(format!(
                    "define '{}' under databases or use an existing alias",
                    table.db
                )),
            ));
        }
    }
}

fn validate_relation_targets(document: &SchemaDocument, report: &mut ValidationReport) {
    for (table_name, relation_name, relation) in document.relations() {
        if !document.tables.contains_key(&relation.table) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "unresolved_table",
                format!("tables.{table_name}.relations.{relation_name}.table"),
                format!(
                    "relation '{}' of table '{}' targets undefined table '{}'",
                    relation_name, table_name, relation.table
                ),
                None,
            ));
        }
    }
}

fn validate_foreign_keys(document: &SchemaDocument, report: &mut ValidationReport) {
    for (table_name, table) in &document.tables {
        for (relation_name, relation) in &table.relations {
            if !table.has_column(&relation.foreign_key) {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "unknown_foreign_key",
                    format!("tables.{table_name}.relations.{relation_name}.foreign_key"),
                    format!(
                        "relation '{}' uses foreign key '{}' which is not a column of table '{}'",
                        relation_name, relation.foreign_key, table_name
                    ),
                    Some(format!("add '{}' to columns", relation.foreign_key)),
                ));
            }
        }
    }
}

fn validate_references(document: &SchemaDocument, report: &mut ValidationReport) {
    for (table_name, relation_name, relation) in document.relations() {
        // Unresolved targets were already reported.
        let Some(target) = document.table(&relation.table) else {
            continue;
        };

        if !target.has_column(&relation.reference) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "unknown_reference",
                format!("tables.{table_name}.relations.{relation_name}.reference"),
                format!(
                    "relation '{}' of table '{}' references '{}' which is not a column of table '{}'",
                    relation_name, table_name, relation.reference, relation.table
                ),
                None,
            ));
        }
    }
}

fn warn_unused_databases(document: &SchemaDocument, report: &mut ValidationReport) {
    let used: HashSet<&str> = document
        .tables
        .values()
        .map(|table| table.db.as_str())
        .collect();

    for alias in document.databases.keys() {
        if !used.contains(alias.as_str()) {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "unused_database",
                format!("databases.{alias}"),
                format!("database alias '{alias}' is not used by any table"),
                None,
            ));
        }
    }
}
