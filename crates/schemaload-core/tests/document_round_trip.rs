use schemaload_core::{STARTER_DOCUMENT, SchemaDocument, parse_document, validate_document};

#[test]
fn serialized_document_parses_back_identically() {
    let document = parse_document(STARTER_DOCUMENT).expect("parse starter document");

    let json = serde_json::to_string_pretty(&document).expect("serialize document");
    let reparsed = parse_document(&json).expect("re-parse serialized document");

    assert_eq!(document, reparsed);
    let keys: Vec<_> = reparsed.tables.keys().cloned().collect();
    assert_eq!(keys, vec!["authors".to_string(), "books".to_string()]);
}

#[test]
fn serializes_with_wire_field_names() {
    let document = parse_document(
        r#"{"databases":{"db1":{"host":"h","port":5432,"user":"u","password":"p","database":"d"}},
            "tables":{"t1":{"db":"db1","columns":["id"],"relations":{
              "self":{"foreign_key":"id","reference":"id","table":"t1"}}}}}"#,
    )
    .expect("parse document");

    let json = serde_json::to_string(&document).expect("serialize document");
    let expected = r#"{"databases":{"db1":{"host":"h","port":5432,"user":"u","password":"p","database":"d"}},"tables":{"t1":{"db":"db1","columns":["id"],"relations":{"self":{"foreign_key":"id","reference":"id","table":"t1"}}}}}"#;
    assert_eq!(json, expected);
}

#[test]
fn validation_of_valid_document_is_idempotent() {
    let document = parse_document(
        r#"{"databases":{"db1":{"host":"h","port":5432,"user":"u","password":"p","database":"d"}},"tables":{"t1":{"db":"db1","columns":["id"],"relations":{}}}}"#,
    )
    .expect("parse document");

    let first = validate_document(&document);
    let second = validate_document(&document);
    assert!(first.is_ok());
    assert!(first.warnings.is_empty());
    assert_eq!(first, second);
}

#[test]
fn unresolved_relation_table_is_reported() {
    let document: SchemaDocument = parse_document(
        r#"{"databases":{"db1":{"host":"h","port":5432,"user":"u","password":"p","database":"d"}},
            "tables":{"t1":{"db":"db1","columns":["id"],"relations":{
              "owner":{"foreign_key":"id","reference":"id","table":"people"}}}}}"#,
    )
    .expect("parse document");

    let report = validate_document(&document);
    assert!(!report.errors.is_empty());
    let issue = report
        .errors
        .iter()
        .find(|issue| issue.rule == "unresolved_table")
        .expect("unresolved_table issue");
    assert!(issue.message.contains("'people'"));
    assert_eq!(issue.path, "tables.t1.relations.owner.table");
}
