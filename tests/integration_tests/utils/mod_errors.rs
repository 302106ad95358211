use bookstore::errors::DbError;
use std::io;

#[test]
fn test_io_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let db_err: DbError = io_err.into();
    assert_eq!(format!("{db_err}"), "I/O error: file not found");
}

#[test]
fn test_display_messages() {
    assert_eq!(DbError::InvalidInput("year".into()).to_string(), "Invalid input: year");
    assert_eq!(DbError::StoreUnavailable("books".into()).to_string(), "Store unavailable: books");
    assert_eq!(DbError::QueryError("bad".into()).to_string(), "Query error: bad");
}

#[test]
fn test_json_error_from() {
    let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let db_err = DbError::from(err);
    assert!(matches!(db_err, DbError::Json(_)));
    assert!(db_err.to_string().starts_with("Serde JSON:"));
}

#[test]
fn test_invalid_document_id_from_parse() {
    let err = "not-a-uuid".parse::<bookstore::types::DocumentId>().unwrap_err();
    assert!(matches!(err, DbError::InvalidDocumentId(_)));
}
