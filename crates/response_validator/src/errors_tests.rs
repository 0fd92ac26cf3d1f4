use super::*;

#[test]
fn test_schema_error_messages() {
    assert_eq!(
        SchemaError::UnknownType {
            field: "id".to_string(),
            value: "\"integer\"".to_string()
        }
        .to_string(),
        "Field 'id' lists unknown type \"integer\""
    );
    assert_eq!(
        SchemaError::NotAnObject {
            name: "list".to_string()
        }
        .to_string(),
        "Schema 'list' must be a JSON object"
    );
}

#[test]
fn test_validation_failure_lists_every_violation() {
    let failure = ValidationFailure::List {
        violations: vec![
            Violation::UnexpectedStatus { status: 404 },
            Violation::MissingData,
        ],
    };

    assert_eq!(
        failure.to_string(),
        "List response validation failed:\nunexpected status code: 404\nresponse missing data"
    );
    assert_eq!(failure.violations().len(), 2);
}

#[test]
fn test_status_failure_has_no_violations() {
    let failure = ValidationFailure::UnsuccessfulStatus { status: 500 };

    assert!(failure.violations().is_empty());
    assert_eq!(failure.to_string(), "Expected a 2xx response, got 500");
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SchemaError>();
    assert_send_sync::<ValidationFailure>();
}
