//! Response shape validation for the panel API.
//!
//! All checks are pure: they take a response (or a JSON value) and return the
//! list of [`Violation`]s found, in field order. An empty list means the
//! response conforms. The `expect_*` helpers wrap the same checks as
//! `Result`s for use in scenario bodies.

use std::fmt;

use panel_client::ApiResponse;
use serde_json::Value;

pub mod envelope;
pub use envelope::{ApiErrorDetail, Envelope, Resource};

pub mod errors;
pub use errors::{SchemaError, ValidationFailure};

pub mod schema;
pub use schema::{FieldType, SchemaDescriptor, ValueType};

pub mod schemas;

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Path reported when the body itself has the wrong shape.
const ROOT_PATH: &str = "(root)";

/// One way in which a response differs from what was expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    Missing {
        path: String,
    },
    TypeMismatch {
        path: String,
        expected: String,
        actual: ValueType,
    },
    LiteralMismatch {
        path: String,
        expected: String,
        actual: Value,
    },
    UnexpectedStatus {
        status: u16,
    },
    MissingData,
    /// The body carries an `errors` property.
    ApiErrors {
        errors: Value,
    },
    ObjectKindMismatch {
        expected: String,
        actual: Option<String>,
    },
    NotAList,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing { path } => write!(f, "missing: {path}"),
            Violation::TypeMismatch {
                path,
                expected,
                actual,
            } => write!(f, "invalid type for {path}: expected {expected}, got {actual}"),
            Violation::LiteralMismatch {
                path,
                expected,
                actual,
            } => write!(f, "invalid value for {path}: expected '{expected}', got {actual}"),
            Violation::UnexpectedStatus { status } => {
                write!(f, "unexpected status code: {status}")
            }
            Violation::MissingData => f.write_str("response missing data"),
            Violation::ApiErrors { errors } => write!(f, "API returned errors: {errors}"),
            Violation::ObjectKindMismatch { expected, actual } => match actual {
                Some(actual) => write!(f, "expected object type '{expected}', got '{actual}'"),
                None => write!(f, "expected object type '{expected}', got none"),
            },
            Violation::NotAList => f.write_str("list response data property must be an array"),
        }
    }
}

/// Check a response body against `descriptor`.
pub fn validate_schema(response: &ApiResponse, descriptor: &SchemaDescriptor) -> Vec<Violation> {
    validate_value(&response.data, descriptor)
}

/// Check any JSON value against `descriptor`, e.g. one item of a list.
pub fn validate_value(value: &Value, descriptor: &SchemaDescriptor) -> Vec<Violation> {
    let mut violations = Vec::new();
    match value {
        Value::Object(_) => walk(value, descriptor, "", &mut violations),
        other => violations.push(Violation::TypeMismatch {
            path: ROOT_PATH.to_string(),
            expected: ValueType::Object.to_string(),
            actual: ValueType::of(other),
        }),
    }
    violations
}

fn walk(value: &Value, descriptor: &SchemaDescriptor, prefix: &str, out: &mut Vec<Violation>) {
    for (name, field_type) in descriptor.fields() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        let Some(actual) = value.get(name) else {
            out.push(Violation::Missing { path });
            continue;
        };
        let actual_type = ValueType::of(actual);

        match field_type {
            FieldType::Type(expected) if *expected != actual_type => {
                out.push(Violation::TypeMismatch {
                    path,
                    expected: field_type.describe(),
                    actual: actual_type,
                });
            }
            FieldType::OneOf(allowed) if !allowed.contains(&actual_type) => {
                out.push(Violation::TypeMismatch {
                    path,
                    expected: field_type.describe(),
                    actual: actual_type,
                });
            }
            FieldType::Literal(expected) if actual.as_str() != Some(expected.as_str()) => {
                out.push(Violation::LiteralMismatch {
                    path,
                    expected: expected.clone(),
                    actual: actual.clone(),
                });
            }
            FieldType::Nested(nested) => {
                if actual_type == ValueType::Object {
                    walk(actual, nested, &path, out);
                } else {
                    out.push(Violation::TypeMismatch {
                        path,
                        expected: field_type.describe(),
                        actual: actual_type,
                    });
                }
            }
            _ => {}
        }
    }
}

/// Check the standard envelope: 2xx status, a body, no `errors`, and
/// optionally the `object` tag.
///
/// An `errors` property ends the check; nothing after it is reported.
pub fn validate_envelope(response: &ApiResponse, expected_object: Option<&str>) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !response.is_success() {
        violations.push(Violation::UnexpectedStatus {
            status: response.status,
        });
    }

    if response.data.is_null() {
        violations.push(Violation::MissingData);
        return violations;
    }

    if let Some(errors) = response.data.get("errors").filter(|e| !e.is_null()) {
        violations.push(Violation::ApiErrors {
            errors: errors.clone(),
        });
        return violations;
    }

    if let Some(expected) = expected_object {
        let actual = response.data.get("object").and_then(Value::as_str);
        if actual != Some(expected) {
            violations.push(Violation::ObjectKindMismatch {
                expected: expected.to_string(),
                actual: actual.map(str::to_string),
            });
        }
    }

    violations
}

/// [`validate_envelope`] for a `list` plus an array check on `data`.
pub fn validate_list(response: &ApiResponse) -> Vec<Violation> {
    let mut violations = validate_envelope(response, Some("list"));
    if violations.is_empty() && !response.data.get("data").is_some_and(Value::is_array) {
        violations.push(Violation::NotAList);
    }
    violations
}

/// Require a 2xx status and a body.
pub fn expect_successful_response(response: &ApiResponse) -> Result<(), ValidationFailure> {
    if !response.is_success() {
        return Err(ValidationFailure::UnsuccessfulStatus {
            status: response.status,
        });
    }
    if response.data.is_null() {
        return Err(ValidationFailure::MissingData);
    }
    Ok(())
}

pub fn expect_valid_schema(
    response: &ApiResponse,
    descriptor: &SchemaDescriptor,
) -> Result<(), ValidationFailure> {
    let violations = validate_schema(response, descriptor);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::Schema {
            schema: descriptor.name().to_string(),
            violations,
        })
    }
}

pub fn expect_valid_list_response(response: &ApiResponse) -> Result<(), ValidationFailure> {
    expect_successful_response(response)?;
    let violations = validate_list(response);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure::List { violations })
    }
}
