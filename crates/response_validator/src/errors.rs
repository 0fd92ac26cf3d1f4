//! Error types for descriptor parsing and response assertions.

use crate::Violation;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// A schema notation that cannot be turned into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema '{name}' must be a JSON object")]
    NotAnObject { name: String },

    #[error("Field '{field}' lists unknown type {value}")]
    UnknownType { field: String, value: String },

    #[error("Field '{field}' has an empty type union")]
    EmptyUnion { field: String },

    #[error("Field '{field}' has unsupported notation {value}")]
    UnsupportedNotation { field: String, value: String },
}

/// A response that failed one of the `expect_*` assertions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("Expected a 2xx response, got {status}")]
    UnsuccessfulStatus { status: u16 },

    #[error("Response has no body")]
    MissingData,

    #[error("Schema validation failed for {schema}:\n{}", join_violations(.violations))]
    Schema {
        schema: String,
        violations: Vec<Violation>,
    },

    #[error("List response validation failed:\n{}", join_violations(.violations))]
    List { violations: Vec<Violation> },
}

impl ValidationFailure {
    /// The individual violations, empty for status and body failures.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationFailure::Schema { violations, .. } | ValidationFailure::List { violations } => {
                violations
            }
            _ => &[],
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
