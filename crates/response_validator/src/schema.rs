//! Expected-shape descriptors for response bodies.

use std::fmt;

use serde_json::Value;

use crate::errors::SchemaError;

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

/// JSON value categories. Arrays and objects are distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueType::String,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::Object(_) => ValueType::Object,
            Value::Array(_) => ValueType::Array,
            Value::Null => ValueType::Null,
        }
    }

    /// Parse a type name as written in schema notation.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ValueType::String),
            "number" => Some(ValueType::Number),
            "boolean" => Some(ValueType::Boolean),
            "object" => Some(ValueType::Object),
            "array" => Some(ValueType::Array),
            "null" => Some(ValueType::Null),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
            ValueType::Array => "array",
            ValueType::Null => "null",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expectation for one field of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Exactly this type. `null` is rejected unless the type is `Null`,
    /// so a field that may be `null` must be declared as a [`OneOf`] that
    /// lists [`ValueType::Null`].
    ///
    /// [`OneOf`]: FieldType::OneOf
    Type(ValueType),
    /// Any of these types; `null` is accepted only when listed.
    OneOf(Vec<ValueType>),
    /// A string equal to this value, e.g. the envelope `object` tag.
    Literal(String),
    /// An object matching the nested descriptor.
    Nested(SchemaDescriptor),
}

impl FieldType {
    /// Human-readable form used in violation messages.
    pub fn describe(&self) -> String {
        match self {
            FieldType::Type(t) => t.to_string(),
            FieldType::OneOf(types) => {
                let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
                format!("one of [{}]", names.join(", "))
            }
            FieldType::Literal(expected) => format!("'{expected}'"),
            FieldType::Nested(_) => "object".to_string(),
        }
    }
}

/// Ordered mapping from field name to expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    name: String,
    fields: Vec<(String, FieldType)>,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push((name.into(), field_type));
        self
    }

    pub fn typed(self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.field(name, FieldType::Type(value_type))
    }

    pub fn one_of(self, name: impl Into<String>, types: &[ValueType]) -> Self {
        self.field(name, FieldType::OneOf(types.to_vec()))
    }

    pub fn literal(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, FieldType::Literal(value.into()))
    }

    pub fn nested(self, name: impl Into<String>, descriptor: SchemaDescriptor) -> Self {
        self.field(name, FieldType::Nested(descriptor))
    }

    /// Parse a descriptor from its JSON notation.
    ///
    /// A string that names a type (`"number"`) is a type expectation; any
    /// other string is a literal. An array is a union of type names and an
    /// object is a nested descriptor.
    ///
    /// ```
    /// use response_validator::SchemaDescriptor;
    /// use serde_json::json;
    ///
    /// let schema = SchemaDescriptor::from_json(
    ///     "server",
    ///     &json!({ "object": "server", "attributes": { "external_id": ["string", "null"] } }),
    /// )
    /// .unwrap();
    /// assert_eq!(schema.fields().count(), 2);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the notation is not an object, a union
    /// names an unknown type, or a field has an unsupported notation.
    pub fn from_json(name: impl Into<String>, notation: &Value) -> Result<Self, SchemaError> {
        let name = name.into();
        let Some(object) = notation.as_object() else {
            return Err(SchemaError::NotAnObject { name });
        };

        let mut descriptor = SchemaDescriptor::new(name);
        for (field, field_notation) in object {
            let field_type = match field_notation {
                Value::String(s) => match ValueType::from_name(s) {
                    Some(t) => FieldType::Type(t),
                    None => FieldType::Literal(s.clone()),
                },
                Value::Array(items) => {
                    let mut types = Vec::with_capacity(items.len());
                    for item in items {
                        let t = item.as_str().and_then(ValueType::from_name).ok_or_else(|| {
                            SchemaError::UnknownType {
                                field: field.clone(),
                                value: item.to_string(),
                            }
                        })?;
                        types.push(t);
                    }
                    if types.is_empty() {
                        return Err(SchemaError::EmptyUnion {
                            field: field.clone(),
                        });
                    }
                    FieldType::OneOf(types)
                }
                Value::Object(_) => {
                    FieldType::Nested(SchemaDescriptor::from_json(field.clone(), field_notation)?)
                }
                other => {
                    return Err(SchemaError::UnsupportedNotation {
                        field: field.clone(),
                        value: other.to_string(),
                    });
                }
            };
            descriptor.fields.push((field.clone(), field_type));
        }

        Ok(descriptor)
    }
}
