use super::*;
use serde_json::json;

#[test]
fn test_value_type_of() {
    assert_eq!(ValueType::of(&json!("a")), ValueType::String);
    assert_eq!(ValueType::of(&json!(1.5)), ValueType::Number);
    assert_eq!(ValueType::of(&json!(true)), ValueType::Boolean);
    assert_eq!(ValueType::of(&json!({})), ValueType::Object);
    assert_eq!(ValueType::of(&json!([])), ValueType::Array);
    assert_eq!(ValueType::of(&Value::Null), ValueType::Null);
}

#[test]
fn test_value_type_names_round_trip() {
    for t in [
        ValueType::String,
        ValueType::Number,
        ValueType::Boolean,
        ValueType::Object,
        ValueType::Array,
        ValueType::Null,
    ] {
        assert_eq!(ValueType::from_name(t.name()), Some(t));
    }
    assert_eq!(ValueType::from_name("integer"), None);
}

#[test]
fn test_builder_keeps_field_order() {
    let schema = SchemaDescriptor::new("user")
        .literal("object", "user")
        .typed("id", ValueType::Number)
        .one_of("external_id", &[ValueType::String, ValueType::Null]);

    let names: Vec<&str> = schema.fields().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["object", "id", "external_id"]);
    assert_eq!(schema.name(), "user");
}

#[test]
fn test_from_json_classifies_fields() {
    let schema = SchemaDescriptor::from_json(
        "server",
        &json!({
            "object": "server",
            "attributes": {
                "id": "number",
                "external_id": ["string", "null"],
                "limits": "object"
            }
        }),
    )
    .unwrap();

    let fields: Vec<(&str, &FieldType)> = schema.fields().collect();
    let object = fields.iter().find(|(n, _)| *n == "object").unwrap().1;
    assert_eq!(object, &FieldType::Literal("server".to_string()));

    let FieldType::Nested(attributes) = fields.iter().find(|(n, _)| *n == "attributes").unwrap().1
    else {
        panic!("attributes should be nested");
    };
    let nested: Vec<(&str, &FieldType)> = attributes.fields().collect();
    assert!(nested.contains(&("id", &FieldType::Type(ValueType::Number))));
    assert!(nested.contains(&("limits", &FieldType::Type(ValueType::Object))));
    assert!(nested.contains(&(
        "external_id",
        &FieldType::OneOf(vec![ValueType::String, ValueType::Null])
    )));
}

#[test]
fn test_from_json_rejects_bad_notation() {
    assert_eq!(
        SchemaDescriptor::from_json("x", &json!(["number"])),
        Err(SchemaError::NotAnObject {
            name: "x".to_string()
        })
    );
    assert!(matches!(
        SchemaDescriptor::from_json("x", &json!({ "id": ["number", "integer"] })),
        Err(SchemaError::UnknownType { field, .. }) if field == "id"
    ));
    assert!(matches!(
        SchemaDescriptor::from_json("x", &json!({ "id": [] })),
        Err(SchemaError::EmptyUnion { .. })
    ));
    assert!(matches!(
        SchemaDescriptor::from_json("x", &json!({ "id": 5 })),
        Err(SchemaError::UnsupportedNotation { .. })
    ));
}

#[test]
fn test_describe() {
    assert_eq!(FieldType::Type(ValueType::Array).describe(), "array");
    assert_eq!(
        FieldType::OneOf(vec![ValueType::String, ValueType::Null]).describe(),
        "one of [string, null]"
    );
    assert_eq!(FieldType::Literal("list".to_string()).describe(), "'list'");
}
