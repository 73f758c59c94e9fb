use aws_sdk_dynamodb::types::ScalarAttributeType;
use std::collections::HashMap;

/// Represents the schema of a DynamoDB table.
///
/// DynamoDB is schemaless apart from key attributes: every attribute used as a
/// table or index key must be declared with its scalar type when the table is
/// created. A `Schema` records those types by attribute name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: HashMap<String, FieldType>,
}

/// Represents the type of a field in a DynamoDB table schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Represents a string field.
    String,
    /// Represents a number field.
    Number,
}

impl FieldType {
    pub fn scalar_type(&self) -> ScalarAttributeType {
        match self {
            FieldType::String => ScalarAttributeType::S,
            FieldType::Number => ScalarAttributeType::N,
        }
    }
}

impl Schema {
    /// Creates a new empty `Schema`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the schema and returns the modified `Schema`.
    pub fn add_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Type of `name`, falling back to [`FieldType::String`] when undeclared.
    pub fn field_type(&self, name: &str) -> FieldType {
        self.fields.get(name).copied().unwrap_or(FieldType::String)
    }
}
