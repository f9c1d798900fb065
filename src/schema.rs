use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of every component schema reference
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// Name of the shared placeholder for dynamic JSON values
pub const ANY_JSON: &str = "AnyJson";

/// Component registry: simple type name -> schema
pub type SchemaMap = BTreeMap<String, Schema>;

/// OpenAPI Schema definition, used for components, properties and inline fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Schema identifier
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "double")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    /// JSON Schema 2020-12 replacement of `example`, used by OpenAPI 3.1 output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<serde_json::Value>>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required property names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Value schema for map types
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    /// Enum values for enum types
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Schema {
    /// Schema with only a type
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// Schema with a type and a format
    pub fn with_format(schema_type: &str, format: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: Some(format.to_string()),
            ..Self::default()
        }
    }

    /// Plain `$ref` to a component
    pub fn reference(component: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", COMPONENTS_PREFIX, component)),
            ..Self::default()
        }
    }

    /// Object-kind fragment referencing a component
    pub fn object_ref(component: &str) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            ..Self::reference(component)
        }
    }

    /// Name of the referenced component, if this is a component reference
    pub fn referenced_component(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(COMPONENTS_PREFIX))
    }

    /// Add a name to the required set, keeping the first insertion order
    pub fn add_required(&mut self, name: &str) {
        let required = self.required.get_or_insert_with(Vec::new);
        if !required.iter().any(|r| r == name) {
            required.push(name.to_string());
        }
    }

    pub fn property(&self, name: &str) -> Option<&Schema> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Apply `f` to this schema and every nested schema
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Schema)) {
        f(self);
        if let Some(properties) = self.properties.as_mut() {
            for property in properties.values_mut() {
                property.visit_mut(f);
            }
        }
        if let Some(items) = self.items.as_mut() {
            items.visit_mut(f);
        }
        if let Some(values) = self.additional_properties.as_mut() {
            values.visit_mut(f);
        }
    }
}
