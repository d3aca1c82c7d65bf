//! JSON Schema wrapper used to describe and validate expected shapes.

use crate::error::SchemaError;
use crate::extractor::Shape;
use crate::feedback::collect_validation_errors;
use jsonschema::Validator;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Outcome of validating a value against a schema.
///
/// Validation failures are reported here, never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// Whether the value conforms.
    pub valid: bool,
    /// Human-readable validator messages when `valid` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl Validation {
    /// A passing outcome.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            valid: true,
            errors: None,
        }
    }

    /// A failing outcome with the given message.
    #[must_use]
    pub fn invalid(errors: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: Some(errors.into()),
        }
    }
}

/// Minimal capability set the orchestration layer needs from a schema.
pub trait StructuredSchema {
    /// Whether conforming values are objects or arrays.
    fn kind(&self) -> Shape;

    /// Check `value` against the schema.
    fn validate(&self, value: &Value) -> Validation;

    /// Portable JSON Schema representation, used for prompting.
    fn to_portable_schema(&self) -> Value;
}

/// A compiled JSON Schema together with its root [`Shape`].
///
/// Immutable once constructed; cloning shares the compiled validator.
#[derive(Clone)]
pub struct SchemaDescriptor {
    schema: Arc<Value>,
    validator: Arc<Validator>,
    kind: Shape,
}

impl SchemaDescriptor {
    /// Compiles a JSON Schema document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::Compile` if the document is not a valid schema.
    ///
    /// # Examples
    ///
    /// ```
    /// use rig_guard_structured::{SchemaDescriptor, Shape, StructuredSchema};
    /// use serde_json::json;
    ///
    /// let schema = SchemaDescriptor::new(json!({"type": "array", "items": {"type": "string"}})).unwrap();
    /// assert_eq!(schema.kind(), Shape::Array);
    /// assert!(schema.validate(&json!(["a", "b"])).valid);
    /// ```
    pub fn new(schema: Value) -> Result<Self, SchemaError> {
        let validator =
            Validator::new(&schema).map_err(|e| SchemaError::Compile(e.to_string()))?;
        let kind = root_kind(&schema);

        Ok(Self {
            schema: Arc::new(schema),
            validator: Arc::new(validator),
            kind,
        })
    }

    /// Derives the schema for `T` with `schemars` and compiles it.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the derived schema cannot be serialized or compiled.
    pub fn for_type<T: JsonSchema>() -> Result<Self, SchemaError> {
        let schema = serde_json::to_value(schema_for!(T))?;
        Self::new(schema)
    }

    /// The wrapped schema document.
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Every validation error for `value`, one entry per failure.
    #[must_use]
    pub fn errors(&self, value: &Value) -> Vec<String> {
        collect_validation_errors(&self.validator, value)
    }
}

impl StructuredSchema for SchemaDescriptor {
    fn kind(&self) -> Shape {
        self.kind
    }

    fn validate(&self, value: &Value) -> Validation {
        let errors = self.errors(value);
        if errors.is_empty() {
            Validation::ok()
        } else {
            Validation::invalid(errors.join("; "))
        }
    }

    fn to_portable_schema(&self) -> Value {
        (*self.schema).clone()
    }
}

impl fmt::Debug for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("kind", &self.kind)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Compact JSON rendering of the schema, embedded verbatim in prompts.
impl fmt::Display for SchemaDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schema)
    }
}

fn root_kind(schema: &Value) -> Shape {
    match schema.get("type") {
        Some(Value::String(t)) if t == "array" => Shape::Array,
        Some(Value::Array(types)) => {
            let has = |name: &str| types.iter().any(|t| t.as_str() == Some(name));
            if has("array") && !has("object") {
                Shape::Array
            } else {
                Shape::Object
            }
        }
        _ => Shape::Object,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "number"}
            },
            "required": ["name", "age"]
        }))
        .unwrap()
    }

    #[test]
    fn test_object_kind() {
        assert_eq!(person_schema().kind(), Shape::Object);
    }

    #[test]
    fn test_array_kind() {
        let schema = SchemaDescriptor::new(json!({"type": "array", "items": {"type": "string"}})).unwrap();
        assert_eq!(schema.kind(), Shape::Array);
    }

    #[test]
    fn test_nullable_array_kind() {
        let schema = SchemaDescriptor::new(json!({"type": ["array", "null"]})).unwrap();
        assert_eq!(schema.kind(), Shape::Array);
    }

    #[test]
    fn test_untyped_schema_defaults_to_object() {
        let schema = SchemaDescriptor::new(json!({})).unwrap();
        assert_eq!(schema.kind(), Shape::Object);
    }

    #[test]
    fn test_display_is_compact_json() {
        let rendered = person_schema().to_string();
        assert!(rendered.contains(r#""type":"object""#));
        assert!(!rendered.contains('\n'));
    }

    #[test]
    fn test_portable_schema_has_properties() {
        let portable = person_schema().to_portable_schema();
        assert_eq!(portable["type"], "object");
        assert!(portable.get("properties").is_some());
    }

    #[test]
    fn test_validate_conforming() {
        let outcome = person_schema().validate(&json!({"name": "John", "age": 30}));
        assert_eq!(outcome, Validation::ok());
    }

    #[test]
    fn test_validate_non_conforming() {
        let outcome = person_schema().validate(&json!({"name": "John", "age": "thirty"}));
        assert!(!outcome.valid);
        let errors = outcome.errors.unwrap();
        assert!(!errors.is_empty());
        assert!(errors.contains("/age"));
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let result = SchemaDescriptor::new(json!({"type": "not-a-type"}));
        assert!(matches!(result, Err(SchemaError::Compile(_))));
    }

    #[test]
    fn test_validation_serialization_skips_missing_errors() {
        let json = serde_json::to_value(Validation::ok()).unwrap();
        assert_eq!(json, json!({"valid": true}));
    }
}
