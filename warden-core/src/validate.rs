//! Parameter validation for proposed tool calls.
//!
//! Validation is injectable so the pipeline does not depend on any
//! particular schema library: implement [`InputValidator`] to swap in a
//! full JSON Schema engine, or use the default [`SchemaValidator`], which
//! covers the checks the model actually gets wrong (non-object input,
//! missing required parameters, primitive type mismatches). Anything the
//! basic checks let through is still caught by typed deserialization at the
//! executor boundary.

use serde_json::Value;

/// Errors produced by parameter validation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Tool input must be a JSON object.
    #[error("tool input must be a JSON object, got: {0}")]
    NotAnObject(&'static str),

    /// A required parameter is missing.
    #[error("missing required parameter '{0}'")]
    MissingProperty(String),

    /// A parameter has the wrong JSON type.
    #[error("parameter '{property}' must be {expected}, got {actual}")]
    WrongType {
        property: String,
        expected: String,
        actual: &'static str,
    },
}

/// Validates raw parameters against a tool's input schema.
pub trait InputValidator: Send + Sync {
    /// Check `params` against `schema`, returning the first problem found.
    fn validate(&self, schema: &Value, params: &Value) -> Result<(), ValidationError>;
}

/// Default validator covering object-ness, `required`, and primitive
/// `type` checks against the schemas generated from tool input types.
pub struct SchemaValidator;

impl InputValidator for SchemaValidator {
    fn validate(&self, schema: &Value, params: &Value) -> Result<(), ValidationError> {
        let Some(obj) = params.as_object() else {
            return Err(ValidationError::NotAnObject(json_type_name(params)));
        };

        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !obj.contains_key(name) {
                    return Err(ValidationError::MissingProperty(name.to_string()));
                }
            }
        }

        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return Ok(());
        };

        for (key, value) in obj {
            let Some(expected) = properties.get(key).and_then(|p| p.get("type")) else {
                continue;
            };
            if !type_matches(expected, value) {
                return Err(ValidationError::WrongType {
                    property: key.clone(),
                    expected: expected_description(expected),
                    actual: json_type_name(value),
                });
            }
        }

        Ok(())
    }
}

/// Check a value against a schema `type`, which may be a single name or a
/// list of alternatives (as generated for optional fields).
fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(name) => matches_name(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| matches_name(name, value)),
        _ => true,
    }
}

fn matches_name(name: &str, value: &Value) -> bool {
    match name {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        _ => true,
    }
}

fn expected_description(expected: &Value) -> String {
    match expected {
        Value::String(name) => name.clone(),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        _ => "any".to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
