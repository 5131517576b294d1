use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{NewTerm, TermUpdate};

/// Reasons a request payload is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("field '{0}' must be a string")]
    NotAString(&'static str),
}

/// Validates a create payload of the shape `{"name": str, "description": str}`.
///
/// Unknown fields are ignored. Empty strings are accepted as long as they are
/// strings.
pub fn validate_new_term(payload: &Value) -> Result<NewTerm, ValidationError> {
    let object = as_object(payload)?;
    let name = required_string(object, "name")?;
    let description = required_string(object, "description")?;
    Ok(NewTerm { name, description })
}

/// Validates an update payload of the shape `{"description": str}`.
pub fn validate_term_update(payload: &Value) -> Result<TermUpdate, ValidationError> {
    let object = as_object(payload)?;
    let description = required_string(object, "description")?;
    Ok(TermUpdate { description })
}

fn as_object(payload: &Value) -> Result<&Map<String, Value>, ValidationError> {
    payload.as_object().ok_or(ValidationError::NotAnObject)
}

fn required_string(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ValidationError::NotAString(field)),
    }
}
