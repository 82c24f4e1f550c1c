//! Structured output: decode-and-validate against a declared schema.
//!
//! Fails closed: any mismatch (missing required field, wrong primitive
//! type, undecodable payload) is a [`Error::SchemaValidation`], never a
//! partially populated value.

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Validate an instance against a JSON schema.
pub fn validate(schema: &serde_json::Value, instance: &serde_json::Value) -> Result<()> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| Error::SchemaValidation(format!("schema compilation failed: {e}")))?;

    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::SchemaValidation(errors.join("; ")))
    }
}

/// Decode a structured-output payload, validating it against the declared
/// schema before deserializing into the target type.
pub fn decode<T: DeserializeOwned>(schema: &serde_json::Value, payload: &str) -> Result<T> {
    let instance: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| Error::SchemaValidation(format!("payload is not valid JSON: {e}")))?;

    validate(schema, &instance)?;

    serde_json::from_value(instance)
        .map_err(|e| Error::SchemaValidation(format!("payload does not fit target type: {e}")))
}
