//! Response contract checks.
//!
//! These run on decoded bodies after a request completes. The client itself
//! never inspects or repairs payloads; a missing field stays missing and is
//! reported here.

use serde_json::Value;

/// Status values accepted from a health endpoint.
pub const HEALTHY_STATUSES: [&str; 2] = ["ok", "healthy"];

/// A decoded body that does not match the expected contract.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The body is not a JSON object.
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(String),

    /// A required field is absent.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// The health status is not one of [`HEALTHY_STATUSES`].
    #[error("Unexpected health status: {0}")]
    UnexpectedStatus(String),
}

/// Validates the body of a health endpoint.
///
/// The body must be an object whose `status` field is `"ok"` or `"healthy"`.
///
/// # Examples
///
/// ```
/// use cart_client::contract::{validate_health_response, ContractError};
/// use serde_json::json;
///
/// assert!(validate_health_response(&json!({"status": "ok"})).is_ok());
/// assert!(validate_health_response(&json!({"status": "healthy", "uptime": 12})).is_ok());
/// assert_eq!(
///     validate_health_response(&json!({"state": "ok"})),
///     Err(ContractError::MissingField("status".to_string()))
/// );
/// ```
pub fn validate_health_response(body: &Value) -> Result<(), ContractError> {
    require_fields(body, &["status"])?;

    match body.get("status") {
        Some(Value::String(status)) if HEALTHY_STATUSES.contains(&status.as_str()) => Ok(()),
        Some(other) => Err(ContractError::UnexpectedStatus(other.to_string())),
        None => Err(ContractError::MissingField("status".to_string())),
    }
}

/// Checks that `body` is an object containing every field in `fields`.
///
/// Reports the first missing field.
pub fn require_fields(body: &Value, fields: &[&str]) -> Result<(), ContractError> {
    let object = body
        .as_object()
        .ok_or_else(|| ContractError::NotAnObject(type_name(body).to_string()))?;

    match fields.iter().find(|field| !object.contains_key(**field)) {
        Some(missing) => Err(ContractError::MissingField((*missing).to_string())),
        None => Ok(()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_rejects_non_object() {
        assert_eq!(
            validate_health_response(&json!(["ok"])),
            Err(ContractError::NotAnObject("array".to_string()))
        );
    }

    #[test]
    fn test_health_rejects_unknown_status() {
        assert_eq!(
            validate_health_response(&json!({"status": "degraded"})),
            Err(ContractError::UnexpectedStatus("\"degraded\"".to_string()))
        );
        assert!(matches!(
            validate_health_response(&json!({"status": 1})),
            Err(ContractError::UnexpectedStatus(_))
        ));
    }

    #[test]
    fn test_require_fields_reports_first_missing() {
        let body = json!({"name": "Test Merchant", "status": "active"});
        assert!(require_fields(&body, &["name", "status"]).is_ok());
        assert_eq!(
            require_fields(&body, &["merchantId", "plan"]),
            Err(ContractError::MissingField("merchantId".to_string()))
        );
    }
}
