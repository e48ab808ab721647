//! Response envelope handling.
//!
//! The ledger service wraps every answer as
//! `{ "success": true, "data": { ... } }` or, on failure,
//! `{ "success": false, "error": "<code>", "message": "<text>" }`.
//! Everything is validated here before any field is read.

use serde_json::Value;

use super::RemoteError;
use crate::domain::{Cents, cents_from_json};

const MAX_BODY_IN_ERROR: usize = 200;

/// Validate status and envelope, returning the `data` object.
pub fn unwrap_data(status: u16, body: &str) -> Result<Value, RemoteError> {
    let parsed = serde_json::from_str::<Value>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .as_ref()
            .ok()
            .and_then(failure_message)
            .unwrap_or_else(|| snippet(body));
        return Err(RemoteError::Status { status, message });
    }

    let envelope = parsed.map_err(|e| RemoteError::Malformed(e.to_string()))?;

    if envelope.get("success").and_then(Value::as_bool) == Some(false) {
        let message = failure_message(&envelope).unwrap_or_else(|| "no message".to_string());
        return Err(RemoteError::Rejected(message));
    }

    match envelope.get("data") {
        Some(data) if data.is_object() => Ok(data.clone()),
        Some(_) => Err(RemoteError::InvalidField {
            field: "data".to_string(),
            reason: "expected an object".to_string(),
        }),
        None => Err(RemoteError::MissingField("data".to_string())),
    }
}

/// A non-empty string field of `data`.
pub fn require_str<'a>(data: &'a Value, field: &str) -> Result<&'a str, RemoteError> {
    match present(data, field)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::String(_) => Err(invalid(field, "empty string")),
        _ => Err(invalid(field, "expected a string")),
    }
}

/// An identifier reported either as a number or as a non-empty string.
pub fn require_id(data: &Value, field: &str) -> Result<String, RemoteError> {
    match present(data, field)? {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(invalid(field, "expected a number or a non-empty string")),
    }
}

/// A money amount reported as a number or a decimal string.
pub fn require_cents(data: &Value, field: &str) -> Result<Cents, RemoteError> {
    let value = present(data, field)?;
    cents_from_json(value).map_err(|e| RemoteError::invalid_amount(&qualified(field), e))
}

fn present<'a>(data: &'a Value, field: &str) -> Result<&'a Value, RemoteError> {
    match data.get(field) {
        Some(Value::Null) | None => Err(RemoteError::MissingField(qualified(field))),
        Some(value) => Ok(value),
    }
}

fn invalid(field: &str, reason: &str) -> RemoteError {
    RemoteError::InvalidField {
        field: qualified(field),
        reason: reason.to_string(),
    }
}

fn qualified(field: &str) -> String {
    format!("data.{}", field)
}

fn failure_message(envelope: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .filter_map(|key| envelope.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn snippet(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return "(empty body)".to_string();
    }
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(MAX_BODY_IN_ERROR).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
