//! JSON encoding and decoding of bridge records.
//!
//! Decoding reports the path of the offending field (`attendees[1].role`)
//! instead of serde_json's line/column position, since payloads arrive as
//! single-line messages.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{CoreError, CoreResult};

/// Decode a record from JSON text.
pub fn decode<T: DeserializeOwned>(json: &str) -> CoreResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(decode_error)?;
    deserializer.end().map_err(|e| CoreError::Decode {
        path: ".".to_string(),
        message: e.to_string(),
    })?;
    Ok(value)
}

/// Decode a record from an already parsed JSON value.
pub fn decode_value<T: DeserializeOwned>(value: serde_json::Value) -> CoreResult<T> {
    serde_path_to_error::deserialize(value).map_err(decode_error)
}

/// Encode a record as compact JSON text.
pub fn encode<T: Serialize>(record: &T) -> CoreResult<String> {
    serde_json::to_string(record).map_err(|e| CoreError::Encode(e.to_string()))
}

/// Encode a record as a JSON value.
pub fn encode_value<T: Serialize>(record: &T) -> CoreResult<serde_json::Value> {
    serde_json::to_value(record).map_err(|e| CoreError::Encode(e.to_string()))
}

fn decode_error(err: serde_path_to_error::Error<serde_json::Error>) -> CoreError {
    let path = err.path().to_string();
    let inner = err.into_inner();
    let message = strip_position(&inner.to_string());

    // A missing field is reported against its parent; name the field itself
    let path = match missing_field_name(&message) {
        Some(field) if path == "." => field.to_string(),
        Some(field) => format!("{path}.{field}"),
        None => path,
    };

    CoreError::Decode { path, message }
}

fn missing_field_name(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(field, _)| field)
}

fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}
