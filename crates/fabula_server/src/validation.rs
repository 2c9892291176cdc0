//! Request body validation.

use crate::ApiRequest;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fabula_error::{StoryError, StoryErrorKind};
use serde_json::Value;

/// Parse `body` as `T`, checking required keys first.
///
/// - not JSON, not an object, or any required key absent → `MissingFields`
///   listing every required key of the endpoint
/// - keys present but ill-typed → `InvalidRequest`
pub fn parse_request<T: ApiRequest>(body: &[u8]) -> Result<T, StoryError> {
    let value = match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) if missing_fields::<T>(&value).is_empty() => value,
        Ok(value @ Value::Object(_)) => {
            tracing::debug!(missing = ?missing_fields::<T>(&value), "Request lacks fields");
            return Err(missing_all::<T>());
        }
        _ => return Err(missing_all::<T>()),
    };

    serde_json::from_value(value)
        .map_err(|e| StoryError::new(StoryErrorKind::InvalidRequest(e.to_string())))
}

fn missing_all<T: ApiRequest>() -> StoryError {
    StoryError::new(StoryErrorKind::MissingFields(
        T::REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
    ))
}

fn missing_fields<T: ApiRequest>(value: &Value) -> Vec<String> {
    T::REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            let present = value.get(**field).is_some()
                || T::ALIASES
                    .iter()
                    .any(|(name, alias)| name == *field && value.get(*alias).is_some());
            !present
        })
        .map(|field| field.to_string())
        .collect()
}

/// Decode a base64 image, accepting an optional `data:...;base64,` prefix.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, StoryError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|e| StoryError::new(StoryErrorKind::InvalidBase64(e.to_string())))
}
