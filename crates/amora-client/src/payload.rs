use crate::ClientError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize a partial profile and drop the keys the backend must not see:
/// nulls and empty objects. Arrays and scalars pass through as-is, and only
/// top-level keys are inspected.
pub fn clean_payload<P: Serialize + ?Sized>(payload: &P) -> Result<Map<String, Value>, ClientError> {
    let value =
        serde_json::to_value(payload).map_err(|e| ClientError::InvalidPayload(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ClientError::InvalidPayload(
            "profile update must be a JSON object".to_string(),
        ));
    };

    Ok(fields
        .into_iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::Object(inner) => !inner.is_empty(),
            _ => true,
        })
        .collect())
}
