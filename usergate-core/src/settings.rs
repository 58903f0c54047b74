//! Projection of the serialized `settings` column
//!
//! The column holds free-form JSON text. Only its top-level `key` field is
//! exposed on [`UserRecord`](crate::UserRecord); anything unreadable maps to
//! `None` instead of an error.

use serde_json::Value;

/// Field projected out of the settings payload.
pub const SETTINGS_KEY_FIELD: &str = "key";

/// Extract `key` from a raw settings payload.
///
/// Returns `None` when the payload is absent, not valid JSON, not an object,
/// has no `key` field, or the field is JSON `null`.
///
/// # Example
/// ```
/// use usergate_core::project_key;
/// use serde_json::json;
///
/// assert_eq!(project_key(Some(r#"{"key": "abc"}"#)), Some(json!("abc")));
/// assert_eq!(project_key(Some("not json")), None);
/// assert_eq!(project_key(None), None);
/// ```
pub fn project_key(raw: Option<&str>) -> Option<Value> {
    let raw = raw?;
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::trace!(error = %err, "unparseable settings payload");
            return None;
        }
    };

    match parsed {
        Value::Object(mut map) => match map.remove(SETTINGS_KEY_FIELD) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        },
        _ => None,
    }
}
