//! Wire models for the OpenMRS REST web services (`/ws/rest/v1`).
//!
//! REST payloads carry many fields this crate does not use (links, audit info, resource
//! versions), so unlike on-disk formats these models ignore unknown keys and treat most
//! fields as optional. Missing or malformed parts are surfaced as `None` and handled by the
//! display layer rather than rejected here, so one bad observation never costs the rest of an
//! encounter list.

pub mod encounter;
pub mod observation;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialise a field, falling back to the type's default when it is `null` or has the wrong
/// shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(T::default());
    }

    Ok(serde_json::from_value(raw).unwrap_or_else(|err| {
        tracing::warn!("ignoring malformed field: {err}");
        T::default()
    }))
}

/// Deserialise a list, dropping entries that do not match `T`. `null` or a non-list is empty.
pub(crate) fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(list_entries(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Like [`lenient_list`], but keeps `null` (and non-lists) distinct from an empty list.
pub(crate) fn lenient_optional_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(list_entries(Value::deserialize(deserializer)?))
}

fn list_entries<T: DeserializeOwned>(raw: Value) -> Option<Vec<T>> {
    let entries = match raw {
        Value::Null => return None,
        Value::Array(entries) => entries,
        other => {
            tracing::warn!("expected a list, ignoring {other}");
            return None;
        }
    };

    let parsed = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(index, "dropping malformed list entry: {err}");
                None
            }
        })
        .collect();

    Some(parsed)
}

/// Returns the trimmed string when it holds something other than whitespace.
pub(crate) fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}
