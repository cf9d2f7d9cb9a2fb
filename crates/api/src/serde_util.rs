//! Serde helpers for request payloads.

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field from an explicit `null` in update
/// payloads.
///
/// With `#[serde(default, deserialize_with = "double_option")]` a
/// missing field deserializes to `None` (leave unchanged) and
/// `"field": null` to `Some(None)` (clear the value).
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}
