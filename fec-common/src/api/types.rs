//! FEC response envelope
//!
//! Every endpoint answers `{results: [...], pagination: {...}}`. Listing
//! endpoints fill `page`/`pages`; itemized schedule endpoints fill
//! `last_indexes` instead.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<PageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageInfo {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub last_indexes: Option<Map<String, Value>>,
}

impl Envelope {
    /// Total page count for offset pagination; a missing block means one page
    pub fn total_pages(&self) -> u32 {
        self.pagination
            .as_ref()
            .and_then(|p| p.pages)
            .unwrap_or(1)
    }

    /// Cursor for the next keyset page, if the API returned one
    pub fn next_cursor(&self) -> Option<KeysetCursor> {
        self.pagination
            .as_ref()
            .and_then(|p| p.last_indexes.as_ref())
            .and_then(KeysetCursor::from_last_indexes)
    }
}

/// Opaque keyset cursor: `last_index` plus any `last_<field>` tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetCursor(BTreeMap<String, String>);

impl KeysetCursor {
    /// Returns `None` when `last_index` is absent or null, which ends the walk
    pub fn from_last_indexes(map: &Map<String, Value>) -> Option<Self> {
        let has_index = map
            .get("last_index")
            .map(|v| !v.is_null() && v.as_str() != Some(""))
            .unwrap_or(false);
        if !has_index {
            return None;
        }

        let tokens = map
            .iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) if !s.is_empty() => Some((k.clone(), s.clone())),
                Value::Number(n) => Some((k.clone(), n.to_string())),
                Value::Bool(b) => Some((k.clone(), b.to_string())),
                _ => None,
            })
            .collect();
        Some(Self(tokens))
    }

    /// Query parameters to forward on the next request
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
