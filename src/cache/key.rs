//! Deterministic cache key derivation
//!
//! A key is the logical endpoint name, optionally followed by `:` and a
//! canonical JSON rendering of the request parameters. Object keys are sorted
//! at every nesting level so that parameter order never changes the key.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// Request parameters, keyed by wire name
pub type Params = BTreeMap<String, Value>;

/// Cache key for one logical call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for `endpoint` called with `params`
    ///
    /// Absent and empty parameter sets produce the bare endpoint name.
    pub fn new(endpoint: &str, params: Option<&Params>) -> Self {
        match params {
            Some(params) if !params.is_empty() => {
                let canonical: Map<String, Value> = params
                    .iter()
                    .map(|(name, value)| (name.clone(), canonicalize(value)))
                    .collect();
                CacheKey(format!("{}:{}", endpoint, Value::Object(canonical)))
            }
            _ => CacheKey(endpoint.to_string()),
        }
    }

    /// Convenience for single-parameter keys such as `{"product_id": "123"}`
    pub fn with_param(endpoint: &str, name: &str, value: impl Into<Value>) -> Self {
        let mut params = Params::new();
        params.insert(name.to_string(), value.into());
        Self::new(endpoint, Some(&params))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuilds nested objects with keys inserted in sorted order
///
/// Keeps the rendering stable even when `serde_json` is built with
/// insertion-ordered maps.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
