//! Caller-supplied filters and their wire parameters
//!
//! A `Filter` is a loose map of snake_case options. Each resource translates
//! only the keys it recognizes into the API's parameter names; everything else
//! is ignored.

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

use crate::cache::Params;

/// Loose set of filtering options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert of a timestamp, rendered as RFC 3339
    pub fn with_date(self, key: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.with(key, value.to_rfc3339())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Filter {
    fn from(map: Map<String, Value>) -> Self {
        Filter(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Filter(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Filter key to wire name, plus whether the value is a date
type Mapping = (&'static str, &'static str, bool);

/// Options understood by product and order listings
const LISTING_KEYS: &[Mapping] = &[
    ("status", "status", false),
    ("date_from", "dateFrom", true),
    ("date_to", "dateTo", true),
    ("limit", "limit", false),
];

/// Options understood by the category tree
const CATEGORY_KEYS: &[Mapping] = &[("parent_id", "parentId", false), ("depth", "depth", false)];

/// Wire parameters for product and order listings
pub(crate) fn listing_params(filter: Option<&Filter>) -> Params {
    translate(filter, LISTING_KEYS)
}

/// Wire parameters for the category tree
pub(crate) fn category_params(filter: Option<&Filter>) -> Params {
    translate(filter, CATEGORY_KEYS)
}

fn translate(filter: Option<&Filter>, mappings: &[Mapping]) -> Params {
    let mut params = Params::new();
    let Some(filter) = filter else {
        return params;
    };
    for &(key, wire, is_date) in mappings {
        let value = match filter.get(key) {
            Some(value @ (Value::String(_) | Value::Bool(_))) => value.clone(),
            Some(Value::Number(n)) if is_date => match epoch_to_rfc3339(n) {
                Some(date) => Value::String(date),
                None => continue,
            },
            Some(value @ Value::Number(_)) => value.clone(),
            _ => continue,
        };
        params.insert(wire.to_string(), value);
    }
    params
}

/// Formats epoch seconds (integral or fractional) as RFC 3339
fn epoch_to_rfc3339(n: &Number) -> Option<String> {
    let date = match n.as_i64() {
        Some(secs) => DateTime::from_timestamp(secs, 0),
        None => {
            let secs = n.as_f64()?;
            let nanos = (secs.fract().abs() * 1e9) as u32;
            DateTime::from_timestamp(secs.trunc() as i64, nanos)
        }
    }?;
    Some(date.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_listing_translation_only_supplied_keys() {
        let filter = Filter::new().with("status", "active").with("limit", 10);
        let params = listing_params(Some(&filter));

        assert_eq!(params.len(), 2);
        assert_eq!(params["status"], json!("active"));
        assert_eq!(params["limit"], json!(10));
        assert!(!params.contains_key("dateFrom"));
        assert!(!params.contains_key("dateTo"));
    }

    #[test]
    fn test_dates_are_renamed_and_formatted() {
        let from = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let filter = Filter::new()
            .with_date("date_from", from)
            .with("date_to", "2024-07-31");
        let params = listing_params(Some(&filter));

        assert_eq!(params["dateFrom"], json!("2024-07-01T00:00:00+00:00"));
        assert_eq!(params["dateTo"], json!("2024-07-31"));
    }

    #[test]
    fn test_unrecognized_and_null_keys_are_ignored() {
        let filter: Filter = [
            ("status", json!("active")),
            ("color", json!("red")),
            ("limit", Value::Null),
            ("date_from", json!({"nested": true})),
        ]
        .into_iter()
        .collect();
        let params = listing_params(Some(&filter));

        assert_eq!(params.len(), 1);
        assert_eq!(params["status"], json!("active"));
    }

    #[test]
    fn test_epoch_dates_are_formatted() {
        let filter = Filter::new()
            .with("date_from", 1_719_792_000)
            .with("date_to", 1_719_792_000.5);
        let params = listing_params(Some(&filter));

        assert_eq!(params["dateFrom"], json!("2024-07-01T00:00:00+00:00"));
        assert_eq!(params["dateTo"], json!("2024-07-01T00:00:00.500+00:00"));
    }

    #[test]
    fn test_out_of_range_epoch_is_dropped() {
        let filter = Filter::new().with("date_from", i64::MAX);
        assert!(listing_params(Some(&filter)).is_empty());
    }

    #[test]
    fn test_category_translation() {
        let filter = Filter::new()
            .with("parent_id", 12)
            .with("depth", 2)
            .with("status", "active");
        let params = category_params(Some(&filter));

        assert_eq!(params.len(), 2);
        assert_eq!(params["parentId"], json!(12));
        assert_eq!(params["depth"], json!(2));
    }

    #[test]
    fn test_absent_filter_yields_no_params() {
        assert!(listing_params(None).is_empty());
        assert!(category_params(Some(&Filter::new())).is_empty());
    }
}
