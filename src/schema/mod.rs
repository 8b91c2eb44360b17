//! Typed records for marketplace API payloads
//!
//! Raw JSON is deserialized into these records (accepting both the API's
//! camelCase field names and snake_case), checked against field constraints,
//! and re-serialized in snake_case as the normalized payload handed back to
//! callers. A payload that fails any constraint is rejected, never coerced.

pub mod category;
pub mod order;
pub mod product;

pub use category::{Category, CategoryList};
pub use order::{Customer, Delivery, Order, OrderItem, OrderList};
pub use product::{Product, ProductList, ProductModel, ProductPrice, ProductStock};

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while validating a payload
#[derive(Debug, Error)]
pub enum SchemaError {
    /// JSON shape does not match the record (missing field, wrong type)
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),

    /// A field is present but violates its constraint
    #[error("field `{field}` {reason}")]
    Constraint { field: String, reason: String },
}

impl SchemaError {
    pub(crate) fn constraint(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Constraint {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Field-level checks run after deserialization
pub trait Validate {
    /// Checks constraints, naming offending fields relative to `path`
    fn validate(&self, path: &str) -> Result<(), SchemaError>;
}

/// Deserializes, validates and normalizes a raw payload as record `T`
pub fn normalize<T>(raw: &Value) -> Result<Value, SchemaError>
where
    T: DeserializeOwned + Serialize + Validate,
{
    let record = T::deserialize(raw)?;
    record.validate("")?;
    Ok(serde_json::to_value(&record)?)
}

/// Joins a parent path and a field name: `items[0]` + `price` -> `items[0].price`
pub(crate) fn field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Validates every element of a list field
pub(crate) fn validate_each<T: Validate>(
    path: &str,
    name: &str,
    items: &[T],
) -> Result<(), SchemaError> {
    for (i, item) in items.iter().enumerate() {
        item.validate(&format!("{}[{}]", field(path, name), i))?;
    }
    Ok(())
}

/// Accepts an identifier sent either as a JSON string or a number
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    match Id::deserialize(deserializer)? {
        Id::Text(s) if s.trim().is_empty() => Err(de::Error::custom("identifier must not be empty")),
        Id::Text(s) => Ok(s),
        Id::Number(n) => Ok(n.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_paths() {
        assert_eq!(field("", "price"), "price");
        assert_eq!(field("items[0]", "price"), "items[0].price");
    }

    #[test]
    fn test_constraint_message_names_field() {
        let err = SchemaError::constraint("items[0].price", "must be greater than 0");
        assert_eq!(err.to_string(), "field `items[0].price` must be greater than 0");
    }

    #[test]
    fn test_normalize_reports_missing_field() {
        let err = normalize::<Category>(&json!({"categoryId": 1})).unwrap_err();
        assert!(matches!(err, SchemaError::Malformed(_)));
        assert!(err.to_string().contains("name"));
    }
}
