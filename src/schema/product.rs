//! Product records
//!
//! Mirrors the marketplace product card: prices, per-warehouse stock and the
//! model variants (sizes and colours) a product is sold in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{field, string_or_number, validate_each, SchemaError, Validate};

fn default_currency() -> String {
    "RUB".to_string()
}

/// A price point for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPrice {
    /// Price in `currency`, must be positive
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Discount percentage in `[0, 100]`
    #[serde(default)]
    pub discount: Option<f64>,
}

/// Stock held at one warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductStock {
    #[serde(alias = "warehouseId")]
    pub warehouse_id: i64,
    pub amount: i64,
}

/// A sellable variant of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductModel {
    #[serde(alias = "modelId", deserialize_with = "string_or_number")]
    pub model_id: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "productId", deserialize_with = "string_or_number")]
    pub product_id: String,
    pub name: String,
    pub prices: Vec<ProductPrice>,
    pub stocks: Vec<ProductStock>,
    pub models: Vec<ProductModel>,
    /// Free-form attributes, passed through untouched
    pub attributes: Map<String, Value>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// One page of products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductList {
    #[serde(alias = "products")]
    pub items: Vec<Product>,
    pub total: u64,
}

impl Validate for ProductPrice {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if !(self.price > 0.0) {
            return Err(SchemaError::constraint(field(path, "price"), "must be greater than 0"));
        }
        if let Some(discount) = self.discount {
            if !(0.0..=100.0).contains(&discount) {
                return Err(SchemaError::constraint(
                    field(path, "discount"),
                    "must be between 0 and 100",
                ));
            }
        }
        Ok(())
    }
}

impl Validate for ProductStock {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.amount < 0 {
            return Err(SchemaError::constraint(field(path, "amount"), "must not be negative"));
        }
        Ok(())
    }
}

impl Validate for ProductModel {
    fn validate(&self, _path: &str) -> Result<(), SchemaError> {
        Ok(())
    }
}

impl Validate for Product {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::constraint(field(path, "name"), "must not be empty"));
        }
        validate_each(path, "prices", &self.prices)?;
        validate_each(path, "stocks", &self.stocks)?;
        validate_each(path, "models", &self.models)
    }
}

impl Validate for ProductList {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        validate_each(path, "items", &self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::normalize;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "productId": "12345",
            "name": "Test Product",
            "prices": [{"price": 999.0, "discount": 10}],
            "stocks": [{"warehouseId": 1, "amount": 100}],
            "models": [{"modelId": 77, "sizes": ["M"], "colors": ["red"]}],
            "attributes": {"brand": "Acme"},
            "createdAt": "2024-07-15T10:00:00Z",
            "updatedAt": "2024-07-16T10:00:00Z"
        })
    }

    #[test]
    fn test_normalizes_to_snake_case() {
        let value = normalize::<Product>(&sample()).unwrap();

        assert_eq!(value["product_id"], json!("12345"));
        assert_eq!(value["prices"][0]["currency"], json!("RUB"));
        assert_eq!(value["stocks"][0]["warehouse_id"], json!(1));
        assert_eq!(value["models"][0]["model_id"], json!("77"));
        assert_eq!(value["attributes"]["brand"], json!("Acme"));
        assert!(value.get("productId").is_none());
    }

    #[test]
    fn test_accepts_snake_case_input() {
        let raw = json!({
            "product_id": "12345",
            "name": "Test Product",
            "prices": [{"price": 999, "currency": "RUB"}],
            "stocks": [{"warehouse_id": 1, "amount": 100}],
            "models": [],
            "attributes": {},
            "created_at": "2024-07-15T10:00:00Z",
            "updated_at": "2024-07-15T10:00:00Z"
        });
        let product: Product = serde_json::from_value(raw).unwrap();
        assert_eq!(product.product_id, "12345");
        assert!(product.models.is_empty());
        assert!(product.prices[0].discount.is_none());
    }

    #[test]
    fn test_missing_timestamps_are_rejected() {
        let mut raw = sample();
        raw.as_object_mut().unwrap().remove("createdAt");
        let err = normalize::<Product>(&raw).unwrap_err();
        assert!(err.to_string().contains("missing field `created_at`"));
    }

    #[test]
    fn test_missing_collections_are_rejected() {
        for name in ["prices", "stocks", "models", "attributes"] {
            let mut raw = sample();
            raw.as_object_mut().unwrap().remove(name);
            assert!(normalize::<Product>(&raw).is_err(), "{} should be required", name);
        }

        let mut raw = sample();
        raw["models"][0].as_object_mut().unwrap().remove("colors");
        assert!(normalize::<Product>(&raw).is_err());
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let mut raw = sample();
        raw["prices"][0]["price"] = json!(0);
        let err = normalize::<Product>(&raw).unwrap_err();
        assert!(err.to_string().contains("prices[0].price"));
    }

    #[test]
    fn test_rejects_discount_out_of_range() {
        let mut raw = sample();
        raw["prices"][0]["discount"] = json!(150);
        let err = normalize::<Product>(&raw).unwrap_err();
        assert!(err.to_string().contains("discount"));
    }

    #[test]
    fn test_rejects_negative_stock() {
        let mut raw = sample();
        raw["stocks"][0]["amount"] = json!(-1);
        assert!(normalize::<Product>(&raw).is_err());
    }

    #[test]
    fn test_list_paths_include_index() {
        let mut bad = sample();
        bad["prices"][0]["price"] = json!(-5);
        let raw = json!({"items": [sample(), bad], "total": 2});

        let err = normalize::<ProductList>(&raw).unwrap_err();
        assert!(err.to_string().contains("items[1].prices[0].price"));
    }

    #[test]
    fn test_list_requires_total() {
        let raw = json!({"items": [sample()]});
        assert!(normalize::<ProductList>(&raw).is_err());
    }
}
