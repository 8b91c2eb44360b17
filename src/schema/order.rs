//! Order records
//!
//! Orders change frequently and arrive under either `items` or the legacy
//! `orders` key; both normalize to `items` with an explicit `total`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{field, string_or_number, validate_each, SchemaError, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(alias = "itemId", deserialize_with = "string_or_number")]
    pub item_id: String,
    #[serde(alias = "productId", deserialize_with = "string_or_number")]
    pub product_id: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, alias = "warehouseId")]
    pub warehouse_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(alias = "orderId", deserialize_with = "string_or_number")]
    pub order_id: String,
    pub status: String,
    pub items: Vec<OrderItem>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "totalAmount")]
    pub total_amount: f64,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub delivery: Option<Delivery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderList {
    #[serde(alias = "orders")]
    pub items: Vec<Order>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl Validate for OrderItem {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.quantity < 0 {
            return Err(SchemaError::constraint(field(path, "quantity"), "must not be negative"));
        }
        if !(self.price > 0.0) {
            return Err(SchemaError::constraint(field(path, "price"), "must be greater than 0"));
        }
        Ok(())
    }
}

impl Validate for Order {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        if self.status.trim().is_empty() {
            return Err(SchemaError::constraint(field(path, "status"), "must not be empty"));
        }
        if !(self.total_amount >= 0.0) {
            return Err(SchemaError::constraint(
                field(path, "total_amount"),
                "must not be negative",
            ));
        }
        validate_each(path, "items", &self.items)
    }
}

impl Validate for OrderList {
    fn validate(&self, path: &str) -> Result<(), SchemaError> {
        validate_each(path, "items", &self.items)
    }
}

impl OrderList {
    /// Fills in `total` from the item count when the API omitted it
    pub fn with_total(mut self) -> Self {
        if self.total.is_none() {
            self.total = Some(self.items.len() as u64);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order() -> serde_json::Value {
        json!({
            "orderId": "ORD-54321",
            "status": "new",
            "items": [{"itemId": 1, "productId": "12345", "quantity": 2, "price": 499.5}],
            "createdAt": "2024-07-15T10:00:00Z",
            "totalAmount": 999.0,
            "customer": {"name": "Ivan"},
            "delivery": {"address": "Moscow", "warehouseId": 3}
        })
    }

    #[test]
    fn test_order_parses_nested_objects() {
        let order: Order = serde_json::from_value(order()).unwrap();
        assert_eq!(order.items[0].item_id, "1");
        assert_eq!(order.customer.unwrap().name.as_deref(), Some("Ivan"));
        assert_eq!(order.delivery.unwrap().warehouse_id, Some(3));
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let mut raw = order();
        raw["items"][0]["quantity"] = json!(-1);
        let order: Order = serde_json::from_value(raw).unwrap();
        let err = order.validate("").unwrap_err();
        assert!(err.to_string().contains("items[0].quantity"));
    }

    #[test]
    fn test_zero_quantity_is_allowed() {
        let mut raw = order();
        raw["items"][0]["quantity"] = json!(0);
        let order: Order = serde_json::from_value(raw).unwrap();
        assert!(order.validate("").is_ok());
    }

    #[test]
    fn test_missing_created_at_is_rejected() {
        let mut raw = order();
        raw.as_object_mut().unwrap().remove("createdAt");
        let err = serde_json::from_value::<Order>(raw).unwrap_err();
        assert!(err.to_string().contains("missing field `created_at`"));
    }

    #[test]
    fn test_missing_total_amount_is_rejected() {
        let mut raw = order();
        raw.as_object_mut().unwrap().remove("totalAmount");
        assert!(serde_json::from_value::<Order>(raw).is_err());
    }

    #[test]
    fn test_orders_alias_and_total_fill() {
        let raw = json!({"orders": [order(), order()]});
        let list: OrderList = serde_json::from_value(raw).unwrap();
        assert_eq!(list.with_total().total, Some(2));
    }
}
