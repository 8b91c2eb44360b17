//! Product operations

use serde_json::{Map, Value};
use tracing::debug;

use super::filter::listing_params;
use super::{require, resource_id, CachePolicy, Filter, WbClient};
use crate::cache::Params;
use crate::envelope::Envelope;
use crate::error::ClientError;
use crate::schema::{normalize, Product, ProductList, SchemaError};
use crate::transport::Method;

const PRODUCTS_PATH: &str = "/api/v1/products";

fn product_key_params(id: &str) -> Params {
    let mut params = Params::new();
    params.insert("product_id".to_string(), Value::String(id.to_string()));
    params
}

impl WbClient {
    /// Lists the seller's products
    ///
    /// Recognized filter keys: `status`, `date_from`, `date_to`, `limit`.
    pub async fn get_products(&self, filter: Option<&Filter>, force_refresh: bool) -> Envelope {
        let params = listing_params(filter);
        self.cached_get(
            CachePolicy::PRODUCTS,
            &params,
            PRODUCTS_PATH,
            Some(&params),
            force_refresh,
            |raw| normalize::<ProductList>(require(raw)?).map(Some),
        )
        .await
    }

    /// Fetches one product card
    pub async fn get_product(&self, product_id: &str, force_refresh: bool) -> Envelope {
        let id = match resource_id(product_id) {
            Ok(id) => id,
            Err(e) => return ClientError::Validation(e).into(),
        };
        let path = format!("{}/{}", PRODUCTS_PATH, id);
        self.cached_get(
            CachePolicy::PRODUCT,
            &product_key_params(id),
            &path,
            None,
            force_refresh,
            |raw| normalize::<Product>(require(raw)?).map(Some),
        )
        .await
    }

    /// Fetches the marketplace commission for a product
    ///
    /// The payload is passed through as long as it is a JSON object.
    pub async fn get_commission(&self, product_id: &str, force_refresh: bool) -> Envelope {
        let id = match resource_id(product_id) {
            Ok(id) => id,
            Err(e) => return ClientError::Validation(e).into(),
        };
        let path = format!("{}/{}/commission", PRODUCTS_PATH, id);
        self.cached_get(
            CachePolicy::COMMISSION,
            &product_key_params(id),
            &path,
            None,
            force_refresh,
            |raw| match require(raw)? {
                value @ Value::Object(_) => Ok(Some(value.clone())),
                _ => Err(SchemaError::constraint("body", "must be a JSON object")),
            },
        )
        .await
    }

    /// Partially updates a product
    ///
    /// Null fields are dropped from the request body. On success the cached
    /// card, commission and every cached product listing are invalidated.
    pub async fn update_product(&self, product_id: &str, fields: &Map<String, Value>) -> Envelope {
        let id = match resource_id(product_id) {
            Ok(id) => id,
            Err(e) => return ClientError::Validation(e).into(),
        };
        let body: Map<String, Value> = fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if body.is_empty() {
            return ClientError::Validation(SchemaError::constraint(
                "fields",
                "must contain at least one non-null value",
            ))
            .into();
        }

        let path = format!("{}/{}", PRODUCTS_PATH, id);
        let envelope = self
            .transport
            .execute_as("update_product", Method::PATCH, &path, None, Some(&Value::Object(body)))
            .await;

        if envelope.success() {
            let key_params = product_key_params(id);
            for prefix in [
                CachePolicy::PRODUCT.key(Some(&key_params)).to_string(),
                CachePolicy::COMMISSION.key(Some(&key_params)).to_string(),
                CachePolicy::PRODUCTS.endpoint.to_string(),
            ] {
                self.cache.invalidate(&prefix).await;
            }
        } else {
            debug!(product_id = id, "update failed, cache left intact");
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;

    #[test]
    fn test_product_key_is_scoped_to_id() {
        let key = CachePolicy::PRODUCT.key(Some(&product_key_params("12345")));
        assert_eq!(key, CacheKey::with_param("get_product", "product_id", "12345"));
        assert!(!key.as_str().starts_with(CachePolicy::PRODUCTS.endpoint));
    }
}
