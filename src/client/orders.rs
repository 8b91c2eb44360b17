//! Order operations

use serde::Deserialize;

use super::filter::listing_params;
use super::{require, CachePolicy, Filter, WbClient};
use crate::envelope::Envelope;
use crate::schema::{OrderList, Validate};

const ORDERS_PATH: &str = "/api/v1/orders";

impl WbClient {
    /// Lists orders
    ///
    /// Recognized filter keys: `status`, `date_from`, `date_to`, `limit`. The
    /// normalized payload always carries `items` and `total`.
    pub async fn get_orders(&self, filter: Option<&Filter>, force_refresh: bool) -> Envelope {
        let params = listing_params(filter);
        self.cached_get(
            CachePolicy::ORDERS,
            &params,
            ORDERS_PATH,
            Some(&params),
            force_refresh,
            |raw| {
                let orders = OrderList::deserialize(require(raw)?)?;
                orders.validate("")?;
                Ok(Some(serde_json::to_value(orders.with_total())?))
            },
        )
        .await
    }
}
