//! Category tree operations

use super::filter::category_params;
use super::{require, CachePolicy, Filter, WbClient};
use crate::envelope::Envelope;
use crate::schema::{normalize, CategoryList};

const CATEGORIES_PATH: &str = "/api/v1/categories";

impl WbClient {
    /// Fetches the marketplace category tree
    ///
    /// Recognized filter keys: `parent_id`, `depth`.
    pub async fn get_categories(&self, filter: Option<&Filter>, force_refresh: bool) -> Envelope {
        let params = category_params(filter);
        self.cached_get(
            CachePolicy::CATEGORIES,
            &params,
            CATEGORIES_PATH,
            Some(&params),
            force_refresh,
            |raw| normalize::<CategoryList>(require(raw)?).map(Some),
        )
        .await
    }
}
