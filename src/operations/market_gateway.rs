// Market gateway - trading post order-book summaries
use async_trait::async_trait;
use std::collections::HashMap;

use crate::client::GameApiClient;
use crate::models::PricePoint;

/// Batched price lookup result. Items with no active listing are simply
/// absent from `by_id`; `failed_ids` carries ids whose fetch failed after
/// retries (priced as unavailable, never an abort).
#[derive(Debug, Clone, Default)]
pub struct PriceMap {
    pub by_id: HashMap<u32, PricePoint>,
    pub failed_ids: Vec<u32>,
}

/// Capability interface over the market price source.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn prices_by_ids(&self, ids: &[u32]) -> Result<PriceMap, Box<dyn std::error::Error>>;
}

/// HTTP-backed market gateway over the live trading post API.
pub struct ApiMarketGateway {
    client: GameApiClient,
}

impl ApiMarketGateway {
    pub fn new(client: GameApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceSource for ApiMarketGateway {
    async fn prices_by_ids(&self, ids: &[u32]) -> Result<PriceMap, Box<dyn std::error::Error>> {
        let batch = self.client.get_prices(ids).await?;

        let by_id = batch
            .resolved
            .iter()
            .map(|price| (price.id, PricePoint::from(price)))
            .collect();

        Ok(PriceMap { by_id, failed_ids: batch.failed_ids })
    }
}
