// Item gateway - display details for item ids
use async_trait::async_trait;

use crate::client::{FetchBatch, GameApiClient};
use crate::models::Item;

/// Capability interface over the item-detail source.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn items_by_ids(&self, ids: &[u32]) -> Result<FetchBatch<Item>, Box<dyn std::error::Error>>;
}

/// HTTP-backed item gateway over the live game API.
pub struct ApiItemGateway {
    client: GameApiClient,
}

impl ApiItemGateway {
    pub fn new(client: GameApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ItemSource for ApiItemGateway {
    async fn items_by_ids(&self, ids: &[u32]) -> Result<FetchBatch<Item>, Box<dyn std::error::Error>> {
        self.client.get_items(ids).await
    }
}
