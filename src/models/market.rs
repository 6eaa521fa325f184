use serde::{Deserialize, Serialize};

/// Order-book summary as returned by `GET /commerce/prices?ids=...`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ItemPrice {
    pub id: u32,
    #[serde(default)]
    pub whitelisted: bool,
    pub buys: PriceOrders,
    pub sells: PriceOrders,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PriceOrders {
    pub unit_price: i64,
    pub quantity: i64,
}

/// Flattened price summary used by the engine.
///
/// `buy_unit_price` is the highest standing buy order; `sell_unit_price`
/// is the lowest standing sell listing (what it costs to buy the item
/// outright right now).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub buy_unit_price: i64,
    pub sell_unit_price: i64,
    pub buy_quantity: i64,
    pub sell_quantity: i64,
}

impl From<&ItemPrice> for PricePoint {
    fn from(price: &ItemPrice) -> Self {
        PricePoint {
            buy_unit_price: price.buys.unit_price,
            sell_unit_price: price.sells.unit_price,
            buy_quantity: price.buys.quantity,
            sell_quantity: price.sells.quantity,
        }
    }
}

impl PricePoint {
    /// Unit cost of buying this item off the market, if anyone is selling.
    pub fn purchase_price(&self) -> Option<i64> {
        if self.sell_unit_price > 0 && self.sell_quantity > 0 {
            Some(self.sell_unit_price)
        } else {
            None
        }
    }
}
