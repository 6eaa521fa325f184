use serde::{Deserialize, Serialize};

/// Item detail as returned by `GET /items?ids=...`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub icon: Option<String>,
    #[serde(default = "default_rarity")]
    pub rarity: String,
    pub description: Option<String>,
}

fn default_rarity() -> String {
    "Basic".to_string()
}

impl Item {
    /// Placeholder for items the detail endpoint could not resolve.
    pub fn fallback(id: u32) -> Self {
        Item {
            id,
            name: format!("Item {}", id),
            icon: None,
            rarity: default_rarity(),
            description: None,
        }
    }
}
