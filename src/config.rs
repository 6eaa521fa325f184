use serde::{Deserialize, Serialize};
use crate::v_info;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftConfig {
    pub api: ApiConfig,
    pub crafting: CraftingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the game economy API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Maximum ids per batched request (the API rejects more than 200)
    pub max_ids_per_request: usize,
    /// Retry attempts per failed batch before its ids are reported as failed
    pub max_retries: u32,
    /// Base delay for exponential retry backoff in milliseconds
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftingConfig {
    /// Recursion bound for tree expansion (guards cyclic recipe data)
    pub default_max_depth: u32,
    /// Recursion bound for buy-vs-craft cost resolution
    pub max_cost_depth: u32,
}

impl Default for CraftConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: crate::API_BASE_URL.to_string(),
                request_timeout_seconds: 20,
                max_ids_per_request: crate::MAX_IDS_PER_REQUEST,
                max_retries: 3,
                retry_backoff_ms: 500,
            },
            crafting: CraftingConfig {
                default_max_depth: crate::DEFAULT_MAX_DEPTH,
                max_cost_depth: crate::DEFAULT_MAX_DEPTH,
            },
        }
    }
}

impl CraftConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if Path::new(config_path).exists() {
            v_info!("📋 Loading configuration from {}", config_path);
            let config_str = fs::read_to_string(config_path)?;
            let config: CraftConfig = toml::from_str(&config_str)?;
            Ok(config)
        } else {
            v_info!("📋 Creating default configuration at {}", config_path);
            let config = CraftConfig::default();
            config.save(config_path)?;
            v_info!("💡 Edit {} to customize API and depth limits", config_path);
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = Path::new(config_path).parent() {
            fs::create_dir_all(parent)?;
        }

        let config_str = toml::to_string_pretty(self)?;
        fs::write(config_path, config_str)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.api.base_url.is_empty() {
            return Err("api.base_url must not be empty".to_string());
        }
        if self.api.max_ids_per_request == 0 || self.api.max_ids_per_request > 200 {
            return Err("api.max_ids_per_request must be between 1 and 200".to_string());
        }
        if self.api.request_timeout_seconds == 0 {
            return Err("api.request_timeout_seconds must be greater than 0".to_string());
        }
        if self.crafting.default_max_depth == 0 {
            return Err("crafting.default_max_depth must be greater than 0".to_string());
        }
        if self.crafting.max_cost_depth == 0 {
            return Err("crafting.max_cost_depth must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        v_info!("📋 Configuration Summary:");
        v_info!("   🌐 API: {}", self.api.base_url);
        v_info!("   📦 Batch ceiling: {} ids/request", self.api.max_ids_per_request);
        v_info!("   🔁 Retries: {} (backoff {}ms)", self.api.max_retries, self.api.retry_backoff_ms);
        v_info!("   🌳 Tree depth: {}", self.crafting.default_max_depth);
        v_info!("   💰 Cost depth: {}", self.crafting.max_cost_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CraftConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_oversized_batch_ceiling() {
        let mut config = CraftConfig::default();
        config.api.max_ids_per_request = 500;
        assert!(config.validate().is_err());
    }
}
