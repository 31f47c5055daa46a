//! Configuration for lifecycle managers

use serde::{Deserialize, Serialize};

/// Lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Identity of this system; ConfirmDCR requests addressed elsewhere are
    /// rejected as misrouted
    pub system_id: String,

    /// Permit trades where one legal party acts as both sender and receiver
    pub allow_single_party_trades: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "lifecycle".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            system_id: "ledger-local".to_string(),
            allow_single_party_trades: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Internal(format!("Failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Internal(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(system_id) = std::env::var("LIFECYCLE_SYSTEM_ID") {
            config.system_id = system_id;
        }

        if let Ok(flag) = std::env::var("LIFECYCLE_ALLOW_SINGLE_PARTY_TRADES") {
            config.allow_single_party_trades = flag
                .parse()
                .map_err(|e| crate::Error::Internal(format!("Invalid boolean flag: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "lifecycle");
        assert_eq!(config.system_id, "ledger-local");
        assert!(config.allow_single_party_trades);
    }
}
