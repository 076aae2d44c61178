// RPC gateway configuration and constants

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::MintError;

/// Default timeout for a single eth_call
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(15);

/// Polling interval handed to the ethers provider
pub const PROVIDER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the read-only RPC gateway
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// RPC endpoint URL, resolved by the caller for `chain_id`
    pub rpc_url: String,
    /// Chain ID of the target EVM network
    pub chain_id: u64,
    /// Per-call timeout
    pub rpc_timeout: Option<Duration>,
}

/// Builder pattern for GatewayConfig
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    /// Creates a new configuration builder
    pub fn new(rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            config: GatewayConfig {
                rpc_url: rpc_url.into(),
                chain_id,
                rpc_timeout: None,
            },
        }
    }

    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.config.rpc_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }
}

impl GatewayConfig {
    pub fn mainnet(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id: 1,
            rpc_timeout: Some(Duration::from_secs(15)),
        }
    }

    pub fn base(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id: 8453,
            rpc_timeout: Some(Duration::from_secs(10)),
        }
    }

    pub fn development(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id: 31337,
            rpc_timeout: Some(Duration::from_secs(5)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.rpc_timeout.unwrap_or(DEFAULT_RPC_TIMEOUT)
    }

    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), MintError> {
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(MintError::Configuration(
                "RPC URL must start with http:// or https://".to_string(),
            ));
        }

        if self.chain_id == 0 {
            return Err(MintError::Configuration("Chain ID cannot be zero".to_string()));
        }

        if self.rpc_timeout.is_some_and(|t| t.is_zero()) {
            return Err(MintError::Configuration("RPC timeout cannot be zero".to_string()));
        }

        Ok(())
    }
}
