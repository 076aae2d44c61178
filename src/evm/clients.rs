use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use reqwest::{Client, Url};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{CallFailure, MintError};
use crate::evm::types::{GatewayConfig, PROVIDER_POLL_INTERVAL};

/// Raw read-only call transport. Implementations return the undecoded
/// return data of an `eth_call` against the latest block.
#[async_trait]
pub trait RawCaller: Send + Sync {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallFailure>;
}

/// ethers-backed RPC client with a per-call timeout
#[derive(Debug, Clone)]
pub struct RpcClient {
    provider: Arc<Provider<Http>>,
    timeout: Duration,
    id: String,
}

impl RpcClient {
    /// Creates a new RPC client for the configured endpoint
    pub fn new(config: &GatewayConfig) -> Result<Self, MintError> {
        config.validate()?;

        let url = Url::parse(&config.rpc_url)
            .map_err(|e| MintError::Configuration(format!("Invalid RPC URL: {}", e)))?;

        let http = Http::new_with_client(
            url,
            Client::builder()
                .timeout(config.timeout())
                .build()
                .map_err(|e| MintError::Configuration(format!("Failed to create HTTP client: {}", e)))?,
        );

        let provider = Provider::new(http).interval(PROVIDER_POLL_INTERVAL);

        Ok(Self {
            provider: Arc::new(provider),
            timeout: config.timeout(),
            id: format!("rpc-{}-{}", config.chain_id, Uuid::new_v4()),
        })
    }

    /// Gets the underlying provider
    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    pub fn client_id(&self) -> &str {
        &self.id
    }
}

#[async_trait]
impl RawCaller for RpcClient {
    #[instrument(level = "trace", skip(self, data), fields(client = %self.id, selector = %selector_hex(&data)))]
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallFailure> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();

        match tokio::time::timeout(self.timeout, self.provider.call(&tx, None)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                let failure = CallFailure::from(e);
                debug!("eth_call to {:?} failed: {}", to, failure);
                Err(failure)
            }
            Err(_) => {
                debug!("eth_call to {:?} timed out after {:?}", to, self.timeout);
                Err(CallFailure::Timeout)
            }
        }
    }
}

impl std::fmt::Display for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RpcClient({})", self.id)
    }
}

pub(crate) fn selector_hex(data: &[u8]) -> String {
    hex::encode(&data[..data.len().min(4)])
}
