//! End-to-end preparation of a mint: detect, price, specialize, validate.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::detector::PlatformDetector;
use crate::error::MintError;
use crate::evm::{CallGateway, GatewayConfig, RawCaller, RpcClient};
use crate::price::PriceResolver;
use crate::registry::{ProviderConfig, ProviderConfigRegistry, RegistryConfig};
use crate::types::{ContractClassification, MintRequestParams, PriceQuote, ValidationReport};
use crate::utils::unix_now;
use crate::validator::ParameterValidator;

/// Everything the submission layer needs to build a mint transaction
#[derive(Debug, Clone, PartialEq)]
pub struct MintPlan {
    pub classification: ContractClassification,
    pub quote: PriceQuote,
    pub config: ProviderConfig,
    pub validation: ValidationReport,
}

impl MintPlan {
    /// Native value to attach to the mint transaction
    pub fn value(&self, params: &MintRequestParams) -> ethers::types::U256 {
        self.config.value(params.quantity())
    }
}

#[derive(Clone)]
pub struct MintEngine {
    detector: PlatformDetector,
    resolver: PriceResolver,
    registry: Arc<ProviderConfigRegistry>,
}

impl MintEngine {
    pub fn new(caller: Arc<dyn RawCaller>, config: RegistryConfig) -> Self {
        let gateway = CallGateway::new(caller);
        let registry = Arc::new(ProviderConfigRegistry::new(config));
        Self {
            detector: PlatformDetector::new(gateway.clone(), registry.clone()),
            resolver: PriceResolver::new(gateway, registry.clone()),
            registry,
        }
    }

    /// Engine backed by a JSON-RPC endpoint
    pub fn connect(gateway: GatewayConfig, config: RegistryConfig) -> Result<Self, MintError> {
        let client = RpcClient::new(&gateway)?;
        info!("Mint engine connected via {}", client);
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn detector(&self) -> &PlatformDetector {
        &self.detector
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &ProviderConfigRegistry {
        &self.registry
    }

    /// Never fails: detection and pricing degrade, validation reports as data.
    pub async fn prepare(&self, params: &MintRequestParams) -> MintPlan {
        self.prepare_at(params, unix_now()).await
    }

    #[instrument(skip(self, params), fields(contract = ?params.contract_address, chain_id = params.chain_id))]
    pub async fn prepare_at(&self, params: &MintRequestParams, now: u64) -> MintPlan {
        let classification = self.detector.detect(params).await;
        let (quote, classification) = self.resolver.resolve(classification, params).await;
        let config = self.registry.derive(&classification, &quote, params);
        let validation = ParameterValidator::validate(params, &classification, &config, now);

        info!(
            "Prepared {} mint on {:?}: total {} valid {}",
            classification.provider, params.contract_address, quote.total_cost, validation.is_valid
        );

        MintPlan {
            classification,
            quote,
            config,
            validation,
        }
    }
}
