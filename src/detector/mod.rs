//! Platform detection.
//!
//! Classifies a contract by running an ordered cascade of read-only probes.
//! The first matching step wins, so the order below is part of the
//! behavior: curated overrides, caller-supplied provider, extensions,
//! version accessor, ERC721 claim condition, then the ERC1155 drop table.
//! Probe failures only ever mean "capability absent".

pub mod tables;

use std::sync::Arc;

use ethers::types::Address;
use tracing::{debug, info, instrument};

use crate::evm::gateway::CallGateway;
use crate::probe::{InterfaceProbe, InterfaceSupport};
use crate::registry::ProviderConfigRegistry;
use crate::types::{ContractClassification, MintRequestParams, ProviderTag};
use crate::utils::first_success;

use tables::{Probe, Rule, Step, ERC1155_DROP_STEPS, ERC721_ACTIVE_CONDITION, ERC721_CLAIM_CONDITION, VERSION_PROBE};

#[derive(Clone)]
pub struct PlatformDetector {
    gateway: CallGateway,
    probe: InterfaceProbe,
    registry: Arc<ProviderConfigRegistry>,
}

impl PlatformDetector {
    pub fn new(gateway: CallGateway, registry: Arc<ProviderConfigRegistry>) -> Self {
        Self {
            probe: InterfaceProbe::new(gateway.clone()),
            gateway,
            registry,
        }
    }

    /// Classify `params.contract_address`. Never fails; the worst case is an
    /// unclassified result carrying only the interface flags.
    #[instrument(skip(self, params), fields(contract = ?params.contract_address, chain_id = params.chain_id))]
    pub async fn detect(&self, params: &MintRequestParams) -> ContractClassification {
        let address = params.contract_address;

        if let Some(classification) = self.curated(address) {
            info!("{:?} classified as {} from the override table", address, classification.provider);
            return classification;
        }

        if let Some(provider) = params.provider {
            info!("{:?} classified as {} by the caller", address, provider);
            return self.caller_specified(address, provider);
        }

        let support = self.probe.probe_all(address).await;
        debug!(
            "interfaces for {:?}: erc721={} erc1155={} extensions={}",
            address,
            support.is_erc721,
            support.is_erc1155,
            support.extensions.len()
        );

        let classification = self.classify(address, support).await;
        info!("{:?} classified as {}", address, classification.provider);
        classification
    }

    fn curated(&self, address: Address) -> Option<ContractClassification> {
        let entry = self.registry.config().detection_overrides.get(&address)?;
        let mut classification = ContractClassification::unclassified(address, entry.is_erc721, entry.is_erc1155)
            .with_provider(entry.provider);
        classification.extension_address = entry.extension_address;
        Some(classification)
    }

    fn caller_specified(&self, address: Address, provider: ProviderTag) -> ContractClassification {
        let classification = ContractClassification::unclassified(address, false, false).with_provider(provider);
        match (provider, self.registry.config().known_extension()) {
            (ProviderTag::ExtensionClaim, Some(extension)) => classification.with_extension(extension),
            _ => classification,
        }
    }

    async fn classify(&self, address: Address, support: InterfaceSupport) -> ContractClassification {
        let base = ContractClassification::unclassified(address, support.is_erc721, support.is_erc1155);

        if let Some(extension) = self.preferred_extension(&support.extensions) {
            return base.with_provider(ProviderTag::ExtensionClaim).with_extension(extension);
        }

        if self.check(address, &VERSION_PROBE).await {
            return base.with_provider(ProviderTag::SelfDeploy);
        }

        if support.is_erc721 && self.check(address, &ERC721_CLAIM_CONDITION).await {
            // confirmatory only; a failure here never reverses the match
            let confirmed = self.check(address, &ERC721_ACTIVE_CONDITION).await;
            debug!("ERC721 drop on {:?}, active condition confirmed: {}", address, confirmed);
            return base.with_provider(ProviderTag::DropClaim);
        }

        if support.is_erc1155 {
            if let Some(step) = self.first_matching_step(address, &ERC1155_DROP_STEPS).await {
                debug!("ERC1155 drop on {:?} matched by {}", address, step.name);
                return base.with_provider(step.tag);
            }
        }

        base
    }

    /// Allow-listed extension in priority order, else the first installed one
    fn preferred_extension(&self, extensions: &[Address]) -> Option<Address> {
        self.registry
            .config()
            .extension_allow_list
            .iter()
            .find(|known| extensions.contains(known))
            .or_else(|| extensions.first())
            .copied()
    }

    async fn first_matching_step(&self, address: Address, steps: &'static [Step]) -> Option<&'static Step> {
        for step in steps {
            if self.holds(address, &step.rule).await {
                return Some(step);
            }
            debug!("step '{}' did not match {:?}", step.name, address);
        }
        None
    }

    async fn holds(&self, address: Address, rule: &Rule) -> bool {
        match rule {
            Rule::First(probes) => first_success(probes.iter(), |p| async move {
                if self.check(address, p).await {
                    Ok(())
                } else {
                    Err(())
                }
            })
            .await
            .is_some(),
            Rule::Quorum { probes, min } => {
                let mut hits = 0;
                for p in probes.iter() {
                    if self.check(address, p).await {
                        hits += 1;
                        if hits >= *min {
                            return true;
                        }
                    }
                }
                false
            }
            Rule::All(probes) => {
                for p in probes.iter() {
                    if !self.check(address, p).await {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Capability probe: call succeeds and the output has the expected shape
    async fn check(&self, address: Address, probe: &Probe) -> bool {
        let Some(args) = probe.args.tokens() else {
            return false;
        };
        match self.gateway.execute(address, probe.fragment, args).await {
            Ok(tokens) => probe.expect.matches(&tokens),
            Err(_) => false,
        }
    }
}
