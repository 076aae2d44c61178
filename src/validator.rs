//! Caller parameter validation. Pure: no remote calls, inputs are never
//! modified, and "cannot mint" is reported as data.

use ethers::types::U256;
use tracing::debug;

use crate::registry::{ProviderConfig, RequiredParam};
use crate::types::{ContractClassification, MintRequestParams, ProviderTag, ValidationReport};
use crate::utils::{requires_proof, unix_now};

pub struct ParameterValidator;

impl ParameterValidator {
    /// Validate against the wall clock
    pub fn validate_now(
        params: &MintRequestParams,
        classification: &ContractClassification,
        config: &ProviderConfig,
    ) -> ValidationReport {
        Self::validate(params, classification, config, unix_now())
    }

    /// `now` is a unix timestamp in seconds
    pub fn validate(
        params: &MintRequestParams,
        classification: &ContractClassification,
        config: &ProviderConfig,
        now: u64,
    ) -> ValidationReport {
        let missing_params: Vec<String> = config
            .required_params
            .iter()
            .filter(|param| !param.is_present(params))
            .map(|param| param.name().to_string())
            .collect();

        let mut errors = Vec::new();
        let proof_required = classification
            .claim
            .as_ref()
            .is_some_and(|claim| requires_proof(&claim.merkle_root()));

        match classification.provider {
            ProviderTag::ExtensionClaim => {
                if !RequiredParam::InstanceOrTokenId.is_present(params) {
                    errors.push("instanceId or tokenId is required for extension claims".to_string());
                }
                if params.instance_id.is_some() && params.parsed_instance_id().is_none() {
                    errors.push("instanceId must be a non-negative integer".to_string());
                }
                if proof_required {
                    errors.push("merkle-gated claims are not supported".to_string());
                }
            }
            ProviderTag::DropClaim => {
                if proof_required {
                    errors.push("merkle-gated claims are not supported".to_string());
                }
                if let Some(claim) = &classification.claim {
                    if claim.start_time() > U256::from(now) {
                        errors.push(format!("claim has not started (starts at {})", claim.start_time()));
                    }
                }
            }
            ProviderTag::SelfDeploy | ProviderTag::Unclassified => {}
        }

        let report = ValidationReport {
            is_valid: missing_params.is_empty() && errors.is_empty(),
            missing_params,
            errors,
        };
        debug!(
            "Validated {:?} as {}: valid={} missing={:?}",
            classification.contract_address, classification.provider, report.is_valid, report.missing_params
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderConfigRegistry;
    use crate::types::{ClaimAttachment, ClaimCondition, ClaimRecord, PriceQuote};
    use ethers::types::{Address, H256};

    const NOW: u64 = 1_700_000_000;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn classified(provider: ProviderTag) -> ContractClassification {
        ContractClassification::unclassified(addr(1), true, false)
            .with_provider(provider)
            .with_extension(addr(2))
    }

    fn config_for(classification: &ContractClassification, params: &MintRequestParams) -> ProviderConfig {
        ProviderConfigRegistry::default().derive(classification, &PriceQuote::free(), params)
    }

    fn complete() -> MintRequestParams {
        MintRequestParams::new(addr(1), 1).with_recipient(addr(3)).with_amount(1)
    }

    fn check(params: &MintRequestParams, classification: &ContractClassification) -> ValidationReport {
        ParameterValidator::validate(params, classification, &config_for(classification, params), NOW)
    }

    #[test]
    fn test_extension_claim_needs_an_id() {
        let classification = classified(ProviderTag::ExtensionClaim);
        let report = check(&complete(), &classification);

        assert!(!report.is_valid);
        assert_eq!(report.missing_params, vec!["instanceId or tokenId".to_string()]);
        assert!(!report.errors.is_empty());

        let report = check(&complete().with_token_id(U256::from(4)), &classification);
        assert!(report.is_valid, "{:?}", report);
    }

    #[test]
    fn test_extension_claim_rejects_malformed_instance_id() {
        let classification = classified(ProviderTag::ExtensionClaim);

        for bad in ["-1", "twelve", "0x"] {
            let report = check(&complete().with_instance_id(bad), &classification);
            assert!(!report.is_valid);
            assert!(report.errors.iter().any(|e| e.contains("non-negative")));
        }
        assert!(check(&complete().with_instance_id("12"), &classification).is_valid);
    }

    #[test]
    fn test_extension_claim_rejects_merkle_root() {
        let classification = classified(ProviderTag::ExtensionClaim).with_claim(ClaimAttachment::Record(ClaimRecord {
            merkle_root: H256::repeat_byte(0xab),
            ..Default::default()
        }));
        let report = check(&complete().with_instance_id("1"), &classification);

        assert!(!report.is_valid);
        assert!(report.missing_params.is_empty());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_drop_claim_not_started() {
        let classification = classified(ProviderTag::DropClaim).with_claim(ClaimAttachment::Condition(ClaimCondition {
            start_timestamp: U256::from(NOW + 3_600),
            ..Default::default()
        }));
        let report = check(&complete(), &classification);

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("not started")));
    }

    #[test]
    fn test_drop_claim_started_and_open() {
        let classification = classified(ProviderTag::DropClaim).with_claim(ClaimAttachment::Condition(ClaimCondition {
            start_timestamp: U256::from(NOW - 60),
            ..Default::default()
        }));
        assert!(check(&complete(), &classification).is_valid);
    }

    #[test]
    fn test_drop_claim_rejects_merkle_root() {
        let classification = classified(ProviderTag::DropClaim).with_claim(ClaimAttachment::Condition(ClaimCondition {
            merkle_root: H256::repeat_byte(1),
            ..Default::default()
        }));
        let report = check(&complete(), &classification);

        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("merkle")));
    }

    #[test]
    fn test_missing_required_params() {
        let classification = classified(ProviderTag::SelfDeploy);
        let params = MintRequestParams::new(addr(1), 0);
        let report = check(&params, &classification);

        assert!(!report.is_valid);
        assert_eq!(report.missing_params, vec!["chainId", "recipient", "amount"]);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_inputs_are_untouched() {
        let classification = classified(ProviderTag::DropClaim);
        let params = complete();
        let config = config_for(&classification, &params);
        let (before_params, before_classification, before_config) = (params.clone(), classification.clone(), config.clone());

        let _ = ParameterValidator::validate(&params, &classification, &config, NOW);

        assert_eq!(params, before_params);
        assert_eq!(classification, before_classification);
        assert_eq!(config, before_config);
    }
}
