//! Price resolution.
//!
//! Each provider has its own protocol (see the submodules). Every protocol
//! ends in a zero-cost or default-fee quote when nothing can be discovered;
//! the only error allowed to abort one is [`PricingError::ConfigInconsistency`],
//! which is converted to the provider's terminal fallback right here.

mod drop;
mod extension;
mod self_deploy;

use std::sync::Arc;

use ethers::abi::Token;
use ethers::types::{Address, U256};
use tracing::{debug, info, instrument, warn};

use crate::error::PricingError;
use crate::evm::gateway::{single_uint, CallGateway, CallRequest, CallResult};
use crate::registry::{abi, ProviderConfigRegistry};
use crate::types::{ClaimAttachment, ContractClassification, Erc20Detail, MintRequestParams, PriceQuote, ProviderTag};

/// Outcome of a pricing protocol, before it is merged into the classification
struct Priced {
    quote: PriceQuote,
    claim: Option<ClaimAttachment>,
}

impl Priced {
    fn quote(quote: PriceQuote) -> Self {
        Self { quote, claim: None }
    }

    fn with_claim(quote: PriceQuote, claim: ClaimAttachment) -> Self {
        Self {
            quote,
            claim: Some(claim),
        }
    }
}

#[derive(Clone)]
pub struct PriceResolver {
    gateway: CallGateway,
    registry: Arc<ProviderConfigRegistry>,
}

impl PriceResolver {
    pub fn new(gateway: CallGateway, registry: Arc<ProviderConfigRegistry>) -> Self {
        Self { gateway, registry }
    }

    /// Price a mint for an already classified contract. Returns the quote
    /// and the classification updated with any discovered claim data.
    #[instrument(
        skip(self, classification, params),
        fields(contract = ?classification.contract_address, provider = %classification.provider)
    )]
    pub async fn resolve(
        &self,
        classification: ContractClassification,
        params: &MintRequestParams,
    ) -> (PriceQuote, ContractClassification) {
        let outcome = match classification.provider {
            ProviderTag::ExtensionClaim => self.extension_claim(&classification, params).await,
            ProviderTag::SelfDeploy => self.self_deploy(&classification, params).await,
            ProviderTag::DropClaim if classification.is_erc1155 => self.drop_erc1155(&classification, params).await,
            ProviderTag::DropClaim => self.drop_erc721(&classification, params).await,
            ProviderTag::Unclassified => self.unclassified(&classification, params).await,
        };

        let priced = match outcome {
            Ok(priced) => priced,
            Err(e) => {
                warn!("Pricing {:?} aborted: {}", classification.contract_address, e);
                Priced::quote(self.terminal_fallback(classification.provider, params, e.to_string()))
            }
        };

        info!(
            "Quote for {:?}: unit {} total {} erc20 {:?}",
            classification.contract_address,
            priced.quote.unit_price,
            priced.quote.total_cost,
            priced.quote.erc20.as_ref().map(|d| d.address)
        );

        let classification = match priced.claim {
            Some(claim) => classification.with_claim(claim),
            None => classification,
        };
        (priced.quote, classification)
    }

    fn terminal_fallback(&self, provider: ProviderTag, params: &MintRequestParams, reason: String) -> PriceQuote {
        let config = self.registry.config();
        match provider {
            ProviderTag::ExtensionClaim => PriceQuote::fallback(config.default_extension_fee, reason),
            ProviderTag::SelfDeploy => self_deploy::default_quote(config, params.quantity(), reason),
            ProviderTag::DropClaim | ProviderTag::Unclassified => PriceQuote::fallback(U256::zero(), reason),
        }
    }

    /// ERC20 leg of a quote. Symbol, decimals, allowance and balance are
    /// fetched concurrently; allowance and balance only when `owner` is known.
    /// Decimals outside a byte are a configuration inconsistency.
    async fn erc20_detail(
        &self,
        token: Address,
        spender: Address,
        owner: Option<Address>,
        cost: U256,
    ) -> Result<Erc20Detail, PricingError> {
        let mut requests = vec![
            CallRequest::new(token, abi::ERC20_SYMBOL, vec![]),
            CallRequest::new(token, abi::ERC20_DECIMALS, vec![]),
        ];
        if let Some(owner) = owner {
            requests.push(CallRequest::new(
                token,
                abi::ERC20_ALLOWANCE,
                vec![Token::Address(owner), Token::Address(spender)],
            ));
            requests.push(CallRequest::new(token, abi::ERC20_BALANCE_OF, vec![Token::Address(owner)]));
        }
        let mut results = self.gateway.execute_batch(requests).await.into_iter();
        let symbol = results.next();
        let decimals = batch_uint(results.next());
        let allowance = owner_amount(token, abi::ERC20_ALLOWANCE, results.next());
        let balance = owner_amount(token, abi::ERC20_BALANCE_OF, results.next());

        let decimals = match decimals {
            Ok(value) if value > U256::from(u8::MAX) => {
                return Err(PricingError::ConfigInconsistency(format!(
                    "decimals {} of {:?} outside 0..=255",
                    value, token
                )))
            }
            Ok(value) => value.low_u32() as u8,
            Err(e) => {
                debug!("decimals() on {:?} failed: {}", token, e);
                self.registry.config().default_erc20_decimals
            }
        };

        let symbol = symbol
            .and_then(Result::ok)
            .and_then(|tokens| tokens.into_iter().next())
            .and_then(Token::into_string)
            .unwrap_or_default();

        Ok(Erc20Detail {
            address: token,
            symbol,
            decimals,
            allowance,
            balance,
            cost,
        })
    }
}

/// Single unsigned integer out of one slot of an `execute_batch` reply
fn batch_uint(result: Option<CallResult>) -> Result<U256, PricingError> {
    let tokens = result.ok_or_else(|| PricingError::shape("missing batch result"))??;
    single_uint(&tokens)
}

/// Allowance or balance; zero when not requested or unreadable
fn owner_amount(token: Address, fragment: &str, result: Option<CallResult>) -> U256 {
    if result.is_none() {
        return U256::zero();
    }
    batch_uint(result).unwrap_or_else(|e| {
        debug!("{} on {:?} failed: {}", fragment, token, e);
        U256::zero()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::CallFailure;
    use crate::evm::mock::MockChain;
    use crate::registry::RegistryConfig;

    pub(crate) fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    pub(crate) fn uint(n: u64) -> Token {
        Token::Uint(U256::from(n))
    }

    pub(crate) fn resolver(chain: MockChain, config: RegistryConfig) -> (PriceResolver, Arc<MockChain>) {
        let chain = Arc::new(chain);
        let resolver = PriceResolver::new(
            CallGateway::new(chain.clone()),
            Arc::new(ProviderConfigRegistry::new(config)),
        );
        (resolver, chain)
    }

    pub(crate) fn erc20(chain: MockChain, token: Address, decimals: u64) -> MockChain {
        chain
            .respond(token, abi::ERC20_SYMBOL, vec![Token::String("USDC".into())])
            .respond(token, abi::ERC20_DECIMALS, vec![uint(decimals)])
            .respond(token, abi::ERC20_ALLOWANCE, vec![uint(50)])
            .respond(token, abi::ERC20_BALANCE_OF, vec![uint(1_000)])
    }

    #[tokio::test]
    async fn test_erc20_detail_with_owner() {
        let (resolver, _) = resolver(erc20(MockChain::new(), addr(9), 6), RegistryConfig::default());
        let detail = resolver
            .erc20_detail(addr(9), addr(2), Some(addr(3)), U256::from(100))
            .await
            .unwrap();

        assert_eq!(detail.symbol, "USDC");
        assert_eq!(detail.decimals, 6);
        assert_eq!(detail.allowance, U256::from(50));
        assert_eq!(detail.balance, U256::from(1_000));
        assert!(detail.needs_approval(detail.cost));
    }

    #[tokio::test]
    async fn test_erc20_detail_without_owner_skips_holdings() {
        let (resolver, chain) = resolver(erc20(MockChain::new(), addr(9), 6), RegistryConfig::default());
        let detail = resolver.erc20_detail(addr(9), addr(2), None, U256::from(100)).await.unwrap();

        assert!(detail.allowance.is_zero());
        assert!(detail.balance.is_zero());
        assert!(!chain.was_called(addr(9), abi::ERC20_ALLOWANCE));
        assert!(!chain.was_called(addr(9), abi::ERC20_BALANCE_OF));
    }

    #[tokio::test]
    async fn test_erc20_detail_defaults_on_failure() {
        let (resolver, _) = resolver(MockChain::new(), RegistryConfig::default());
        let detail = resolver
            .erc20_detail(addr(9), addr(2), Some(addr(3)), U256::one())
            .await
            .unwrap();

        assert_eq!(detail.symbol, "");
        assert_eq!(detail.decimals, 18);
        assert!(detail.allowance.is_zero() && detail.balance.is_zero());
    }

    #[tokio::test]
    async fn test_erc20_decimals_out_of_range() {
        let (resolver, _) = resolver(erc20(MockChain::new(), addr(9), 256), RegistryConfig::default());
        let result = resolver.erc20_detail(addr(9), addr(2), None, U256::one()).await;

        assert!(result.unwrap_err().is_config_inconsistency());
    }

    #[tokio::test]
    async fn test_decimals_at_upper_bound() {
        let (resolver, _) = resolver(erc20(MockChain::new(), addr(9), 255), RegistryConfig::default());
        let detail = resolver.erc20_detail(addr(9), addr(2), None, U256::one()).await.unwrap();

        assert_eq!(detail.decimals, 255);
    }

    #[test]
    fn test_batch_slots() {
        assert_eq!(batch_uint(Some(Ok(vec![uint(6)]))).unwrap(), U256::from(6));
        assert!(batch_uint(None).is_err());
        assert!(batch_uint(Some(Err(CallFailure::Timeout))).is_err());

        assert!(owner_amount(addr(9), abi::ERC20_BALANCE_OF, None).is_zero());
        assert!(owner_amount(addr(9), abi::ERC20_BALANCE_OF, Some(Ok(vec![Token::Bool(true)]))).is_zero());
        assert_eq!(owner_amount(addr(9), abi::ERC20_BALANCE_OF, Some(Ok(vec![uint(3)]))), U256::from(3));
    }
}
