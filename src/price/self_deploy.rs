//! Self-deploy pricing: flat sale price, then creator + protocol fees, then
//! the configured defaults. The first pattern that answers wins.

use ethers::abi::Token;
use ethers::types::U256;
use tracing::{debug, warn};

use super::{batch_uint, PriceResolver, Priced};
use crate::error::PricingError;
use crate::evm::CallRequest;
use crate::registry::{abi, RegistryConfig};
use crate::types::{ContractClassification, MintRequestParams, PriceQuote};

/// Default creator and protocol fees for `amount` units
pub(super) fn default_quote(config: &RegistryConfig, amount: u64, reason: impl Into<String>) -> PriceQuote {
    let unit = config.default_creator_fee.saturating_add(config.default_protocol_fee);
    PriceQuote {
        unit_price: unit,
        total_cost: unit.saturating_mul(U256::from(amount)),
        erc20: None,
        fallback_reason: Some(reason.into()),
    }
}

impl PriceResolver {
    pub(super) async fn self_deploy(
        &self,
        classification: &ContractClassification,
        params: &MintRequestParams,
    ) -> Result<Priced, PricingError> {
        let contract = classification.contract_address;
        let amount = params.quantity();
        let units = U256::from(amount);

        match self.gateway.uint(contract, abi::SALE_PRICE, vec![]).await {
            Ok(price) => return Ok(Priced::quote(PriceQuote::native(price, price.saturating_mul(units)))),
            Err(e) => debug!("salePrice() on {:?} unavailable: {}", contract, e),
        }

        let mut fees = self
            .gateway
            .execute_batch(vec![
                CallRequest::new(contract, abi::CREATOR_FEE_FOR_AMOUNT, vec![Token::Uint(units)]),
                CallRequest::new(contract, abi::PROTOCOL_FEE, vec![]),
            ])
            .await
            .into_iter();
        let (creator_fee, protocol_fee) = (batch_uint(fees.next()), batch_uint(fees.next()));

        match (creator_fee, protocol_fee) {
            (Ok(creator_fee), Ok(protocol_fee)) => Ok(Priced::quote(PriceQuote::native(
                protocol_fee,
                creator_fee.saturating_add(protocol_fee.saturating_mul(units)),
            ))),
            (creator_fee, protocol_fee) => {
                warn!(
                    "Fee accessors on {:?} unavailable (creator ok: {}, protocol ok: {}), using defaults",
                    contract,
                    creator_fee.is_ok(),
                    protocol_fee.is_ok()
                );
                Ok(Priced::quote(default_quote(
                    self.registry.config(),
                    amount,
                    "fee accessors unavailable, default fees applied",
                )))
            }
        }
    }
}
