//! Drop-claim pricing (ERC721 and ERC1155 variants) and the best-effort
//! unclassified protocol.

use ethers::abi::Token;
use ethers::types::U256;
use tracing::{debug, warn};

use super::{PriceResolver, Priced};
use crate::error::PricingError;
use crate::evm::gateway::{token_address, token_bytes32, token_string, token_uint};
use crate::registry::{abi, MintCall};
use crate::types::{ClaimAttachment, ClaimCondition, ContractClassification, MintRequestParams, PriceQuote, ProviderTag};
use crate::utils::first_success;

const CONDITION_FIELDS: usize = 8;

fn parse_condition(tokens: &[Token]) -> Result<ClaimCondition, PricingError> {
    let fields = match tokens {
        [Token::Tuple(fields)] if fields.len() == CONDITION_FIELDS => fields,
        other => return Err(PricingError::shape(format!("claim condition is not an 8-field tuple: {:?}", other))),
    };
    Ok(ClaimCondition {
        start_timestamp: token_uint(&fields[0], "startTimestamp")?,
        max_claimable_supply: token_uint(&fields[1], "maxClaimableSupply")?,
        supply_claimed: token_uint(&fields[2], "supplyClaimed")?,
        quantity_limit_per_wallet: token_uint(&fields[3], "quantityLimitPerWallet")?,
        merkle_root: token_bytes32(&fields[4], "merkleRoot")?,
        price_per_token: token_uint(&fields[abi::CONDITION_PRICE_FIELD], "pricePerToken")?,
        currency: token_address(&fields[6], "currency")?,
        metadata: token_string(&fields[7], "metadata")?,
    })
}

impl PriceResolver {
    pub(super) async fn drop_erc1155(
        &self,
        classification: &ContractClassification,
        params: &MintRequestParams,
    ) -> Result<Priced, PricingError> {
        let contract = classification.contract_address;
        let units = U256::from(params.quantity());

        if let Some(price) = self.registry.config().drop1155_price_overrides.get(&contract) {
            debug!("Using curated price {} for {:?}", price, contract);
            return Ok(Priced::quote(PriceQuote::native(*price, price.saturating_mul(units))));
        }

        let accessors = [abi::DROP1155_PRICE, abi::DROP1155_MINT_PRICE];
        if let Some((fragment, price)) =
            first_success(accessors, |fragment| self.gateway.uint(contract, fragment, vec![])).await
        {
            debug!("{} on {:?} returned {}", fragment, contract, price);
            return Ok(Priced::quote(PriceQuote::native(price, price.saturating_mul(units))));
        }

        let condition = self
            .gateway
            .execute(contract, abi::DROP1155_CLAIM_CONDITION, vec![Token::Uint(U256::zero())])
            .await
            .map_err(PricingError::from)
            .and_then(|tokens| parse_condition(&tokens));

        match condition {
            Ok(condition) => {
                let price = condition.price_per_token;
                Ok(Priced::with_claim(
                    PriceQuote::native(price, price.saturating_mul(units)),
                    ClaimAttachment::Condition(condition),
                ))
            }
            Err(e) => {
                warn!("No price discoverable on {:?} ({}), treating as free", contract, e);
                Ok(Priced::quote(PriceQuote::fallback(U256::zero(), "no price accessor answered")))
            }
        }
    }

    pub(super) async fn drop_erc721(
        &self,
        classification: &ContractClassification,
        params: &MintRequestParams,
    ) -> Result<Priced, PricingError> {
        let contract = classification.contract_address;

        let (start_id, count) = match self.gateway.execute(contract, abi::DROP721_CLAIM_CONDITION, vec![]).await {
            Ok(tokens) => match tokens.as_slice() {
                [Token::Uint(start_id), Token::Uint(count)] => (*start_id, *count),
                other => {
                    warn!("claimCondition() on {:?} returned {:?}", contract, other);
                    return Ok(Priced::quote(PriceQuote::fallback(U256::zero(), "malformed claim condition")));
                }
            },
            Err(e) => {
                warn!("claimCondition() on {:?} failed: {}", contract, e);
                return Ok(Priced::quote(PriceQuote::fallback(U256::zero(), "claim condition unavailable")));
            }
        };

        if count.is_zero() {
            debug!("{:?} has no claim conditions", contract);
            return Ok(Priced::quote(PriceQuote::free()));
        }

        // latest condition
        let index = start_id.saturating_add(count - 1);
        let condition = self
            .gateway
            .execute(contract, abi::DROP721_CONDITION_BY_ID, vec![Token::Uint(index)])
            .await
            .map_err(PricingError::from)
            .and_then(|tokens| parse_condition(&tokens));
        let condition = match condition {
            Ok(condition) => condition,
            Err(e) => {
                warn!("Condition {} on {:?} unusable: {}", index, contract, e);
                return Ok(Priced::quote(PriceQuote::fallback(U256::zero(), "claim condition unavailable")));
            }
        };

        let price = condition.price_per_token;
        let cost = price.saturating_mul(U256::from(params.quantity()));

        let quote = if self.registry.config().is_native_currency(condition.currency) {
            PriceQuote::native(price, cost)
        } else {
            let detail = self.erc20_detail(condition.currency, contract, params.recipient, cost).await?;
            PriceQuote {
                unit_price: price,
                total_cost: U256::zero(),
                erc20: Some(detail),
                fallback_reason: None,
            }
        };

        Ok(Priced::with_claim(quote, ClaimAttachment::Condition(condition)))
    }

    pub(super) async fn unclassified(
        &self,
        classification: &ContractClassification,
        params: &MintRequestParams,
    ) -> Result<Priced, PricingError> {
        let contract = classification.contract_address;
        let candidates = self.registry.template(ProviderTag::Unclassified).price_functions;

        let found = first_success(candidates.iter().copied(), |fragment| {
            self.gateway.uint(contract, fragment, vec![])
        })
        .await;

        match found {
            Some((fragment, unit_price)) => {
                debug!("{} on {:?} returned {}", fragment, contract, unit_price);
                let total = MintCall::Unclassified { unit_price }.value(params.quantity());
                Ok(Priced::quote(PriceQuote::native(unit_price, total)))
            }
            None => Ok(Priced::quote(PriceQuote::fallback(U256::zero(), "no price accessor answered"))),
        }
    }
}
