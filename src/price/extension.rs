//! Extension-claim pricing.
//!
//! The claim extension ships in an ERC721 and an ERC1155 shape that share
//! selectors but not return layouts. Every call tries the detected shape
//! first and the other one on any failure, decoding included.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use tracing::{debug, warn};

use super::{PriceResolver, Priced};
use crate::error::PricingError;
use crate::evm::gateway::{token_address, token_bytes32, token_string, token_uint};
use crate::registry::abi;
use crate::types::{ClaimAttachment, ClaimRecord, ContractClassification, MintRequestParams, PriceQuote};
use crate::utils::first_success;

#[derive(Debug)]
struct ClaimShape {
    erc1155: bool,
    get_claim: &'static str,
    get_claim_for_token: &'static str,
}

static ERC721_SHAPE: ClaimShape = ClaimShape {
    erc1155: false,
    get_claim: abi::EXT721_GET_CLAIM,
    get_claim_for_token: abi::EXT721_GET_CLAIM_FOR_TOKEN,
};

static ERC1155_SHAPE: ClaimShape = ClaimShape {
    erc1155: true,
    get_claim: abi::EXT1155_GET_CLAIM,
    get_claim_for_token: abi::EXT1155_GET_CLAIM_FOR_TOKEN,
};

fn shapes(erc1155_first: bool) -> [&'static ClaimShape; 2] {
    if erc1155_first {
        [&ERC1155_SHAPE, &ERC721_SHAPE]
    } else {
        [&ERC721_SHAPE, &ERC1155_SHAPE]
    }
}

/// Positions shared by both record layouts
const RECORD_FIELDS: usize = 13;
const COST: usize = 9;
const PAYMENT_RECEIVER: usize = 10;
const ERC20: usize = 11;

#[derive(Debug, Clone, Copy)]
enum Lookup {
    Instance(U256),
    Token(U256),
}

impl Lookup {
    /// A well-formed instance id wins over a token id
    fn from_params(params: &MintRequestParams) -> Option<Self> {
        params
            .parsed_instance_id()
            .map(Lookup::Instance)
            .or(params.token_id.map(Lookup::Token))
    }
}

fn parse_record(shape: &ClaimShape, token: &Token) -> Result<ClaimRecord, PricingError> {
    let fields = match token {
        Token::Tuple(fields) if fields.len() == RECORD_FIELDS => fields,
        _ => return Err(PricingError::shape("claim record is not a 13-field tuple")),
    };
    // the ERC1155 layout has no `identical` flag and carries a token id
    let (merkle_root, location, token_id) = if shape.erc1155 { (6, 7, Some(8)) } else { (7, 8, None) };

    Ok(ClaimRecord {
        instance_id: None,
        total: token_uint(&fields[0], "total")?,
        total_max: token_uint(&fields[1], "totalMax")?,
        wallet_max: token_uint(&fields[2], "walletMax")?,
        start_date: token_uint(&fields[3], "startDate")?,
        end_date: token_uint(&fields[4], "endDate")?,
        merkle_root: token_bytes32(&fields[merkle_root], "merkleRoot")?,
        location: token_string(&fields[location], "location")?,
        token_id: token_id.map(|i| token_uint(&fields[i], "tokenId")).transpose()?,
        cost: token_uint(&fields[COST], "cost")?,
        payment_receiver: token_address(&fields[PAYMENT_RECEIVER], "paymentReceiver")?,
        erc20: token_address(&fields[ERC20], "erc20")?,
    })
}

/// `getClaim` returns the record; `getClaimForToken` returns
/// `(instanceId, record)` and the instance id is adopted from it.
fn parse_lookup(shape: &ClaimShape, lookup: Lookup, tokens: &[Token]) -> Result<ClaimRecord, PricingError> {
    match (lookup, tokens) {
        (Lookup::Instance(id), [record]) => Ok(ClaimRecord {
            instance_id: Some(id),
            ..parse_record(shape, record)?
        }),
        (Lookup::Token(_), [instance, record]) => Ok(ClaimRecord {
            instance_id: Some(token_uint(instance, "instanceId")?),
            ..parse_record(shape, record)?
        }),
        (_, other) => Err(PricingError::shape(format!("unexpected claim lookup output of {} values", other.len()))),
    }
}

impl PriceResolver {
    pub(super) async fn extension_claim(
        &self,
        classification: &ContractClassification,
        params: &MintRequestParams,
    ) -> Result<Priced, PricingError> {
        let creator = classification.contract_address;
        let extension = classification.extension_address.unwrap_or(creator);
        let shapes = shapes(classification.is_erc1155);
        let lookup = Lookup::from_params(params);

        let fee = self.mint_fee(extension).await;
        let record = match lookup {
            Some(lookup) => self.claim_record(extension, creator, lookup, shapes).await,
            None => None,
        };

        let (fee, mut fallback_reason) = match fee {
            Some(fee) => (fee, None),
            // one fee-only retry before the configured default
            None => match self.mint_fee(extension).await {
                Some(fee) => (fee, None),
                None => {
                    warn!("MINT_FEE unreachable on {:?}, using default fee", extension);
                    (
                        self.registry.config().default_extension_fee,
                        Some("mint fee unreachable, default fee applied".to_string()),
                    )
                }
            },
        };

        let Some(record) = record else {
            if lookup.is_some() {
                warn!("No usable claim record on {:?}, pricing fee only", extension);
                fallback_reason.get_or_insert_with(|| "claim record unavailable, fee only".to_string());
            }
            return Ok(Priced::quote(PriceQuote {
                unit_price: U256::zero(),
                total_cost: fee,
                erc20: None,
                fallback_reason,
            }));
        };

        let quote = if record.erc20.is_zero() {
            PriceQuote {
                unit_price: record.cost,
                total_cost: fee.saturating_add(record.cost),
                erc20: None,
                fallback_reason,
            }
        } else {
            let detail = self
                .erc20_detail(record.erc20, extension, params.recipient, record.cost)
                .await?;
            PriceQuote {
                unit_price: record.cost,
                total_cost: fee,
                erc20: Some(detail),
                fallback_reason,
            }
        };

        Ok(Priced::with_claim(quote, ClaimAttachment::Record(record)))
    }

    /// `MINT_FEE` has the same selector and layout in both shapes
    async fn mint_fee(&self, extension: Address) -> Option<U256> {
        match self.gateway.uint(extension, abi::EXT_MINT_FEE, vec![]).await {
            Ok(fee) => Some(fee),
            Err(e) => {
                debug!("MINT_FEE on {:?} failed: {}", extension, e);
                None
            }
        }
    }

    async fn claim_record(
        &self,
        extension: Address,
        creator: Address,
        lookup: Lookup,
        shapes: [&'static ClaimShape; 2],
    ) -> Option<ClaimRecord> {
        let found = first_success(shapes, |shape| async move {
            let (fragment, id) = match lookup {
                Lookup::Instance(id) => (shape.get_claim, id),
                Lookup::Token(id) => (shape.get_claim_for_token, id),
            };
            let tokens = self
                .gateway
                .execute(extension, fragment, vec![Token::Address(creator), Token::Uint(id)])
                .await?;
            parse_lookup(shape, lookup, &tokens)
        })
        .await;

        found.map(|(shape, record)| {
            debug!("Claim record on {:?} decoded with the erc1155={} shape", extension, shape.erc1155);
            record
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::mock::MockChain;
    use crate::price::tests::{addr, erc20, resolver, uint};
    use crate::registry::RegistryConfig;
    use crate::types::ProviderTag;

    const CREATOR: u64 = 0xc0de;
    const EXTENSION: u64 = 0xe7;

    fn classification(erc1155: bool) -> ContractClassification {
        ContractClassification::unclassified(addr(CREATOR), !erc1155, erc1155)
            .with_provider(ProviderTag::ExtensionClaim)
            .with_extension(addr(EXTENSION))
    }

    fn claim721(cost: u64, currency: Address) -> Token {
        Token::Tuple(vec![
            uint(3),
            uint(100),
            uint(2),
            uint(1_700_000_000),
            uint(0),
            uint(1),
            Token::Bool(true),
            Token::FixedBytes(vec![0; 32]),
            Token::String("ipfs://claim".into()),
            uint(cost),
            Token::Address(addr(0xfee)),
            Token::Address(currency),
            Token::Address(Address::zero()),
        ])
    }

    fn claim1155(token_id: U256, cost: u64) -> Token {
        Token::Tuple(vec![
            uint(3),
            uint(100),
            uint(2),
            uint(1_700_000_000),
            uint(0),
            uint(1),
            Token::FixedBytes(vec![0; 32]),
            Token::String("ipfs://claim".into()),
            Token::Uint(token_id),
            uint(cost),
            Token::Address(addr(0xfee)),
            Token::Address(Address::zero()),
            Token::Address(Address::zero()),
        ])
    }

    fn params() -> MintRequestParams {
        MintRequestParams::new(addr(CREATOR), 1)
    }

    #[tokio::test]
    async fn test_native_claim_adds_cost_to_fee() {
        let chain = MockChain::new()
            .respond(addr(EXTENSION), abi::EXT_MINT_FEE, vec![uint(500)])
            .respond_to(
                addr(EXTENSION),
                abi::EXT721_GET_CLAIM,
                vec![Token::Address(addr(CREATOR)), uint(42)],
                vec![claim721(10_000, Address::zero())],
            );
        let (resolver, _) = resolver(chain, RegistryConfig::default());

        let (quote, updated) = resolver
            .resolve(classification(false), &params().with_instance_id("42").with_amount(3))
            .await;

        assert_eq!(quote.total_cost, U256::from(10_500));
        assert!(quote.erc20.is_none());
        assert!(quote.fallback_reason.is_none());
        assert_eq!(updated.discovered_instance_id(), Some(U256::from(42)));
        assert_eq!(updated.provider, ProviderTag::ExtensionClaim);
    }

    #[tokio::test]
    async fn test_token_lookup_adopts_instance_id() {
        let chain = MockChain::new()
            .respond(addr(EXTENSION), abi::EXT_MINT_FEE, vec![uint(500)])
            .respond(
                addr(EXTENSION),
                abi::EXT721_GET_CLAIM_FOR_TOKEN,
                vec![uint(9), claim721(1_000, Address::zero())],
            );
        let (resolver, _) = resolver(chain, RegistryConfig::default());

        let (quote, updated) = resolver
            .resolve(classification(false), &params().with_token_id(U256::from(77)))
            .await;

        assert_eq!(quote.total_cost, U256::from(1_500));
        assert_eq!(updated.discovered_instance_id(), Some(U256::from(9)));
        match updated.claim {
            Some(ClaimAttachment::Record(record)) => assert_eq!(record.cost, U256::from(1_000)),
            other => panic!("expected a claim record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_other_shape() {
        // u256::MAX in the token id slot cannot be read as a string offset,
        // so the ERC721 layout fails to decode this ERC1155 record
        let chain = MockChain::new()
            .respond(addr(EXTENSION), abi::EXT_MINT_FEE, vec![uint(500)])
            .respond(addr(EXTENSION), abi::EXT1155_GET_CLAIM, vec![claim1155(U256::MAX, 2_000)]);
        let (resolver, _) = resolver(chain, RegistryConfig::default());

        let (quote, updated) = resolver
            .resolve(classification(false), &params().with_instance_id("1"))
            .await;

        assert_eq!(quote.total_cost, U256::from(2_500));
        match updated.claim {
            Some(ClaimAttachment::Record(record)) => assert_eq!(record.token_id, Some(U256::MAX)),
            other => panic!("expected a claim record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_erc20_claim_prices_fee_only() {
        let token = addr(0x20);
        let chain = erc20(MockChain::new(), token, 6)
            .respond(addr(EXTENSION), abi::EXT_MINT_FEE, vec![uint(500)])
            .respond(addr(EXTENSION), abi::EXT721_GET_CLAIM, vec![claim721(25, token)]);
        let (resolver, chain) = resolver(chain, RegistryConfig::default());

        let (quote, _) = resolver
            .resolve(classification(false), &params().with_instance_id("5").with_recipient(addr(3)))
            .await;

        assert_eq!(quote.total_cost, U256::from(500));
        let detail = quote.erc20.unwrap();
        assert_eq!(detail.address, token);
        assert_eq!(detail.cost, U256::from(25));
        assert_eq!(detail.decimals, 6);
        assert!(chain.was_called(token, abi::ERC20_ALLOWANCE));
    }

    #[tokio::test]
    async fn test_erc20_bad_decimals_uses_default_fee() {
        let token = addr(0x20);
        let chain = erc20(MockChain::new(), token, 300)
            .respond(addr(EXTENSION), abi::EXT_MINT_FEE, vec![uint(500)])
            .respond(addr(EXTENSION), abi::EXT721_GET_CLAIM, vec![claim721(25, token)]);
        let config = RegistryConfig::default();
        let default_fee = config.default_extension_fee;
        let (resolver, _) = resolver(chain, config);

        let (quote, updated) = resolver.resolve(classification(false), &params().with_instance_id("5")).await;

        assert_eq!(quote.total_cost, default_fee);
        assert!(quote.erc20.is_none());
        assert!(quote.fallback_reason.is_some());
        assert!(updated.claim.is_none());
    }

    #[tokio::test]
    async fn test_malformed_record_degrades_to_fee_only() {
        let chain = MockChain::new()
            .respond(addr(EXTENSION), abi::EXT_MINT_FEE, vec![uint(500)])
            .respond(addr(EXTENSION), abi::EXT721_GET_CLAIM, vec![uint(1)]);
        let (resolver, _) = resolver(chain, RegistryConfig::default());

        let (quote, updated) = resolver.resolve(classification(false), &params().with_instance_id("5")).await;

        assert_eq!(quote.total_cost, U256::from(500));
        assert!(quote.fallback_reason.is_some());
        assert!(updated.claim.is_none());
    }

    #[tokio::test]
    async fn test_fee_only_without_ids() {
        let chain = MockChain::new().respond(addr(EXTENSION), abi::EXT_MINT_FEE, vec![uint(500)]);
        let (resolver, chain) = resolver(chain, RegistryConfig::default());

        let (quote, _) = resolver.resolve(classification(true), &params()).await;

        assert_eq!(quote.total_cost, U256::from(500));
        assert!(quote.fallback_reason.is_none());
        assert!(!chain.was_called(addr(EXTENSION), abi::EXT721_GET_CLAIM));
    }

    #[tokio::test]
    async fn test_unreachable_extension_uses_default_fee() {
        let config = RegistryConfig::default().with_default_extension_fee(U256::from(123));
        let (resolver, chain) = resolver(MockChain::new(), config);

        let (quote, _) = resolver.resolve(classification(false), &params().with_instance_id("5")).await;

        assert_eq!(quote.total_cost, U256::from(123));
        assert!(quote.fallback_reason.is_some());
        // first attempt plus the fee-only retry
        assert_eq!(chain.calls_to(addr(EXTENSION), abi::EXT_MINT_FEE), 2);
    }

    #[test]
    fn test_lookup_prefers_instance_id() {
        let both = params().with_instance_id("3").with_token_id(U256::from(8));
        assert!(matches!(Lookup::from_params(&both), Some(Lookup::Instance(id)) if id == U256::from(3)));

        let malformed = params().with_instance_id("-3").with_token_id(U256::from(8));
        assert!(matches!(Lookup::from_params(&malformed), Some(Lookup::Token(_))));
        assert!(Lookup::from_params(&params()).is_none());
    }
}
