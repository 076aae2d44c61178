pub mod abi;
mod config;

pub use config::{DetectionOverride, RegistryConfig, KNOWN_CLAIM_EXTENSIONS, NATIVE_SENTINEL};

use ethers::abi::Token;
use ethers::types::{Address, U256};
use tracing::debug;

use crate::types::{
    ClaimAttachment, ContractClassification, MintRequestParams, PriceQuote, ProviderTag,
};

/// Request parameter a provider needs before a mint can be submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredParam {
    ContractAddress,
    ChainId,
    Recipient,
    Amount,
    /// Either an instance id or a token id
    InstanceOrTokenId,
}

impl RequiredParam {
    pub fn name(&self) -> &'static str {
        match self {
            RequiredParam::ContractAddress => "contractAddress",
            RequiredParam::ChainId => "chainId",
            RequiredParam::Recipient => "recipient",
            RequiredParam::Amount => "amount",
            RequiredParam::InstanceOrTokenId => "instanceId or tokenId",
        }
    }

    pub fn is_present(&self, params: &MintRequestParams) -> bool {
        match self {
            RequiredParam::ContractAddress => !params.contract_address.is_zero(),
            RequiredParam::ChainId => params.chain_id != 0,
            RequiredParam::Recipient => params.recipient.is_some(),
            RequiredParam::Amount => params.amount.is_some_and(|a| a > 0),
            RequiredParam::InstanceOrTokenId => {
                params.instance_id.as_deref().is_some_and(|s| !s.trim().is_empty()) || params.token_id.is_some()
            }
        }
    }
}

/// Immutable per-provider template
#[derive(Debug)]
pub struct ProviderTemplate {
    pub provider: ProviderTag,
    /// ABI used when the contract is (or is assumed to be) ERC721
    pub abi: &'static [&'static str],
    /// Alternate ABI shape keyed by ERC1155; empty when the provider has one shape
    pub abi_erc1155: &'static [&'static str],
    pub required_params: &'static [RequiredParam],
    /// Ordered price-discovery functions
    pub price_functions: &'static [&'static str],
}

impl ProviderTemplate {
    /// ABI shape matching the detected standard, then the alternate one
    pub fn shapes(&self, erc1155_first: bool) -> [&'static [&'static str]; 2] {
        if erc1155_first && !self.abi_erc1155.is_empty() {
            [self.abi_erc1155, self.abi]
        } else {
            [self.abi, self.abi_erc1155]
        }
    }
}

static EXTENSION_CLAIM: ProviderTemplate = ProviderTemplate {
    provider: ProviderTag::ExtensionClaim,
    abi: &[abi::EXT721_GET_CLAIM, abi::EXT721_GET_CLAIM_FOR_TOKEN, abi::EXT721_MINT, abi::EXT721_MINT_BATCH],
    abi_erc1155: &[abi::EXT1155_GET_CLAIM, abi::EXT1155_GET_CLAIM_FOR_TOKEN, abi::EXT1155_MINT, abi::EXT1155_MINT_BATCH],
    required_params: &[
        RequiredParam::ContractAddress,
        RequiredParam::ChainId,
        RequiredParam::Recipient,
        RequiredParam::Amount,
        RequiredParam::InstanceOrTokenId,
    ],
    price_functions: &[abi::EXT_MINT_FEE],
};

static SELF_DEPLOY: ProviderTemplate = ProviderTemplate {
    provider: ProviderTag::SelfDeploy,
    abi: &[abi::CONTRACT_VERSION, abi::SALE_PRICE, abi::CREATOR_FEE_FOR_AMOUNT, abi::PROTOCOL_FEE, abi::MINT_WITH_REWARDS],
    abi_erc1155: &[],
    required_params: &[RequiredParam::ContractAddress, RequiredParam::ChainId, RequiredParam::Recipient, RequiredParam::Amount],
    price_functions: &[abi::SALE_PRICE],
};

static DROP_CLAIM: ProviderTemplate = ProviderTemplate {
    provider: ProviderTag::DropClaim,
    abi: &[abi::DROP721_CLAIM_CONDITION, abi::DROP721_CONDITION_BY_ID, abi::DROP721_ACTIVE_CONDITION_ID, abi::DROP721_CLAIM],
    abi_erc1155: &[abi::DROP1155_PRICE, abi::DROP1155_MINT_PRICE, abi::DROP1155_CLAIM_CONDITION, abi::DROP1155_CLAIM],
    required_params: &[RequiredParam::ContractAddress, RequiredParam::ChainId, RequiredParam::Recipient, RequiredParam::Amount],
    price_functions: &[abi::DROP1155_PRICE, abi::DROP1155_MINT_PRICE, abi::DROP1155_CLAIM_CONDITION],
};

static UNCLASSIFIED: ProviderTemplate = ProviderTemplate {
    provider: ProviderTag::Unclassified,
    abi: &[abi::GENERIC_MINT],
    abi_erc1155: &[],
    required_params: &[RequiredParam::ContractAddress, RequiredParam::ChainId, RequiredParam::Amount],
    price_functions: &[
        abi::CANDIDATE_MINT_PRICE,
        abi::CANDIDATE_PRICE,
        abi::CANDIDATE_COST,
        abi::CANDIDATE_PUBLIC_SALE_PRICE,
        abi::CANDIDATE_SALE_PRICE,
        abi::CANDIDATE_PRICE_CONSTANT,
    ],
};

/// Self-deploy pricing as discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfDeployPricing {
    /// Flat unit price
    Unit(U256),
    /// Creator fee already computed for the amount, plus a per-unit protocol fee
    Split { creator_fee: U256, protocol_fee: U256 },
}

/// Provider-specific mint call, resolved once per request. Each variant owns
/// its argument builder and value calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintCall {
    ExtensionClaim {
        extension: Address,
        erc1155: bool,
        instance_id: Option<U256>,
        cost: U256,
        fee: U256,
        erc20: Option<Address>,
    },
    SelfDeploy {
        pricing: SelfDeployPricing,
    },
    DropClaim {
        erc1155: bool,
        token_id: U256,
        price_per_token: U256,
        currency: Address,
        native: bool,
    },
    Unclassified {
        unit_price: U256,
    },
}

impl MintCall {
    pub fn provider(&self) -> ProviderTag {
        match self {
            MintCall::ExtensionClaim { .. } => ProviderTag::ExtensionClaim,
            MintCall::SelfDeploy { .. } => ProviderTag::SelfDeploy,
            MintCall::DropClaim { .. } => ProviderTag::DropClaim,
            MintCall::Unclassified { .. } => ProviderTag::Unclassified,
        }
    }

    /// Contract the mint transaction is sent to
    pub fn target(&self, contract: Address) -> Address {
        match self {
            MintCall::ExtensionClaim { extension, .. } => *extension,
            _ => contract,
        }
    }

    /// Fragment of the function to invoke for `amount` units
    pub fn function(&self, amount: u64) -> &'static str {
        match self {
            MintCall::ExtensionClaim { erc1155: false, .. } if amount > 1 => abi::EXT721_MINT_BATCH,
            MintCall::ExtensionClaim { erc1155: true, .. } if amount > 1 => abi::EXT1155_MINT_BATCH,
            MintCall::ExtensionClaim { erc1155: false, .. } => abi::EXT721_MINT,
            MintCall::ExtensionClaim { erc1155: true, .. } => abi::EXT1155_MINT,
            MintCall::SelfDeploy { .. } => abi::MINT_WITH_REWARDS,
            MintCall::DropClaim { erc1155: false, .. } => abi::DROP721_CLAIM,
            MintCall::DropClaim { erc1155: true, .. } => abi::DROP1155_CLAIM,
            MintCall::Unclassified { .. } => abi::GENERIC_MINT,
        }
    }

    /// Argument builder
    pub fn arguments(&self, params: &MintRequestParams) -> Vec<Token> {
        let amount = params.quantity();
        let recipient = Token::Address(params.recipient.unwrap_or_default());
        let proof = Token::Array(
            params
                .merkle_proof
                .iter()
                .flatten()
                .map(|h| Token::FixedBytes(h.as_bytes().to_vec()))
                .collect(),
        );

        match self {
            MintCall::ExtensionClaim { instance_id, .. } => {
                let creator = Token::Address(params.contract_address);
                let instance = Token::Uint(instance_id.unwrap_or_default());
                if amount > 1 {
                    vec![
                        creator,
                        instance,
                        Token::Uint(U256::from(amount)),
                        Token::Array(vec![]),
                        Token::Array(vec![]),
                        recipient,
                    ]
                } else {
                    vec![creator, instance, Token::Uint(U256::zero()), proof, recipient]
                }
            }
            MintCall::SelfDeploy { .. } => vec![
                recipient,
                Token::Uint(U256::from(amount)),
                Token::String(String::new()),
                Token::Address(Address::zero()),
            ],
            MintCall::DropClaim {
                erc1155,
                token_id,
                price_per_token,
                currency,
                ..
            } => {
                let allowlist = Token::Tuple(vec![
                    proof,
                    Token::Uint(U256::zero()),
                    Token::Uint(*price_per_token),
                    Token::Address(*currency),
                ]);
                let mut args = vec![recipient];
                if *erc1155 {
                    args.push(Token::Uint(*token_id));
                }
                args.extend([
                    Token::Uint(U256::from(amount)),
                    Token::Address(*currency),
                    Token::Uint(*price_per_token),
                    allowlist,
                    Token::Bytes(vec![]),
                ]);
                args
            }
            MintCall::Unclassified { .. } => vec![recipient, Token::Uint(U256::from(amount))],
        }
    }

    /// Value calculator: native currency attached to the mint transaction
    pub fn value(&self, amount: u64) -> U256 {
        let amount = U256::from(amount);
        match self {
            MintCall::ExtensionClaim { cost, fee, erc20, .. } => match erc20 {
                Some(_) => *fee,
                None => fee.saturating_add(*cost),
            },
            MintCall::SelfDeploy {
                pricing: SelfDeployPricing::Unit(price),
            } => price.saturating_mul(amount),
            MintCall::SelfDeploy {
                pricing: SelfDeployPricing::Split { creator_fee, protocol_fee },
            } => creator_fee.saturating_add(protocol_fee.saturating_mul(amount)),
            MintCall::DropClaim {
                price_per_token, native, ..
            } => {
                if *native {
                    price_per_token.saturating_mul(amount)
                } else {
                    U256::zero()
                }
            }
            MintCall::Unclassified { unit_price } => unit_price.saturating_mul(amount),
        }
    }
}

/// Template specialized with discovered contract data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: ProviderTag,
    pub contract_address: Address,
    pub abi: Vec<&'static str>,
    pub required_params: Vec<RequiredParam>,
    pub price_functions: Vec<&'static str>,
    pub call: MintCall,
}

impl ProviderConfig {
    pub fn target(&self) -> Address {
        self.call.target(self.contract_address)
    }

    pub fn mint_function(&self, amount: u64) -> &'static str {
        self.call.function(amount)
    }

    pub fn value(&self, amount: u64) -> U256 {
        self.call.value(amount)
    }
}

/// Provider templates plus the deployment data used to specialize them
#[derive(Debug, Clone, Default)]
pub struct ProviderConfigRegistry {
    config: RegistryConfig,
}

impl ProviderConfigRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn template(&self, provider: ProviderTag) -> &'static ProviderTemplate {
        match provider {
            ProviderTag::ExtensionClaim => &EXTENSION_CLAIM,
            ProviderTag::SelfDeploy => &SELF_DEPLOY,
            ProviderTag::DropClaim => &DROP_CLAIM,
            ProviderTag::Unclassified => &UNCLASSIFIED,
        }
    }

    /// Specialize the template for `classification`, substituting the
    /// discovered price and currency. Templates are never modified.
    pub fn derive(
        &self,
        classification: &ContractClassification,
        quote: &PriceQuote,
        params: &MintRequestParams,
    ) -> ProviderConfig {
        let template = self.template(classification.provider);
        let erc1155 = classification.is_erc1155;
        let amount = U256::from(params.quantity());

        let call = match classification.provider {
            ProviderTag::ExtensionClaim => {
                let record = match &classification.claim {
                    Some(ClaimAttachment::Record(record)) => Some(record),
                    _ => None,
                };
                let cost = record.map(|r| r.cost).unwrap_or_default();
                let erc20 = quote.erc20.as_ref().map(|d| d.address);
                let fee = if erc20.is_some() {
                    quote.total_cost
                } else {
                    quote.total_cost.saturating_sub(cost)
                };
                MintCall::ExtensionClaim {
                    extension: classification.extension_address.unwrap_or(classification.contract_address),
                    erc1155,
                    instance_id: params.parsed_instance_id().or(classification.discovered_instance_id()),
                    cost,
                    fee,
                    erc20,
                }
            }
            ProviderTag::SelfDeploy => {
                // a quote whose total is not unit × amount carries a creator fee
                let per_unit = quote.unit_price.saturating_mul(amount);
                let pricing = if per_unit == quote.total_cost {
                    SelfDeployPricing::Unit(quote.unit_price)
                } else {
                    SelfDeployPricing::Split {
                        creator_fee: quote.total_cost.saturating_sub(per_unit),
                        protocol_fee: quote.unit_price,
                    }
                };
                MintCall::SelfDeploy { pricing }
            }
            ProviderTag::DropClaim => {
                let (price, currency) = match &classification.claim {
                    Some(ClaimAttachment::Condition(c)) => (c.price_per_token, c.currency),
                    _ => (quote.unit_price, self.config.native_sentinel),
                };
                let native = self.config.is_native_currency(currency);
                MintCall::DropClaim {
                    erc1155,
                    token_id: params.token_id.unwrap_or_default(),
                    price_per_token: price,
                    currency: if native { self.config.native_sentinel } else { currency },
                    native,
                }
            }
            ProviderTag::Unclassified => MintCall::Unclassified {
                unit_price: unit_from_total(quote, amount),
            },
        };

        debug!(
            "Derived {} config for {:?} (value {})",
            template.provider,
            classification.contract_address,
            call.value(params.quantity())
        );

        let [primary, alternate] = template.shapes(erc1155);
        ProviderConfig {
            provider: template.provider,
            contract_address: classification.contract_address,
            abi: primary.iter().chain(alternate.iter()).copied().collect(),
            required_params: template.required_params.to_vec(),
            price_functions: template.price_functions.to_vec(),
            call,
        }
    }
}

/// Unit price implied by a quote so that `unit × amount` reproduces its total
fn unit_from_total(quote: &PriceQuote, amount: U256) -> U256 {
    if !quote.unit_price.is_zero() && quote.unit_price.saturating_mul(amount) == quote.total_cost {
        quote.unit_price
    } else if amount.is_zero() {
        quote.total_cost
    } else {
        quote.total_cost / amount
    }
}
