//! Request, classification and quote types shared by the detector, the
//! price resolver and the validator.

use std::fmt;
use std::str::FromStr;

use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Minting convention a contract follows. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderTag {
    /// Base contract delegating claims to an installed extension contract
    ExtensionClaim,
    /// Self-deployed drop contract exposing a version accessor
    SelfDeploy,
    /// Claim-condition based drop (ERC721 or ERC1155 variant)
    DropClaim,
    Unclassified,
}

impl ProviderTag {
    pub const ALL: [ProviderTag; 4] = [
        ProviderTag::ExtensionClaim,
        ProviderTag::SelfDeploy,
        ProviderTag::DropClaim,
        ProviderTag::Unclassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTag::ExtensionClaim => "extension-claim",
            ProviderTag::SelfDeploy => "self-deploy",
            ProviderTag::DropClaim => "drop-claim",
            ProviderTag::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown provider: {}", s))
    }
}

/// What the caller wants to mint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MintRequestParams {
    pub contract_address: Address,
    pub chain_id: u64,
    /// Explicit provider; skips on-chain detection when set
    pub provider: Option<ProviderTag>,
    pub recipient: Option<Address>,
    pub amount: Option<u64>,
    pub token_id: Option<U256>,
    /// Raw instance id as supplied by the caller; validated before use
    pub instance_id: Option<String>,
    pub merkle_proof: Option<Vec<H256>>,
}

impl MintRequestParams {
    pub fn new(contract_address: Address, chain_id: u64) -> Self {
        Self {
            contract_address,
            chain_id,
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: ProviderTag) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_token_id(mut self, token_id: U256) -> Self {
        self.token_id = Some(token_id);
        self
    }

    pub fn with_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_id = Some(instance_id.into());
        self
    }

    /// Amount used for pricing. Absent amounts price a single unit.
    pub fn quantity(&self) -> u64 {
        self.amount.unwrap_or(1)
    }

    /// Instance id parsed as a non-negative decimal (or 0x-hex) integer.
    /// `None` when absent or malformed.
    pub fn parsed_instance_id(&self) -> Option<U256> {
        self.instance_id.as_deref().and_then(parse_instance_id)
    }
}

pub(crate) fn parse_instance_id(raw: &str) -> Option<U256> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(hex) = raw.strip_prefix("0x") {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return U256::from_str_radix(hex, 16).ok();
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(raw).ok()
}

/// Claim condition of a drop-claim contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCondition {
    pub start_timestamp: U256,
    pub max_claimable_supply: U256,
    pub supply_claimed: U256,
    pub quantity_limit_per_wallet: U256,
    pub merkle_root: H256,
    pub price_per_token: U256,
    pub currency: Address,
    pub metadata: String,
}

/// Claim record of an extension-claim instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub instance_id: Option<U256>,
    pub total: U256,
    pub total_max: U256,
    pub wallet_max: U256,
    pub start_date: U256,
    pub end_date: U256,
    pub merkle_root: H256,
    pub location: String,
    /// Only present in the ERC1155 shape
    pub token_id: Option<U256>,
    pub cost: U256,
    pub payment_receiver: Address,
    pub erc20: Address,
}

/// Pricing data discovered for a contract and attached to its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimAttachment {
    Condition(ClaimCondition),
    Record(ClaimRecord),
}

impl ClaimAttachment {
    pub fn merkle_root(&self) -> H256 {
        match self {
            ClaimAttachment::Condition(c) => c.merkle_root,
            ClaimAttachment::Record(r) => r.merkle_root,
        }
    }

    pub fn start_time(&self) -> U256 {
        match self {
            ClaimAttachment::Condition(c) => c.start_timestamp,
            ClaimAttachment::Record(r) => r.start_date,
        }
    }
}

/// Result of platform detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractClassification {
    pub contract_address: Address,
    pub provider: ProviderTag,
    pub is_erc721: bool,
    pub is_erc1155: bool,
    pub extension_address: Option<Address>,
    pub claim: Option<ClaimAttachment>,
}

impl ContractClassification {
    pub fn unclassified(contract_address: Address, is_erc721: bool, is_erc1155: bool) -> Self {
        Self {
            contract_address,
            provider: ProviderTag::Unclassified,
            is_erc721,
            is_erc1155,
            extension_address: None,
            claim: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderTag) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_extension(mut self, extension: Address) -> Self {
        self.extension_address = Some(extension);
        self
    }

    /// Merge discovered pricing data, returning the updated classification.
    pub fn with_claim(self, claim: ClaimAttachment) -> Self {
        Self {
            claim: Some(claim),
            ..self
        }
    }

    /// Instance id discovered while pricing an extension claim
    pub fn discovered_instance_id(&self) -> Option<U256> {
        match &self.claim {
            Some(ClaimAttachment::Record(record)) => record.instance_id,
            _ => None,
        }
    }
}

/// ERC20 leg of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Detail {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub allowance: U256,
    pub balance: U256,
    /// Token amount owed for the whole mint
    pub cost: U256,
}

impl Erc20Detail {
    pub fn needs_approval(&self, required: U256) -> bool {
        self.allowance < required
    }

    pub fn has_sufficient_balance(&self) -> bool {
        self.balance >= self.cost
    }
}

/// Price of a mint. Always produced, zero cost when nothing could be discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub unit_price: U256,
    /// Total cost in the chain's native currency
    pub total_cost: U256,
    pub erc20: Option<Erc20Detail>,
    /// Set when the pricing branch degraded to a fallback
    pub fallback_reason: Option<String>,
}

impl PriceQuote {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn native(unit_price: U256, total_cost: U256) -> Self {
        Self {
            unit_price,
            total_cost,
            ..Default::default()
        }
    }

    pub fn fallback(total_cost: U256, reason: impl Into<String>) -> Self {
        Self {
            unit_price: U256::zero(),
            total_cost,
            erc20: None,
            fallback_reason: Some(reason.into()),
        }
    }

    pub fn is_free(&self) -> bool {
        self.total_cost.is_zero() && self.erc20.is_none()
    }
}

/// Outcome of parameter validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub missing_params: Vec<String>,
    pub errors: Vec<String>,
}
