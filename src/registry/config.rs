use std::collections::HashMap;
use std::str::FromStr;

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::MintError;
use crate::types::ProviderTag;

/// Native currency placeholder used by drop-claim contracts
pub const NATIVE_SENTINEL: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// Known lazy-claim extension deployments (ERC721, ERC1155)
pub const KNOWN_CLAIM_EXTENSIONS: [&str; 2] = [
    "0x23aA05a271DEBFFAA3D75739aF5581f744b326E4",
    "0x26BBEA7803DcAc346D5F5f135b57Cf2c752A02bE",
];

/// Classification forced for an address without any probing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOverride {
    pub provider: ProviderTag,
    #[serde(default)]
    pub is_erc721: bool,
    #[serde(default)]
    pub is_erc1155: bool,
    #[serde(default)]
    pub extension_address: Option<Address>,
}

/// Deployment-specific constants and curated tables. Data only; the
/// detector and resolver read it but never branch on literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Extension-claim fee used when the extension cannot be reached
    pub default_extension_fee: U256,

    /// Self-deploy per-unit creator fee fallback
    pub default_creator_fee: U256,

    /// Self-deploy per-unit protocol fee fallback
    pub default_protocol_fee: U256,

    /// Decimals assumed when an ERC20 does not answer `decimals()`
    pub default_erc20_decimals: u8,

    /// Preferred extension addresses, in priority order
    pub extension_allow_list: Vec<Address>,

    /// Addresses that bypass on-chain detection
    pub detection_overrides: HashMap<Address, DetectionOverride>,

    /// Unit prices forced for ERC1155 drop-claim contracts
    pub drop1155_price_overrides: HashMap<Address, U256>,

    /// "Pay in native currency" placeholder
    pub native_sentinel: Address,
}

fn parse_address(raw: &str) -> Address {
    Address::from_str(raw).unwrap_or_default()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_extension_fee: U256::from(500_000_000_000_000u64), // 0.0005 ETH
            default_creator_fee: U256::zero(),
            default_protocol_fee: U256::from(777_000_000_000_000u64), // 0.000777 ETH
            default_erc20_decimals: 18,
            extension_allow_list: KNOWN_CLAIM_EXTENSIONS.iter().map(|a| parse_address(a)).collect(),
            detection_overrides: HashMap::new(),
            drop1155_price_overrides: HashMap::new(),
            native_sentinel: parse_address(NATIVE_SENTINEL),
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; missing fields keep their defaults
    pub fn from_json(raw: &str) -> Result<Self, MintError> {
        serde_json::from_str(raw).map_err(|e| MintError::Configuration(format!("invalid registry config: {}", e)))
    }

    /// Everything free unless discovered on chain
    pub fn zero_fees() -> Self {
        Self {
            default_extension_fee: U256::zero(),
            default_creator_fee: U256::zero(),
            default_protocol_fee: U256::zero(),
            ..Self::default()
        }
    }

    pub fn with_default_extension_fee(mut self, fee: U256) -> Self {
        self.default_extension_fee = fee;
        self
    }

    pub fn with_default_self_deploy_fees(mut self, creator_fee: U256, protocol_fee: U256) -> Self {
        self.default_creator_fee = creator_fee;
        self.default_protocol_fee = protocol_fee;
        self
    }

    pub fn with_extension_allow_list(mut self, list: Vec<Address>) -> Self {
        self.extension_allow_list = list;
        self
    }

    pub fn with_detection_override(mut self, address: Address, entry: DetectionOverride) -> Self {
        self.detection_overrides.insert(address, entry);
        self
    }

    pub fn with_drop1155_price_override(mut self, address: Address, price: U256) -> Self {
        self.drop1155_price_overrides.insert(address, price);
        self
    }

    /// Zero address and the sentinel both mean native currency
    pub fn is_native_currency(&self, currency: Address) -> bool {
        currency.is_zero() || currency == self.native_sentinel
    }

    /// Extension address the registry attaches when the caller names the
    /// extension-claim provider explicitly
    pub fn known_extension(&self) -> Option<Address> {
        self.extension_allow_list.first().copied()
    }
}
