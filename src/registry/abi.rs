//! Human-readable ABI fragments for every function this crate probes,
//! prices with, or hands to the submission layer.

// Standard interfaces
pub const SUPPORTS_INTERFACE: &str = "function supportsInterface(bytes4) view returns (bool)";
pub const GET_EXTENSIONS: &str = "function getExtensions() view returns (address[])";
pub const URI: &str = "function uri(uint256) view returns (string)";
pub const TOTAL_SUPPLY_OF: &str = "function totalSupply(uint256) view returns (uint256)";

pub const ERC721_INTERFACE_ID: [u8; 4] = [0x80, 0xac, 0x58, 0xcd];
pub const ERC1155_INTERFACE_ID: [u8; 4] = [0xd9, 0xb6, 0x7a, 0x26];

// ERC20 leg. `decimals` is read as a full word so out-of-range values are visible.
pub const ERC20_SYMBOL: &str = "function symbol() view returns (string)";
pub const ERC20_DECIMALS: &str = "function decimals() view returns (uint256)";
pub const ERC20_ALLOWANCE: &str = "function allowance(address,address) view returns (uint256)";
pub const ERC20_BALANCE_OF: &str = "function balanceOf(address) view returns (uint256)";

// Extension claim. The flat fee accessor is identical in both shapes.
pub const EXT_MINT_FEE: &str = "function MINT_FEE() view returns (uint256)";

// Extension claim, ERC721 shape
pub const EXT721_GET_CLAIM: &str = "function getClaim(address,uint256) view returns ((uint32,uint32,uint32,uint48,uint48,uint8,bool,bytes32,string,uint256,address,address,address))";
pub const EXT721_GET_CLAIM_FOR_TOKEN: &str = "function getClaimForToken(address,uint256) view returns (uint256,(uint32,uint32,uint32,uint48,uint48,uint8,bool,bytes32,string,uint256,address,address,address))";
pub const EXT721_MINT: &str = "function mint(address,uint256,uint32,bytes32[],address) payable";
pub const EXT721_MINT_BATCH: &str = "function mintBatch(address,uint256,uint16,uint32[],bytes32[][],address) payable";

// Extension claim, ERC1155 shape
pub const EXT1155_GET_CLAIM: &str = "function getClaim(address,uint256) view returns ((uint32,uint32,uint32,uint48,uint48,uint8,bytes32,string,uint256,uint256,address,address,address))";
pub const EXT1155_GET_CLAIM_FOR_TOKEN: &str = "function getClaimForToken(address,uint256) view returns (uint256,(uint32,uint32,uint32,uint48,uint48,uint8,bytes32,string,uint256,uint256,address,address,address))";
pub const EXT1155_MINT: &str = "function mint(address,uint256,uint32,bytes32[],address) payable";
pub const EXT1155_MINT_BATCH: &str = "function mintBatch(address,uint256,uint16,uint32[],bytes32[][],address) payable";

// Self-deploy
pub const CONTRACT_VERSION: &str = "function contractVersion() view returns (uint32)";
pub const SALE_PRICE: &str = "function salePrice() view returns (uint256)";
pub const CREATOR_FEE_FOR_AMOUNT: &str = "function creatorFeeForAmount(uint256) view returns (uint256)";
pub const PROTOCOL_FEE: &str = "function protocolFee() view returns (uint256)";
pub const MINT_WITH_REWARDS: &str = "function mintWithRewards(address,uint256,string,address) payable returns (uint256)";

// Drop claim, ERC721 variant
pub const DROP721_CLAIM_CONDITION: &str = "function claimCondition() view returns (uint256,uint256)";
pub const DROP721_CONDITION_BY_ID: &str = "function getClaimConditionById(uint256) view returns ((uint256,uint256,uint256,uint256,bytes32,uint256,address,string))";
pub const DROP721_ACTIVE_CONDITION_ID: &str = "function getActiveClaimConditionId() view returns (uint256)";
pub const DROP721_CLAIM: &str = "function claim(address,uint256,address,uint256,(bytes32[],uint256,uint256,address),bytes) payable";

// Drop claim, ERC1155 variant
pub const DROP1155_PRICE: &str = "function price() view returns (uint256)";
pub const DROP1155_MINT_PRICE: &str = "function mintPrice() view returns (uint256)";
pub const DROP1155_CLAIM_CONDITION: &str = "function claimCondition(uint256) view returns ((uint256,uint256,uint256,uint256,bytes32,uint256,address,string))";
pub const DROP1155_ACTIVE_CONDITION_ID: &str = "function getActiveClaimConditionId(uint256) view returns (uint256)";
pub const DROP1155_CLAIM: &str = "function claim(address,uint256,uint256,address,uint256,(bytes32[],uint256,uint256,address),bytes) payable";

/// Field of the drop condition tuple holding the unit price
pub const CONDITION_PRICE_FIELD: usize = 5;

// Signature mint
pub const SIG_VERIFY: &str = "function verify((address,address,uint256,address,uint256,string,uint256,uint256,address,uint128,uint128,bytes32),bytes) view returns (bool,address)";
pub const SIG_MINT_WITH_SIGNATURE: &str = "function mintWithSignature((address,address,uint256,address,uint256,string,uint256,uint256,address,uint128,uint128,bytes32),bytes) payable returns (uint256)";

// Drop indicator accessors
pub const CONTRACT_TYPE: &str = "function contractType() view returns (bytes32)";
pub const PRIMARY_SALE_RECIPIENT: &str = "function primarySaleRecipient() view returns (address)";
pub const PLATFORM_FEE_INFO: &str = "function getPlatformFeeInfo() view returns (address,uint16)";
pub const DEFAULT_ROYALTY_INFO: &str = "function getDefaultRoyaltyInfo() view returns (address,uint16)";
pub const CONTRACT_URI: &str = "function contractURI() view returns (string)";
pub const NEXT_TOKEN_ID_TO_MINT: &str = "function nextTokenIdToMint() view returns (uint256)";
pub const BASE_URI_COUNT: &str = "function getBaseURICount() view returns (uint256)";
pub const FLAT_PLATFORM_FEE_INFO: &str = "function getFlatPlatformFeeInfo() view returns (address,uint256)";

// Drop-specific functions, two argument shapes each
pub const SUPPLY_CLAIMED_BY_WALLET_TOKEN: &str = "function getSupplyClaimedByWallet(uint256,uint256,address) view returns (uint256)";
pub const SUPPLY_CLAIMED_BY_WALLET: &str = "function getSupplyClaimedByWallet(uint256,address) view returns (uint256)";
pub const MAX_TOTAL_SUPPLY_TOKEN: &str = "function maxTotalSupply(uint256) view returns (uint256)";
pub const MAX_TOTAL_SUPPLY: &str = "function maxTotalSupply() view returns (uint256)";
pub const SALE_RECIPIENT_TOKEN: &str = "function saleRecipient(uint256) view returns (address)";
pub const SALE_RECIPIENT: &str = "function saleRecipient() view returns (address)";

// Extension management, two output shapes each
pub const ALL_EXTENSIONS_FULL: &str = "function getAllExtensions() view returns (((string,string,address),(bytes4,string)[])[])";
pub const ALL_EXTENSIONS_METADATA: &str = "function getAllExtensions() view returns ((string,string,address)[])";
pub const DEFAULT_EXTENSIONS_FULL: &str = "function defaultExtensions() view returns (((string,string,address),(bytes4,string)[])[])";
pub const DEFAULT_EXTENSIONS_METADATA: &str = "function defaultExtensions() view returns ((string,string,address)[])";

// Extension initialization accessors
pub const IS_TRUSTED_FORWARDER: &str = "function isTrustedForwarder(address) view returns (bool)";
pub const ROYALTY_INFO_FOR_TOKEN: &str = "function getRoyaltyInfoForToken(uint256) view returns (address,uint16)";
pub const PLATFORM_FEE_TYPE: &str = "function getPlatformFeeType() view returns (uint8)";
pub const DEFAULT_ADMIN_ROLE: &str = "function DEFAULT_ADMIN_ROLE() view returns (bytes32)";
pub const HAS_ROLE: &str = "function hasRole(bytes32,address) view returns (bool)";

// Unclassified price candidates
pub const CANDIDATE_MINT_PRICE: &str = "function mintPrice() view returns (uint256)";
pub const CANDIDATE_PRICE: &str = "function price() view returns (uint256)";
pub const CANDIDATE_COST: &str = "function cost() view returns (uint256)";
pub const CANDIDATE_PUBLIC_SALE_PRICE: &str = "function publicSalePrice() view returns (uint256)";
pub const CANDIDATE_SALE_PRICE: &str = "function salePrice() view returns (uint256)";
pub const CANDIDATE_PRICE_CONSTANT: &str = "function PRICE() view returns (uint256)";
pub const GENERIC_MINT: &str = "function mint(address,uint256) payable";

/// ERC165 id of an interface: XOR of its function selectors.
pub fn interface_id(fragments: &[&str]) -> Option<[u8; 4]> {
    fragments.iter().try_fold([0u8; 4], |mut acc, fragment| {
        let selector = crate::evm::gateway::parse_fragment(fragment).ok()?.short_signature();
        acc.iter_mut().zip(selector).for_each(|(a, s)| *a ^= s);
        Some(acc)
    })
}

/// Signature-mint (ERC1155) interface id
pub fn signature_mint_interface_id() -> Option<[u8; 4]> {
    interface_id(&[SIG_MINT_WITH_SIGNATURE, SIG_VERIFY])
}
