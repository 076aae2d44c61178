//! Ordered probe tables for ERC1155 drop detection. Each step is tried in
//! order by one generic loop; the first step whose rule holds classifies
//! the contract with the step's tag.

use ethers::abi::Token;
use ethers::types::{Address, U256};

use crate::registry::abi;
use crate::types::ProviderTag;

/// Arguments a probe is called with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    Empty,
    /// `uint256(0)`
    TokenZero,
    /// `address(0)`
    ZeroAddress,
    /// `(uint256(0), address(0))`
    ZeroAndAddress,
    /// `(uint256(0), uint256(0), address(0))`
    ZeroZeroAndAddress,
    /// `(bytes32(0), address(0))`
    ZeroRoleAndAddress,
    /// All-zero signature-mint request with an empty signature
    ZeroMintRequest,
    /// The signature-mint ERC165 interface id
    SignatureMintInterface,
}

impl ArgShape {
    /// `None` when the arguments cannot be built
    pub fn tokens(&self) -> Option<Vec<Token>> {
        let zero = || Token::Uint(U256::zero());
        let nobody = || Token::Address(Address::zero());
        let tokens = match self {
            ArgShape::Empty => vec![],
            ArgShape::TokenZero => vec![zero()],
            ArgShape::ZeroAddress => vec![nobody()],
            ArgShape::ZeroAndAddress => vec![zero(), nobody()],
            ArgShape::ZeroZeroAndAddress => vec![zero(), zero(), nobody()],
            ArgShape::ZeroRoleAndAddress => vec![Token::FixedBytes(vec![0u8; 32]), nobody()],
            ArgShape::ZeroMintRequest => vec![zero_mint_request(), Token::Bytes(vec![])],
            ArgShape::SignatureMintInterface => {
                vec![Token::FixedBytes(abi::signature_mint_interface_id()?.to_vec())]
            }
        };
        Some(tokens)
    }
}

fn zero_mint_request() -> Token {
    let zero = || Token::Uint(U256::zero());
    let nobody = || Token::Address(Address::zero());
    Token::Tuple(vec![
        nobody(),
        nobody(),
        zero(),
        nobody(),
        zero(),
        Token::String(String::new()),
        zero(),
        zero(),
        nobody(),
        zero(),
        zero(),
        Token::FixedBytes(vec![0u8; 32]),
    ])
}

/// Output a probe must return to count as a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// Callable without revert
    Any,
    Uint,
    /// Exactly two unsigned integers
    UintPair,
    /// Exactly two values of any type
    Pair,
    True,
    Bool,
    Address,
    Bytes32,
    Str,
    /// A single struct
    Tuple,
    Array,
}

impl OutputShape {
    pub fn matches(&self, tokens: &[Token]) -> bool {
        match (self, tokens) {
            (OutputShape::Any, _) => true,
            (OutputShape::Uint, [Token::Uint(_)]) => true,
            (OutputShape::UintPair, [Token::Uint(_), Token::Uint(_)]) => true,
            (OutputShape::Pair, [_, _]) => true,
            (OutputShape::True, [Token::Bool(true)]) => true,
            (OutputShape::Bool, [Token::Bool(_)]) => true,
            (OutputShape::Address, [Token::Address(_)]) => true,
            (OutputShape::Bytes32, [Token::FixedBytes(b)]) => b.len() == 32,
            (OutputShape::Str, [Token::String(_)]) => true,
            (OutputShape::Tuple, [Token::Tuple(_)]) => true,
            (OutputShape::Array, [Token::Array(_)]) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub fragment: &'static str,
    pub args: ArgShape,
    pub expect: OutputShape,
}

const fn probe(fragment: &'static str, args: ArgShape, expect: OutputShape) -> Probe {
    Probe { fragment, args, expect }
}

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Any single probe succeeding, tried in order
    First(&'static [Probe]),
    /// At least `min` probes succeeding
    Quorum { probes: &'static [Probe], min: usize },
    /// Every probe succeeding, in order
    All(&'static [Probe]),
}

#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub rule: Rule,
    pub tag: ProviderTag,
}

use ArgShape::*;
use OutputShape as Out;

pub const VERSION_PROBE: Probe = probe(abi::CONTRACT_VERSION, Empty, Out::Uint);
pub const ERC721_CLAIM_CONDITION: Probe = probe(abi::DROP721_CLAIM_CONDITION, Empty, Out::UintPair);
pub const ERC721_ACTIVE_CONDITION: Probe = probe(abi::DROP721_ACTIVE_CONDITION_ID, Empty, Out::Uint);

const CLAIM_CONDITION_1155: [Probe; 1] = [probe(abi::DROP1155_CLAIM_CONDITION, TokenZero, Out::Tuple)];
const ACTIVE_CONDITION_1155: [Probe; 1] = [probe(abi::DROP1155_ACTIVE_CONDITION_ID, TokenZero, Out::Uint)];
const SIGNATURE_VERIFY: [Probe; 1] = [probe(abi::SIG_VERIFY, ZeroMintRequest, Out::Any)];
const SIGNATURE_MINT_INTERFACE: [Probe; 1] = [probe(abi::SUPPORTS_INTERFACE, SignatureMintInterface, Out::True)];
const SIGNATURE_MINT: [Probe; 1] = [probe(abi::SIG_MINT_WITH_SIGNATURE, ZeroMintRequest, Out::Any)];
const URI_AND_SUPPLY: [Probe; 2] = [probe(abi::URI, TokenZero, Out::Str), probe(abi::TOTAL_SUPPLY_OF, TokenZero, Out::Uint)];

const INDICATORS: [Probe; 8] = [
    probe(abi::CONTRACT_TYPE, Empty, Out::Bytes32),
    probe(abi::PRIMARY_SALE_RECIPIENT, Empty, Out::Address),
    probe(abi::PLATFORM_FEE_INFO, Empty, Out::Pair),
    probe(abi::DEFAULT_ROYALTY_INFO, Empty, Out::Pair),
    probe(abi::CONTRACT_URI, Empty, Out::Str),
    probe(abi::NEXT_TOKEN_ID_TO_MINT, Empty, Out::Uint),
    probe(abi::BASE_URI_COUNT, Empty, Out::Uint),
    probe(abi::FLAT_PLATFORM_FEE_INFO, Empty, Out::Pair),
];

const DROP_FUNCTIONS: [Probe; 6] = [
    probe(abi::SUPPLY_CLAIMED_BY_WALLET_TOKEN, ZeroZeroAndAddress, Out::Uint),
    probe(abi::SUPPLY_CLAIMED_BY_WALLET, ZeroAndAddress, Out::Uint),
    probe(abi::MAX_TOTAL_SUPPLY_TOKEN, TokenZero, Out::Uint),
    probe(abi::MAX_TOTAL_SUPPLY, Empty, Out::Uint),
    probe(abi::SALE_RECIPIENT_TOKEN, TokenZero, Out::Address),
    probe(abi::SALE_RECIPIENT, Empty, Out::Address),
];

const EXTENSION_MANAGEMENT: [Probe; 4] = [
    probe(abi::ALL_EXTENSIONS_FULL, Empty, Out::Array),
    probe(abi::ALL_EXTENSIONS_METADATA, Empty, Out::Array),
    probe(abi::DEFAULT_EXTENSIONS_FULL, Empty, Out::Array),
    probe(abi::DEFAULT_EXTENSIONS_METADATA, Empty, Out::Array),
];

const EXTENSION_INITIALIZATION: [Probe; 5] = [
    probe(abi::IS_TRUSTED_FORWARDER, ZeroAddress, Out::Bool),
    probe(abi::ROYALTY_INFO_FOR_TOKEN, TokenZero, Out::Pair),
    probe(abi::PLATFORM_FEE_TYPE, Empty, Out::Uint),
    probe(abi::DEFAULT_ADMIN_ROLE, Empty, Out::Bytes32),
    probe(abi::HAS_ROLE, ZeroRoleAndAddress, Out::Bool),
];

/// ERC1155 drop-claim cascade, strict order
pub static ERC1155_DROP_STEPS: [Step; 10] = [
    Step {
        name: "per-token claim condition",
        rule: Rule::First(&CLAIM_CONDITION_1155),
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "active claim condition id",
        rule: Rule::First(&ACTIVE_CONDITION_1155),
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "signature verify",
        rule: Rule::First(&SIGNATURE_VERIFY),
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "drop indicators",
        rule: Rule::Quorum { probes: &INDICATORS, min: 2 },
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "drop functions",
        rule: Rule::First(&DROP_FUNCTIONS),
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "signature mint interface",
        rule: Rule::First(&SIGNATURE_MINT_INTERFACE),
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "signature mint",
        rule: Rule::First(&SIGNATURE_MINT),
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "extension management",
        rule: Rule::First(&EXTENSION_MANAGEMENT),
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "extension initialization",
        rule: Rule::Quorum { probes: &EXTENSION_INITIALIZATION, min: 2 },
        tag: ProviderTag::DropClaim,
    },
    Step {
        name: "token uri and supply",
        rule: Rule::All(&URI_AND_SUPPLY),
        tag: ProviderTag::DropClaim,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::gateway::parse_fragment;

    fn all_probes() -> Vec<Probe> {
        let mut probes = vec![VERSION_PROBE, ERC721_CLAIM_CONDITION, ERC721_ACTIVE_CONDITION];
        for step in ERC1155_DROP_STEPS.iter() {
            match step.rule {
                Rule::First(p) | Rule::All(p) | Rule::Quorum { probes: p, .. } => probes.extend_from_slice(p),
            }
        }
        probes
    }

    #[test]
    fn test_every_probe_encodes() {
        for p in all_probes() {
            let function = parse_fragment(p.fragment).unwrap();
            let args = p.args.tokens().unwrap();
            assert!(function.encode_input(&args).is_ok(), "{} args do not encode", p.fragment);
        }
    }

    #[test]
    fn test_quorum_sizes() {
        assert_eq!(INDICATORS.len(), 8);
        assert_eq!(EXTENSION_INITIALIZATION.len(), 5);
        assert!(ERC1155_DROP_STEPS.iter().all(|s| s.tag == ProviderTag::DropClaim));
    }

    #[test]
    fn test_output_shapes() {
        let one = Token::Uint(U256::one());
        assert!(Out::UintPair.matches(&[one.clone(), one.clone()]));
        assert!(!Out::UintPair.matches(&[one.clone()]));
        assert!(!Out::UintPair.matches(&[one.clone(), Token::Bool(true)]));
        assert!(Out::True.matches(&[Token::Bool(true)]));
        assert!(!Out::True.matches(&[Token::Bool(false)]));
        assert!(Out::Any.matches(&[]));
        assert!(!Out::Bytes32.matches(&[Token::FixedBytes(vec![0; 4])]));
        assert!(Out::Tuple.matches(&[Token::Tuple(vec![one])]));
    }
}
