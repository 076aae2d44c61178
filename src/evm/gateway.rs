//! Single read-only call execution.
//!
//! The gateway is the only place where a remote call can fail; it turns
//! every failure (revert, timeout, undecodable output, bad fragment) into a
//! tagged [`CallFailure`] value so callers decide their fallback explicitly.

use std::sync::Arc;

use ethers::abi::{Function, HumanReadableParser, ParamType, Token};
use ethers::types::{Address, Bytes, H256, U256};
use futures::future::join_all;
use tracing::trace;

use crate::error::{CallFailure, PricingError};
use crate::evm::clients::RawCaller;

pub type CallResult = Result<Vec<Token>, CallFailure>;

/// One call in a concurrent batch
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub address: Address,
    pub fragment: &'static str,
    pub args: Vec<Token>,
}

impl CallRequest {
    pub fn new(address: Address, fragment: &'static str, args: Vec<Token>) -> Self {
        Self { address, fragment, args }
    }
}

#[derive(Clone)]
pub struct CallGateway {
    caller: Arc<dyn RawCaller>,
}

impl CallGateway {
    pub fn new(caller: Arc<dyn RawCaller>) -> Self {
        Self { caller }
    }

    /// Executes `fragment` (human-readable ABI, e.g.
    /// `"function MINT_FEE() view returns (uint256)"`) against `address`.
    pub async fn execute(&self, address: Address, fragment: &str, args: Vec<Token>) -> CallResult {
        let function = parse_fragment(fragment)?;
        let data = function
            .encode_input(&args)
            .map_err(|e| CallFailure::InvalidFragment(format!("{}: {}", function.name, e)))?;

        let output = self.caller.call(address, Bytes::from(data)).await?;
        if output.is_empty() {
            trace!("{} on {:?} returned no data", function.name, address);
            return Err(CallFailure::Undecodable("empty return data".to_string()));
        }
        if let Some(expected) = encoded_size(&function) {
            if output.len() != expected {
                return Err(CallFailure::Undecodable(format!(
                    "{} returned {} bytes, expected {}",
                    function.name,
                    output.len(),
                    expected
                )));
            }
        }

        let tokens = function.decode_output(&output)?;
        trace!("{} on {:?} returned {} tokens", function.name, address, tokens.len());
        Ok(tokens)
    }

    /// Dispatches independent calls concurrently. Results keep request order
    /// and one failure never affects its siblings.
    pub async fn execute_batch(&self, requests: Vec<CallRequest>) -> Vec<CallResult> {
        join_all(
            requests
                .into_iter()
                .map(|req| async move { self.execute(req.address, req.fragment, req.args).await }),
        )
        .await
    }

    /// Executes and expects a single unsigned integer.
    pub async fn uint(&self, address: Address, fragment: &str, args: Vec<Token>) -> Result<U256, PricingError> {
        let tokens = self.execute(address, fragment, args).await?;
        single_uint(&tokens)
    }
}

/// Parses a human-readable fragment. Tuple parameters and outputs are kept
/// as single tuple values.
pub fn parse_fragment(fragment: &str) -> Result<Function, CallFailure> {
    HumanReadableParser::parse_function(fragment)
        .map_err(|e| CallFailure::InvalidFragment(format!("{}: {}", fragment, e)))
}

/// Exact return size of a function whose outputs are all statically sized.
/// `None` when any output is dynamic.
fn encoded_size(function: &Function) -> Option<usize> {
    function.outputs.iter().map(|p| static_size(&p.kind)).sum()
}

fn static_size(kind: &ParamType) -> Option<usize> {
    match kind {
        ParamType::Address | ParamType::Bool | ParamType::Int(_) | ParamType::Uint(_) | ParamType::FixedBytes(_) => {
            Some(32)
        }
        ParamType::FixedArray(inner, len) => static_size(inner).map(|size| size * len),
        ParamType::Tuple(kinds) => kinds.iter().map(static_size).sum(),
        ParamType::Bytes | ParamType::String | ParamType::Array(_) => None,
    }
}

pub fn single_uint(tokens: &[Token]) -> Result<U256, PricingError> {
    match tokens {
        [Token::Uint(value)] => Ok(*value),
        other => Err(PricingError::shape(format!("expected one uint, got {:?}", other))),
    }
}

pub fn token_uint(token: &Token, field: &str) -> Result<U256, PricingError> {
    token
        .clone()
        .into_uint()
        .ok_or_else(|| PricingError::shape(format!("{} is not numeric", field)))
}

pub fn token_address(token: &Token, field: &str) -> Result<Address, PricingError> {
    token
        .clone()
        .into_address()
        .ok_or_else(|| PricingError::shape(format!("{} is not an address", field)))
}

pub fn token_bytes32(token: &Token, field: &str) -> Result<H256, PricingError> {
    match token {
        Token::FixedBytes(bytes) if bytes.len() == 32 => Ok(H256::from_slice(bytes)),
        _ => Err(PricingError::shape(format!("{} is not bytes32", field))),
    }
}

pub fn token_string(token: &Token, field: &str) -> Result<String, PricingError> {
    token
        .clone()
        .into_string()
        .ok_or_else(|| PricingError::shape(format!("{} is not a string", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::mock::MockChain;

    const FEE: &str = "function MINT_FEE() view returns (uint256)";
    const PAIR: &str = "function claimCondition() view returns (uint256,uint256)";

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[tokio::test]
    async fn test_execute_decodes_output() {
        let chain = MockChain::new().respond(addr(1), FEE, vec![Token::Uint(U256::from(500))]);
        let gateway = CallGateway::new(Arc::new(chain));

        let tokens = gateway.execute(addr(1), FEE, vec![]).await.unwrap();
        assert_eq!(tokens, vec![Token::Uint(U256::from(500))]);
        assert_eq!(gateway.uint(addr(1), FEE, vec![]).await.unwrap(), U256::from(500));
    }

    #[tokio::test]
    async fn test_execute_reports_failures_as_values() {
        let chain = MockChain::new()
            .revert(addr(1), FEE)
            .respond(addr(2), FEE, vec![Token::Uint(U256::one())]);
        let gateway = CallGateway::new(Arc::new(chain));

        assert!(matches!(gateway.execute(addr(1), FEE, vec![]).await, Err(CallFailure::Reverted(_))));
        // unscripted contract
        assert!(gateway.execute(addr(3), FEE, vec![]).await.is_err());
        assert!(gateway.execute(addr(2), FEE, vec![]).await.is_ok());
    }

    #[tokio::test]
    async fn test_short_output_is_undecodable() {
        let chain = MockChain::new().respond(addr(1), PAIR, vec![Token::Uint(U256::one())]);
        let gateway = CallGateway::new(Arc::new(chain));

        assert!(matches!(gateway.execute(addr(1), PAIR, vec![]).await, Err(CallFailure::Undecodable(_))));
    }

    #[tokio::test]
    async fn test_trailing_words_are_undecodable() {
        let three_words = ethers::abi::encode(&[Token::Uint(U256::one()), Token::Uint(U256::one()), Token::Uint(U256::one())]);
        let chain = MockChain::new().respond_raw(addr(1), PAIR, three_words);
        let gateway = CallGateway::new(Arc::new(chain));

        assert!(matches!(gateway.execute(addr(1), PAIR, vec![]).await, Err(CallFailure::Undecodable(_))));
    }

    #[test]
    fn test_tuples_stay_grouped() {
        let claim = parse_fragment(
            "function claim(address,uint256,address,uint256,(bytes32[],uint256,uint256,address),bytes) payable",
        )
        .unwrap();
        assert_eq!(claim.inputs.len(), 6);

        let lookup = parse_fragment(
            "function getClaimForToken(address,uint256) view returns (uint256,(uint32,uint32,bytes32,string))",
        )
        .unwrap();
        assert_eq!(lookup.outputs.len(), 2);
        assert!(matches!(lookup.outputs[1].kind, ParamType::Tuple(ref fields) if fields.len() == 4));
        assert_eq!(encoded_size(&lookup), None);
        assert_eq!(encoded_size(&parse_fragment(PAIR).unwrap()), Some(64));
    }

    #[tokio::test]
    async fn test_invalid_fragment() {
        let gateway = CallGateway::new(Arc::new(MockChain::new()));
        let result = gateway.execute(addr(1), "function broken(", vec![]).await;
        assert!(matches!(result, Err(CallFailure::InvalidFragment(_))));
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let chain = MockChain::new()
            .respond(addr(1), FEE, vec![Token::Uint(U256::from(7))])
            .revert(addr(2), FEE);
        let gateway = CallGateway::new(Arc::new(chain));

        let results = gateway
            .execute_batch(vec![
                CallRequest::new(addr(2), FEE, vec![]),
                CallRequest::new(addr(1), FEE, vec![]),
            ])
            .await;

        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap(), &vec![Token::Uint(U256::from(7))]);
    }

    #[test]
    fn test_single_uint_shape() {
        assert!(single_uint(&[Token::Uint(U256::one())]).is_ok());
        assert!(single_uint(&[Token::Bool(true)]).is_err());
        assert!(single_uint(&[Token::Uint(U256::one()), Token::Uint(U256::one())]).is_err());
    }
}
