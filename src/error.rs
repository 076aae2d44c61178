use ethers::providers::{ProviderError, RpcError as _};
use thiserror::Error;

/// Failure of a single read-only call. Always absorbed by the caller and
/// turned into "capability absent" or the next fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// The node answered with an execution error
    #[error("call reverted: {0}")]
    Reverted(String),

    /// Transport-level failure (connection, HTTP, serialization)
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within the gateway timeout
    #[error("call timed out")]
    Timeout,

    /// The call succeeded but the return data does not match the fragment
    #[error("undecodable output: {0}")]
    Undecodable(String),

    /// The human-readable ABI fragment could not be parsed or encoded
    #[error("invalid fragment: {0}")]
    InvalidFragment(String),
}

/// Errors raised inside a pricing protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error(transparent)]
    Call(#[from] CallFailure),

    /// A call succeeded but returned the wrong arity or type
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Discovered on-chain data is internally inconsistent. The only class
    /// allowed to abort a pricing branch.
    #[error("inconsistent contract configuration: {0}")]
    ConfigInconsistency(String),
}

impl PricingError {
    pub fn shape(msg: impl Into<String>) -> Self {
        PricingError::ShapeMismatch(msg.into())
    }

    pub fn is_config_inconsistency(&self) -> bool {
        matches!(self, PricingError::ConfigInconsistency(_))
    }
}

/// Crate-level error, only surfaced while constructing the engine.
#[derive(Error, Debug)]
pub enum MintError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Call(#[from] CallFailure),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl From<ProviderError> for CallFailure {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::JsonRpcClientError(e) => match e.as_error_response() {
                Some(resp) => CallFailure::Reverted(resp.message.clone()),
                None => CallFailure::Transport(e.to_string()),
            },
            ProviderError::SerdeJson(e) => CallFailure::Transport(format!("serialization: {}", e)),
            ProviderError::HTTPError(e) => CallFailure::Transport(e.to_string()),
            ProviderError::HexError(e) => CallFailure::Undecodable(format!("hex: {}", e)),
            _ => CallFailure::Transport(format!("provider error: {:?}", error)),
        }
    }
}

impl From<ethers::abi::Error> for CallFailure {
    fn from(error: ethers::abi::Error) -> Self {
        CallFailure::Undecodable(error.to_string())
    }
}

// Convenience conversions for configuration messages
impl From<String> for MintError {
    fn from(error: String) -> Self {
        MintError::Configuration(error)
    }
}

impl From<&str> for MintError {
    fn from(error: &str) -> Self {
        MintError::Configuration(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_error_from_call_failure() {
        let err: PricingError = CallFailure::Timeout.into();
        assert_eq!(err, PricingError::Call(CallFailure::Timeout));
        assert!(!err.is_config_inconsistency());
        assert!(PricingError::ConfigInconsistency("decimals".into()).is_config_inconsistency());
    }

    #[test]
    fn test_abi_error_is_undecodable() {
        let failure: CallFailure = ethers::abi::Error::InvalidData.into();
        assert!(matches!(failure, CallFailure::Undecodable(_)));
    }

    #[test]
    fn test_provider_error_is_transport() {
        let failure: CallFailure = ProviderError::CustomError("connection reset".into()).into();
        assert!(matches!(failure, CallFailure::Transport(msg) if msg.contains("connection reset")));
    }
}
