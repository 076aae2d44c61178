//! Mint platform detection and price resolution.
//!
//! Given a contract address and chain id, this crate works out which NFT
//! minting convention the contract follows and what a mint costs, using only
//! read-only calls. Detection and pricing always return a usable value;
//! call failures become "capability absent" or the next fallback.
//!
//! ```no_run
//! use mint_detect::{GatewayConfig, MintEngine, MintRequestParams, RegistryConfig};
//! use ethers::types::Address;
//!
//! # async fn run() -> mint_detect::Result<()> {
//! let engine = MintEngine::connect(GatewayConfig::base("https://base.example.org"), RegistryConfig::default())?;
//! let params = MintRequestParams::new(Address::zero(), 8453).with_amount(2);
//! let plan = engine.prepare(&params).await;
//! println!("{} costs {}", plan.classification.provider, plan.quote.total_cost);
//! # Ok(())
//! # }
//! ```

pub mod detector;
pub mod engine;
pub mod error;
pub mod evm;
pub mod price;
pub mod probe;
pub mod registry;
pub mod types;
pub mod utils;
pub mod validator;

pub use detector::PlatformDetector;
pub use engine::{MintEngine, MintPlan};
pub use error::{CallFailure, MintError, PricingError};
pub use evm::{CallGateway, GatewayConfig, GatewayConfigBuilder, RawCaller, RpcClient};
pub use price::PriceResolver;
pub use probe::{InterfaceProbe, InterfaceSupport};
pub use registry::{MintCall, ProviderConfig, ProviderConfigRegistry, RegistryConfig};
pub use types::*;
pub use validator::ParameterValidator;

pub type Result<T> = std::result::Result<T, MintError>;
