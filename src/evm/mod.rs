pub mod clients;
pub mod gateway;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use clients::{RawCaller, RpcClient};
pub use gateway::{CallGateway, CallRequest, CallResult};
pub use types::{GatewayConfig, GatewayConfigBuilder};
