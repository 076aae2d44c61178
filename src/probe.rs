//! Standard-interface and installed-extension probes.

use ethers::abi::Token;
use ethers::types::Address;
use tracing::debug;

use crate::evm::gateway::CallGateway;
use crate::registry::abi;

/// Capabilities reported by the interface probes. Every field defaults to
/// "absent" when its call fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSupport {
    pub is_erc721: bool,
    pub is_erc1155: bool,
    pub extensions: Vec<Address>,
}

#[derive(Clone)]
pub struct InterfaceProbe {
    gateway: CallGateway,
}

impl InterfaceProbe {
    pub fn new(gateway: CallGateway) -> Self {
        Self { gateway }
    }

    /// ERC165 `supportsInterface`; `false` on any failure
    pub async fn supports_interface(&self, address: Address, interface_id: [u8; 4]) -> bool {
        let args = vec![Token::FixedBytes(interface_id.to_vec())];
        match self.gateway.execute(address, abi::SUPPORTS_INTERFACE, args).await {
            Ok(tokens) => matches!(tokens.as_slice(), [Token::Bool(true)]),
            Err(e) => {
                debug!("supportsInterface(0x{}) on {:?} failed: {}", hex::encode(interface_id), address, e);
                false
            }
        }
    }

    pub async fn is_erc721(&self, address: Address) -> bool {
        self.supports_interface(address, abi::ERC721_INTERFACE_ID).await
    }

    pub async fn is_erc1155(&self, address: Address) -> bool {
        self.supports_interface(address, abi::ERC1155_INTERFACE_ID).await
    }

    /// Installed extensions; empty on any failure
    pub async fn extensions(&self, address: Address) -> Vec<Address> {
        match self.gateway.execute(address, abi::GET_EXTENSIONS, vec![]).await {
            Ok(tokens) => match tokens.into_iter().next().and_then(Token::into_array) {
                Some(items) => items.into_iter().filter_map(Token::into_address).collect(),
                None => Vec::new(),
            },
            Err(e) => {
                debug!("getExtensions on {:?} failed: {}", address, e);
                Vec::new()
            }
        }
    }

    /// Runs the ERC721, ERC1155 and extension probes concurrently
    pub async fn probe_all(&self, address: Address) -> InterfaceSupport {
        let (is_erc721, is_erc1155, extensions) = futures::join!(
            self.is_erc721(address),
            self.is_erc1155(address),
            self.extensions(address)
        );
        InterfaceSupport {
            is_erc721,
            is_erc1155,
            extensions,
        }
    }
}
