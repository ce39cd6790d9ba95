use wallet_session_core::{ChainResolverPort, PortError};

/// Built-in chain id to display name directory. Unknown ids fail open to a
/// placeholder so a chain switch never leaves the name unresolvable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainDirectoryAdapter;

impl ChainDirectoryAdapter {
    fn lookup(chain_id: u64) -> Option<&'static str> {
        match chain_id {
            1 => Some("Ethereum Mainnet"),
            10 => Some("OP Mainnet"),
            56 => Some("BNB Smart Chain"),
            100 => Some("Gnosis"),
            137 => Some("Polygon Mainnet"),
            8453 => Some("Base"),
            42161 => Some("Arbitrum One"),
            43114 => Some("Avalanche C-Chain"),
            11155111 => Some("Sepolia"),
            _ => None,
        }
    }
}

impl ChainResolverPort for ChainDirectoryAdapter {
    async fn resolve(&self, chain_id: u64) -> Result<String, PortError> {
        Ok(match Self::lookup(chain_id) {
            Some(name) => name.to_owned(),
            None => format!("Unknown Chain (0x{chain_id:x})"),
        })
    }
}
