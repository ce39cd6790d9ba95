use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::domain::{Notification, ProviderError, ProviderEvent};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("provider rejected request: {0}")]
    Provider(#[from] ProviderError),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy violation: {0}")]
    Policy(String),
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
}

/// Caller-facing operation errors. Every operation returns one of these
/// instead of panicking or leaking raw port failures across the boundary.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no provider handle attached")]
    ProviderAbsent,
    #[error("connect failed: {0}")]
    Connection(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("chain switch rejected: {0}")]
    ChainSwitch(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("unknown account: {0}")]
    UnknownAccount(Address),
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<crate::state_machine::TransitionError> for WalletError {
    fn from(e: crate::state_machine::TransitionError) -> Self {
        Self::InvalidState(e.to_string())
    }
}

/// Wrapper around one injected EIP-1193 provider. Methods map onto the
/// conventional request methods; events are buffered by the adapter and
/// drained in emission order.
///
/// Futures returned by these ports run on a single-threaded cooperative
/// runtime and are not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait ProviderPort {
    fn subscribe_events(&self) -> Result<(), PortError>;
    fn unsubscribe_events(&self) -> Result<(), PortError>;
    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError>;

    /// `eth_requestAccounts`
    async fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64, PortError>;
    /// `wallet_switchEthereumChain`
    async fn switch_chain(&self, chain_id: u64) -> Result<(), PortError>;
    /// `eth_getBalance`
    async fn balance_of(&self, account: Address) -> Result<U256, PortError>;
    /// `eth_sendTransaction` for a plain value transfer
    async fn send_transfer(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<B256, PortError>;
    /// Resolves once the transaction is included, or fails with the
    /// provider's reason. The caller bounds the wait.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<(), PortError>;
}

/// Chain id to display name. Pure lookup; implementations fail open with a
/// placeholder rather than erroring on unknown ids.
#[allow(async_fn_in_trait)]
pub trait ChainResolverPort {
    async fn resolve(&self, chain_id: u64) -> Result<String, PortError>;
}

pub trait NotifierPort {
    fn notify(&self, notification: Notification) -> Result<(), PortError>;
}

pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, PortError>;
}
