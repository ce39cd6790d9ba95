use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Identity of one injected wallet source. The handle itself is passed
/// separately at attach time; a record can outlive any particular handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
}

impl ProviderRecord {
    pub fn new(name: impl Into<String>, icon: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Absorbing state for records attached without a handle.
    NoProvider,
    Disconnected,
    Connecting,
    Connected,
}

/// Normalized snapshot of one provider connection.
/// Invariant: `accounts` is non-empty exactly when `status` is `Connected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub accounts: Vec<Address>,
    pub chain_id: Option<u64>,
    pub chain_name: Option<String>,
}

/// Per-account derived state. `balance` is an ether-denominated decimal
/// string, or unset while no query for the current chain has resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub address: Address,
    pub balance: Option<String>,
}

/// User-entered transfer fields, unvalidated until submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDraft {
    pub receiver: String,
    pub amount: String,
}

impl TransferDraft {
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty() && self.amount.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftField {
    Receiver,
    Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Building,
    Submitted,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferFailure {
    NoSigner,
    Submission(String),
    ConfirmationTimeout,
    Confirmation(String),
}

impl std::fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSigner => write!(f, "no-signer"),
            Self::Submission(reason) => write!(f, "submission rejected: {reason}"),
            Self::ConfirmationTimeout => write!(f, "timeout"),
            Self::Confirmation(reason) => write!(f, "confirmation failed: {reason}"),
        }
    }
}

/// One transfer attempt. Immutable once `Confirmed` or `Failed`; a failed
/// run is discarded and a fresh one created from a fresh draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRun {
    pub id: u64,
    pub account: Address,
    pub receiver: Address,
    pub amount_wei: U256,
    pub status: TransferStatus,
    pub tx_hash: Option<B256>,
    pub failure: Option<TransferFailure>,
}

impl TransferRun {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TransferStatus::Confirmed | TransferStatus::Failed)
    }
}

/// EIP-1193 rejection shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Provider-pushed event, sequence-numbered in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnected(ProviderError),
}

/// Intent for the external notification sink; rendering is not our concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub description: String,
}

impl Notification {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lower bound on how long the `Connecting` status stays observable.
    pub connect_min_visible_ms: u64,
    /// Upper bound on the receipt wait before a run fails with `timeout`.
    pub confirmation_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_min_visible_ms: 500,
            confirmation_timeout_ms: 120_000,
        }
    }
}

impl SessionConfig {
    pub fn connect_floor(&self) -> Duration {
        Duration::from_millis(self.connect_min_visible_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

/// Result of a successful connect: the accounts granted, how long the
/// provider took to resolve, and how much of the visibility floor was
/// waited out on top of that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOutcome {
    pub accounts: Vec<Address>,
    pub resolved_in_ms: u64,
    pub floor_wait_ms: u64,
}
