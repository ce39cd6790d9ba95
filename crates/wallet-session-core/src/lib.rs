pub mod connection;
pub mod domain;
pub mod ports;
pub mod session;
pub mod state_machine;
pub mod transfer;

pub use connection::ConnectionStateMachine;
pub use domain::{
    AccountView, ConnectOutcome, ConnectionState, ConnectionStatus, DraftField, Notification,
    ProviderError, ProviderEvent, ProviderEventKind, ProviderRecord, SessionConfig, TransferDraft,
    TransferFailure, TransferRun, TransferStatus,
};
pub use ports::{
    ChainResolverPort, ClockPort, NotifierPort, PortError, ProviderPort, WalletError,
};
pub use session::AccountSession;
pub use state_machine::{
    connection_transition, transfer_transition, ConnectionAction, StateTransition, TransferAction,
    TransitionError,
};
pub use transfer::{validate_draft, TransferOrchestrator};
