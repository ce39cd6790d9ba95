use thiserror::Error;

use crate::domain::{ConnectionStatus, TransferStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    BeginConnect,
    ConnectResolved,
    ConnectFailed,
    AccountsReplaced,
    AccountsEmptied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    Submit,
    Confirm,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition<S> {
    pub from: S,
    pub to: S,
}

#[derive(Debug, Error)]
#[error("illegal {kind} transition: {from} on {action}")]
pub struct TransitionError {
    pub kind: &'static str,
    pub from: String,
    pub action: String,
}

pub fn connection_transition(
    from: ConnectionStatus,
    action: ConnectionAction,
) -> Result<(ConnectionStatus, StateTransition<ConnectionStatus>), TransitionError> {
    use ConnectionAction as A;
    use ConnectionStatus as S;
    let to = match (from, action) {
        (S::Disconnected, A::BeginConnect) => S::Connecting,
        (S::Connecting, A::ConnectResolved) => S::Connected,
        (S::Connecting, A::ConnectFailed) => S::Disconnected,
        // Account lists can be replaced or emptied by the provider at any
        // time outside an in-flight connect; the list drives the status.
        (S::Disconnected | S::Connected, A::AccountsReplaced) => S::Connected,
        (S::Disconnected | S::Connected, A::AccountsEmptied) => S::Disconnected,
        _ => {
            return Err(TransitionError {
                kind: "connection",
                from: format!("{from:?}"),
                action: format!("{action:?}"),
            })
        }
    };
    Ok((to, StateTransition { from, to }))
}

pub fn transfer_transition(
    from: TransferStatus,
    action: TransferAction,
) -> Result<(TransferStatus, StateTransition<TransferStatus>), TransitionError> {
    use TransferAction as A;
    use TransferStatus as S;
    let to = match (from, action) {
        (S::Building, A::Submit) => S::Submitted,
        (S::Submitted, A::Confirm) => S::Confirmed,
        (S::Building | S::Submitted, A::Fail) => S::Failed,
        _ => {
            return Err(TransitionError {
                kind: "transfer",
                from: format!("{from:?}"),
                action: format!("{action:?}"),
            })
        }
    };
    Ok((to, StateTransition { from, to }))
}
