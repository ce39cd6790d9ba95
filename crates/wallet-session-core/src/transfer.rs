use std::time::Duration;

use alloy::primitives::{utils::parse_ether, Address, U256};

use crate::domain::{Notification, TransferDraft, TransferFailure, TransferRun, TransferStatus};
use crate::ports::{NotifierPort, ProviderPort, WalletError};
use crate::state_machine::{transfer_transition, TransferAction};

/// Checks a draft before any provider call is issued. A failing draft is
/// left untouched by the caller so the user can correct it.
pub fn validate_draft(draft: &TransferDraft) -> Result<(Address, U256), WalletError> {
    let receiver = draft.receiver.trim();
    if receiver.is_empty() {
        return Err(WalletError::Validation("receiver is required".to_owned()));
    }
    let amount = draft.amount.trim();
    if amount.is_empty() {
        return Err(WalletError::Validation("amount is required".to_owned()));
    }
    let receiver: Address = receiver
        .parse()
        .map_err(|e| WalletError::Validation(format!("invalid receiver address: {e}")))?;
    let amount_wei = parse_ether(amount)
        .map_err(|e| WalletError::Validation(format!("invalid amount: {e}")))?;
    if amount_wei == U256::ZERO {
        return Err(WalletError::Validation("amount must be positive".to_owned()));
    }
    Ok((receiver, amount_wei))
}

/// Drives one transfer run through `Building -> Submitted -> Confirmed`
/// (or `Failed` at either step). No stage is ever retried; a failed run is
/// terminal and a retry starts over from a fresh draft.
pub struct TransferOrchestrator<'a, P, N> {
    provider: &'a P,
    notifier: &'a N,
    confirmation_timeout: Duration,
}

impl<'a, P, N> TransferOrchestrator<'a, P, N>
where
    P: ProviderPort,
    N: NotifierPort,
{
    pub fn new(provider: &'a P, notifier: &'a N, confirmation_timeout: Duration) -> Self {
        Self {
            provider,
            notifier,
            confirmation_timeout,
        }
    }

    /// Validates the draft, then signs and sends the transfer. Returns
    /// `Err` only for validation failures; provider-side failures come
    /// back as a run already marked `Failed`.
    pub async fn submit(
        &self,
        id: u64,
        account: Address,
        draft: &TransferDraft,
    ) -> Result<TransferRun, WalletError> {
        let (receiver, amount_wei) = validate_draft(draft)?;
        let mut run = TransferRun {
            id,
            account,
            receiver,
            amount_wei,
            status: TransferStatus::Building,
            tx_hash: None,
            failure: None,
        };

        // A provider that no longer lists the account cannot sign for it.
        let has_signer = match self.provider.request_accounts().await {
            Ok(accounts) => accounts.contains(&account),
            Err(_) => false,
        };
        if !has_signer {
            return self.fail(run, TransferFailure::NoSigner);
        }

        match self.provider.send_transfer(account, receiver, amount_wei).await {
            Ok(tx_hash) => {
                run.status = transfer_transition(run.status, TransferAction::Submit)?.0;
                run.tx_hash = Some(tx_hash);
                tracing::info!(run = run.id, %tx_hash, "transfer submitted");
                self.emit(format!("Transaction Submited: {tx_hash}"));
                Ok(run)
            }
            Err(e) => self.fail(run, TransferFailure::Submission(e.to_string())),
        }
    }

    /// Waits out the receipt for a `Submitted` run, bounded by the
    /// configured timeout, and returns the run in its terminal state. The
    /// earlier "submitted" notification is never retracted; failures get
    /// their own signal.
    pub async fn await_confirmation(&self, mut run: TransferRun) -> Result<TransferRun, WalletError> {
        if run.status != TransferStatus::Submitted {
            return Err(WalletError::InvalidState(
                "only a submitted run can await confirmation".to_owned(),
            ));
        }
        let tx_hash = run.tx_hash.ok_or_else(|| {
            WalletError::InvalidState("submitted run is missing its transaction hash".to_owned())
        })?;

        let wait = self.provider.wait_for_receipt(tx_hash);
        match tokio::time::timeout(self.confirmation_timeout, wait).await {
            Ok(Ok(())) => {
                run.status = transfer_transition(run.status, TransferAction::Confirm)?.0;
                tracing::info!(run = run.id, %tx_hash, "transfer confirmed");
                self.emit(format!("Transaction Succeed: {tx_hash}"));
                Ok(run)
            }
            Ok(Err(e)) => self.fail(run, TransferFailure::Confirmation(e.to_string())),
            Err(_) => self.fail(run, TransferFailure::ConfirmationTimeout),
        }
    }

    fn fail(
        &self,
        mut run: TransferRun,
        failure: TransferFailure,
    ) -> Result<TransferRun, WalletError> {
        run.status = transfer_transition(run.status, TransferAction::Fail)?.0;
        tracing::warn!(run = run.id, %failure, "transfer failed");
        self.emit(format!("Transaction Failed: {failure}"));
        run.failure = Some(failure);
        Ok(run)
    }

    fn emit(&self, description: String) {
        if let Err(e) = self.notifier.notify(Notification::new(description)) {
            tracing::warn!("notification sink error: {e}");
        }
    }
}
