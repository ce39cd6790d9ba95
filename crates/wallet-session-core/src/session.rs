use alloy::primitives::Address;

use crate::domain::{AccountView, DraftField, TransferDraft, TransferRun};

/// Per-account state for one connected address: the cached balance, the
/// in-progress transfer draft, and the most recent transfer run. Sessions
/// are destroyed and recreated whenever the account list or the chain
/// changes, so nothing in here survives either.
#[derive(Debug, Clone)]
pub struct AccountSession {
    address: Address,
    balance: Option<String>,
    draft: TransferDraft,
    run: Option<TransferRun>,
}

impl AccountSession {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: None,
            draft: TransferDraft::default(),
            run: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn balance(&self) -> Option<&str> {
        self.balance.as_deref()
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            address: self.address,
            balance: self.balance.clone(),
        }
    }

    pub fn draft(&self) -> &TransferDraft {
        &self.draft
    }

    /// Unvalidated assignment; partial input is allowed while typing.
    pub fn edit_draft(&mut self, field: DraftField, value: impl Into<String>) {
        match field {
            DraftField::Receiver => self.draft.receiver = value.into(),
            DraftField::Amount => self.draft.amount = value.into(),
        }
    }

    pub fn run(&self) -> Option<&TransferRun> {
        self.run.as_ref()
    }

    pub fn has_transfer_in_flight(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.is_terminal())
    }

    pub(crate) fn reset_draft(&mut self) {
        self.draft = TransferDraft::default();
    }

    pub(crate) fn set_balance(&mut self, balance: Option<String>) {
        self.balance = balance;
    }

    pub(crate) fn take_run(&mut self) -> Option<TransferRun> {
        self.run.take()
    }

    pub(crate) fn store_run(&mut self, run: TransferRun) {
        self.run = Some(run);
    }
}
