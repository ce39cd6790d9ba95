use std::time::Duration;

use alloy::primitives::{utils::format_ether, Address};

use crate::domain::{
    ConnectOutcome, ConnectionState, ConnectionStatus, DraftField, Notification, ProviderError,
    ProviderEvent, ProviderEventKind, ProviderRecord, SessionConfig, TransferRun, TransferStatus,
};
use crate::ports::{ChainResolverPort, ClockPort, NotifierPort, ProviderPort, WalletError};
use crate::session::AccountSession;
use crate::state_machine::{connection_transition, ConnectionAction};
use crate::transfer::TransferOrchestrator;

/// Owns everything this system knows about one provider: connection
/// status, the account list in provider order, the current chain, and one
/// `AccountSession` per account. All mutation flows through either a
/// caller-facing operation or `apply_event`, so provider-pushed events and
/// user actions converge on the same transitions.
pub struct ConnectionStateMachine<P, R, N, C> {
    record: ProviderRecord,
    provider: Option<P>,
    resolver: R,
    notifier: N,
    clock: C,
    config: SessionConfig,
    status: ConnectionStatus,
    chain_id: Option<u64>,
    chain_name: Option<String>,
    sessions: Vec<AccountSession>,
    /// Bumped on every account or chain mutation; in-flight query results
    /// are discarded when the epoch they were issued under has passed.
    state_epoch: u64,
    last_disconnect: Option<ProviderError>,
    next_run_id: u64,
}

impl<P, R, N, C> ConnectionStateMachine<P, R, N, C>
where
    P: ProviderPort,
    R: ChainResolverPort,
    N: NotifierPort,
    C: ClockPort,
{
    /// Attaches a provider record. Subscribes to provider events exactly
    /// once and seeds the chain id with a single `eth_chainId` read; the
    /// event stream is the only thing that updates it afterwards. With no
    /// handle the machine starts (and stays) in `NoProvider`.
    pub async fn attach(
        record: ProviderRecord,
        provider: Option<P>,
        resolver: R,
        notifier: N,
        clock: C,
        config: SessionConfig,
    ) -> Result<Self, WalletError> {
        let status = if provider.is_some() {
            ConnectionStatus::Disconnected
        } else {
            ConnectionStatus::NoProvider
        };
        let mut machine = Self {
            record,
            provider,
            resolver,
            notifier,
            clock,
            config,
            status,
            chain_id: None,
            chain_name: None,
            sessions: Vec::new(),
            state_epoch: 0,
            last_disconnect: None,
            next_run_id: 1,
        };

        let seeded = match machine.provider.as_ref() {
            Some(provider) => {
                provider
                    .subscribe_events()
                    .map_err(|e| WalletError::Transport(e.to_string()))?;
                match provider.chain_id().await {
                    Ok(chain_id) => Some(chain_id),
                    Err(e) => {
                        // Non-fatal: the chain stays unknown until the
                        // provider pushes a chainChanged event.
                        tracing::warn!(
                            provider = %machine.record.name,
                            "initial chain identification failed: {e}"
                        );
                        None
                    }
                }
            }
            None => None,
        };
        if let Some(chain_id) = seeded {
            let chain_name = machine.resolve_chain_name(chain_id).await;
            machine.chain_id = Some(chain_id);
            machine.chain_name = chain_name;
        }

        tracing::info!(
            provider = %machine.record.name,
            status = ?machine.status,
            chain_id = machine.chain_id,
            "provider attached"
        );
        Ok(machine)
    }

    /// Tears down the event subscription and returns the record for
    /// possible reattachment.
    pub fn detach(mut self) -> ProviderRecord {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.unsubscribe_events() {
                tracing::warn!(provider = %self.record.name, "event unsubscribe failed: {e}");
            }
        }
        tracing::info!(provider = %self.record.name, "provider detached");
        self.record
    }

    pub fn record(&self) -> &ProviderRecord {
        &self.record
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState {
            status: self.status,
            accounts: self.accounts(),
            chain_id: self.chain_id,
            chain_name: self.chain_name.clone(),
        }
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.sessions.iter().map(AccountSession::address).collect()
    }

    pub fn sessions(&self) -> &[AccountSession] {
        &self.sessions
    }

    pub fn last_disconnect(&self) -> Option<&ProviderError> {
        self.last_disconnect.as_ref()
    }

    /// Requests account access from the provider. Valid only while
    /// `Disconnected`; a rejection returns the machine there for a retry.
    /// The `Connecting` status is held for at least the configured floor
    /// so the transition stays observable however fast the provider is.
    pub async fn connect(&mut self) -> Result<ConnectOutcome, WalletError> {
        match self.status {
            ConnectionStatus::NoProvider => return Err(WalletError::ProviderAbsent),
            ConnectionStatus::Disconnected => {}
            other => {
                return Err(WalletError::InvalidState(format!(
                    "connect is only valid while disconnected, not {other:?}"
                )))
            }
        }
        self.status = connection_transition(self.status, ConnectionAction::BeginConnect)?.0;

        let started_ms = self.now_ms()?;
        let requested = match self.provider.as_ref() {
            Some(provider) => provider.request_accounts().await,
            None => return Err(WalletError::ProviderAbsent),
        };
        let resolved_in_ms = self.now_ms()?.saturating_sub(started_ms);

        match requested {
            Ok(accounts) if !accounts.is_empty() => {
                let floor_wait = self
                    .config
                    .connect_floor()
                    .saturating_sub(Duration::from_millis(resolved_in_ms));
                if !floor_wait.is_zero() {
                    tokio::time::sleep(floor_wait).await;
                }
                self.status =
                    connection_transition(self.status, ConnectionAction::ConnectResolved)?.0;
                self.rebuild_sessions(&accounts);
                tracing::info!(
                    provider = %self.record.name,
                    accounts = accounts.len(),
                    resolved_in_ms,
                    "provider connected"
                );
                Ok(ConnectOutcome {
                    accounts,
                    resolved_in_ms,
                    floor_wait_ms: floor_wait.as_millis() as u64,
                })
            }
            Ok(_) => {
                self.status =
                    connection_transition(self.status, ConnectionAction::ConnectFailed)?.0;
                Err(WalletError::Connection(
                    "provider granted no accounts".to_owned(),
                ))
            }
            Err(e) => {
                self.status =
                    connection_transition(self.status, ConnectionAction::ConnectFailed)?.0;
                tracing::warn!(provider = %self.record.name, "connect rejected: {e}");
                Err(WalletError::Connection(e.to_string()))
            }
        }
    }

    /// Asks the provider to switch networks. Local state is never touched
    /// here; a successful switch comes back through the `chainChanged`
    /// event stream. Rejections are returned for reporting, without retry.
    pub async fn switch_chain(&self, target_chain_id: u64) -> Result<(), WalletError> {
        let provider = self.provider.as_ref().ok_or(WalletError::ProviderAbsent)?;
        provider.switch_chain(target_chain_id).await.map_err(|e| {
            tracing::warn!(target_chain_id, "chain switch rejected: {e}");
            WalletError::ChainSwitch(e.to_string())
        })
    }

    /// Drains buffered provider events and applies them in emission order.
    /// Returns how many events were applied.
    pub async fn pump_events(&mut self) -> Result<usize, WalletError> {
        let events = match self.provider.as_ref() {
            Some(provider) => provider
                .drain_events()
                .map_err(|e| WalletError::Transport(e.to_string()))?,
            None => return Ok(0),
        };
        let applied = events.len();
        for event in events {
            self.apply_event(event).await?;
        }
        Ok(applied)
    }

    /// Applies one provider event. Public so synthetic events can be fed
    /// through the same transitions the live stream uses.
    pub async fn apply_event(&mut self, event: ProviderEvent) -> Result<(), WalletError> {
        tracing::debug!(sequence = event.sequence, kind = ?event.kind, "provider event");
        match event.kind {
            ProviderEventKind::AccountsChanged(accounts) => self.apply_accounts_changed(accounts),
            ProviderEventKind::ChainChanged(chain_id) => self.apply_chain_changed(chain_id).await,
            ProviderEventKind::Disconnected(error) => {
                // Informational only. Providers that actually revoke access
                // follow up with an empty accountsChanged, which is what
                // moves the status.
                tracing::warn!(
                    provider = %self.record.name,
                    code = error.code,
                    "provider reported disconnect: {}",
                    error.message
                );
                self.last_disconnect = Some(error);
                Ok(())
            }
        }
    }

    /// Re-queries the balance for one account. A result that resolves
    /// after the chain or account list has moved on is discarded; failures
    /// leave the balance unset rather than stale.
    pub async fn refresh_balance(&mut self, address: Address) -> Result<(), WalletError> {
        self.session_index(address)?;
        let issued_epoch = self.state_epoch;
        let queried = match self.provider.as_ref() {
            Some(provider) => provider.balance_of(address).await,
            None => return Err(WalletError::ProviderAbsent),
        };

        // Events that arrived while the query was outstanding take
        // precedence over its result.
        self.pump_events().await?;
        if self.state_epoch != issued_epoch {
            tracing::debug!(%address, "discarding balance for superseded chain/account state");
            return Ok(());
        }

        let session = match self
            .sessions
            .iter_mut()
            .find(|session| session.address() == address)
        {
            Some(session) => session,
            None => return Ok(()),
        };
        match queried {
            Ok(wei) => session.set_balance(Some(format_ether(wei))),
            Err(e) => {
                session.set_balance(None);
                tracing::warn!(%address, "balance query failed: {e}");
            }
        }
        Ok(())
    }

    /// Refreshes every session's balance, tolerating accounts that
    /// disappear under us mid-sweep.
    pub async fn refresh_balances(&mut self) -> Result<(), WalletError> {
        for address in self.accounts() {
            match self.refresh_balance(address).await {
                Ok(()) | Err(WalletError::UnknownAccount(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn edit_draft(
        &mut self,
        address: Address,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), WalletError> {
        let index = self.session_index(address)?;
        self.sessions[index].edit_draft(field, value);
        Ok(())
    }

    /// Validates the account's draft and submits the transfer. At most one
    /// non-terminal run may exist per account; the draft is reset once a
    /// run is created (even one that failed), but left untouched when
    /// validation rejects it.
    pub async fn submit_transfer(&mut self, address: Address) -> Result<TransferRun, WalletError> {
        if self.status != ConnectionStatus::Connected {
            return Err(WalletError::InvalidState(
                "transfers require a connected provider".to_owned(),
            ));
        }
        let index = self.session_index(address)?;
        if self.sessions[index].has_transfer_in_flight() {
            return Err(WalletError::InvalidState(
                "a transfer is already awaiting confirmation for this account".to_owned(),
            ));
        }

        let draft = self.sessions[index].draft().clone();
        let run_id = self.next_run_id;
        let provider = self.provider.as_ref().ok_or(WalletError::ProviderAbsent)?;
        let orchestrator =
            TransferOrchestrator::new(provider, &self.notifier, self.config.confirmation_timeout());
        let run = orchestrator.submit(run_id, address, &draft).await?;

        self.next_run_id = self.next_run_id.saturating_add(1);
        let session = &mut self.sessions[index];
        session.reset_draft();
        session.store_run(run.clone());
        Ok(run)
    }

    /// Completes the account's `Submitted` run by waiting for its receipt,
    /// bounded by the configured timeout. Returns the run in its terminal
    /// state.
    pub async fn await_confirmation(
        &mut self,
        address: Address,
    ) -> Result<TransferRun, WalletError> {
        let index = self.session_index(address)?;
        let run = match self.sessions[index].take_run() {
            Some(run) if run.status == TransferStatus::Submitted => run,
            Some(run) => {
                self.sessions[index].store_run(run);
                return Err(WalletError::InvalidState(
                    "no submitted transfer awaiting confirmation".to_owned(),
                ));
            }
            None => {
                return Err(WalletError::InvalidState(
                    "no transfer run for this account".to_owned(),
                ))
            }
        };

        let provider = self.provider.as_ref().ok_or(WalletError::ProviderAbsent)?;
        let orchestrator =
            TransferOrchestrator::new(provider, &self.notifier, self.config.confirmation_timeout());
        let run = orchestrator.await_confirmation(run).await?;
        self.sessions[index].store_run(run.clone());
        Ok(run)
    }

    /// Emits the "address copied" intent; the clipboard itself is the
    /// caller's business.
    pub fn announce_address_copied(&self, address: Address) -> Result<(), WalletError> {
        self.session_index(address)?;
        self.notifier
            .notify(Notification::new("Copied address to clipboard"))
            .map_err(|e| WalletError::Transport(e.to_string()))
    }

    fn apply_accounts_changed(&mut self, accounts: Vec<Address>) -> Result<(), WalletError> {
        let action = if accounts.is_empty() {
            ConnectionAction::AccountsEmptied
        } else {
            ConnectionAction::AccountsReplaced
        };
        self.status = connection_transition(self.status, action)?.0;
        self.rebuild_sessions(&accounts);
        tracing::info!(
            provider = %self.record.name,
            accounts = accounts.len(),
            status = ?self.status,
            "account list replaced"
        );
        Ok(())
    }

    async fn apply_chain_changed(&mut self, chain_id: u64) -> Result<(), WalletError> {
        let chain_name = self.resolve_chain_name(chain_id).await;
        self.chain_id = Some(chain_id);
        self.chain_name = chain_name;
        // Balances are chain-scoped; every session starts over.
        let accounts = self.accounts();
        self.rebuild_sessions(&accounts);
        tracing::info!(
            chain_id,
            chain = self.chain_name.as_deref().unwrap_or("unknown"),
            "chain changed"
        );
        Ok(())
    }

    fn rebuild_sessions(&mut self, accounts: &[Address]) {
        self.state_epoch = self.state_epoch.saturating_add(1);
        self.sessions = accounts.iter().copied().map(AccountSession::new).collect();
    }

    async fn resolve_chain_name(&self, chain_id: u64) -> Option<String> {
        match self.resolver.resolve(chain_id).await {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(chain_id, "chain name lookup failed: {e}");
                None
            }
        }
    }

    fn session_index(&self, address: Address) -> Result<usize, WalletError> {
        self.sessions
            .iter()
            .position(|session| session.address() == address)
            .ok_or(WalletError::UnknownAccount(address))
    }

    fn now_ms(&self) -> Result<u64, WalletError> {
        self.clock
            .now_ms()
            .map_err(|e| WalletError::Transport(e.to_string()))
    }
}
