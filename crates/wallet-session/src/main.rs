//! wallet-session demo shell: attaches a provider, connects, and drives one
//! transfer end to end against the deterministic runtime (or an EIP-1193
//! proxy configured via `WALLET_SESSION_EIP1193_PROXY_URL`).

use eyre::WrapErr;

use wallet_session_adapters::{
    ChainDirectoryAdapter, Eip1193Adapter, NotifierAdapter, SystemClockAdapter,
    WalletAdapterConfig,
};
use wallet_session_core::{ConnectionStateMachine, DraftField, ProviderRecord};

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting wallet-session");

    let config = WalletAdapterConfig::from_env();
    let provider = Eip1193Adapter::with_config(config.clone());
    let notifier = NotifierAdapter::new();

    let mut machine = ConnectionStateMachine::attach(
        ProviderRecord::new("Demo Wallet", None),
        Some(provider),
        ChainDirectoryAdapter,
        notifier.clone(),
        SystemClockAdapter,
        config.session_config(),
    )
    .await
    .wrap_err("failed to attach provider")?;

    let outcome = machine.connect().await.wrap_err("connect failed")?;
    let account = outcome
        .accounts
        .first()
        .copied()
        .ok_or_else(|| eyre::eyre!("provider granted no accounts"))?;

    let state = machine.state();
    println!(
        "connected to {} with {} account(s), provider resolved in {}ms",
        state.chain_name.as_deref().unwrap_or("unknown chain"),
        state.accounts.len(),
        outcome.resolved_in_ms,
    );

    machine
        .refresh_balances()
        .await
        .wrap_err("balance refresh failed")?;
    for session in machine.sessions() {
        println!(
            "  {}  balance: {} ETH",
            session.address(),
            session.balance().unwrap_or("?")
        );
    }

    let receiver = std::env::var("WALLET_SESSION_DEMO_RECEIVER")
        .unwrap_or_else(|_| "0x00000000000000000000000000000000000000CC".to_owned());
    let amount =
        std::env::var("WALLET_SESSION_DEMO_AMOUNT").unwrap_or_else(|_| "1.5".to_owned());
    machine.edit_draft(account, DraftField::Receiver, receiver)?;
    machine.edit_draft(account, DraftField::Amount, amount)?;

    let submitted = machine.submit_transfer(account).await?;
    println!("submitted: {:?}", submitted.tx_hash);

    let run = machine.await_confirmation(account).await?;
    println!("transfer finished as {:?}", run.status);

    machine.pump_events().await?;
    for notification in notifier.drain()? {
        println!("notification: {}", notification.description);
    }

    machine.detach();
    Ok(())
}
