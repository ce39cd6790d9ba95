mod common;

use common::{account_a, account_b, attach_machine, default_account};

use wallet_session_core::{ConnectionStatus, ProviderError};

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn accounts_changed_replaces_the_list_verbatim() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");
    assert_eq!(stack.machine.accounts(), vec![default_account()]);

    stack
        .provider
        .debug_inject_accounts_changed(vec![account_b(), account_a()])
        .expect("inject accounts");
    stack.machine.pump_events().await.expect("pump");

    // Provider order is preserved as received, not normalized.
    assert_eq!(stack.machine.accounts(), vec![account_b(), account_a()]);
    assert_eq!(stack.machine.status(), ConnectionStatus::Connected);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn empty_accounts_changed_forces_disconnect() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");

    stack
        .provider
        .debug_inject_accounts_changed(Vec::new())
        .expect("inject empty accounts");
    stack.machine.pump_events().await.expect("pump");

    assert_eq!(stack.machine.status(), ConnectionStatus::Disconnected);
    assert!(stack.machine.sessions().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn event_bursts_apply_in_emission_order() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");

    stack
        .provider
        .debug_inject_accounts_changed(vec![account_a()])
        .expect("inject a");
    stack
        .provider
        .debug_inject_accounts_changed(Vec::new())
        .expect("inject empty");
    stack
        .provider
        .debug_inject_accounts_changed(vec![account_b()])
        .expect("inject b");

    let applied = stack.machine.pump_events().await.expect("pump");
    assert_eq!(applied, 3);
    // The latest list wins; the interleaved empty list does not stick.
    assert_eq!(stack.machine.accounts(), vec![account_b()]);
    assert_eq!(stack.machine.status(), ConnectionStatus::Connected);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn chain_changed_updates_chain_and_resets_balances_only() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");
    stack
        .machine
        .refresh_balance(default_account())
        .await
        .expect("refresh");
    assert!(stack.machine.sessions()[0].balance().is_some());

    stack
        .provider
        .debug_inject_chain_changed(137)
        .expect("inject chain");
    stack.machine.pump_events().await.expect("pump");

    let state = stack.machine.state();
    assert_eq!(state.chain_id, Some(137));
    assert_eq!(state.chain_name.as_deref(), Some("Polygon Mainnet"));
    assert_eq!(state.status, ConnectionStatus::Connected);
    assert_eq!(state.accounts, vec![default_account()]);
    // Balance was computed for the old chain and must not survive.
    assert_eq!(stack.machine.sessions()[0].balance(), None);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn unknown_chains_fail_open_to_a_placeholder_name() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");

    stack
        .provider
        .debug_inject_chain_changed(0xdead_beef)
        .expect("inject chain");
    stack.machine.pump_events().await.expect("pump");

    assert_eq!(
        stack.machine.state().chain_name.as_deref(),
        Some("Unknown Chain (0xdeadbeef)")
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn disconnect_events_are_informational_only() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");

    stack
        .provider
        .debug_inject_disconnect(ProviderError::new(4900, "Provider is disconnected."))
        .expect("inject disconnect");
    stack.machine.pump_events().await.expect("pump");

    // Only an empty accountsChanged actually disconnects.
    assert_eq!(stack.machine.status(), ConnectionStatus::Connected);
    assert_eq!(stack.machine.accounts(), vec![default_account()]);
    let recorded = stack.machine.last_disconnect().expect("recorded");
    assert_eq!(recorded.code, 4900);
}
