#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::Address;

use wallet_session_adapters::{ChainDirectoryAdapter, Eip1193Adapter, NotifierAdapter};
use wallet_session_core::{
    ClockPort, ConnectionStateMachine, PortError, ProviderRecord, SessionConfig,
};

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_739_750_400_000)
    }
}

pub type TestMachine =
    ConnectionStateMachine<Eip1193Adapter, ChainDirectoryAdapter, NotifierAdapter, TestClock>;

/// One attached machine plus handles on the shared adapter state, so tests
/// can inject provider events and read emitted notifications.
pub struct TestStack {
    pub provider: Eip1193Adapter,
    pub notifier: NotifierAdapter,
    pub machine: TestMachine,
}

pub async fn attach_machine() -> TestStack {
    let provider = Eip1193Adapter::deterministic();
    let notifier = NotifierAdapter::new();
    let machine = ConnectionStateMachine::attach(
        ProviderRecord::new("Test Wallet", None),
        Some(provider.clone()),
        ChainDirectoryAdapter,
        notifier.clone(),
        TestClock::default(),
        SessionConfig::default(),
    )
    .await
    .expect("attach machine");
    TestStack {
        provider,
        notifier,
        machine,
    }
}

pub async fn attach_without_handle() -> (NotifierAdapter, TestMachine) {
    let notifier = NotifierAdapter::new();
    let machine = ConnectionStateMachine::attach(
        ProviderRecord::new("Ghost Wallet", None),
        Option::<Eip1193Adapter>::None,
        ChainDirectoryAdapter,
        notifier.clone(),
        TestClock::default(),
        SessionConfig::default(),
    )
    .await
    .expect("attach record without handle");
    (notifier, machine)
}

/// The deterministic adapter's built-in account.
pub fn default_account() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid default account")
}

pub fn account_a() -> Address {
    "0x00000000000000000000000000000000000000AA"
        .parse()
        .expect("valid account a")
}

pub fn account_b() -> Address {
    "0x00000000000000000000000000000000000000BB"
        .parse()
        .expect("valid account b")
}

pub fn receiver_address() -> Address {
    "0x00000000000000000000000000000000000000CC"
        .parse()
        .expect("valid receiver")
}
