use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, B256, U256};
use serde_json::{json, Value};

use wallet_session_core::{
    PortError, ProviderError, ProviderEvent, ProviderEventKind, ProviderPort,
};

use crate::WalletAdapterConfig;

/// EIP-1193 provider adapter. `Proxy` relays requests as JSON-RPC to a
/// bridge in front of a real injected provider; `Deterministic` is a
/// self-contained in-memory runtime for tests and the demo shell.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
    receipt_poll_interval: Duration,
}

#[derive(Debug)]
struct ProviderState {
    subscribed: bool,
    accounts: Vec<Address>,
    chain_id: u64,
    balances: HashMap<Address, U256>,
    send_nonce: u64,
    event_seq: u64,
    events: Vec<ProviderEvent>,
    request_log: Vec<String>,
    faults: FaultPlan,
}

/// Deterministic-mode failure toggles, all off by default.
#[derive(Debug, Default)]
struct FaultPlan {
    reject_accounts: Option<ProviderError>,
    reject_switch: Option<ProviderError>,
    reject_send: Option<ProviderError>,
    fail_balance: bool,
    stall_receipts: bool,
    chain_change_during_balance: Option<u64>,
}

impl Default for ProviderState {
    fn default() -> Self {
        let account: Address = "0x1000000000000000000000000000000000000001"
            .parse()
            .expect("valid built-in deterministic account");
        let mut balances = HashMap::new();
        balances.insert(account, U256::from(10_000_000_000_000_000_000u128));
        Self {
            subscribed: false,
            accounts: vec![account],
            chain_id: 1,
            balances,
            send_nonce: 0,
            event_seq: 0,
            events: Vec::new(),
            request_log: Vec::new(),
            faults: FaultPlan::default(),
        }
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(WalletAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: WalletAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = Duration::from_millis(config.request_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                    receipt_poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    fn log_request(&self, method: &str) -> Result<(), PortError> {
        self.lock_state()?.request_log.push(method.to_owned());
        Ok(())
    }

    // --- event buffer ---------------------------------------------------

    fn record_event(g: &mut ProviderState, kind: ProviderEventKind) {
        if !g.subscribed {
            // No listener, no delivery; this matches a real provider.
            return;
        }
        g.event_seq = g.event_seq.saturating_add(1);
        let sequence = g.event_seq;
        g.events.push(ProviderEvent { sequence, kind });
    }

    // --- deterministic state setup (pre-attach) -------------------------

    pub fn debug_set_accounts(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock_state()?.accounts = accounts;
        Ok(())
    }

    pub fn debug_set_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.lock_state()?.chain_id = chain_id;
        Ok(())
    }

    pub fn debug_set_balance(&self, account: Address, wei: U256) -> Result<(), PortError> {
        self.lock_state()?.balances.insert(account, wei);
        Ok(())
    }

    // --- deterministic event injection ----------------------------------

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.accounts = accounts.clone();
        Self::record_event(&mut g, ProviderEventKind::AccountsChanged(accounts));
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.chain_id = chain_id;
        Self::record_event(&mut g, ProviderEventKind::ChainChanged(chain_id));
        Ok(())
    }

    pub fn debug_inject_disconnect(&self, error: ProviderError) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        Self::record_event(&mut g, ProviderEventKind::Disconnected(error));
        Ok(())
    }

    // --- deterministic fault toggles ------------------------------------

    pub fn debug_reject_accounts(&self, error: Option<ProviderError>) -> Result<(), PortError> {
        self.lock_state()?.faults.reject_accounts = error;
        Ok(())
    }

    pub fn debug_reject_switch(&self, error: Option<ProviderError>) -> Result<(), PortError> {
        self.lock_state()?.faults.reject_switch = error;
        Ok(())
    }

    pub fn debug_reject_send(&self, error: Option<ProviderError>) -> Result<(), PortError> {
        self.lock_state()?.faults.reject_send = error;
        Ok(())
    }

    pub fn debug_fail_balance(&self, fail: bool) -> Result<(), PortError> {
        self.lock_state()?.faults.fail_balance = fail;
        Ok(())
    }

    pub fn debug_stall_receipts(&self, stall: bool) -> Result<(), PortError> {
        self.lock_state()?.faults.stall_receipts = stall;
        Ok(())
    }

    /// Stages a chain change that fires while the next balance query is
    /// outstanding, for exercising stale-result discards.
    pub fn debug_chain_change_during_balance(&self, chain_id: u64) -> Result<(), PortError> {
        self.lock_state()?.faults.chain_change_during_balance = Some(chain_id);
        Ok(())
    }

    pub fn debug_request_log(&self) -> Result<Vec<String>, PortError> {
        Ok(self.lock_state()?.request_log.clone())
    }

    // --- proxy runtime --------------------------------------------------

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented("eip1193 proxy runtime not enabled"))
            }
        };

        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(-32000);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown provider error")
                .to_owned();
            return Err(PortError::Provider(ProviderError { code, message }));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    fn parse_accounts(result: &Value) -> Result<Vec<Address>, PortError> {
        let arr = result
            .as_array()
            .ok_or_else(|| PortError::Transport("eth_requestAccounts: array expected".to_owned()))?;
        let mut accounts = Vec::with_capacity(arr.len());
        for item in arr {
            let raw = item.as_str().ok_or_else(|| {
                PortError::Transport("eth_requestAccounts: string expected".to_owned())
            })?;
            let parsed: Address = raw
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
            accounts.push(parsed);
        }
        Ok(accounts)
    }
}

impl ProviderPort for Eip1193Adapter {
    fn subscribe_events(&self) -> Result<(), PortError> {
        self.check_mode()?;
        let mut g = self.lock_state()?;
        if g.subscribed {
            return Err(PortError::Policy(
                "provider events already subscribed".to_owned(),
            ));
        }
        g.subscribed = true;
        Ok(())
    }

    fn unsubscribe_events(&self) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        if !g.subscribed {
            return Err(PortError::Policy("provider events not subscribed".to_owned()));
        }
        g.subscribed = false;
        g.events.clear();
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<ProviderEvent>, PortError> {
        self.check_mode()?;
        let mut g = self.lock_state()?;
        Ok(std::mem::take(&mut g.events))
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;
        self.log_request("eth_requestAccounts")?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.rpc_call("eth_requestAccounts", json!([])).await?;
            let accounts = Self::parse_accounts(&result)?;
            let mut g = self.lock_state()?;
            if g.accounts != accounts {
                g.accounts = accounts.clone();
                Self::record_event(&mut g, ProviderEventKind::AccountsChanged(accounts.clone()));
            }
            return Ok(accounts);
        }

        let g = self.lock_state()?;
        if let Some(error) = g.faults.reject_accounts.clone() {
            return Err(PortError::Provider(error));
        }
        Ok(g.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        self.check_mode()?;
        self.log_request("eth_chainId")?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.rpc_call("eth_chainId", json!([])).await?;
            let chain_id = json_chain_id_to_u64(&result)?;
            let mut g = self.lock_state()?;
            if g.chain_id != chain_id {
                g.chain_id = chain_id;
                Self::record_event(&mut g, ProviderEventKind::ChainChanged(chain_id));
            }
            return Ok(chain_id);
        }

        Ok(self.lock_state()?.chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.check_mode()?;
        self.log_request("wallet_switchEthereumChain")?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let params = json!([{ "chainId": format!("0x{chain_id:x}") }]);
            self.rpc_call("wallet_switchEthereumChain", params).await?;
            let mut g = self.lock_state()?;
            if g.chain_id != chain_id {
                g.chain_id = chain_id;
                Self::record_event(&mut g, ProviderEventKind::ChainChanged(chain_id));
            }
            return Ok(());
        }

        let mut g = self.lock_state()?;
        if let Some(error) = g.faults.reject_switch.clone() {
            return Err(PortError::Provider(error));
        }
        if g.chain_id != chain_id {
            g.chain_id = chain_id;
            Self::record_event(&mut g, ProviderEventKind::ChainChanged(chain_id));
        }
        Ok(())
    }

    async fn balance_of(&self, account: Address) -> Result<U256, PortError> {
        self.check_mode()?;
        self.log_request("eth_getBalance")?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let params = json!([account.to_string(), "latest"]);
            let result = self.rpc_call("eth_getBalance", params).await?;
            return json_quantity_to_u256(&result);
        }

        let mut g = self.lock_state()?;
        if let Some(staged_chain) = g.faults.chain_change_during_balance.take() {
            g.chain_id = staged_chain;
            Self::record_event(&mut g, ProviderEventKind::ChainChanged(staged_chain));
        }
        if g.faults.fail_balance {
            return Err(PortError::Transport("balance query failed".to_owned()));
        }
        Ok(g.balances.get(&account).copied().unwrap_or(U256::ZERO))
    }

    async fn send_transfer(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<B256, PortError> {
        self.check_mode()?;
        self.log_request("eth_sendTransaction")?;

        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let params = json!([{
                "from": from.to_string(),
                "to": to.to_string(),
                "value": format!("0x{value:x}"),
            }]);
            let result = self.rpc_call("eth_sendTransaction", params).await?;
            let hash = result.as_str().ok_or_else(|| {
                PortError::Transport("eth_sendTransaction must return tx hash".to_owned())
            })?;
            return hash
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")));
        }

        let mut g = self.lock_state()?;
        if let Some(error) = g.faults.reject_send.clone() {
            return Err(PortError::Provider(error));
        }
        g.send_nonce = g.send_nonce.saturating_add(1);
        let mut seed = Vec::with_capacity(20 + 20 + 32 + 8);
        seed.extend_from_slice(from.as_slice());
        seed.extend_from_slice(to.as_slice());
        seed.extend_from_slice(&value.to_be_bytes::<32>());
        seed.extend_from_slice(&g.send_nonce.to_be_bytes());
        Ok(keccak256(seed))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<(), PortError> {
        self.check_mode()?;
        self.log_request("eth_getTransactionReceipt")?;

        if let ProviderMode::Proxy(proxy) = &self.mode {
            let poll_interval = proxy.receipt_poll_interval;
            loop {
                let result = self
                    .rpc_call("eth_getTransactionReceipt", json!([tx_hash.to_string()]))
                    .await?;
                if !result.is_null() {
                    let status = result.get("status").and_then(Value::as_str).unwrap_or("0x1");
                    if status == "0x0" {
                        return Err(PortError::Provider(ProviderError::new(
                            -32000,
                            format!("transaction reverted: {tx_hash}"),
                        )));
                    }
                    return Ok(());
                }
                tokio::time::sleep(poll_interval).await;
            }
        }

        let stalled = self.lock_state()?.faults.stall_receipts;
        if stalled {
            // Pends until the caller's confirmation timeout gives up.
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

fn json_chain_id_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(s)
}

fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    if raw.starts_with("0x") || raw.starts_with("0X") {
        u64::from_str_radix(raw.trim_start_matches("0x").trim_start_matches("0X"), 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}

fn json_quantity_to_u256(value: &Value) -> Result<U256, PortError> {
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Transport("quantity must be a hex string".to_owned()))?;
    U256::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| PortError::Validation(format!("invalid hex quantity: {e}")))
}
