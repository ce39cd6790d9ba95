use wallet_session_core::SessionConfig;

#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    pub runtime_profile: String,
    pub eip1193_proxy_url: Option<String>,
    pub request_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub connect_min_visible_ms: u64,
    pub confirmation_timeout_ms: u64,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: "dev".to_owned(),
            eip1193_proxy_url: None,
            request_timeout_ms: 15_000,
            receipt_poll_interval_ms: 2_000,
            connect_min_visible_ms: 500,
            confirmation_timeout_ms: 120_000,
        }
    }
}

impl WalletAdapterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            runtime_profile: env_string("WALLET_SESSION_PROFILE")
                .unwrap_or(defaults.runtime_profile),
            eip1193_proxy_url: env_string("WALLET_SESSION_EIP1193_PROXY_URL"),
            request_timeout_ms: env_u64(
                "WALLET_SESSION_REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            ),
            receipt_poll_interval_ms: env_u64(
                "WALLET_SESSION_RECEIPT_POLL_INTERVAL_MS",
                defaults.receipt_poll_interval_ms,
            ),
            connect_min_visible_ms: env_u64(
                "WALLET_SESSION_CONNECT_MIN_VISIBLE_MS",
                defaults.connect_min_visible_ms,
            ),
            confirmation_timeout_ms: env_u64(
                "WALLET_SESSION_CONFIRMATION_TIMEOUT_MS",
                defaults.confirmation_timeout_ms,
            ),
        }
    }

    /// In the production profile the adapter refuses to fall back to the
    /// deterministic runtime when no proxy endpoint is configured.
    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == "production"
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            connect_min_visible_ms: self.connect_min_visible_ms,
            confirmation_timeout_ms: self.confirmation_timeout_ms,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
