//! Configuration constants for the marketplace application.
//!
//! This module centralizes magic numbers and configuration values
//! to improve maintainability and enable easier tuning.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Maximum attempts for the grant workflow (automatic and manual).
pub const MAX_AUTO_GRANT_ATTEMPTS: u32 = 3;

/// Fixed delay between grant attempts.
pub const AUTO_GRANT_RETRY_DELAY_MS: u64 = 4000;

/// Price per access used when the seller did not choose one (in nRLC).
pub const DEFAULT_GRANT_PRICE_NRLC: u64 = 0;

/// Number of accesses granted by default.
pub const DEFAULT_GRANT_VOLUME: u64 = 1;

/// nRLC per RLC (minor units per major unit).
pub const NRLC_PER_RLC: u64 = 1_000_000_000;

/// Sentinel authorized-user address meaning "any user".
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Application authorized automatically right after a strategy is published.
pub const DEFAULT_AUTHORIZED_APP: &str = "0x5240d145EBAf2EeD32c75865Ec8420667Cf51d8e";

/// Storage key holding the JSON array of hidden resource identifiers.
pub const HIDDEN_SET_KEY: &str = "hiddenPdAddresses";

/// Maximum number of characters kept in a result preview.
pub const PREVIEW_MAX_CHARS: usize = 2000;

/// Directory the invoked application must write its result into.
pub const RESULT_OUTPUT_DIR: &str = "iexec_out";

/// Price ceiling large enough that a run is never rejected on price negotiation.
pub const UNLIMITED_PRICE: u64 = (1 << 53) - 1;

/// Chain used when the wallet reports nothing usable (Bellecour).
pub const DEFAULT_CHAIN_ID: u64 = 134;

/// Explorer network slug used for task links.
pub const DEFAULT_EXPLORER_SLUG: &str = "bellecour";

/// Explorer base URL.
pub const EXPLORER_BASE_URL: &str = "https://explorer.iex.ec";

/// Upper bound on the number of steps a buyer can submit.
pub const MAX_RUN_STEPS: usize = 10;

/// Archive entry name every published strategy file is stored under.
pub const STRATEGY_ENTRY_NAME: &str = "strategy.py";

/// Payload key under which the packaged strategy archive is published.
pub const STRATEGY_PAYLOAD_KEY: &str = "zipfile";

/// File name of the key/value store inside the data directory.
pub const STORE_FILE_NAME: &str = "local-storage.json";

/// Environment variable overrides.
pub mod env {
    pub const EXPLORER_SLUG: &str = "TRADEVAULT_EXPLORER_SLUG";
    pub const AUTO_LOAD: &str = "TRADEVAULT_AUTO_LOAD";
    pub const AUTHORIZED_APP: &str = "TRADEVAULT_AUTHORIZED_APP";
    pub const GRANT_ATTEMPTS: &str = "TRADEVAULT_GRANT_ATTEMPTS";
    pub const GRANT_RETRY_MS: &str = "TRADEVAULT_GRANT_RETRY_MS";
    pub const DATA_DIR: &str = "TRADEVAULT_DATA_DIR";
    pub const CHAIN_ID: &str = "TRADEVAULT_CHAIN_ID";
}

/// Runtime configuration, defaulting to the constants above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Explorer network slug for task links. Follows `chain_id` unless overridden.
    pub explorer_slug: String,
    /// Whether catalog refreshes discover published resources on the network.
    pub auto_load_listings: bool,
    /// Application granted access right after publishing.
    pub authorized_app: String,
    /// Grant workflow attempt bound.
    pub grant_max_attempts: u32,
    /// Fixed delay between grant attempts.
    pub grant_retry_delay_ms: u64,
    /// Directory holding the persisted key/value store.
    pub data_dir: PathBuf,
    /// Chain the wallet is expected to be on.
    pub chain_id: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            explorer_slug: DEFAULT_EXPLORER_SLUG.to_string(),
            auto_load_listings: false,
            authorized_app: DEFAULT_AUTHORIZED_APP.to_string(),
            grant_max_attempts: MAX_AUTO_GRANT_ATTEMPTS,
            grant_retry_delay_ms: AUTO_GRANT_RETRY_DELAY_MS,
            data_dir: default_data_dir(),
            chain_id: DEFAULT_CHAIN_ID,
        }
    }
}

impl VaultConfig {
    /// Build a configuration from `TRADEVAULT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let chain_id = non_empty(env::CHAIN_ID)
            .map(|v| normalize_chain_id(&v))
            .unwrap_or(defaults.chain_id);
        let explorer_slug = non_empty(env::EXPLORER_SLUG)
            .map(|v| v.trim().to_string())
            .or_else(|| explorer_slug_for_chain(chain_id).map(str::to_string))
            .unwrap_or_else(|| {
                warn!("No explorer known for chain {}, using {}", chain_id, defaults.explorer_slug);
                defaults.explorer_slug
            });

        Self {
            explorer_slug,
            auto_load_listings: non_empty(env::AUTO_LOAD)
                .map(|v| v.trim() == "true")
                .unwrap_or(defaults.auto_load_listings),
            authorized_app: non_empty(env::AUTHORIZED_APP)
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.authorized_app),
            grant_max_attempts: parse_or(
                env::GRANT_ATTEMPTS,
                non_empty(env::GRANT_ATTEMPTS),
                defaults.grant_max_attempts,
            )
            .max(1),
            grant_retry_delay_ms: parse_or(
                env::GRANT_RETRY_MS,
                non_empty(env::GRANT_RETRY_MS),
                defaults.grant_retry_delay_ms,
            ),
            data_dir: non_empty(env::DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            chain_id,
        }
    }

    /// Path of the persisted key/value store.
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(v) => v.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}", key, v);
            default
        }),
        None => default,
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tradevault")
}

/// Normalize a wallet-reported chain id.
///
/// Accepts CAIP-2 (`eip155:134`), hex (`0x86`) and decimal strings.
/// Anything else yields [`DEFAULT_CHAIN_ID`].
pub fn normalize_chain_id(raw: &str) -> u64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_CHAIN_ID;
    }
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() == 2 && is_decimal(parts[1]) {
        return parts[1].parse().unwrap_or(DEFAULT_CHAIN_ID);
    }
    if let Some(hex_digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        if !hex_digits.is_empty() && hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return u64::from_str_radix(hex_digits, 16).unwrap_or(DEFAULT_CHAIN_ID);
        }
        return DEFAULT_CHAIN_ID;
    }
    if is_decimal(raw) {
        return raw.parse().unwrap_or(DEFAULT_CHAIN_ID);
    }
    DEFAULT_CHAIN_ID
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Explorer network slug for a chain, if the explorer indexes it.
pub fn explorer_slug_for_chain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        134 => Some("bellecour"),
        42161 => Some("arbitrum-mainnet"),
        421_614 => Some("arbitrum-sepolia-testnet"),
        _ => None,
    }
}

/// Explorer link for a task.
pub fn explorer_task_url(slug: &str, task_id: &str) -> String {
    format!("{EXPLORER_BASE_URL}/{slug}/task/{task_id}")
}
