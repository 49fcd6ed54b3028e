// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::{parse_list, strip_0x};
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::services::swap::pacing::Pacing;
use alloy::primitives::Address;
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    #[serde(default = "default_network_name")]
    pub network_name: String,

    // Network
    #[serde(alias = "rpc_rise")]
    pub rpc_url: String,
    pub weth_address: Address,
    /// Optional HTTP/SOCKS proxies, assigned to wallets round-robin.
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub proxies: Vec<String>,
    /// File with one proxy URL per line; merged after `proxies`.
    pub proxy_file: Option<String>,

    // Identity
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub wallet_keys: Vec<String>,
    /// Single-wallet fallback when `wallet_keys` is empty.
    pub private_key: Option<String>,

    // Pacing
    #[serde(default = "default_min_swap_eth")]
    pub min_swap_eth: f64,
    #[serde(default = "default_max_swap_eth")]
    pub max_swap_eth: f64,
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,

    // Transaction
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    /// Unset means confirmations are awaited indefinitely.
    pub confirmation_timeout_secs: Option<u64>,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_network_name() -> String {
    constants::DEFAULT_NETWORK_NAME.to_string()
}
fn default_min_swap_eth() -> f64 {
    constants::DEFAULT_MIN_SWAP_ETH
}
fn default_max_swap_eth() -> f64 {
    constants::DEFAULT_MAX_SWAP_ETH
}
fn default_min_delay_secs() -> u64 {
    constants::DEFAULT_MIN_DELAY_SECS
}
fn default_max_delay_secs() -> u64 {
    constants::DEFAULT_MAX_DELAY_SECS
}
fn default_gas_limit() -> u64 {
    constants::DEFAULT_GAS_LIMIT
}
fn default_receipt_poll_ms() -> u64 {
    constants::DEFAULT_RECEIPT_POLL_MS
}

fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, SeqAccess, Visitor};
    use std::fmt;

    struct ListVisitor;

    impl<'de> Visitor<'de> for ListVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of strings or a comma-separated string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(parse_list(v))
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(elem) = seq.next_element::<String>()? {
                let trimmed = elem.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(ListVisitor)
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let mut settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.merge_proxy_file()?;
        settings.validate()?;
        Ok(settings)
    }

    fn merge_proxy_file(&mut self) -> Result<(), AppError> {
        let Some(path) = self.proxy_file.as_deref() else {
            return Ok(());
        };
        let body = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read proxy file {path}: {e}")))?;
        let from_file = body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(ToString::to_string);
        self.proxies.extend(from_file);
        tracing::info!(target: "config", proxies = self.proxies.len(), file = %path, "Loaded proxy list");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.signing_keys().is_empty() {
            return Err(AppError::Config(
                "WALLET_KEYS (or PRIVATE_KEY) is missing".to_string(),
            ));
        }
        Url::parse(self.rpc_url.trim())
            .map_err(|e| AppError::Config(format!("Invalid RPC URL: {e}")))?;
        for proxy in &self.proxies {
            Url::parse(proxy)
                .map_err(|e| AppError::Config(format!("Invalid proxy URL {proxy}: {e}")))?;
        }
        let finite = self.min_swap_eth.is_finite() && self.max_swap_eth.is_finite();
        if !(finite && self.min_swap_eth > 0.0 && self.min_swap_eth <= self.max_swap_eth) {
            return Err(AppError::Validation {
                field: "min_swap_eth/max_swap_eth".into(),
                message: format!(
                    "expected finite 0 < min <= max, got {} / {}",
                    self.min_swap_eth, self.max_swap_eth
                ),
            });
        }
        if self.min_delay_secs > self.max_delay_secs {
            return Err(AppError::Validation {
                field: "min_delay_secs/max_delay_secs".into(),
                message: format!(
                    "expected min <= max, got {} / {}",
                    self.min_delay_secs, self.max_delay_secs
                ),
            });
        }
        if self.gas_limit == 0 {
            return Err(AppError::Validation {
                field: "gas_limit".into(),
                message: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Configured signing keys in wallet order, `0x` prefix stripped.
    pub fn signing_keys(&self) -> Vec<String> {
        let keys: Vec<String> = if self.wallet_keys.is_empty() {
            self.private_key
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect()
        } else {
            self.wallet_keys.clone()
        };
        keys.iter().map(|k| strip_0x(k).to_string()).collect()
    }

    /// Proxy assigned to the wallet at `index`, if any.
    pub fn proxy_for_wallet(&self, index: usize) -> Option<&str> {
        if self.proxies.is_empty() {
            return None;
        }
        self.proxies
            .get(index % self.proxies.len())
            .map(String::as_str)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::new(
            self.min_swap_eth,
            self.max_swap_eth,
            Duration::from_secs(self.min_delay_secs),
            Duration::from_secs(self.max_delay_secs),
        )
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms.max(1))
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
