// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::{
    DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_SWAP_ETH, DEFAULT_MIN_DELAY_SECS, DEFAULT_MIN_SWAP_ETH,
    SWAP_AMOUNT_DECIMALS,
};
use alloy::primitives::U256;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const MICROS_PER_ETH: u64 = 1_000_000;
const WEI_PER_MICRO: u64 = 1_000_000_000_000;

/// Trade size with 6-decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SwapAmount {
    micros: u64,
}

impl SwapAmount {
    pub fn from_micros(micros: u64) -> Self {
        Self { micros }
    }

    pub fn micros(&self) -> u64 {
        self.micros
    }

    pub fn wei(&self) -> U256 {
        U256::from(self.micros) * U256::from(WEI_PER_MICRO)
    }
}

impl fmt::Display for SwapAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.micros / MICROS_PER_ETH,
            self.micros % MICROS_PER_ETH
        )
    }
}

/// Random trade sizes and inter-round waits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    min_swap_eth: f64,
    max_swap_eth: f64,
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_SWAP_ETH,
            DEFAULT_MAX_SWAP_ETH,
            Duration::from_secs(DEFAULT_MIN_DELAY_SECS),
            Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
        )
    }
}

impl Pacing {
    /// Bounds are reordered if given inverted.
    pub fn new(min_swap_eth: f64, max_swap_eth: f64, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_swap_eth: min_swap_eth.min(max_swap_eth),
            max_swap_eth: max_swap_eth.max(min_swap_eth),
            min_delay: min_delay.min(max_delay),
            max_delay: max_delay.max(min_delay),
        }
    }

    pub fn draw_amount<R: Rng + ?Sized>(&self, rng: &mut R) -> SwapAmount {
        let eth = rng.gen_range(self.min_swap_eth..=self.max_swap_eth);
        let scale = 10f64.powi(SWAP_AMOUNT_DECIMALS as i32);
        let micros = (eth * scale).round() as u64;
        SwapAmount::from_micros(micros.max(1))
    }

    pub fn draw_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min_ms = self.min_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        Duration::from_millis(rng.gen_range(min_ms..=max_ms))
    }
}

/// Sleep for `delay` unless `cancel` fires first. Returns false when the
/// wait was cut short by cancellation.
pub async fn wait_with_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = sleep(delay) => true,
    }
}

/// `1m 5s` style rendering for wait announcements.
pub fn describe_delay(delay: Duration) -> String {
    let total = delay.as_secs();
    format!("{}m {}s", total / 60, total % 60)
}
