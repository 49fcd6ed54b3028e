// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

// =============================================================================
// SWAP PACING
// =============================================================================

/// Per-round trade amount window, in native units.
pub const DEFAULT_MIN_SWAP_ETH: f64 = 0.0001;
pub const DEFAULT_MAX_SWAP_ETH: f64 = 0.001;

/// Trade amounts are rounded to this many decimals before conversion to wei.
pub const SWAP_AMOUNT_DECIMALS: u32 = 6;

/// Inter-round wait window.
pub const DEFAULT_MIN_DELAY_SECS: u64 = 30;
pub const DEFAULT_MAX_DELAY_SECS: u64 = 60;

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

pub const DEFAULT_GAS_LIMIT: u64 = 100_000;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 500;

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Number of events retained by the in-memory event log.
pub const EVENT_LOG_CAPACITY: usize = 1_000;
pub const EVENT_BROADCAST_CAPACITY: usize = 256;

pub const DEFAULT_NETWORK_NAME: &str = "RISE TESTNET";

// RPC read retries (nonce priming, balances, allowance)
pub const RPC_RETRY_ATTEMPTS: usize = 3;
pub const RPC_RETRY_DELAY_MS: u64 = 100;
