// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::retry::retry_async;
use crate::domain::constants::{RPC_RETRY_ATTEMPTS, RPC_RETRY_DELAY_MS};
use crate::domain::error::ChainError;
use crate::network::chain::ChainClient;
use std::time::Duration;

/// Nonce cursor for one signing account.
///
/// Owned by exactly one sequencer lane, which is the only writer. `None`
/// means the cursor has not been primed from the chain yet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccountNonceState {
    next_nonce: Option<u64>,
}

impl AccountNonceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primed(next_nonce: u64) -> Self {
        Self {
            next_nonce: Some(next_nonce),
        }
    }

    pub fn next_nonce(&self) -> Option<u64> {
        self.next_nonce
    }

    /// Nonce for the next task, priming from the pending transaction count
    /// when the cursor is unset. Returns whether priming happened.
    pub async fn acquire<C: ChainClient>(&mut self, chain: &C) -> Result<(u64, bool), ChainError> {
        if let Some(nonce) = self.next_nonce {
            return Ok((nonce, false));
        }

        let address = chain.address();
        let on_chain_nonce = retry_async(
            move |_| chain.pending_nonce(address),
            RPC_RETRY_ATTEMPTS,
            Duration::from_millis(RPC_RETRY_DELAY_MS),
        )
        .await?;

        self.next_nonce = Some(on_chain_nonce);
        Ok((on_chain_nonce, true))
    }

    pub fn record_success(&mut self) {
        if let Some(nonce) = self.next_nonce.as_mut() {
            *nonce += 1;
        }
    }

    /// Apply a failed attempt. A nonce that the chain already consumed is
    /// skipped; any other failure leaves the cursor for the next task.
    /// Returns true when the cursor advanced.
    pub fn record_failure(&mut self, err: &ChainError) -> bool {
        if !err.is_nonce_already_used() {
            return false;
        }
        match self.next_nonce.as_mut() {
            Some(nonce) => {
                *nonce += 1;
                true
            }
            None => false,
        }
    }

    /// Forget the cursor so the next task re-primes from chain.
    pub fn resync(&mut self) {
        self.next_nonce = None;
    }
}
