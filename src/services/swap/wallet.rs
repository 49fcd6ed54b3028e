// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::short_hex;
use crate::domain::error::ChainError;
use crate::network::chain::ChainClient;
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalletBalances {
    pub native: U256,
    pub wrapped: U256,
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// One signing account plus its last observed balances.
pub struct WalletContext<C: ChainClient> {
    chain: Arc<C>,
    balances: Mutex<WalletBalances>,
}

impl<C: ChainClient> WalletContext<C> {
    pub fn new(chain: Arc<C>) -> Self {
        Self {
            chain,
            balances: Mutex::new(WalletBalances::default()),
        }
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    pub fn address(&self) -> Address {
        self.chain.address()
    }

    pub fn label(&self) -> String {
        short_hex(&self.address().to_string())
    }

    pub fn balances(&self) -> WalletBalances {
        *self.balances.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-read native and wrapped balances. The cached values are kept when
    /// either read fails.
    pub async fn refresh(&self) -> Result<WalletBalances, ChainError> {
        let address = self.address();
        let (native, wrapped) = tokio::try_join!(
            self.chain.balance(address),
            self.chain.token_balance(address)
        )?;
        let fresh = WalletBalances {
            native,
            wrapped,
            refreshed_at: Some(Utc::now()),
        };
        *self.balances.lock().unwrap_or_else(|e| e.into_inner()) = fresh;
        Ok(fresh)
    }
}
