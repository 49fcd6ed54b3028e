// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

#![allow(dead_code)]

use alloy::primitives::{Address, TxHash, U256};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weth_cycler::domain::error::ChainError;
use weth_cycler::network::chain::{ChainClient, TxReceipt};
use weth_cycler::services::events::{EventLevel, EventLog};

pub fn weth() -> Address {
    Address::repeat_byte(0xee)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Wrap { amount: U256, nonce: u64 },
    Unwrap { amount: U256, nonce: u64 },
    Approve { spender: Address, amount: U256, nonce: u64 },
}

impl Call {
    pub fn nonce(&self) -> u64 {
        match self {
            Call::Wrap { nonce, .. } | Call::Unwrap { nonce, .. } | Call::Approve { nonce, .. } => {
                *nonce
            }
        }
    }
}

#[derive(Default)]
struct FakeState {
    pending_nonce: u64,
    used_nonces: HashSet<u64>,
    failing_nonce_reads: usize,
    submit_failures: VecDeque<ChainError>,
    revert_next: usize,
    hang_confirmations: bool,
    fail_balances: bool,
    fail_allowance: bool,
    fail_approvals: bool,
    allowance: U256,
    native: U256,
    wrapped: U256,
    calls: Vec<Call>,
    nonce_reads: usize,
    balance_reads: usize,
}

/// In-memory chain for one account. Accepted submissions consume their nonce;
/// a nonce that was consumed before is rejected as already used.
pub struct FakeChain {
    address: Address,
    latency: Duration,
    balance_latency: Duration,
    state: Mutex<FakeState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeChain {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            latency: Duration::from_millis(200),
            balance_latency: Duration::ZERO,
            state: Mutex::new(FakeState {
                allowance: U256::MAX,
                native: U256::from(10u64).pow(U256::from(18u64)),
                wrapped: U256::from(10u64).pow(U256::from(18u64)),
                ..FakeState::default()
            }),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_balance_latency(mut self, latency: Duration) -> Self {
        self.balance_latency = latency;
        self
    }

    pub fn with_pending_nonce(self, nonce: u64) -> Self {
        self.set_pending_nonce(nonce);
        self
    }

    pub fn with_used_nonce(self, nonce: u64) -> Self {
        self.state().used_nonces.insert(nonce);
        self
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        self.state().allowance = allowance;
        self
    }

    pub fn set_pending_nonce(&self, nonce: u64) {
        self.state().pending_nonce = nonce;
    }

    pub fn fail_nonce_reads(&self, count: usize) {
        self.state().failing_nonce_reads = count;
    }

    pub fn fail_next_submit(&self, err: ChainError) {
        self.state().submit_failures.push_back(err);
    }

    pub fn revert_next(&self, count: usize) {
        self.state().revert_next = count;
    }

    pub fn hang_confirmations(&self, hang: bool) {
        self.state().hang_confirmations = hang;
    }

    pub fn fail_balances(&self, fail: bool) {
        self.state().fail_balances = fail;
    }

    pub fn fail_allowance(&self, fail: bool) {
        self.state().fail_allowance = fail;
    }

    pub fn fail_approvals(&self, fail: bool) {
        self.state().fail_approvals = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn nonces(&self) -> Vec<u64> {
        self.calls().iter().map(Call::nonce).collect()
    }

    pub fn nonce_reads(&self) -> usize {
        self.state().nonce_reads
    }

    pub fn balance_reads(&self) -> usize {
        self.state().balance_reads
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn accept(&self, call: Call) -> Result<TxHash, ChainError> {
        self.enter();
        let mut state = self.state();
        let nonce = call.nonce();
        if let Some(err) = state.submit_failures.pop_front() {
            drop(state);
            self.leave();
            return Err(err);
        }
        if state.fail_approvals && matches!(call, Call::Approve { .. }) {
            drop(state);
            self.leave();
            return Err(ChainError::Rpc("approval rejected".into()));
        }
        if !state.used_nonces.insert(nonce) {
            drop(state);
            self.leave();
            return Err(ChainError::NonceAlreadyUsed(format!(
                "nonce has already been used: {nonce}"
            )));
        }
        state.pending_nonce = state.pending_nonce.max(nonce + 1);
        match &call {
            Call::Wrap { amount, .. } => {
                state.native = state.native.saturating_sub(*amount);
                state.wrapped += *amount;
            }
            Call::Unwrap { amount, .. } => {
                state.wrapped = state.wrapped.saturating_sub(*amount);
                state.native += *amount;
            }
            Call::Approve { amount, .. } => state.allowance = *amount,
        }
        state.calls.push(call);
        Ok(TxHash::from(U256::from(nonce + 1).to_be_bytes::<32>()))
    }
}

impl ChainClient for FakeChain {
    fn address(&self) -> Address {
        self.address
    }

    fn wrapped_token(&self) -> Address {
        weth()
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64, ChainError> {
        let mut state = self.state();
        state.nonce_reads += 1;
        if state.failing_nonce_reads > 0 {
            state.failing_nonce_reads -= 1;
            return Err(ChainError::Rpc("nonce read unavailable".into()));
        }
        Ok(state.pending_nonce)
    }

    async fn submit_wrap(&self, amount: U256, nonce: u64) -> Result<TxHash, ChainError> {
        self.accept(Call::Wrap { amount, nonce })
    }

    async fn submit_unwrap(&self, amount: U256, nonce: u64) -> Result<TxHash, ChainError> {
        self.accept(Call::Unwrap { amount, nonce })
    }

    async fn submit_approval(
        &self,
        spender: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, ChainError> {
        self.accept(Call::Approve {
            spender,
            amount,
            nonce,
        })
    }

    async fn await_confirmation(&self, hash: TxHash) -> Result<TxReceipt, ChainError> {
        let hang = self.state().hang_confirmations;
        if hang {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(self.latency).await;
        let reverted = {
            let mut state = self.state();
            if state.revert_next > 0 {
                state.revert_next -= 1;
                true
            } else {
                false
            }
        };
        self.leave();
        if reverted {
            return Err(ChainError::Reverted {
                hash: format!("{hash:#x}"),
            });
        }
        Ok(TxReceipt {
            hash,
            block_number: Some(1),
            gas_used: 46_000,
        })
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256, ChainError> {
        let state = self.state();
        if state.fail_allowance {
            return Err(ChainError::Rpc("allowance unavailable".into()));
        }
        Ok(state.allowance)
    }

    async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
        self.state().balance_reads += 1;
        if !self.balance_latency.is_zero() {
            tokio::time::sleep(self.balance_latency).await;
        }
        let state = self.state();
        if state.fail_balances {
            return Err(ChainError::Rpc("balance unavailable".into()));
        }
        Ok(state.native)
    }

    async fn token_balance(&self, _address: Address) -> Result<U256, ChainError> {
        let state = self.state();
        if state.fail_balances {
            return Err(ChainError::Rpc("balance unavailable".into()));
        }
        Ok(state.wrapped)
    }
}

pub fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Wrap one wei and wait for it, yielding the nonce it ran with.
pub fn wrap_job(
    chain: &Arc<FakeChain>,
) -> impl FnOnce(u64) -> BoxFuture<'static, Result<u64, ChainError>> + Send + use<> {
    let chain = chain.clone();
    move |nonce| {
        async move {
            let hash = chain.submit_wrap(U256::from(1u64), nonce).await?;
            chain.await_confirmation(hash).await?;
            Ok(nonce)
        }
        .boxed()
    }
}

pub fn has_event(events: &EventLog, level: EventLevel, needle: &str) -> bool {
    events
        .snapshot()
        .iter()
        .any(|e| e.level == level && e.message.contains(needle))
}

pub fn count_events(events: &EventLog, needle: &str) -> usize {
    events
        .snapshot()
        .iter()
        .filter(|e| e.message.contains(needle))
        .count()
}
