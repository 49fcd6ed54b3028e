// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::ChainError;
use alloy::primitives::{Address, TxHash, U256};
use std::future::Future;

/// Settled transaction as seen by the swap controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Chain access bound to a single signing account and wrapped-token contract.
///
/// Every `submit_*` call only broadcasts; confirmation is awaited separately
/// through [`ChainClient::await_confirmation`] so callers decide where the
/// wait happens (inside the sequencer task body).
pub trait ChainClient: Send + Sync + 'static {
    /// Address of the bound signer.
    fn address(&self) -> Address;

    /// Wrapped-token contract the client deposits into and withdraws from.
    fn wrapped_token(&self) -> Address;

    fn pending_nonce(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, ChainError>> + Send;

    fn submit_wrap(
        &self,
        amount: U256,
        nonce: u64,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    fn submit_unwrap(
        &self,
        amount: U256,
        nonce: u64,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    fn submit_approval(
        &self,
        spender: Address,
        amount: U256,
        nonce: u64,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    fn await_confirmation(
        &self,
        hash: TxHash,
    ) -> impl Future<Output = Result<TxReceipt, ChainError>> + Send;

    fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn balance(&self, address: Address) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn token_balance(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;
}
