// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::retry::retry_async;
use crate::domain::constants::{RPC_RETRY_ATTEMPTS, RPC_RETRY_DELAY_MS};
use crate::domain::error::{AppError, ChainError};
use crate::network::chain::{ChainClient, TxReceipt};
use crate::network::provider::HttpProvider;
use alloy::consensus::{SignableTransaction, TxEip1559};
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy_consensus::TxEnvelope;
use alloy_sol_types::SolCall;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;

sol! {
    #[sol(rpc)]
    interface IWETH {
        function deposit() external payable;
        function withdraw(uint256 wad) external;
        function approve(address guy, uint256 wad) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// [`ChainClient`] backed by an alloy HTTP provider and a local signer.
#[derive(Clone)]
pub struct AlloyChainClient {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    weth: Address,
    chain_id: u64,
    gas_limit: u64,
    receipt_poll: Duration,
}

impl AlloyChainClient {
    /// Bind `private_key` to `provider`, resolving the chain id once.
    pub async fn connect(
        provider: HttpProvider,
        private_key: &str,
        weth: Address,
        gas_limit: u64,
        receipt_poll: Duration,
    ) -> Result<Self, AppError> {
        let signer = PrivateKeySigner::from_str(private_key)
            .map_err(|e| AppError::InvalidKey(e.to_string()))?;
        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("chain_id lookup failed: {e}")))?;

        tracing::info!(
            target: "chain",
            chain_id,
            wallet = %signer.address(),
            weth = %weth,
            "Chain client ready"
        );

        Ok(Self {
            provider,
            signer,
            weth,
            chain_id,
            gas_limit,
            receipt_poll,
        })
    }

    async fn sign_and_send(
        &self,
        nonce: u64,
        value: U256,
        input: Bytes,
    ) -> Result<TxHash, ChainError> {
        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(|e| ChainError::Rpc(format!("fee estimation failed: {e}")))?;

        let mut tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.weth),
            value,
            access_list: AccessList::default(),
            input,
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
            .map_err(|e| ChainError::Other(format!("Sign tx failed: {e}")))?;
        let signed: TxEnvelope = tx.into_signed(sig).into();
        let raw = signed.encoded_2718();

        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| ChainError::classify(e.to_string()))?;
        let hash = *pending.tx_hash();
        tracing::debug!(target: "chain", nonce, tx = %hash, "Broadcast transaction");
        Ok(hash)
    }
}

impl ChainClient for AlloyChainClient {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn wrapped_token(&self) -> Address {
        self.weth
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| ChainError::Rpc(format!("Failed to fetch nonce: {e}")))
    }

    async fn submit_wrap(&self, amount: U256, nonce: u64) -> Result<TxHash, ChainError> {
        let input = IWETH::depositCall {}.abi_encode();
        self.sign_and_send(nonce, amount, input.into()).await
    }

    async fn submit_unwrap(&self, amount: U256, nonce: u64) -> Result<TxHash, ChainError> {
        let input = IWETH::withdrawCall { wad: amount }.abi_encode();
        self.sign_and_send(nonce, U256::ZERO, input.into()).await
    }

    async fn submit_approval(
        &self,
        spender: Address,
        amount: U256,
        nonce: u64,
    ) -> Result<TxHash, ChainError> {
        let input = IWETH::approveCall {
            guy: spender,
            wad: amount,
        }
        .abi_encode();
        self.sign_and_send(nonce, U256::ZERO, input.into()).await
    }

    async fn await_confirmation(&self, hash: TxHash) -> Result<TxReceipt, ChainError> {
        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(rcpt)) => {
                    if !rcpt.status() {
                        return Err(ChainError::Reverted {
                            hash: format!("{hash:#x}"),
                        });
                    }
                    return Ok(TxReceipt {
                        hash,
                        block_number: rcpt.block_number,
                        gas_used: rcpt.gas_used,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "chain", tx = %hash, error = %e, "Receipt poll failed");
                }
            }
            sleep(self.receipt_poll).await;
        }
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError> {
        let weth = IWETH::new(self.weth, self.provider.clone());
        retry_async(
            move |_| {
                let weth = weth.clone();
                async move { weth.allowance(owner, spender).call().await }
            },
            RPC_RETRY_ATTEMPTS,
            Duration::from_millis(RPC_RETRY_DELAY_MS),
        )
        .await
        .map_err(|e| ChainError::Rpc(format!("Allowance check failed: {e}")))
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        let provider = self.provider.clone();
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_balance(address).await }
            },
            RPC_RETRY_ATTEMPTS,
            Duration::from_millis(RPC_RETRY_DELAY_MS),
        )
        .await
        .map_err(|e| ChainError::Rpc(format!("Balance check failed: {e}")))
    }

    async fn token_balance(&self, address: Address) -> Result<U256, ChainError> {
        let weth = IWETH::new(self.weth, self.provider.clone());
        retry_async(
            move |_| {
                let weth = weth.clone();
                async move { weth.balanceOf(address).call().await }
            },
            RPC_RETRY_ATTEMPTS,
            Duration::from_millis(RPC_RETRY_DELAY_MS),
        )
        .await
        .map_err(|e| ChainError::Rpc(format!("Token balance failed: {e}")))
    }
}
