// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! [`ChainClient`] backed by an alloy HTTP provider with a local signer

use std::time::Duration;

use alloy::{
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::decode_revert_reason,
    transports::TransportError,
};
use alloy_primitives::{Address, B256, Bytes};
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    chain::{ChainClient, ContractCall, Receipt, TransactionAttempt},
    error::{ChainError, ChainResult},
    executor::next_poll_delay,
};

const REVERT_PREFIX: &str = "execution reverted";

/// Chain client talking JSON-RPC over HTTP
#[derive(Debug, Clone)]
pub struct AlloyChainClient {
    provider: DynProvider,
    sender: Address,
    poll_interval: Duration,
}

impl AlloyChainClient {
    /// Connect to `rpc_url`, signing with the hex-encoded `private_key`
    pub fn new(rpc_url: &str, private_key: &str, poll_interval: Duration) -> ChainResult<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| ChainError::signer(format!("invalid private key: {e}")))?;
        let sender = signer.address();
        let url = Url::parse(rpc_url)
            .map_err(|e| ChainError::rpc(format!("invalid RPC URL '{rpc_url}': {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        debug!(%sender, rpc_url, "Created chain client");
        Ok(Self {
            provider,
            sender,
            poll_interval,
        })
    }

    fn request(&self, call: &ContractCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.sender)
            .with_to(call.to)
            .with_input(call.input.clone())
    }
}

impl ChainClient for AlloyChainClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn pending_nonce(&self) -> ChainResult<u64> {
        self.provider
            .get_transaction_count(self.sender)
            .pending()
            .await
            .map_err(classify)
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.provider.get_gas_price().await.map_err(classify)
    }

    async fn estimate_gas(&self, call: &ContractCall) -> ChainResult<u64> {
        self.provider
            .estimate_gas(self.request(call))
            .await
            .map_err(classify)
    }

    async fn simulate(&self, call: &ContractCall) -> ChainResult<Bytes> {
        self.provider.call(self.request(call)).await.map_err(classify)
    }

    async fn send_transaction(
        &self,
        call: &ContractCall,
        attempt: &TransactionAttempt,
    ) -> ChainResult<B256> {
        let request = self
            .request(call)
            .with_nonce(attempt.nonce)
            .with_gas_limit(attempt.gas_limit)
            .with_gas_price(attempt.gas_price);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(classify)?;
        Ok(*pending.tx_hash())
    }

    #[instrument(skip(self))]
    async fn wait_for_receipt(
        &self,
        transaction_hash: B256,
        timeout: Duration,
    ) -> ChainResult<Receipt> {
        let deadline = Instant::now() + timeout;
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(transaction_hash)
                .await
                .map_err(classify)?;

            if let Some(receipt) = receipt {
                return Ok(Receipt {
                    transaction_hash,
                    success: ReceiptResponse::status(&receipt),
                    logs: receipt
                        .inner
                        .logs()
                        .iter()
                        .map(|log| log.inner.clone())
                        .collect(),
                });
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ChainError::Timeout {
                    transaction_hash,
                    timeout_seconds: timeout.as_secs(),
                });
            }
            sleep(next_poll_delay(self.poll_interval, remaining)).await;
        }
    }
}

/// Map a transport error onto a revert or a plain RPC failure
fn classify(error: TransportError) -> ChainError {
    let Some(payload) = error.as_error_resp() else {
        return ChainError::rpc(error);
    };

    let data_reason = payload
        .as_revert_data()
        .and_then(|data| decode_revert_reason(&data));
    if data_reason.is_some() {
        return ChainError::Reverted {
            reason: data_reason,
        };
    }

    match revert_reason_from_message(&payload.message) {
        Some(reason) => ChainError::Reverted { reason },
        None => ChainError::rpc(&payload.message),
    }
}

/// `Some(reason)` when the node message reports a revert
fn revert_reason_from_message(message: &str) -> Option<Option<String>> {
    if !message.to_lowercase().contains("revert") {
        return None;
    }
    let reason = message
        .strip_prefix(REVERT_PREFIX)
        .map(|rest| rest.trim_start_matches(':').trim())
        .unwrap_or(message)
        .to_string();
    Some((!reason.is_empty()).then_some(reason))
}
