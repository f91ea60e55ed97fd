// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! The SDK client handle

use std::sync::Arc;

use alloy_primitives::Address;
use llm_stream::{LlmClient, PaymentSigner};
use tracing::info;
use tx_executor::{
    AlloyChainClient, ChainClient, NodeResultClient, OnchainInference, TransactionExecutor,
};

use crate::{
    config::SdkConfig,
    error::{SdkError, SdkResult},
};

/// On-chain inference over the JSON-RPC chain client
pub type Inference = OnchainInference<AlloyChainClient>;

/// Entry point to on-chain inference and LLM requests
///
/// Every handle owns its own chain client, executor and HTTP clients; build
/// as many as needed and share one behind an [`Arc`] across tasks.
#[derive(Debug)]
pub struct Client {
    sender: Address,
    inference: Inference,
    llm: LlmClient,
}

impl Client {
    /// Build a client from a validated configuration
    pub fn new(config: SdkConfig) -> SdkResult<Self> {
        config.validate().map_err(|e| SdkError::config(format!("{e:#}")))?;
        let private_key = config
            .private_key
            .as_deref()
            .ok_or_else(|| SdkError::config("private_key must be set"))?;

        let chain = AlloyChainClient::new(
            &config.rpc_url,
            private_key,
            config.executor.receipt_poll_interval,
        )?;
        let sender = chain.sender();
        let executor = TransactionExecutor::new(chain, config.executor.clone())?;
        let lookup = NodeResultClient::new(&config.api_url, config.lookup_timeout())?;
        let inference = OnchainInference::new(executor, config.inference_hub_address, lookup);
        let llm = LlmClient::new(config.llm)?;

        info!(
            %sender,
            rpc_url = %config.rpc_url,
            hub = %config.inference_hub_address,
            "Created inference SDK client"
        );

        Ok(Self {
            sender,
            inference,
            llm,
        })
    }

    /// Build a client from the layered configuration sources
    pub fn from_env() -> SdkResult<Self> {
        Self::new(SdkConfig::from_env()?)
    }

    /// Answer LLM payment challenges with `signer`
    #[must_use]
    pub fn with_payment_signer(mut self, signer: Arc<dyn PaymentSigner>) -> Self {
        self.llm = self.llm.with_payment_signer(signer);
        self
    }

    /// Account signing the client's transactions
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Model inference through the inference hub
    pub fn inference(&self) -> &Inference {
        &self.inference
    }

    /// Chat, completion and streaming chat
    pub fn llm(&self) -> &LlmClient {
        &self.llm
    }
}
