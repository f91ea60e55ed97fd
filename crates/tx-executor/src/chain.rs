// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Chain client abstraction
//!
//! The executor drives its state machine through [`ChainClient`], so the
//! retry and revert-diagnosis logic can be exercised against in-memory stubs
//! and run unchanged against a live node through
//! [`AlloyChainClient`](crate::AlloyChainClient).

use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, Log};

use crate::error::ChainResult;

/// A contract call ready to be estimated, simulated or broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract
    pub to: Address,
    /// ABI-encoded calldata
    pub input: Bytes,
    /// Short name used in logs and error messages
    pub label: &'static str,
}

impl ContractCall {
    /// Create a new contract call
    pub fn new(to: Address, input: impl Into<Bytes>, label: &'static str) -> Self {
        Self {
            to,
            input: input.into(),
            label,
        }
    }
}

/// Parameters of one broadcast attempt
///
/// Local to a single pass through the state machine and discarded afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionAttempt {
    /// One-based attempt number within the logical call
    pub attempt: u32,
    /// Pending nonce fetched for this attempt
    pub nonce: u64,
    /// Raw gas estimate
    pub gas_estimate: u64,
    /// Estimate inflated by the call-class multiplier
    pub gas_limit: u64,
    /// Gas price in wei
    pub gas_price: u128,
}

/// A mined transaction receipt, reduced to what the executor needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the mined transaction
    pub transaction_hash: B256,
    /// Whether execution succeeded
    pub success: bool,
    /// Logs emitted by the transaction
    pub logs: Vec<Log>,
}

/// Operations the executor needs from a node
pub trait ChainClient: Send + Sync {
    /// Account that signs and pays for transactions
    fn sender(&self) -> Address;

    /// Next nonce for the sender, including pending transactions
    fn pending_nonce(&self) -> impl Future<Output = ChainResult<u64>> + Send;

    /// Current gas price in wei
    fn gas_price(&self) -> impl Future<Output = ChainResult<u128>> + Send;

    /// Estimate gas for a call
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Reverted`](crate::ChainError::Reverted) when the
    /// node reports that the call would revert.
    fn estimate_gas(&self, call: &ContractCall) -> impl Future<Output = ChainResult<u64>> + Send;

    /// Execute a call read-only against the latest state
    ///
    /// Used to replay a failed call and capture its revert reason.
    fn simulate(&self, call: &ContractCall) -> impl Future<Output = ChainResult<Bytes>> + Send;

    /// Sign and broadcast a call with the given attempt parameters
    fn send_transaction(
        &self,
        call: &ContractCall,
        attempt: &TransactionAttempt,
    ) -> impl Future<Output = ChainResult<B256>> + Send;

    /// Wait until the transaction is mined or `timeout` elapses
    fn wait_for_receipt(
        &self,
        transaction_hash: B256,
        timeout: Duration,
    ) -> impl Future<Output = ChainResult<Receipt>> + Send;
}
