// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Resilient transaction execution for blockchain-backed inference
//!
//! Every state-changing call goes through the same state machine: gas
//! estimation with revert diagnosis, submission with the pending nonce, and
//! receipt handling under a call-class deadline. Nonce races are retried with
//! a fresh attempt; reverts are explained and surfaced, never retried.
//!
//! # Architecture
//!
//! - [`chain`]: the [`ChainClient`] seam between the state machine and a node
//! - [`alloy_client`]: [`AlloyChainClient`], the JSON-RPC implementation
//! - [`executor`]: [`TransactionExecutor`] and its retry loop
//! - [`inference`]: [`OnchainInference`], model runs through the inference hub
//! - [`lookup`]: [`NodeResultClient`], out-of-band result resolution
//! - [`abi`]: contract bindings for the hub and the inference precompile
//! - [`nonce`]: nonce-conflict classification
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use alloy_primitives::address;
//! use shared_types::InferenceMode;
//! use tensor_codec::TensorData;
//! use tx_executor::{
//!     AlloyChainClient, ExecutorConfig, NodeResultClient, OnchainInference, TransactionExecutor,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExecutorConfig::default();
//! let chain = AlloyChainClient::new(
//!     "http://localhost:8545",
//!     "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
//!     config.receipt_poll_interval,
//! )?;
//! let executor = TransactionExecutor::new(chain, config)?;
//! let lookup = NodeResultClient::new("http://localhost:1317", Duration::from_secs(30))?;
//! let inference = OnchainInference::new(
//!     executor,
//!     address!("8383bf4c2d5b4d2f0d8fc96c85f6b5a7a0b3d3a1"),
//!     lookup,
//! );
//!
//! let result = inference
//!     .infer(
//!         "QmbUqS93oc4JTLMHwpVxsE39mhNxy6hpf6Py3r9oANr8aZ",
//!         InferenceMode::Vanilla,
//!         [("open_high_low_close", TensorData::from(vec![2535.79, 2535.79, 2505.37, 2515.36]))],
//!         None,
//!     )
//!     .await?;
//! println!("{} -> {:?}", result.transaction_hash, result.output.numbers);
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod alloy_client;
pub mod chain;
pub mod config;
pub mod error;
pub mod executor;
pub mod inference;
pub mod lookup;
pub mod nonce;

pub use alloy_client::AlloyChainClient;
pub use chain::{ChainClient, ContractCall, Receipt, TransactionAttempt};
pub use config::{CallClass, DEFAULT_MAX_RETRIES, ExecutorConfig};
pub use error::{ChainError, ChainResult, ExecutorError, ExecutorResult, RevertStage};
pub use executor::TransactionExecutor;
pub use inference::OnchainInference;
pub use lookup::NodeResultClient;
pub use nonce::{NONCE_CONFLICT_PATTERNS, is_nonce_conflict};
