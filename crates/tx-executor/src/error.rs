// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for transaction execution and result resolution
//!
//! [`ChainError`] is what a [`ChainClient`](crate::ChainClient) reports for a
//! single RPC interaction. [`ExecutorError`] is what callers of the executor
//! see: chain errors wrapped, plus revert diagnosis, retry exhaustion and the
//! result-decoding failures of the inference flow.

use std::fmt;

use alloy_primitives::B256;
use tensor_codec::TensorError;
use thiserror::Error;

use crate::nonce::is_nonce_conflict;

/// Result type alias for chain client operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Result type alias for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors reported by a chain client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ChainError {
    /// The node executed the call and it reverted
    #[error("execution reverted{}", revert_suffix(.reason))]
    Reverted { reason: Option<String> },

    /// Any other RPC or transport failure
    #[error("RPC error: {message}")]
    Rpc { message: String },

    /// No receipt was observed before the deadline
    #[error("transaction {transaction_hash} not mined within {timeout_seconds} seconds")]
    Timeout {
        transaction_hash: B256,
        timeout_seconds: u64,
    },

    /// Key material could not be loaded or used
    #[error("signer error: {message}")]
    Signer { message: String },
}

impl ChainError {
    /// Create an RPC error
    pub fn rpc<T: ToString>(message: T) -> Self {
        Self::Rpc {
            message: message.to_string(),
        }
    }

    /// Create a revert error with an optional reason
    pub fn reverted<T: ToString>(reason: Option<T>) -> Self {
        Self::Reverted {
            reason: reason.map(|r| r.to_string()),
        }
    }

    /// Create a signer error
    pub fn signer<T: ToString>(message: T) -> Self {
        Self::Signer {
            message: message.to_string(),
        }
    }

    /// Whether the failure is a nonce race that a fresh attempt may resolve
    pub fn is_nonce_conflict(&self) -> bool {
        match self {
            Self::Rpc { message } => is_nonce_conflict(message),
            Self::Reverted { .. } | Self::Timeout { .. } | Self::Signer { .. } => false,
        }
    }
}

fn revert_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|reason| format!(": {reason}"))
        .unwrap_or_default()
}

/// Step of the state machine that surfaced a revert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertStage {
    /// Gas estimation failed before anything was broadcast
    Estimation,
    /// The transaction was mined with a failure status
    Receipt,
}

impl fmt::Display for RevertStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estimation => write!(f, "gas estimation"),
            Self::Receipt => write!(f, "receipt"),
        }
    }
}

/// Errors surfaced by the executor and the inference flow built on it
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ExecutorError {
    /// A read-only replay produced a revert reason
    #[error("simulation failed at {stage} with revert reason: {reason}")]
    SimulationRevert { stage: RevertStage, reason: String },

    /// The call failed on chain and no revert reason could be obtained
    #[error("contract logic error: {message}")]
    ContractLogic { message: String },

    /// Failure reported by the chain client
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Nonce conflicts persisted through every attempt
    #[error("transaction failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ExecutorError>,
    },

    /// Neither the receipt nor the out-of-band lookup yielded a result
    #[error("{event} not found for transaction {transaction_hash}")]
    MissingResultEvent {
        event: &'static str,
        transaction_hash: B256,
    },

    /// The out-of-band result lacks the field required by the inference mode
    #[error("missing field '{field}' in inference result")]
    MissingResultField { field: String },

    /// The out-of-band lookup service answered with an error
    #[error("result lookup failed with status {status}: {message}")]
    Lookup { status: u16, message: String },

    /// HTTP transport failure talking to the lookup service
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Base64 payload that does not decode
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON payload that does not parse
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// ABI payload that does not decode
    #[error("ABI decoding failed: {message}")]
    Abi { message: String },

    /// Tensor conversion failure
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// Invalid executor or client configuration
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl ExecutorError {
    /// Create a contract logic error
    pub fn contract_logic<T: ToString>(message: T) -> Self {
        Self::ContractLogic {
            message: message.to_string(),
        }
    }

    /// Create an ABI decoding error
    pub fn abi<T: ToString>(message: T) -> Self {
        Self::Abi {
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// Create a missing field error
    pub fn missing_field<T: ToString>(field: T) -> Self {
        Self::MissingResultField {
            field: field.to_string(),
        }
    }

    /// Whether the failure is a nonce race that the retry loop handles
    pub fn is_nonce_conflict(&self) -> bool {
        matches!(self, Self::Chain(error) if error.is_nonce_conflict())
    }

    /// Whether the failure is final for this logical call
    ///
    /// Reverts and failed receipts never succeed on a replay of the same call.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SimulationRevert { .. }
                | Self::ContractLogic { .. }
                | Self::RetriesExhausted { .. }
                | Self::Chain(ChainError::Reverted { .. })
        )
    }

    /// Revert reason carried by the error, if any
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::SimulationRevert { reason, .. } => Some(reason),
            Self::Chain(ChainError::Reverted { reason }) => reason.as_deref(),
            Self::RetriesExhausted { source, .. } => source.revert_reason(),
            _ => None,
        }
    }

    /// Number of attempts made, when the retry budget ran out
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
