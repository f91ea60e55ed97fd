// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the SDK facade

use llm_stream::LlmError;
use thiserror::Error;
use tx_executor::{ChainError, ExecutorError};

/// Result type alias for facade operations
pub type SdkResult<T> = Result<T, SdkError>;

/// Errors surfaced while building or using the [`Client`](crate::Client)
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The chain client could not be created
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// On-chain execution or result resolution failed
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// LLM request failed
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl SdkError {
    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }
}
