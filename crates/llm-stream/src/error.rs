// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the LLM client and streaming bridge

use thiserror::Error;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors surfaced by the LLM client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum LlmError {
    /// The server answered at the connection level with something unusable
    #[error("stream protocol error{}: {message}", status_suffix(.status))]
    StreamProtocol { status: Option<u16>, message: String },

    /// Payment was demanded and could not be satisfied
    #[error("payment required: {message}")]
    PaymentRequired { message: String },

    /// A complete response that lacks required content
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON that does not parse
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// The streaming worker could not be started
    #[error("failed to start streaming worker: {0}")]
    Worker(#[from] std::io::Error),

    /// The streaming worker panicked
    #[error("streaming worker panicked")]
    WorkerPanicked,
}

impl LlmError {
    /// Create a stream protocol error for an HTTP status
    pub fn protocol<T: ToString>(status: u16, message: T) -> Self {
        Self::StreamProtocol {
            status: Some(status),
            message: message.to_string(),
        }
    }

    /// Create a payment error
    pub fn payment<T: ToString>(message: T) -> Self {
        Self::PaymentRequired {
            message: message.to_string(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response<T: ToString>(message: T) -> Self {
        Self::InvalidResponse {
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<T: ToString>(message: T) -> Self {
        Self::Configuration {
            message: message.to_string(),
        }
    }

    /// HTTP status the server answered with, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::StreamProtocol { status, .. } => *status,
            Self::PaymentRequired { .. } => Some(402),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Whether repeating the request might succeed
    ///
    /// Payment failures are excluded so a retry never settles twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(error) => error.is_timeout() || error.is_connect(),
            Self::StreamProtocol {
                status: Some(status),
                ..
            } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" (HTTP {status})"))
        .unwrap_or_default()
}
