// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Client SDK for blockchain-backed model inference and LLM requests
//!
//! [`Client`] is an explicit handle: construct one from an [`SdkConfig`] and
//! pass it where it is needed. It owns the chain client, the transaction
//! executor and the HTTP clients behind its two namespaces:
//!
//! - [`Client::inference`]: run models through the inference hub contract
//! - [`Client::llm`]: chat, completion and blocking streaming chat
//!
//! # Example
//!
//! ```rust,no_run
//! use inference_sdk::{Client, InferenceMode, SdkConfig, TensorData};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! inference_sdk::telemetry::init_tracing()?;
//!
//! let client = Client::new(SdkConfig::load()?)?;
//! let result = client
//!     .inference()
//!     .infer(
//!         "QmbUqS93oc4JTLMHwpVxsE39mhNxy6hpf6Py3r9oANr8aZ",
//!         InferenceMode::Vanilla,
//!         [("price_history", TensorData::from(vec![3.1_f64, 3.4, 2.9]))],
//!         None,
//!     )
//!     .await?;
//! println!("{} -> {:?}", result.transaction_hash, result.output.numbers);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod telemetry;

pub use client::{Client, Inference};
pub use config::SdkConfig;
pub use error::{SdkError, SdkResult};
pub use llm_stream::{
    ChatMessage, ChatRequest, ChunkStream, CompletionRequest, LlmClient, LlmConfig, LlmError,
    PaymentSigner, SettlementMode, StaticPayment, StreamChunk, TextGenerationOutput,
};
pub use shared_types::{InferenceMode, InferenceResult, ModelOutput};
pub use tensor_codec::{TensorData, TensorError};
pub use tx_executor::{ChainError, ExecutorConfig, ExecutorError};
