// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! LLM chat and completion client with a blocking streaming bridge
//!
//! Requests go to payment-gated servers: a `402 Payment Required` answer is
//! met once through a [`PaymentSigner`], and the settlement mode travels in
//! the `X-SETTLEMENT-TYPE` header.
//!
//! - [`client`]: [`LlmClient`] with async `chat` and `completion`, and the
//!   synchronous `stream_chat`
//! - [`bridge`]: [`ChunkStream`], a blocking iterator fed by a per-stream
//!   worker thread
//! - [`sse`]: incremental `text/event-stream` decoding
//! - [`types`]: requests, outputs and streaming chunks
//!
//! # Example
//!
//! ```rust,no_run
//! use llm_stream::{ChatMessage, ChatRequest, LlmClient, LlmConfig};
//!
//! # fn example() -> Result<(), llm_stream::LlmError> {
//! let client = LlmClient::new(LlmConfig::default())?;
//! let request = ChatRequest::new(
//!     "openai/gpt-4o",
//!     vec![ChatMessage::user("Summarize the last ETH candle")],
//! );
//!
//! for chunk in client.stream_chat(request)? {
//!     if let Some(text) = chunk?.content() {
//!         print!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod payment;
pub mod sse;
pub mod types;

pub use bridge::ChunkStream;
pub use client::{LlmClient, SETTLEMENT_HEADER};
pub use config::LlmConfig;
pub use error::{LlmError, LlmResult};
pub use payment::{PAYMENT_HEADER, PROCESSING_HASH_HEADER, PaymentSigner, StaticPayment};
pub use sse::{SseDecoder, SseFrame};
pub use types::{
    ChatMessage, ChatRequest, CompletionRequest, FunctionDelta, ResponseFormat, SettlementMode,
    StreamChoice, StreamChunk, StreamDelta, TextGenerationOutput, ToolCallDelta, Usage,
};
