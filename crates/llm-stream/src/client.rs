// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the payment-gated LLM servers

use std::sync::Arc;

use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    bridge::{ChunkStream, StreamJob},
    config::{LlmConfig, endpoint},
    error::{LlmError, LlmResult},
    payment::{PAYMENT_HEADER, PROCESSING_HASH_HEADER, PaymentSigner},
    types::{
        ChatMessage, ChatRequest, CompletionRequest, EXTERNAL_TRANSACTION_HASH, SettlementMode,
        TextGenerationOutput,
    },
};

/// Header selecting how the request is settled
pub const SETTLEMENT_HEADER: &str = "X-SETTLEMENT-TYPE";

const COMPLETIONS_PATH: [&str; 2] = ["v1", "completions"];
const CHAT_COMPLETIONS_PATH: [&str; 3] = ["v1", "chat", "completions"];

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    completion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// Client for chat, completion and streaming chat requests
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
    config: Arc<LlmConfig>,
    server_url: Url,
    streaming_server_url: Url,
    signer: Option<Arc<dyn PaymentSigner>>,
}

impl LlmClient {
    /// Create a client from a validated configuration
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        config.validate()?;
        let server_url = config.server_url()?;
        let streaming_server_url = config.streaming_server_url()?;
        let http = build_http_client(&config, true)?;

        info!(
            %server_url,
            %streaming_server_url,
            timeout_seconds = config.timeout_seconds,
            "Created LLM client"
        );

        Ok(Self {
            http,
            config: Arc::new(config),
            server_url,
            streaming_server_url,
            signer: None,
        })
    }

    /// Answer `402 Payment Required` challenges with `signer`
    #[must_use]
    pub fn with_payment_signer(mut self, signer: Arc<dyn PaymentSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Client configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Complete a prompt
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn completion(&self, request: &CompletionRequest) -> LlmResult<TextGenerationOutput> {
        let url = endpoint(&self.server_url, &COMPLETIONS_PATH);
        let settlement = request.settlement_mode.unwrap_or(self.config.settlement_mode);

        let response = send_paid(
            &self.http,
            &self.config,
            self.signer.as_deref(),
            url,
            &request.payload(),
            settlement,
        )
        .await?;
        let payment_hash = processing_hash(&response);
        let body: CompletionResponse = serde_json::from_str(&response.text().await?)?;

        Ok(TextGenerationOutput {
            transaction_hash: EXTERNAL_TRANSACTION_HASH.to_string(),
            finish_reason: None,
            chat_output: None,
            completion_output: body.completion,
            payment_hash,
        })
    }

    /// Run a chat turn and wait for the whole answer
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    pub async fn chat(&self, request: &ChatRequest) -> LlmResult<TextGenerationOutput> {
        let url = endpoint(&self.server_url, &CHAT_COMPLETIONS_PATH);
        let settlement = request.settlement_mode.unwrap_or(self.config.settlement_mode);

        let response = send_paid(
            &self.http,
            &self.config,
            self.signer.as_deref(),
            url,
            &request.payload(false),
            settlement,
        )
        .await?;
        let payment_hash = processing_hash(&response);
        let text = response.text().await?;
        let body: ChatResponse = serde_json::from_str(&text)?;

        let Some(choice) = body.choices.into_iter().next() else {
            return Err(LlmError::invalid_response(format!(
                "'choices' missing or empty in {text}"
            )));
        };

        Ok(TextGenerationOutput {
            transaction_hash: EXTERNAL_TRANSACTION_HASH.to_string(),
            finish_reason: choice.finish_reason,
            chat_output: choice.message,
            completion_output: None,
            payment_hash,
        })
    }

    /// Stream a chat turn as a blocking iterator of chunks
    ///
    /// The exchange runs on a dedicated worker thread with its own runtime,
    /// so the returned [`ChunkStream`] must be consumed from synchronous
    /// code, not from inside an async task.
    pub fn stream_chat(&self, request: ChatRequest) -> LlmResult<ChunkStream> {
        debug!(model = %request.model, "Starting chat stream");
        ChunkStream::spawn(StreamJob {
            config: Arc::clone(&self.config),
            url: endpoint(&self.streaming_server_url, &CHAT_COMPLETIONS_PATH),
            signer: self.signer.clone(),
            request,
        })
    }
}

/// HTTP client for LLM requests
///
/// A streaming client carries no whole-request timeout, since a stream may
/// legitimately outlive it.
pub(crate) fn build_http_client(config: &LlmConfig, bounded: bool) -> LlmResult<Client> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout())
        .user_agent(concat!("llm-stream/", env!("CARGO_PKG_VERSION")));
    if bounded {
        builder = builder.timeout(config.timeout());
    }
    builder
        .build()
        .map_err(|e| LlmError::config(format!("failed to create HTTP client: {e}")))
}

/// POST `body`, answering one payment challenge if the server issues it
///
/// Returns the successful response with its body unread.
pub(crate) async fn send_paid<B: Serialize + ?Sized>(
    http: &Client,
    config: &LlmConfig,
    signer: Option<&dyn PaymentSigner>,
    url: Url,
    body: &B,
    settlement: SettlementMode,
) -> LlmResult<Response> {
    let request_id = Uuid::new_v4();
    let request = || -> RequestBuilder {
        http.post(url.clone())
            .bearer_auth(&config.api_key)
            .header(SETTLEMENT_HEADER, settlement.as_str())
            .header("X-Request-Id", request_id.to_string())
            .json(body)
    };

    debug!(%request_id, %url, %settlement, "Sending LLM request");
    let mut response = request().send().await?;

    if response.status() == StatusCode::PAYMENT_REQUIRED {
        let Some(signer) = signer else {
            warn!(%request_id, "Payment required but no payment signer is configured");
            return Err(LlmError::payment(
                "server requires payment and no payment signer is configured",
            ));
        };

        let challenge = read_challenge(response).await?;
        let payment = signer.sign(&challenge)?;
        debug!(%request_id, "Retrying request with payment");
        response = request().header(PAYMENT_HEADER, payment).send().await?;

        if response.status() == StatusCode::PAYMENT_REQUIRED {
            let message = response.text().await.unwrap_or_default();
            error!(%request_id, "Payment rejected");
            return Err(LlmError::payment(format!("payment rejected: {message}")));
        }
    }

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        error!(%request_id, status = status.as_u16(), "LLM request failed");
        return Err(LlmError::protocol(status.as_u16(), message));
    }

    Ok(response)
}

async fn read_challenge(response: Response) -> LlmResult<Value> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())))
}

fn processing_hash(response: &Response) -> Option<String> {
    response
        .headers()
        .get(PROCESSING_HASH_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
