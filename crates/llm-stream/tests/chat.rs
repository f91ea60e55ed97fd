// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for non-streaming chat and completion

use std::sync::Arc;

use llm_stream::{
    ChatMessage, ChatRequest, CompletionRequest, LlmClient, LlmConfig, LlmError, SettlementMode,
    StaticPayment,
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn create_test_client(base_url: String) -> LlmClient {
    LlmClient::new(LlmConfig::for_testing(base_url)).unwrap()
}

fn chat_request() -> ChatRequest {
    ChatRequest::new(
        "openai/gpt-4o",
        vec![
            ChatMessage::system("You are terse."),
            ChatMessage::user("Say hi"),
        ],
    )
}

/// Test completion output and payment hash
#[tokio::test]
async fn completion_success() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(header("X-SETTLEMENT-TYPE", "private"))
        .and(header(
            "authorization",
            "Bearer 0x1234567890123456789012345678901234567890",
        ))
        .and(body_partial_json(json!({
            "model": "claude-3.5-haiku",
            "prompt": "Once upon",
            "max_tokens": 100
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-processing-hash", "0xpaid")
                .set_body_json(json!({"completion": " a time"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = CompletionRequest::new("anthropic/claude-3.5-haiku", "Once upon")
        .with_settlement_mode(SettlementMode::Private);
    let output = client.completion(&request).await.unwrap();

    assert_eq!(output.completion_output.as_deref(), Some(" a time"));
    assert_eq!(output.payment_hash.as_deref(), Some("0xpaid"));
    assert_eq!(output.transaction_hash, "external");
    assert!(output.chat_output.is_none());
}

/// Test chat output from the first choice
#[tokio::test]
async fn chat_success() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("X-SETTLEMENT-TYPE", "batch"))
        .and(body_partial_json(json!({"model": "gpt-4o", "temperature": 0.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi."},
                "finish_reason": "stop"
            }]
        })))
        .mount(&mock_server)
        .await;

    let output = client.chat(&chat_request()).await.unwrap();

    assert_eq!(output.finish_reason.as_deref(), Some("stop"));
    assert_eq!(output.chat_output, Some(ChatMessage::assistant("Hi.")));
    assert!(output.payment_hash.is_none());
}

/// Test that an answer without choices is rejected
#[tokio::test]
async fn chat_without_choices_is_invalid() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri());

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let err = client.chat(&chat_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse { .. }));
    assert!(err.to_string().contains("'choices' missing or empty"));
}

/// Test that tools are sent with an automatic tool choice
#[tokio::test]
async fn chat_sends_tools() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri());
    let tool = json!({"type": "function", "function": {"name": "get_price", "parameters": {}}});

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"tools": [tool.clone()], "tool_choice": "auto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "tool_calls": [{"id": "call_1"}]},
                "finish_reason": "tool_calls"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = chat_request().with_tools(vec![tool], None);
    let output = client.chat(&request).await.unwrap();

    assert_eq!(output.finish_reason.as_deref(), Some("tool_calls"));
    let message = output.chat_output.unwrap();
    assert!(message.content.is_none());
    assert_eq!(message.tool_calls.unwrap().len(), 1);
}

/// Test server errors
#[tokio::test]
async fn server_error_is_protocol_error() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let err = client.chat(&chat_request()).await.unwrap_err();
    assert!(matches!(
        err,
        LlmError::StreamProtocol { status: Some(503), ref message } if message == "overloaded"
    ));
}

/// Test that a payment challenge is answered once with the signer's header
#[tokio::test]
async fn payment_challenge_is_answered() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri())
        .with_payment_signer(Arc::new(StaticPayment::new("signed-payment")));

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(header("X-PAYMENT", "signed-payment"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-processing-hash", "0xsettled")
                .set_body_json(json!({"completion": "ok"})),
        )
        .with_priority(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({"accepts": [{"scheme": "exact"}]})),
        )
        .with_priority(2)
        .expect(1)
        .mount(&mock_server)
        .await;

    let output = client
        .completion(&CompletionRequest::new("gpt-4o", "ping"))
        .await
        .unwrap();

    assert_eq!(output.completion_output.as_deref(), Some("ok"));
    assert_eq!(output.payment_hash.as_deref(), Some("0xsettled"));
}

/// Test a payment challenge without a signer
#[tokio::test]
async fn payment_without_signer_fails() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({"accepts": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client.chat(&chat_request()).await.unwrap_err();
    assert!(matches!(err, LlmError::PaymentRequired { .. }));
}

/// Test a payment that the server rejects
#[tokio::test]
async fn rejected_payment_is_not_retried_again() {
    let mock_server = MockServer::start().await;
    let client = create_test_client(mock_server.uri())
        .with_payment_signer(Arc::new(StaticPayment::new("bad-payment")));

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_string("insufficient balance"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let err = client.chat(&chat_request()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "payment required: payment rejected: insufficient balance"
    );
}
