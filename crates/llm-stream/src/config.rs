// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! LLM client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{LlmError, LlmResult},
    types::SettlementMode,
};

/// Default LLM server
pub const DEFAULT_LLM_SERVER_URL: &str = "https://llm.opengradient.ai";

/// Default LLM streaming server
pub const DEFAULT_LLM_STREAMING_SERVER_URL: &str = "https://llm.opengradient.ai";

/// Placeholder bearer token expected by the payment-gated servers
pub const PLACEHOLDER_API_KEY: &str = "0x1234567890123456789012345678901234567890";

const MAX_TIMEOUT_SECONDS: u64 = 600;

/// Configuration for [`LlmClient`](crate::LlmClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Server for chat and completion requests
    pub server_url: String,
    /// Server for streaming chat requests
    pub streaming_server_url: String,
    /// Bearer token sent with every request
    pub api_key: String,
    /// Whole-request timeout in seconds, including reading the body
    pub timeout_seconds: u64,
    /// Connection timeout in seconds
    pub connect_timeout_seconds: u64,
    /// Settlement mode used when a request does not choose one
    pub settlement_mode: SettlementMode,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_LLM_SERVER_URL.to_string(),
            streaming_server_url: DEFAULT_LLM_STREAMING_SERVER_URL.to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
            timeout_seconds: 60,
            connect_timeout_seconds: 10,
            settlement_mode: SettlementMode::default(),
        }
    }
}

impl LlmConfig {
    /// Configuration pointing both servers at `base_url`
    pub fn for_testing(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            server_url: base_url.clone(),
            streaming_server_url: base_url,
            timeout_seconds: 5,
            connect_timeout_seconds: 2,
            ..Self::default()
        }
    }

    /// Whole-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Connection timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Parsed chat and completion server URL
    pub fn server_url(&self) -> LlmResult<Url> {
        parse_base_url("server_url", &self.server_url)
    }

    /// Parsed streaming server URL
    pub fn streaming_server_url(&self) -> LlmResult<Url> {
        parse_base_url("streaming_server_url", &self.streaming_server_url)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> LlmResult<()> {
        self.server_url()?;
        self.streaming_server_url()?;
        for (name, seconds) in [
            ("timeout_seconds", self.timeout_seconds),
            ("connect_timeout_seconds", self.connect_timeout_seconds),
        ] {
            if seconds == 0 || seconds > MAX_TIMEOUT_SECONDS {
                return Err(LlmError::config(format!(
                    "{name} must be between 1 and {MAX_TIMEOUT_SECONDS}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_base_url(name: &str, value: &str) -> LlmResult<Url> {
    let url = Url::parse(value).map_err(|e| LlmError::config(format!("invalid {name}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(LlmError::config(format!("{name} '{value}' cannot carry a path")));
    }
    Ok(url)
}

/// Join an API path onto a base URL, keeping any path prefix of the base
pub(crate) fn endpoint(base: &Url, path: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(path);
    }
    url
}
