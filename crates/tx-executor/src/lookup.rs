// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Out-of-band inference result lookup
//!
//! When the hub's event carries an empty output, the result is fetched from
//! the node's REST API by inference identifier. The response wraps a
//! base64-encoded JSON document whose layout depends on the inference mode.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{InferenceMode, ResultEnvelope};
use tracing::{debug, error, instrument};
use url::Url;

use crate::error::{ExecutorError, ExecutorResult};

const RESULT_PATH: [&str; 4] = ["artela-network", "artela-rollkit", "inference", "tx"];
const RESULT_ROOT: &str = "InferenceResult";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    inference_results: Vec<String>,
}

/// Client for the node's inference result endpoint
#[derive(Debug, Clone)]
pub struct NodeResultClient {
    client: Client,
    api_url: Url,
}

impl NodeResultClient {
    /// Create a lookup client for the node API at `api_url`
    pub fn new(api_url: &str, timeout: Duration) -> ExecutorResult<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| ExecutorError::config(format!("invalid API URL '{api_url}': {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(ExecutorError::config(format!(
                "API URL '{api_url}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecutorError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, api_url })
    }

    /// URL of the result for `inference_id`, with the identifier escaped as a
    /// single path segment
    pub fn result_url(&self, inference_id: &str) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(RESULT_PATH).push(inference_id);
        }
        url
    }

    /// Fetch the result envelope for an inference
    ///
    /// Returns `Ok(None)` when the node has no result for the identifier yet.
    /// A document lacking the field that `mode` requires fails with
    /// [`ExecutorError::MissingResultField`] naming the first absent field.
    #[instrument(skip(self))]
    pub async fn fetch(
        &self,
        inference_id: &str,
        mode: InferenceMode,
    ) -> ExecutorResult<Option<ResultEnvelope>> {
        let url = self.result_url(inference_id);
        debug!(%url, "Fetching inference result from node");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %message, "Failed to get inference result");
            return Err(ExecutorError::Lookup {
                status: status.as_u16(),
                message,
            });
        }

        let body: LookupResponse = response.json().await?;
        let Some(encoded) = body.inference_results.first() else {
            debug!("Node has no inference result yet");
            return Ok(None);
        };

        let decoded = STANDARD.decode(encoded.trim())?;
        let document: Value = serde_json::from_slice(&decoded)?;
        let output = extract_model_output(&document, mode)?;

        Ok(Some(serde_json::from_value(output.clone())?))
    }
}

/// Walk the mode-specific path to the `model_output` object
pub fn extract_model_output(document: &Value, mode: InferenceMode) -> ExecutorResult<&Value> {
    let root = document
        .get(RESULT_ROOT)
        .filter(|value| !value.is_null())
        .ok_or_else(|| ExecutorError::missing_field(RESULT_ROOT))?;

    mode.result_path().iter().try_fold(root, |node, field| {
        node.get(field)
            .ok_or_else(|| ExecutorError::missing_field(field))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn result_url_escapes_identifier_as_one_segment() {
        let client = NodeResultClient::new("http://node:1317/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.result_url("0xabc/7 x").as_str(),
            "http://node:1317/artela-network/artela-rollkit/inference/tx/0xabc%2F7%20x"
        );

        let client = NodeResultClient::new("http://node:1317/api", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.result_url("1").path(),
            "/api/artela-network/artela-rollkit/inference/tx/1"
        );
    }

    #[test]
    fn rejects_unusable_api_urls() {
        assert!(NodeResultClient::new("not a url", Duration::from_secs(5)).is_err());
        assert!(NodeResultClient::new("mailto:node@example.com", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn extracts_each_mode_layout() {
        let output = json!({"numbers": []});
        let vanilla = json!({"InferenceResult": {"VanillaResult": {"model_output": output}}});
        let zkml = json!({"InferenceResult": {"ZkmlResult": {"model_output": output}}});
        let tee = json!({"InferenceResult": {"TeeNodeResult": {"Response": {
            "VanillaResponse": {"model_output": output}
        }}}});

        assert_eq!(extract_model_output(&vanilla, InferenceMode::Vanilla).unwrap(), &output);
        assert_eq!(extract_model_output(&zkml, InferenceMode::Zkml).unwrap(), &output);
        assert_eq!(extract_model_output(&tee, InferenceMode::Tee).unwrap(), &output);
    }

    #[test]
    fn missing_field_is_named() {
        let tee = json!({"InferenceResult": {"TeeNodeResult": {"Response": {}}}});
        let err = extract_model_output(&tee, InferenceMode::Tee).unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::MissingResultField { ref field } if field == "VanillaResponse"
        ));

        let err = extract_model_output(&json!({}), InferenceMode::Vanilla).unwrap_err();
        assert_eq!(err.to_string(), "missing field 'InferenceResult' in inference result");

        let vanilla_as_zkml = json!({"InferenceResult": {"VanillaResult": {"model_output": {}}}});
        let err = extract_model_output(&vanilla_as_zkml, InferenceMode::Zkml).unwrap_err();
        assert!(matches!(
            err,
            ExecutorError::MissingResultField { ref field } if field == "ZkmlResult"
        ));
    }
}
