// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! SDK configuration
//!
//! Sources are layered, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. `inference-sdk.json`
//! 3. `inference-sdk.{env}.json`, where `env` comes from `ENVIRONMENT`
//! 4. Environment variables with the `OG_` prefix; nested keys use `__`,
//!    e.g. `OG_LLM__SERVER_URL` or `OG_EXECUTOR__MAX_RETRIES`

use std::{path::Path, time::Duration};

use alloy_primitives::Address;
use anyhow::{Context, Result, ensure};
use config::{Config, Environment, File};
use llm_stream::LlmConfig;
use serde::{Deserialize, Serialize};
use tx_executor::ExecutorConfig;

use crate::error::{SdkError, SdkResult};

/// Environment variable selecting the environment-specific file
pub const ENVIRONMENT_VAR: &str = "ENVIRONMENT";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "OG";

const CONFIG_FILE: &str = "inference-sdk.json";
const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_API_URL: &str = "http://127.0.0.1:1317";
const MAX_LOOKUP_TIMEOUT_SECONDS: u64 = 300;

/// Configuration for [`Client`](crate::Client)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// JSON-RPC endpoint of the chain
    pub rpc_url: String,
    /// Node REST API used for out-of-band inference results
    pub api_url: String,
    /// Address of the inference hub contract
    pub inference_hub_address: Address,
    /// Hex-encoded key signing every transaction
    pub private_key: Option<String>,
    /// Timeout for out-of-band result lookups, in seconds (1-300)
    pub lookup_timeout_seconds: u64,
    /// LLM servers and request settings
    pub llm: LlmConfig,
    /// Transaction executor settings
    pub executor: ExecutorConfig,
}

impl std::fmt::Debug for SdkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkConfig")
            .field("rpc_url", &self.rpc_url)
            .field("api_url", &self.api_url)
            .field("inference_hub_address", &self.inference_hub_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("lookup_timeout_seconds", &self.lookup_timeout_seconds)
            .field("llm", &self.llm)
            .field("executor", &self.executor)
            .finish()
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            inference_hub_address: Address::ZERO,
            private_key: None,
            lookup_timeout_seconds: 30,
            llm: LlmConfig::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl SdkConfig {
    /// Load and validate configuration from the working directory and the
    /// environment
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Config` if a source cannot be read or the result is invalid.
    pub fn from_env() -> SdkResult<Self> {
        Self::load().map_err(|e| SdkError::config(format!("failed to load configuration: {e:#}")))
    }

    /// Load configuration files from the working directory
    pub fn load() -> Result<Self> {
        let environment = std::env::var(ENVIRONMENT_VAR).ok();
        Self::load_from(Path::new("."), environment.as_deref())
    }

    /// Load configuration files from `dir`, including the file for
    /// `environment` when one is given
    pub fn load_from(dir: &Path, environment: Option<&str>) -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::from(dir.join(CONFIG_FILE)).required(false));

        if let Some(environment) = environment {
            let name = format!("inference-sdk.{}.json", environment.to_lowercase());
            builder = builder.add_source(File::from(dir.join(name)).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration sources")?;

        let sdk_config: Self = config
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        sdk_config.validate()?;

        Ok(sdk_config)
    }

    /// Configuration against local test servers
    pub fn for_testing(rpc_url: &str, api_url: &str, llm_url: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            api_url: api_url.to_string(),
            inference_hub_address: Address::repeat_byte(0x11),
            private_key: None,
            lookup_timeout_seconds: 5,
            llm: LlmConfig::for_testing(llm_url),
            executor: ExecutorConfig::for_testing(),
        }
    }

    /// Set the signing key
    #[must_use]
    pub fn with_private_key(mut self, private_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self
    }

    /// Lookup timeout as a duration
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_seconds)
    }

    /// Check that the configuration can build a client
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.rpc_url.trim().is_empty(), "rpc_url must not be empty");
        ensure!(!self.api_url.trim().is_empty(), "api_url must not be empty");
        ensure!(
            self.inference_hub_address != Address::ZERO,
            "inference_hub_address must be set"
        );
        ensure!(
            self.private_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty()),
            "private_key must be set"
        );
        ensure!(
            self.lookup_timeout_seconds != 0,
            "lookup timeout must be greater than 0"
        );
        ensure!(
            self.lookup_timeout_seconds <= MAX_LOOKUP_TIMEOUT_SECONDS,
            "lookup timeout cannot exceed {MAX_LOOKUP_TIMEOUT_SECONDS}"
        );
        self.llm.validate().context("invalid llm settings")?;
        self.executor
            .validate()
            .context("invalid executor settings")?;
        Ok(())
    }
}
