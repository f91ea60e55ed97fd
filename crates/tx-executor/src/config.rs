// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Executor configuration
//!
//! Timeouts and gas multipliers depend on the class of call: model inference
//! executes far more on-chain compute than a plain state change, so it gets a
//! longer receipt deadline and a larger gas safety margin.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};

use crate::error::{ExecutorError, ExecutorResult};

/// Default number of attempts for a logical call
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Upper bound accepted for any receipt timeout
const MAX_TIMEOUT: Duration = Duration::from_secs(600);

/// Class of on-chain call, selecting timeout and gas multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    /// Model inference through the inference hub
    Inference,
    /// Any other state-changing call
    Regular,
}

/// Configuration for the transaction executor
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Attempts per logical call when the caller does not specify a budget
    pub max_retries: u32,
    /// Fixed delay between nonce-conflict retries
    #[serde_as(as = "DurationSeconds<u64>")]
    pub retry_delay: Duration,
    /// Receipt deadline for inference calls
    #[serde_as(as = "DurationSeconds<u64>")]
    pub inference_timeout: Duration,
    /// Receipt deadline for regular calls
    #[serde_as(as = "DurationSeconds<u64>")]
    pub regular_timeout: Duration,
    /// Interval between receipt polls
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub receipt_poll_interval: Duration,
    /// Gas estimate multiplier for inference calls, in percent
    pub inference_gas_multiplier_percent: u32,
    /// Gas estimate multiplier for regular calls, in percent
    pub regular_gas_multiplier_percent: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(1),
            inference_timeout: Duration::from_secs(120),
            regular_timeout: Duration::from_secs(30),
            receipt_poll_interval: Duration::from_millis(500),
            inference_gas_multiplier_percent: 300,
            regular_gas_multiplier_percent: 150,
        }
    }
}

impl ExecutorConfig {
    /// Configuration with short delays, for tests against local stubs
    pub fn for_testing() -> Self {
        Self {
            retry_delay: Duration::from_millis(1),
            inference_timeout: Duration::from_secs(5),
            regular_timeout: Duration::from_secs(5),
            receipt_poll_interval: Duration::from_millis(10),
            ..Self::default()
        }
    }

    /// Set the default attempt budget
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between retries
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Set the receipt deadline for inference calls
    #[must_use]
    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    /// Set the receipt deadline for regular calls
    #[must_use]
    pub fn with_regular_timeout(mut self, timeout: Duration) -> Self {
        self.regular_timeout = timeout;
        self
    }

    /// Receipt deadline for a class of call
    pub fn timeout_for(&self, class: CallClass) -> Duration {
        match class {
            CallClass::Inference => self.inference_timeout,
            CallClass::Regular => self.regular_timeout,
        }
    }

    /// Gas multiplier for a class of call, in percent
    pub fn gas_multiplier_percent(&self, class: CallClass) -> u32 {
        match class {
            CallClass::Inference => self.inference_gas_multiplier_percent,
            CallClass::Regular => self.regular_gas_multiplier_percent,
        }
    }

    /// Inflate a gas estimate by the multiplier for `class`
    pub fn gas_limit(&self, class: CallClass, estimate: u64) -> u64 {
        let limit = u128::from(estimate) * u128::from(self.gas_multiplier_percent(class)) / 100;
        u64::try_from(limit).unwrap_or(u64::MAX)
    }

    /// Attempt budget for a call, falling back to the configured default
    ///
    /// A budget of zero still makes one attempt.
    pub fn attempts(&self, max_retries: Option<u32>) -> u32 {
        max_retries.unwrap_or(self.max_retries).max(1)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.max_retries == 0 {
            return Err(ExecutorError::config("max_retries must be at least 1"));
        }
        for (name, timeout) in [
            ("inference_timeout", self.inference_timeout),
            ("regular_timeout", self.regular_timeout),
        ] {
            if timeout.is_zero() || timeout > MAX_TIMEOUT {
                return Err(ExecutorError::config(format!(
                    "{name} must be between 1 and {} seconds",
                    MAX_TIMEOUT.as_secs()
                )));
            }
        }
        if self.receipt_poll_interval.is_zero() {
            return Err(ExecutorError::config(
                "receipt_poll_interval must be greater than 0",
            ));
        }
        if self.inference_gas_multiplier_percent < 100 || self.regular_gas_multiplier_percent < 100
        {
            return Err(ExecutorError::config(
                "gas multipliers must be at least 100 percent",
            ));
        }
        Ok(())
    }
}
