// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Resilient transaction executor
//!
//! One logical call runs through
//! `Building → GasEstimating → Submitting → AwaitingReceipt`. Nonce races
//! send the whole attempt back to `Building` after a fixed delay, up to the
//! attempt budget. Reverts are diagnosed by a read-only replay and are never
//! retried. Any other failure propagates on the first occurrence.
//!
//! Calls from the same account are not coordinated with each other; nonce
//! races between concurrent callers are resolved only by the retry loop.

use std::time::Duration;

use tokio_retry::{RetryIf, strategy::FixedInterval};
use tracing::{debug, info, instrument, warn};

use crate::{
    chain::{ChainClient, ContractCall, Receipt, TransactionAttempt},
    config::{CallClass, ExecutorConfig},
    error::{ChainError, ExecutorError, ExecutorResult, RevertStage},
};

/// Drives contract calls through estimation, submission and receipt handling
#[derive(Debug, Clone)]
pub struct TransactionExecutor<C> {
    client: C,
    config: ExecutorConfig,
}

impl<C: ChainClient> TransactionExecutor<C> {
    /// Create an executor over a chain client
    pub fn new(client: C, config: ExecutorConfig) -> ExecutorResult<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Underlying chain client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `attempt` until it succeeds, fails for a reason other than a
    /// nonce conflict, or exhausts the attempt budget
    ///
    /// `attempt` receives the one-based attempt number and must rebuild the
    /// call from scratch. `max_retries = None` uses the configured default;
    /// when every attempt hits a nonce conflict the last error is returned
    /// wrapped in [`ExecutorError::RetriesExhausted`].
    pub async fn execute<F, Fut, T>(
        &self,
        mut attempt: F,
        max_retries: Option<u32>,
    ) -> ExecutorResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ExecutorResult<T>>,
    {
        let max_attempts = self.config.attempts(max_retries);
        let strategy = FixedInterval::new(self.config.retry_delay)
            .take(usize::try_from(max_attempts - 1).unwrap_or(usize::MAX));
        let mut attempts = 0_u32;

        let result = RetryIf::spawn(
            strategy,
            || {
                attempts += 1;
                debug!(attempt = attempts, max_attempts, "Building transaction");
                attempt(attempts)
            },
            |error: &ExecutorError| {
                let retry = error.is_nonce_conflict();
                if retry {
                    warn!(
                        max_attempts,
                        error = %error,
                        "Nonce conflict detected"
                    );
                }
                retry
            },
        )
        .await;

        match result {
            Err(error) if error.is_nonce_conflict() => {
                warn!(attempts, "Nonce conflict retry budget exhausted");
                Err(ExecutorError::RetriesExhausted {
                    attempts,
                    source: Box::new(error),
                })
            }
            other => other,
        }
    }

    /// Estimate, broadcast and confirm a single call, retrying nonce conflicts
    pub async fn send(
        &self,
        call: &ContractCall,
        class: CallClass,
        max_retries: Option<u32>,
    ) -> ExecutorResult<Receipt> {
        self.execute(|attempt| self.submit(call, class, attempt), max_retries)
            .await
    }

    /// One pass through the state machine, without retry
    #[instrument(skip(self, call), fields(label = call.label, to = %call.to))]
    pub async fn submit(
        &self,
        call: &ContractCall,
        class: CallClass,
        attempt: u32,
    ) -> ExecutorResult<Receipt> {
        debug!("Estimating gas");
        let gas_estimate = match self.client.estimate_gas(call).await {
            Ok(estimate) => estimate,
            Err(ChainError::Reverted { reason }) => {
                return Err(self.diagnose(call, RevertStage::Estimation, reason).await);
            }
            Err(error) => return Err(error.into()),
        };
        let gas_limit = self.config.gas_limit(class, gas_estimate);

        let nonce = self.client.pending_nonce().await?;
        let gas_price = self.client.gas_price().await?;
        let tx_attempt = TransactionAttempt {
            attempt,
            nonce,
            gas_estimate,
            gas_limit,
            gas_price,
        };
        debug!(
            nonce,
            gas_estimate,
            gas_limit,
            gas_price,
            "Submitting transaction"
        );
        let transaction_hash = self.client.send_transaction(call, &tx_attempt).await?;

        let timeout = self.config.timeout_for(class);
        debug!(%transaction_hash, timeout_seconds = timeout.as_secs(), "Awaiting receipt");
        let receipt = self
            .client
            .wait_for_receipt(transaction_hash, timeout)
            .await?;

        if !receipt.success {
            warn!(%transaction_hash, "Transaction mined with failure status");
            return Err(self.diagnose(call, RevertStage::Receipt, None).await);
        }

        info!(%transaction_hash, logs = receipt.logs.len(), "Transaction confirmed");
        Ok(receipt)
    }

    /// Replay a failed call read-only and turn the outcome into a terminal error
    async fn diagnose(
        &self,
        call: &ContractCall,
        stage: RevertStage,
        known_reason: Option<String>,
    ) -> ExecutorError {
        let replayed = match self.client.simulate(call).await {
            Err(ChainError::Reverted { reason }) => reason,
            Ok(_) => None,
            Err(error) => {
                debug!(error = %error, "Replay for revert reason failed");
                None
            }
        };

        match replayed.or(known_reason) {
            Some(reason) => {
                warn!(%stage, reason = %reason, "Call reverted");
                ExecutorError::SimulationRevert { stage, reason }
            }
            None => ExecutorError::contract_logic(match stage {
                RevertStage::Estimation => {
                    format!("{} reverted during gas estimation with no revert reason", call.label)
                }
                RevertStage::Receipt => {
                    format!("{} transaction failed with no revert reason", call.label)
                }
            }),
        }
    }
}

/// Delay between polls never exceeds the remaining deadline
pub(crate) fn next_poll_delay(poll_interval: Duration, remaining: Duration) -> Duration {
    poll_interval.min(remaining)
}
