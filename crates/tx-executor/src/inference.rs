// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! On-chain model inference through the inference hub

use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, Log};
use shared_types::{InferenceMode, InferenceResult, ModelInput, ResultEnvelope};
use tensor_codec::{TensorData, assemble_input, assemble_output};
use tracing::{debug, info, instrument};

use crate::{
    abi::{INFERENCE_PRECOMPILE_ADDRESS, InferenceHub, InferencePrecompile, encode_run_call},
    chain::{ChainClient, ContractCall, Receipt},
    config::CallClass,
    error::{ExecutorError, ExecutorResult},
    executor::TransactionExecutor,
    lookup::NodeResultClient,
};

/// Runs models through the inference hub and resolves their outputs
#[derive(Debug)]
pub struct OnchainInference<C> {
    executor: TransactionExecutor<C>,
    hub_address: Address,
    lookup: NodeResultClient,
}

impl<C: ChainClient> OnchainInference<C> {
    /// Create the inference namespace for the hub at `hub_address`
    pub fn new(
        executor: TransactionExecutor<C>,
        hub_address: Address,
        lookup: NodeResultClient,
    ) -> Self {
        Self {
            executor,
            hub_address,
            lookup,
        }
    }

    /// Executor used for the hub transactions
    pub fn executor(&self) -> &TransactionExecutor<C> {
        &self.executor
    }

    /// Run `model_cid` on `inputs` and return its decoded output
    ///
    /// Inputs are converted once; each attempt re-encodes the call, so a
    /// nonce conflict anywhere in the attempt retries from calldata onwards.
    /// When the hub's event carries no output, the result is resolved from
    /// the node by the precompile's inference identifier.
    #[instrument(skip(self, inputs), fields(model = model_cid, mode = %mode))]
    pub async fn infer<I, K, V>(
        &self,
        model_cid: &str,
        mode: InferenceMode,
        inputs: I,
        max_retries: Option<u32>,
    ) -> ExecutorResult<InferenceResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<TensorData>,
    {
        let model_input = assemble_input(inputs)?;
        debug!(tensors = model_input.len(), "Assembled model input");

        let (transaction_hash, envelope) = self
            .executor
            .execute(
                |attempt| self.attempt(model_cid, mode, &model_input, attempt),
                max_retries,
            )
            .await?;

        let output = assemble_output(&envelope)?;
        info!(%transaction_hash, outputs = output.len(), "Inference completed");
        Ok(InferenceResult::new(transaction_hash, output))
    }

    async fn attempt(
        &self,
        model_cid: &str,
        mode: InferenceMode,
        model_input: &ModelInput,
        attempt: u32,
    ) -> ExecutorResult<(String, ResultEnvelope)> {
        let input = encode_run_call(model_cid, mode, model_input)?;
        let call = ContractCall::new(self.hub_address, input, "InferenceHub.run");
        let receipt = self
            .executor
            .submit(&call, CallClass::Inference, attempt)
            .await?;

        let envelope = self.resolve_envelope(&receipt, mode).await?;
        Ok((receipt.transaction_hash.to_string(), envelope))
    }

    /// Output carried by the hub event, or fetched from the node when empty
    async fn resolve_envelope(
        &self,
        receipt: &Receipt,
        mode: InferenceMode,
    ) -> ExecutorResult<ResultEnvelope> {
        let transaction_hash = receipt.transaction_hash;
        let event = find_event::<InferenceHub::InferenceResult>(&receipt.logs, None).ok_or(
            ExecutorError::MissingResultEvent {
                event: "InferenceResult event",
                transaction_hash,
            },
        )?;

        let envelope = ResultEnvelope::try_from(event.output)?;
        if !envelope.is_empty() {
            return Ok(envelope);
        }

        let inference_id = find_event::<InferencePrecompile::ModelInferenceEvent>(
            &receipt.logs,
            Some(INFERENCE_PRECOMPILE_ADDRESS),
        )
        .ok_or(ExecutorError::MissingResultEvent {
            event: "ModelInferenceEvent",
            transaction_hash,
        })?
        .inferenceID;
        debug!(%inference_id, "Hub event has no output, resolving from node");

        self.lookup
            .fetch(&inference_id, mode)
            .await?
            .ok_or(ExecutorError::MissingResultEvent {
                event: "node inference result",
                transaction_hash,
            })
    }
}

/// First log that decodes as `E`, optionally restricted to one emitter
fn find_event<E: SolEvent>(logs: &[Log], emitter: Option<Address>) -> Option<E> {
    logs.iter()
        .filter(|log| emitter.is_none_or(|address| log.address == address))
        .find_map(|log| E::decode_log_data(&log.data).ok())
}
