// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared stub chain for executor and inference integration tests

#![allow(dead_code)]

use std::{
    sync::{
        Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, Bytes, Log, address};
use tx_executor::{
    ChainClient, ChainError, ChainResult, ContractCall, ExecutorConfig, Receipt,
    TransactionAttempt, TransactionExecutor,
    abi::{
        INFERENCE_PRECOMPILE_ADDRESS, InferenceHub, InferencePrecompile, ModelInput, ModelOutput,
    },
};

pub const HUB_ADDRESS: Address = address!("8383bf4c2d5b4d2f0d8fc96c85f6b5a7a0b3d3a1");
pub const TX_HASH: B256 = B256::repeat_byte(0xab);

/// In-memory chain whose broadcast failures are scripted up front
#[derive(Debug, Default)]
pub struct StubChain {
    /// Number of leading broadcasts rejected with a nonce conflict
    pub nonce_conflicts: AtomicU32,
    /// Error returned by every broadcast once the nonce conflicts are used up
    pub send_error: Mutex<Option<ChainError>>,
    /// Logs attached to every receipt
    pub logs: Vec<Log>,
    /// Broadcasts attempted, successful or not
    pub broadcasts: AtomicU32,
    /// Calldata of every broadcast
    pub calls: Mutex<Vec<Bytes>>,
    /// Next nonce handed out
    pub nonce: AtomicU32,
}

impl StubChain {
    pub fn with_logs(logs: Vec<Log>) -> Self {
        Self {
            logs,
            ..Self::default()
        }
    }

    pub fn rejecting_nonces(count: u32) -> Self {
        Self {
            nonce_conflicts: AtomicU32::new(count),
            ..Self::default()
        }
    }

    pub fn broadcasts(&self) -> u32 {
        self.broadcasts.load(Ordering::SeqCst)
    }
}

impl ChainClient for StubChain {
    fn sender(&self) -> Address {
        Address::repeat_byte(0x42)
    }

    async fn pending_nonce(&self) -> ChainResult<u64> {
        Ok(u64::from(self.nonce.load(Ordering::SeqCst)))
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        Ok(2_000_000_000)
    }

    async fn estimate_gas(&self, _call: &ContractCall) -> ChainResult<u64> {
        Ok(100_000)
    }

    async fn simulate(&self, _call: &ContractCall) -> ChainResult<Bytes> {
        Ok(Bytes::new())
    }

    async fn send_transaction(
        &self,
        call: &ContractCall,
        _attempt: &TransactionAttempt,
    ) -> ChainResult<B256> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call.input.clone());

        let remaining = self.nonce_conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.nonce_conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(ChainError::rpc("nonce too low: next nonce 7, tx nonce 6"));
        }
        if let Some(error) = self.send_error.lock().unwrap().clone() {
            return Err(error);
        }

        self.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(TX_HASH)
    }

    async fn wait_for_receipt(
        &self,
        transaction_hash: B256,
        _timeout: Duration,
    ) -> ChainResult<Receipt> {
        Ok(Receipt {
            transaction_hash,
            success: true,
            logs: self.logs.clone(),
        })
    }
}

pub fn executor(chain: StubChain) -> TransactionExecutor<StubChain> {
    TransactionExecutor::new(chain, ExecutorConfig::for_testing()).unwrap()
}

/// Hub `InferenceResult` log carrying `output`
pub fn hub_result_log(output: ModelOutput) -> Log {
    let event = InferenceHub::InferenceResult {
        caller: Address::repeat_byte(0x42),
        modelId: "QmModel".to_string(),
        input: ModelInput {
            numbers: vec![],
            strings: vec![],
        },
        output,
    };
    Log {
        address: HUB_ADDRESS,
        data: event.encode_log_data(),
    }
}

/// Precompile log announcing `inference_id`
pub fn precompile_log(inference_id: &str) -> Log {
    let event = InferencePrecompile::ModelInferenceEvent {
        inferenceID: inference_id.to_string(),
    };
    Log {
        address: INFERENCE_PRECOMPILE_ADDRESS,
        data: event.encode_log_data(),
    }
}

pub fn empty_output() -> ModelOutput {
    ModelOutput {
        numbers: vec![],
        strings: vec![],
        jsons: vec![],
        is_simulation_result: false,
    }
}
