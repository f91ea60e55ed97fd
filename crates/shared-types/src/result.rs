// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Inference result handed back to callers

use crate::ModelOutput;

/// Result of an on-chain inference
///
/// Owned solely by the caller; the executor keeps no reference after returning it.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    /// Hex-encoded hash of the inference transaction
    pub transaction_hash: String,
    /// Decoded model output
    pub output: ModelOutput,
}

impl InferenceResult {
    /// Create a new inference result
    pub fn new(transaction_hash: impl Into<String>, output: ModelOutput) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            output,
        }
    }
}
