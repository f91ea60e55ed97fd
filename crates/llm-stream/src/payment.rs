// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Payment negotiation seam
//!
//! A `402 Payment Required` answer carries the payment requirements in its
//! body. A [`PaymentSigner`] turns them into an `X-PAYMENT` header value and
//! the request is sent once more. Producing the signed payload is left to
//! the signer implementation.

use std::fmt;

use serde_json::Value;

use crate::error::LlmResult;

/// Header carrying the signed payment on the retried request
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// Response header carrying the payment processing hash
pub const PROCESSING_HASH_HEADER: &str = "x-processing-hash";

/// Signs payment challenges for paid LLM endpoints
pub trait PaymentSigner: fmt::Debug + Send + Sync {
    /// Produce the `X-PAYMENT` header value answering `challenge`
    fn sign(&self, challenge: &Value) -> LlmResult<String>;
}

/// Signer that answers every challenge with a fixed header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPayment {
    header: String,
}

impl StaticPayment {
    /// Answer every challenge with `header`
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl PaymentSigner for StaticPayment {
    fn sign(&self, _challenge: &Value) -> LlmResult<String> {
        Ok(self.header.clone())
    }
}
