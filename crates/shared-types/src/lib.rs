// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the inference SDK
//!
//! This crate provides the data model that is shared across the codec, the
//! transaction executor and the SDK facade, avoiding circular dependencies.
//!
//! - [`FixedPointNumber`]: exact `(value, decimals)` pairs the chain can store
//! - [`NumberTensor`], [`StringTensor`], [`JsonTensor`]: named, ordered tensors
//! - [`ModelInput`] / [`ResultEnvelope`]: on-chain request and emitted result payloads
//! - [`ModelOutput`] / [`InferenceResult`]: decoded results handed back to callers
//! - [`InferenceMode`]: the three execution modes and their result envelopes

pub mod fixed_point;
pub mod inference_mode;
pub mod result;
pub mod tensor;

pub use fixed_point::FixedPointNumber;
pub use inference_mode::{InferenceMode, InferenceModeParseError};
pub use result::InferenceResult;
pub use tensor::{JsonTensor, ModelInput, ModelOutput, NumberTensor, ResultEnvelope, StringTensor};
