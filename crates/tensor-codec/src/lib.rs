// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Exact fixed-point codec and tensor assembly
//!
//! The target chain cannot store floating-point values, so every number that
//! crosses the contract boundary travels as a `(value, decimals)` pair.
//!
//! - [`fixed_point`]: decimal-exact conversion between numbers and [`FixedPointNumber`]
//! - [`assembler`]: partitioning named inputs into on-chain tensors, and
//!   rebuilding named, reshaped outputs from an emitted [`ResultEnvelope`]
//! - [`error`]: [`TensorError`] for unsupported types, shape mismatches and bad literals
//!
//! # Example
//!
//! ```rust
//! use tensor_codec::{assemble_input, decode, encode_decimal, TensorData};
//!
//! let price = encode_decimal("2535.79")?;
//! assert_eq!((price.value.to_string().as_str(), price.decimals), ("253579", 2));
//! assert_eq!(decode(price.value, price.decimals), 2535.79_f32);
//!
//! let input = assemble_input([("x", TensorData::from(vec![3_i64, 1, 2]))])?;
//! assert_eq!(input.numbers[0].values.len(), 3);
//! # Ok::<(), tensor_codec::TensorError>(())
//! ```
//!
//! [`FixedPointNumber`]: shared_types::FixedPointNumber
//! [`ResultEnvelope`]: shared_types::ResultEnvelope

pub mod assembler;
pub mod error;
pub mod fixed_point;

pub use assembler::{TensorData, assemble_input, assemble_output};
pub use error::{TensorError, TensorResult};
pub use fixed_point::{
    decode, decode_f64, encode_decimal, encode_f32, encode_f64, encode_i64, encode_value,
};
