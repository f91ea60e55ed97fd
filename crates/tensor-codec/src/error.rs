// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for tensor conversion
//!
//! All of these are local and non-retryable: they describe a request that can
//! never succeed as built.

use thiserror::Error;

/// Result type alias for codec and assembler operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Name used when a bare value fails outside of any tensor
pub(crate) const SCALAR_NAME: &str = "<scalar>";

/// Errors raised by the codec and the tensor assembler
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum TensorError {
    /// Element type that cannot be represented on chain
    #[error("unsupported element type '{dtype}' for tensor '{name}'")]
    UnsupportedType { name: String, dtype: String },

    /// Declared shape does not match the number of emitted values
    #[error(
        "tensor '{name}' declares shape {declared:?} ({expected} elements) but carries {actual} values"
    )]
    ShapeMismatch {
        name: String,
        declared: Vec<u32>,
        expected: usize,
        actual: usize,
    },

    /// Text that is not a decimal number
    #[error("invalid decimal literal '{literal}' in tensor '{name}'")]
    InvalidDecimal { name: String, literal: String },

    /// Number too large or too precise for the fixed-point range
    #[error("value '{literal}' in tensor '{name}' does not fit the fixed-point range")]
    ValueOutOfRange { name: String, literal: String },

    /// The same tensor name appears twice
    #[error("duplicate tensor name '{name}'")]
    DuplicateTensor { name: String },

    /// A JSON tensor whose text does not parse
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TensorError {
    /// Create an unsupported type error
    pub fn unsupported<N: ToString, D: ToString>(name: N, dtype: D) -> Self {
        Self::UnsupportedType {
            name: name.to_string(),
            dtype: dtype.to_string(),
        }
    }

    pub(crate) fn invalid_decimal<T: ToString>(literal: T) -> Self {
        Self::InvalidDecimal {
            name: SCALAR_NAME.to_string(),
            literal: literal.to_string(),
        }
    }

    pub(crate) fn out_of_range<T: ToString>(literal: T) -> Self {
        Self::ValueOutOfRange {
            name: SCALAR_NAME.to_string(),
            literal: literal.to_string(),
        }
    }

    /// Attribute the error to a named tensor
    #[must_use]
    pub fn in_tensor(self, tensor: &str) -> Self {
        match self {
            Self::UnsupportedType { dtype, .. } => Self::UnsupportedType {
                name: tensor.to_string(),
                dtype,
            },
            Self::InvalidDecimal { literal, .. } => Self::InvalidDecimal {
                name: tensor.to_string(),
                literal,
            },
            Self::ValueOutOfRange { literal, .. } => Self::ValueOutOfRange {
                name: tensor.to_string(),
                literal,
            },
            other => other,
        }
    }

    /// Name of the tensor the error refers to, if any
    pub fn tensor_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedType { name, .. }
            | Self::ShapeMismatch { name, .. }
            | Self::InvalidDecimal { name, .. }
            | Self::ValueOutOfRange { name, .. }
            | Self::DuplicateTensor { name } => Some(name),
            Self::Json(_) => None,
        }
    }
}
