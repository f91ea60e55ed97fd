// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Tensor payloads exchanged with the inference contracts
//!
//! The request side ([`ModelInput`]) carries number and string tensors. The
//! emitted side ([`ResultEnvelope`]) additionally carries JSON tensors and a
//! declared shape per tensor; [`ModelOutput`] is the decoded, reshaped form
//! handed back to callers.

use std::collections::BTreeMap;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FixedPointNumber;

/// A named, ordered array of fixed-point numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberTensor {
    /// Tensor name, unique within a request
    pub name: String,
    /// Values in tensor order
    pub values: Vec<FixedPointNumber>,
    /// Declared shape; empty means one-dimensional
    #[serde(default)]
    pub shape: Vec<u32>,
}

impl NumberTensor {
    /// Create a one-dimensional number tensor
    pub fn new(name: impl Into<String>, values: Vec<FixedPointNumber>) -> Self {
        Self {
            name: name.into(),
            values,
            shape: Vec::new(),
        }
    }

    /// Attach a declared shape
    #[must_use]
    pub fn with_shape(mut self, shape: Vec<u32>) -> Self {
        self.shape = shape;
        self
    }
}

/// A named, ordered array of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringTensor {
    /// Tensor name, unique within a request
    pub name: String,
    /// Values in tensor order
    pub values: Vec<String>,
    /// Declared shape; empty means one-dimensional
    #[serde(default)]
    pub shape: Vec<u32>,
}

impl StringTensor {
    /// Create a one-dimensional string tensor
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
            shape: Vec::new(),
        }
    }

    /// Attach a declared shape
    #[must_use]
    pub fn with_shape(mut self, shape: Vec<u32>) -> Self {
        self.shape = shape;
        self
    }
}

/// A named JSON document, emitted as raw text and parsed on decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonTensor {
    /// Tensor name
    pub name: String,
    /// Raw JSON text
    pub value: String,
}

impl JsonTensor {
    /// Create a JSON tensor from raw text
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// On-chain request payload: the input mapping partitioned by tensor kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInput {
    /// Number tensors, in input order
    pub numbers: Vec<NumberTensor>,
    /// String tensors, in input order
    pub strings: Vec<StringTensor>,
}

impl ModelInput {
    /// Names of every tensor across both partitions
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.numbers
            .iter()
            .map(|t| t.name.as_str())
            .chain(self.strings.iter().map(|t| t.name.as_str()))
    }

    /// Total number of tensors
    pub fn len(&self) -> usize {
        self.numbers.len() + self.strings.len()
    }

    /// Whether the payload carries no tensors
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Emitted result envelope, either inline in an event or fetched out-of-band
///
/// Absence of all tensor arrays means the result is not inline and must be
/// resolved through the out-of-band lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultEnvelope {
    /// Number tensors with declared shapes
    pub numbers: Vec<NumberTensor>,
    /// String tensors with declared shapes
    pub strings: Vec<StringTensor>,
    /// JSON tensors
    pub jsons: Vec<JsonTensor>,
    /// Whether the node produced this result in simulation
    pub is_simulation_result: bool,
}

impl ResultEnvelope {
    /// Whether the envelope carries no tensors at all
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty() && self.strings.is_empty() && self.jsons.is_empty()
    }
}

/// Decoded model output, keyed by tensor name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    /// Numeric tensors, decoded and reshaped
    pub numbers: BTreeMap<String, ArrayD<f32>>,
    /// String tensors, reshaped
    pub strings: BTreeMap<String, ArrayD<String>>,
    /// Parsed JSON tensors
    pub jsons: BTreeMap<String, Value>,
    /// Whether the node produced this result in simulation
    pub is_simulation_result: bool,
}

impl ModelOutput {
    /// Total number of named tensors across all partitions
    pub fn len(&self) -> usize {
        self.numbers.len() + self.strings.len() + self.jsons.len()
    }

    /// Whether no tensors were decoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of every tensor across all partitions
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.numbers
            .keys()
            .chain(self.strings.keys())
            .chain(self.jsons.keys())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_defaults_when_fields_absent() {
        let envelope: ResultEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.is_empty());
        assert!(!envelope.is_simulation_result);
    }

    #[test]
    fn envelope_parses_node_output() {
        let envelope: ResultEnvelope = serde_json::from_str(
            r#"{
                "numbers": [{"name": "y", "values": [{"value": "1000", "decimals": 2}], "shape": [1]}],
                "strings": [{"name": "label", "values": ["cat"], "shape": [1]}],
                "jsons": [{"name": "meta", "value": "{\"k\": 1}"}],
                "is_simulation_result": true
            }"#,
        )
        .unwrap();

        assert!(!envelope.is_empty());
        assert_eq!(envelope.numbers[0].shape, vec![1]);
        assert_eq!(envelope.strings[0].values, vec!["cat".to_string()]);
        assert_eq!(envelope.jsons[0].name, "meta");
        assert!(envelope.is_simulation_result);
    }

    #[test]
    fn model_input_names_cover_both_partitions() {
        let input = ModelInput {
            numbers: vec![NumberTensor::new("a", vec![])],
            strings: vec![StringTensor::new("b", vec![])],
        };
        assert_eq!(input.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(input.len(), 2);
    }
}
