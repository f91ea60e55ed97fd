// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Tensor assembly for requests and results
//!
//! Requests: a mapping of tensor name to data is partitioned by element type
//! into number tensors (floats and integers, fixed-point encoded) and string
//! tensors, preserving the caller's order within each partition.
//!
//! Results: an emitted [`ResultEnvelope`] is decoded into a [`ModelOutput`],
//! with numbers decoded to `f32`, numbers and strings reshaped to their
//! declared shapes, and JSON tensors parsed.

use std::collections::HashSet;

use ndarray::{ArrayD, IxDyn};
use serde_json::Value;
use shared_types::{
    FixedPointNumber, ModelInput, ModelOutput, NumberTensor, ResultEnvelope, StringTensor,
};
use tracing::debug;

use crate::{
    error::{TensorError, TensorResult},
    fixed_point::{decode, encode_decimal, encode_f32, encode_f64, encode_i64, json_type_name},
};

/// Dynamically typed tensor data supplied by callers
///
/// Scalars convert into single-element tensors. Only the float, integer,
/// decimal and string variants can be sent on chain; the rest exist so that callers with
/// loosely typed data get a precise [`TensorError::UnsupportedType`].
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// Double-precision floats
    Float(Vec<f64>),
    /// Single-precision floats
    Float32(Vec<f32>),
    /// Signed integers
    Int(Vec<i64>),
    /// Decimal literals encoded exactly, e.g. integers beyond `i64`
    Decimal(Vec<String>),
    /// Strings
    Str(Vec<String>),
    /// Booleans (not representable on chain)
    Bool(Vec<bool>),
    /// Mixed or structured values (not representable on chain)
    Object(Vec<Value>),
}

impl TensorData {
    /// Element type name as reported in errors
    pub fn dtype(&self) -> &'static str {
        match self {
            Self::Float(_) => "float64",
            Self::Float32(_) => "float32",
            Self::Int(_) => "int64",
            Self::Decimal(_) => "decimal",
            Self::Str(_) => "str",
            Self::Bool(_) => "bool",
            Self::Object(_) => "object",
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Decimal(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Object(v) => v.len(),
        }
    }

    /// Whether the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Infer a tensor from a JSON value
    ///
    /// Arrays take the narrowest type that holds every element: all `i64`
    /// integers give [`TensorData::Int`], numbers with an integer beyond
    /// `i64` give [`TensorData::Decimal`] carrying their exact text, any other
    /// float among numbers gives [`TensorData::Float`], all strings give
    /// [`TensorData::Str`]. Anything
    /// else, including nested arrays, is [`TensorData::Object`]. A non-array
    /// value is treated as a one-element array.
    pub fn from_json(value: &Value) -> Self {
        let items: Vec<Value> = match value {
            Value::Array(items) => items.clone(),
            scalar => vec![scalar.clone()],
        };

        if let Some(ints) = items.iter().map(Value::as_i64).collect::<Option<Vec<_>>>() {
            return Self::Int(ints);
        }
        if items.iter().all(Value::is_number) {
            let beyond_i64 = |v: &Value| v.as_i64().is_none() && !v.is_f64();
            if items.iter().any(beyond_i64) {
                return Self::Decimal(items.iter().map(Value::to_string).collect());
            }
            if let Some(floats) = items.iter().map(Value::as_f64).collect::<Option<Vec<_>>>() {
                return Self::Float(floats);
            }
        }
        if let Some(strings) = items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
        {
            return Self::Str(strings);
        }
        if let Some(bools) = items.iter().map(Value::as_bool).collect::<Option<Vec<_>>>() {
            return Self::Bool(bools);
        }
        Self::Object(items)
    }
}

macro_rules! tensor_data_from {
    ($variant:ident, $elem:ty) => {
        impl From<Vec<$elem>> for TensorData {
            fn from(values: Vec<$elem>) -> Self {
                Self::$variant(values)
            }
        }

        impl From<$elem> for TensorData {
            fn from(value: $elem) -> Self {
                Self::$variant(vec![value])
            }
        }

        impl From<&[$elem]> for TensorData {
            fn from(values: &[$elem]) -> Self {
                Self::$variant(values.to_vec())
            }
        }

        impl From<ArrayD<$elem>> for TensorData {
            fn from(values: ArrayD<$elem>) -> Self {
                Self::$variant(values.iter().cloned().collect())
            }
        }
    };
}

tensor_data_from!(Float, f64);
tensor_data_from!(Float32, f32);
tensor_data_from!(Int, i64);
tensor_data_from!(Str, String);
tensor_data_from!(Bool, bool);

impl From<&str> for TensorData {
    fn from(value: &str) -> Self {
        Self::Str(vec![value.to_string()])
    }
}

impl From<Vec<&str>> for TensorData {
    fn from(values: Vec<&str>) -> Self {
        Self::Str(values.into_iter().map(str::to_string).collect())
    }
}

impl From<i32> for TensorData {
    fn from(value: i32) -> Self {
        Self::Int(vec![i64::from(value)])
    }
}

impl From<Vec<i32>> for TensorData {
    fn from(values: Vec<i32>) -> Self {
        Self::Int(values.into_iter().map(i64::from).collect())
    }
}

impl From<Value> for TensorData {
    fn from(value: Value) -> Self {
        Self::from_json(&value)
    }
}

impl From<&Value> for TensorData {
    fn from(value: &Value) -> Self {
        Self::from_json(value)
    }
}

/// Partition named tensors into the on-chain request payload
///
/// Iteration order is preserved within each partition. Names must be unique;
/// the first unsupported tensor aborts the whole conversion.
pub fn assemble_input<I, K, V>(inputs: I) -> TensorResult<ModelInput>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<TensorData>,
{
    let mut model_input = ModelInput::default();
    let mut seen = HashSet::new();

    for (name, data) in inputs {
        let name: String = name.into();
        let data: TensorData = data.into();

        if !seen.insert(name.clone()) {
            return Err(TensorError::DuplicateTensor { name });
        }

        match data {
            TensorData::Float(values) => {
                let values = encode_all(&name, &values, |x| encode_f64(*x))?;
                debug!(tensor = %name, dtype = "float64", count = values.len(), "Number tensor input");
                model_input.numbers.push(NumberTensor::new(name, values));
            }
            TensorData::Float32(values) => {
                let values = encode_all(&name, &values, |x| encode_f32(*x))?;
                debug!(tensor = %name, dtype = "float32", count = values.len(), "Number tensor input");
                model_input.numbers.push(NumberTensor::new(name, values));
            }
            TensorData::Int(values) => {
                let values: Vec<_> = values.into_iter().map(encode_i64).collect();
                debug!(tensor = %name, dtype = "int64", count = values.len(), "Number tensor input");
                model_input.numbers.push(NumberTensor::new(name, values));
            }
            TensorData::Decimal(values) => {
                let values = encode_all(&name, &values, |x| encode_decimal(x))?;
                debug!(tensor = %name, dtype = "decimal", count = values.len(), "Number tensor input");
                model_input.numbers.push(NumberTensor::new(name, values));
            }
            TensorData::Str(values) => {
                debug!(tensor = %name, count = values.len(), "String tensor input");
                model_input.strings.push(StringTensor::new(name, values));
            }
            TensorData::Object(values) => {
                let dtype = object_dtype(&values);
                return Err(TensorError::unsupported(name, dtype));
            }
            other @ TensorData::Bool(_) => {
                return Err(TensorError::unsupported(name, other.dtype()));
            }
        }
    }

    Ok(model_input)
}

/// Decode an emitted result envelope into named, reshaped outputs
///
/// An empty declared shape is treated as one-dimensional. A declared shape
/// whose element count differs from the number of values, or overflows,
/// fails with [`TensorError::ShapeMismatch`]. A number with more than
/// [`FixedPointNumber::MAX_DECIMALS`] decimal places fails with
/// [`TensorError::ValueOutOfRange`]; JSON text that does not parse fails with
/// [`TensorError::Json`].
pub fn assemble_output(envelope: &ResultEnvelope) -> TensorResult<ModelOutput> {
    let mut output = ModelOutput {
        is_simulation_result: envelope.is_simulation_result,
        ..ModelOutput::default()
    };
    let mut seen = HashSet::new();
    let mut claim = |name: &str| {
        if seen.insert(name.to_string()) {
            Ok(())
        } else {
            Err(TensorError::DuplicateTensor {
                name: name.to_string(),
            })
        }
    };

    for tensor in &envelope.numbers {
        claim(&tensor.name)?;
        let values = tensor
            .values
            .iter()
            .map(|n| {
                if n.decimals > FixedPointNumber::MAX_DECIMALS {
                    return Err(TensorError::ValueOutOfRange {
                        name: tensor.name.clone(),
                        literal: n.to_string(),
                    });
                }
                Ok(decode(n.value, n.decimals))
            })
            .collect::<TensorResult<Vec<f32>>>()?;
        let array = reshape(&tensor.name, &tensor.shape, values)?;
        output.numbers.insert(tensor.name.clone(), array);
    }

    for tensor in &envelope.strings {
        claim(&tensor.name)?;
        let array = reshape(&tensor.name, &tensor.shape, tensor.values.clone())?;
        output.strings.insert(tensor.name.clone(), array);
    }

    for tensor in &envelope.jsons {
        claim(&tensor.name)?;
        let value: Value = serde_json::from_str(&tensor.value)?;
        output.jsons.insert(tensor.name.clone(), value);
    }

    debug!(
        numbers = output.numbers.len(),
        strings = output.strings.len(),
        jsons = output.jsons.len(),
        is_simulation_result = output.is_simulation_result,
        "Decoded model output"
    );

    Ok(output)
}

fn encode_all<T>(
    name: &str,
    values: &[T],
    encode: impl Fn(&T) -> TensorResult<FixedPointNumber>,
) -> TensorResult<Vec<FixedPointNumber>> {
    values
        .iter()
        .map(|x| encode(x).map_err(|e| e.in_tensor(name)))
        .collect()
}

fn object_dtype(values: &[Value]) -> String {
    let mut kinds: Vec<&str> = values.iter().map(json_type_name).collect();
    kinds.sort_unstable();
    kinds.dedup();
    match kinds.as_slice() {
        [] => "object".to_string(),
        [single] => (*single).to_string(),
        mixed => format!("object({})", mixed.join("|")),
    }
}

fn reshape<T>(name: &str, declared: &[u32], values: Vec<T>) -> TensorResult<ArrayD<T>> {
    let actual = values.len();
    let dims: Vec<usize> = if declared.is_empty() {
        vec![actual]
    } else {
        declared.iter().map(|&d| d as usize).collect()
    };
    let expected = dims
        .iter()
        .try_fold(1_usize, |count, &d| count.checked_mul(d));
    let mismatch = || TensorError::ShapeMismatch {
        name: name.to_string(),
        declared: declared.to_vec(),
        expected: expected.unwrap_or(usize::MAX),
        actual,
    };

    if expected != Some(actual) {
        return Err(mismatch());
    }
    ArrayD::from_shape_vec(IxDyn(&dims), values).map_err(|_| mismatch())
}

#[cfg(test)]
mod tests {
    use alloy_primitives::I256;
    use serde_json::json;
    use shared_types::JsonTensor;

    use super::*;

    fn fp(value: i64, decimals: u32) -> FixedPointNumber {
        FixedPointNumber::new(I256::try_from(value).unwrap(), decimals)
    }

    #[test]
    fn partitions_by_element_type_in_order() {
        let input = assemble_input(vec![
            ("b", TensorData::from(vec![1.5, 2.0])),
            ("words", TensorData::from(vec!["hello", "world"])),
            ("a", TensorData::from(vec![3_i64])),
            ("tag", TensorData::from("x")),
        ])
        .unwrap();

        let numbers: Vec<_> = input.numbers.iter().map(|t| t.name.as_str()).collect();
        let strings: Vec<_> = input.strings.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(numbers, vec!["b", "a"]);
        assert_eq!(strings, vec!["words", "tag"]);
        assert_eq!(input.numbers[0].values, vec![fp(15, 1), fp(2, 0)]);
        assert_eq!(input.numbers[1].values, vec![fp(3, 0)]);
    }

    #[test]
    fn scalars_become_single_element_tensors() {
        let input = assemble_input([("x", 2535.79)]).unwrap();
        assert_eq!(input.numbers[0].values, vec![fp(253_579, 2)]);

        let input = assemble_input([("n", 7_i64)]).unwrap();
        assert_eq!(input.numbers[0].values, vec![fp(7, 0)]);
    }

    #[test]
    fn rejects_unsupported_types_naming_the_tensor() {
        let err = assemble_input([
            ("ok", TensorData::from(1.0)),
            ("flags", TensorData::from(vec![true, false])),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            TensorError::UnsupportedType { ref name, ref dtype } if name == "flags" && dtype == "bool"
        ));

        let err = assemble_input([("mixed", TensorData::from_json(&json!([1, "a"])))]).unwrap_err();
        assert!(matches!(
            err,
            TensorError::UnsupportedType { ref name, ref dtype }
                if name == "mixed" && dtype == "object(number|string)"
        ));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = assemble_input([("x", 1.0), ("x", 2.0)]).unwrap_err();
        assert!(matches!(err, TensorError::DuplicateTensor { ref name } if name == "x"));
    }

    #[test]
    fn non_finite_floats_name_their_tensor() {
        let err = assemble_input([("bad", vec![1.0, f64::NAN])]).unwrap_err();
        assert_eq!(err.tensor_name(), Some("bad"));
    }

    #[test]
    fn json_inference_picks_narrowest_type() {
        assert_eq!(TensorData::from_json(&json!([1, 2])), TensorData::Int(vec![1, 2]));
        assert_eq!(
            TensorData::from_json(&json!([1, 2.5])),
            TensorData::Float(vec![1.0, 2.5])
        );
        assert_eq!(
            TensorData::from_json(&json!("hi")),
            TensorData::Str(vec!["hi".to_string()])
        );
        assert_eq!(TensorData::from_json(&json!([true])), TensorData::Bool(vec![true]));
        assert_eq!(TensorData::from_json(&json!([[1, 2]])).dtype(), "object");
    }

    #[test]
    fn integers_beyond_i64_keep_every_digit() {
        let data = TensorData::from_json(&json!([u64::MAX, 1]));
        assert_eq!(
            data,
            TensorData::Decimal(vec!["18446744073709551615".to_string(), "1".to_string()])
        );

        let input = assemble_input([("ids", data)]).unwrap();
        let big = &input.numbers[0].values[0];
        assert_eq!(big.value.to_string(), "18446744073709551615");
        assert_eq!(big.decimals, 0);
        assert_eq!(input.numbers[0].values[1], fp(1, 0));

        let input = assemble_input([("mixed", TensorData::from_json(&json!([u64::MAX, 0.5])))])
            .unwrap();
        assert_eq!(input.numbers[0].values[1], fp(5, 1));
    }

    #[test]
    fn ndarray_inputs_flatten_row_major() {
        let array =
            ArrayD::<f64>::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let input = assemble_input([("m", array)]).unwrap();
        assert_eq!(
            input.numbers[0].values,
            vec![fp(1, 0), fp(2, 0), fp(3, 0), fp(4, 0)]
        );
    }

    #[test]
    fn decodes_and_reshapes_every_partition() {
        let envelope = ResultEnvelope {
            numbers: vec![
                NumberTensor::new("y", vec![fp(10, 1), fp(2, 0), fp(-35, 1), fp(4, 0)])
                    .with_shape(vec![2, 2]),
            ],
            strings: vec![StringTensor::new("labels", vec!["a".into(), "b".into()])],
            jsons: vec![JsonTensor::new("meta", r#"{"score": 0.5}"#)],
            is_simulation_result: true,
        };

        let output = assemble_output(&envelope).unwrap();
        assert!(output.is_simulation_result);
        assert_eq!(output.len(), 3);

        let y = &output.numbers["y"];
        assert_eq!(y.shape(), &[2, 2]);
        assert_eq!(y[IxDyn(&[1, 0])], -3.5);
        assert_eq!(output.strings["labels"].shape(), &[2]);
        assert_eq!(output.jsons["meta"], json!({"score": 0.5}));
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let envelope = ResultEnvelope {
            numbers: vec![NumberTensor::new("y", vec![fp(1, 0)]).with_shape(vec![3])],
            ..ResultEnvelope::default()
        };

        let err = assemble_output(&envelope).unwrap_err();
        assert!(matches!(
            err,
            TensorError::ShapeMismatch { ref name, expected: 3, actual: 1, .. } if name == "y"
        ));
    }

    #[test]
    fn overflowing_shape_is_a_mismatch() {
        let envelope = ResultEnvelope {
            numbers: vec![
                NumberTensor::new("y", vec![fp(1, 0)])
                    .with_shape(vec![65_536, 65_536, 65_536, 65_536]),
            ],
            ..ResultEnvelope::default()
        };

        let err = assemble_output(&envelope).unwrap_err();
        assert!(matches!(
            err,
            TensorError::ShapeMismatch { ref name, expected: usize::MAX, actual: 1, .. } if name == "y"
        ));
    }

    #[test]
    fn excessive_decimals_are_rejected() {
        let envelope = ResultEnvelope {
            numbers: vec![NumberTensor::new(
                "y",
                vec![fp(1, 2), FixedPointNumber::new(I256::ONE, 400_000_000)],
            )],
            ..ResultEnvelope::default()
        };

        let err = assemble_output(&envelope).unwrap_err();
        assert!(matches!(
            err,
            TensorError::ValueOutOfRange { ref name, ref literal }
                if name == "y" && literal == "1e-400000000"
        ));

        let envelope = ResultEnvelope {
            numbers: vec![NumberTensor::new("y", vec![fp(5, FixedPointNumber::MAX_DECIMALS)])],
            ..ResultEnvelope::default()
        };
        assert_eq!(assemble_output(&envelope).unwrap().numbers["y"][0], 0.0);
    }

    #[test]
    fn invalid_json_tensor_fails() {
        let envelope = ResultEnvelope {
            jsons: vec![JsonTensor::new("meta", "{not json")],
            ..ResultEnvelope::default()
        };
        assert!(matches!(
            assemble_output(&envelope),
            Err(TensorError::Json(_))
        ));
    }

    #[test]
    fn empty_envelope_gives_empty_output() {
        let output = assemble_output(&ResultEnvelope::default()).unwrap();
        assert!(output.is_empty());
        assert!(!output.is_simulation_result);
    }
}
