// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Contract bindings for the inference hub and the inference precompile
//!
//! On chain a fixed-point number is a pair of `int128`s. Conversions to and
//! from the workspace types fail rather than truncate when a mantissa does
//! not fit.

use alloy::sol;
use alloy_primitives::{Address, I256, address};
use shared_types::{FixedPointNumber, JsonTensor, ResultEnvelope};
use tensor_codec::TensorError;

use crate::error::{ExecutorError, ExecutorResult};

/// Address of the precompile that emits `ModelInferenceEvent`
pub const INFERENCE_PRECOMPILE_ADDRESS: Address =
    address!("00000000000000000000000000000000000000f4");

sol! {
    /// Fixed-point number as stored on chain
    #[derive(Debug, PartialEq, Eq)]
    struct TensorNumber {
        int128 value;
        int128 decimals;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct NumberTensor {
        string name;
        TensorNumber[] values;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct StringTensor {
        string name;
        string[] values;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ModelInput {
        NumberTensor[] numbers;
        StringTensor[] strings;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ShapedNumberTensor {
        string name;
        TensorNumber[] values;
        uint32[] shape;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ShapedStringTensor {
        string name;
        string[] values;
        uint32[] shape;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct JsonScalar {
        string name;
        string value;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ModelOutput {
        ShapedNumberTensor[] numbers;
        ShapedStringTensor[] strings;
        JsonScalar[] jsons;
        bool is_simulation_result;
    }

    /// Inference hub entry point
    interface InferenceHub {
        function run(string modelId, uint8 inferenceMode, ModelInput modelInput)
            external
            returns (ModelOutput memory);

        event InferenceResult(address indexed caller, string modelId, ModelInput input, ModelOutput output);
    }

    /// Events emitted by the inference precompile
    interface InferencePrecompile {
        event ModelInferenceEvent(string inferenceID);
    }
}

impl TensorNumber {
    fn from_fixed_point(number: &FixedPointNumber) -> Result<Self, TensorError> {
        let out_of_range = || TensorError::ValueOutOfRange {
            name: String::new(),
            literal: number.to_string(),
        };
        Ok(Self {
            value: i128::try_from(number.value).map_err(|_| out_of_range())?,
            decimals: i128::from(number.decimals),
        })
    }

    /// Negative decimals scale the mantissa up
    fn to_fixed_point(&self) -> ExecutorResult<FixedPointNumber> {
        let value = I256::try_from(self.value).map_err(ExecutorError::abi)?;
        if self.decimals >= 0 {
            let decimals = u32::try_from(self.decimals)
                .ok()
                .filter(|&d| d <= FixedPointNumber::MAX_DECIMALS)
                .ok_or_else(|| {
                    ExecutorError::abi(format!("{} decimal places out of range", self.decimals))
                })?;
            return Ok(FixedPointNumber::new(value, decimals));
        }

        let exponent = u32::try_from(self.decimals.unsigned_abs()).map_err(ExecutorError::abi)?;
        let scale = I256::try_from(10_u8)
            .ok()
            .and_then(|ten| ten.checked_pow(alloy_primitives::U256::from(exponent)))
            .ok_or_else(|| ExecutorError::abi("decimals exponent overflows"))?;
        let scaled = value
            .checked_mul(scale)
            .ok_or_else(|| ExecutorError::abi("scaled mantissa overflows"))?;
        Ok(FixedPointNumber::new(scaled, 0))
    }
}

impl TryFrom<&shared_types::ModelInput> for ModelInput {
    type Error = TensorError;

    fn try_from(input: &shared_types::ModelInput) -> Result<Self, Self::Error> {
        let numbers = input
            .numbers
            .iter()
            .map(|tensor| {
                let values = tensor
                    .values
                    .iter()
                    .map(TensorNumber::from_fixed_point)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| e.in_tensor(&tensor.name))?;
                Ok(NumberTensor {
                    name: tensor.name.clone(),
                    values,
                })
            })
            .collect::<Result<Vec<_>, TensorError>>()?;

        let strings = input
            .strings
            .iter()
            .map(|tensor| StringTensor {
                name: tensor.name.clone(),
                values: tensor.values.clone(),
            })
            .collect();

        Ok(Self { numbers, strings })
    }
}

impl TryFrom<ModelOutput> for ResultEnvelope {
    type Error = ExecutorError;

    fn try_from(output: ModelOutput) -> Result<Self, Self::Error> {
        let numbers = output
            .numbers
            .into_iter()
            .map(|tensor| {
                let values = tensor
                    .values
                    .iter()
                    .map(TensorNumber::to_fixed_point)
                    .collect::<ExecutorResult<Vec<_>>>()?;
                Ok(shared_types::NumberTensor::new(tensor.name, values).with_shape(tensor.shape))
            })
            .collect::<ExecutorResult<Vec<_>>>()?;

        let strings = output
            .strings
            .into_iter()
            .map(|tensor| {
                shared_types::StringTensor::new(tensor.name, tensor.values)
                    .with_shape(tensor.shape)
            })
            .collect();

        let jsons = output
            .jsons
            .into_iter()
            .map(|scalar| JsonTensor::new(scalar.name, scalar.value))
            .collect();

        Ok(Self {
            numbers,
            strings,
            jsons,
            is_simulation_result: output.is_simulation_result,
        })
    }
}

/// Encode `run(modelId, inferenceMode, modelInput)` calldata
pub fn encode_run_call(
    model_id: &str,
    mode: shared_types::InferenceMode,
    input: &shared_types::ModelInput,
) -> Result<Vec<u8>, TensorError> {
    use alloy::sol_types::SolCall;

    let call = InferenceHub::runCall {
        modelId: model_id.to_string(),
        inferenceMode: mode.as_u8(),
        modelInput: ModelInput::try_from(input)?,
    };
    Ok(call.abi_encode())
}
