// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Fixed-point number representation

use std::fmt;

use alloy_primitives::I256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A decimal number stored as an integer mantissa and a decimal-place count
///
/// The represented real number is `value * 10^(-decimals)`. The sign always
/// lives in `value`; `decimals` is unsigned by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedPointNumber {
    /// Signed mantissa
    #[serde(
        serialize_with = "serialize_mantissa",
        deserialize_with = "deserialize_mantissa"
    )]
    pub value: I256,
    /// Number of decimal places
    pub decimals: u32,
}

impl FixedPointNumber {
    /// Create a fixed-point number from its parts
    pub const fn new(value: I256, decimals: u32) -> Self {
        Self { value, decimals }
    }

    /// Zero, encoded as `(0, 0)`
    pub const ZERO: Self = Self::new(I256::ZERO, 0);

    /// Largest decimal-place count with a meaningful `I256` mantissa
    pub const MAX_DECIMALS: u32 = 76;

    /// Whether the represented number is zero
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl From<i64> for FixedPointNumber {
    fn from(value: i64) -> Self {
        Self::new(I256::try_from(value).unwrap_or(I256::ZERO), 0)
    }
}

impl fmt::Display for FixedPointNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.value.unsigned_abs().to_string();
        let sign = if self.value.is_negative() { "-" } else { "" };
        let decimals = self.decimals as usize;

        if decimals == 0 {
            return write!(f, "{sign}{digits}");
        }

        if self.decimals > Self::MAX_DECIMALS {
            return write!(f, "{sign}{digits}e-{}", self.decimals);
        }

        if digits.len() > decimals {
            let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{digits:0>decimals$}")
        }
    }
}

fn serialize_mantissa<S>(value: &I256, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn deserialize_mantissa<'de, D>(deserializer: D) -> Result<I256, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Mantissa {
        Int(i64),
        Text(String),
    }

    match Mantissa::deserialize(deserializer)? {
        Mantissa::Int(value) => I256::try_from(value).map_err(serde::de::Error::custom),
        Mantissa::Text(text) => {
            I256::from_dec_str(text.trim()).map_err(serde::de::Error::custom)
        }
    }
}
