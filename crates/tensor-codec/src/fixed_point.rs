// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Decimal-exact fixed-point codec
//!
//! Encoding always works on the shortest decimal representation of the input,
//! never on its binary expansion, so `0.1` becomes `(1, 1)` and `2535.79`
//! becomes `(253579, 2)`. The literal is decomposed into sign, digits and
//! exponent, normalized by stripping trailing zeros, and then either scaled up
//! (`exponent >= 0`, `decimals = 0`) or kept with `decimals = -exponent`.

use alloy_primitives::I256;
use serde_json::Value;
use shared_types::FixedPointNumber;
use tracing::debug;

use crate::error::{TensorError, TensorResult};

/// Decimal digits that always fit in an `I256` mantissa
const MAX_MANTISSA_DIGITS: usize = 76;

/// Encode a decimal literal such as `"-12.5"`, `"1e-3"` or `"2535.79"`
pub fn encode_decimal(literal: &str) -> TensorResult<FixedPointNumber> {
    let parts = DecimalParts::parse(literal)?;
    let number = parts.into_fixed_point(literal)?;

    debug!(
        literal,
        value = %number.value,
        decimals = number.decimals,
        "Converted number to fixed point"
    );

    Ok(number)
}

/// Encode a double through its shortest round-trip decimal representation
pub fn encode_f64(x: f64) -> TensorResult<FixedPointNumber> {
    encode_decimal(&x.to_string())
}

/// Encode a single-precision float through its own shortest representation
///
/// Widening to `f64` first would expose binary noise (`0.1f32` is
/// `0.10000000149011612f64`), so the `f32` is formatted directly.
pub fn encode_f32(x: f32) -> TensorResult<FixedPointNumber> {
    encode_decimal(&x.to_string())
}

/// Encode an integer; the result always has `decimals = 0`
pub fn encode_i64(x: i64) -> FixedPointNumber {
    // Infallible for i64, kept on the shared path so normalization is identical.
    encode_decimal(&x.to_string()).unwrap_or_else(|_| FixedPointNumber::from(x))
}

/// Encode a dynamically typed value
///
/// Numbers and decimal strings are accepted; every other JSON type fails
/// with [`TensorError::UnsupportedType`] naming it.
pub fn encode_value(value: &Value) -> TensorResult<FixedPointNumber> {
    match value {
        Value::Number(number) => encode_decimal(&number.to_string()),
        Value::String(text) => encode_decimal(text),
        other => Err(TensorError::unsupported(
            crate::error::SCALAR_NAME,
            json_type_name(other),
        )),
    }
}

/// Decode `value * 10^(-decimals)` to single precision
///
/// The conversion parses the exact mantissa with its exponent, so the result
/// is the `f32` nearest to the represented number. Decimal counts far past
/// the `f32` range decode to zero without materializing the padded text.
pub fn decode(value: I256, decimals: u32) -> f32 {
    scientific(value, decimals).parse().unwrap_or(f32::NAN)
}

/// Decode `value * 10^(-decimals)` to double precision
pub fn decode_f64(value: I256, decimals: u32) -> f64 {
    scientific(value, decimals).parse().unwrap_or(f64::NAN)
}

fn scientific(value: I256, decimals: u32) -> String {
    format!("{value}e-{decimals}")
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Sign, significant digits and base-10 exponent of a decimal literal
#[derive(Debug, PartialEq, Eq)]
struct DecimalParts {
    negative: bool,
    digits: String,
    exponent: i64,
}

impl DecimalParts {
    fn parse(literal: &str) -> TensorResult<Self> {
        let text = literal.trim();
        let (negative, unsigned) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => {
                let exponent = unsigned[pos + 1..]
                    .parse::<i64>()
                    .map_err(|_| TensorError::invalid_decimal(literal))?;
                (&unsigned[..pos], exponent)
            }
            None => (unsigned, 0),
        };

        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_part.len() + frac_part.len() == 0 || !all_digits(int_part) || !all_digits(frac_part)
        {
            return Err(TensorError::invalid_decimal(literal));
        }

        let frac_len =
            i64::try_from(frac_part.len()).map_err(|_| TensorError::out_of_range(literal))?;
        let mut parts = Self {
            negative,
            digits: format!("{int_part}{frac_part}"),
            exponent: exponent
                .checked_sub(frac_len)
                .ok_or_else(|| TensorError::out_of_range(literal))?,
        };
        parts.normalize();
        Ok(parts)
    }

    /// Strip leading zeros and move trailing zeros into the exponent
    fn normalize(&mut self) {
        let significant = self.digits.trim_start_matches('0');
        if significant.is_empty() {
            self.negative = false;
            self.digits = "0".to_string();
            self.exponent = 0;
            return;
        }

        let trimmed = significant.trim_end_matches('0');
        let stripped = significant.len() - trimmed.len();
        self.digits = trimmed.to_string();
        self.exponent = self
            .exponent
            .saturating_add(i64::try_from(stripped).unwrap_or(i64::MAX));
    }

    fn into_fixed_point(self, literal: &str) -> TensorResult<FixedPointNumber> {
        let (digits, decimals) = if self.exponent >= 0 {
            let zeros = usize::try_from(self.exponent)
                .ok()
                .filter(|zeros| self.digits.len() + zeros <= MAX_MANTISSA_DIGITS)
                .ok_or_else(|| TensorError::out_of_range(literal))?;
            (format!("{}{}", self.digits, "0".repeat(zeros)), 0)
        } else {
            let decimals = self
                .exponent
                .checked_neg()
                .and_then(|d| u32::try_from(d).ok())
                .filter(|&d| d <= FixedPointNumber::MAX_DECIMALS)
                .ok_or_else(|| TensorError::out_of_range(literal))?;
            if self.digits.len() > MAX_MANTISSA_DIGITS {
                return Err(TensorError::out_of_range(literal));
            }
            (self.digits, decimals)
        };

        let sign = if self.negative { "-" } else { "" };
        let value = I256::from_dec_str(&format!("{sign}{digits}"))
            .map_err(|_| TensorError::out_of_range(literal))?;

        Ok(FixedPointNumber::new(value, decimals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(value: &FixedPointNumber) -> (String, u32) {
        (value.value.to_string(), value.decimals)
    }

    #[test]
    fn encodes_reference_values() {
        assert_eq!(parts(&encode_f64(2535.79).unwrap()), ("253579".into(), 2));
        assert_eq!(parts(&encode_f64(0.0).unwrap()), ("0".into(), 0));
        assert_eq!(parts(&encode_f64(-12.5).unwrap()), ("-125".into(), 1));
        assert_eq!(parts(&encode_f64(0.1).unwrap()), ("1".into(), 1));
    }

    #[test]
    fn zero_has_no_sign_or_decimals() {
        for literal in ["0", "-0", "0.000", "-0.0e5", "+0"] {
            assert_eq!(encode_decimal(literal).unwrap(), FixedPointNumber::ZERO, "{literal}");
        }
    }

    #[test]
    fn trailing_zeros_are_normalized_away() {
        assert_eq!(parts(&encode_decimal("1.500").unwrap()), ("15".into(), 1));
        assert_eq!(parts(&encode_decimal("1200").unwrap()), ("1200".into(), 0));
        assert_eq!(parts(&encode_decimal("12e2").unwrap()), ("1200".into(), 0));
        assert_eq!(parts(&encode_decimal("1.5E-3").unwrap()), ("15".into(), 4));
    }

    #[test]
    fn integers_route_through_the_same_path() {
        assert_eq!(parts(&encode_i64(42)), ("42".into(), 0));
        assert_eq!(parts(&encode_i64(-7000)), ("-7000".into(), 0));
        assert_eq!(encode_i64(0), FixedPointNumber::ZERO);
    }

    #[test]
    fn f32_uses_its_own_shortest_form() {
        assert_eq!(parts(&encode_f32(0.1).unwrap()), ("1".into(), 1));
        assert_eq!(parts(&encode_f32(-3.25).unwrap()), ("-325".into(), 2));
    }

    #[test]
    fn sign_lives_in_value_only() {
        for x in [0.5, 12.5, 2535.79, 1e-7, 123_456_789.0, 3.0] {
            let positive = encode_f64(x).unwrap();
            let negative = encode_f64(-x).unwrap();
            assert_eq!(negative.value, -positive.value, "{x}");
            assert_eq!(negative.decimals, positive.decimals, "{x}");
        }
    }

    #[test]
    fn round_trips_decimal_literals() {
        assert_eq!(decode_f64(encode_f64(2535.79).unwrap().value, 2), 2535.79);

        for x in [2535.79_f64, -12.5, 0.1, 1e-7, 42.0, 98_765.4321, -0.003] {
            let encoded = encode_f64(x).unwrap();
            assert_eq!(decode_f64(encoded.value, encoded.decimals), x);
        }

        for x in [2535.79_f32, -12.5, 0.1, 42.0] {
            let encoded = encode_f32(x).unwrap();
            assert_eq!(decode(encoded.value, encoded.decimals), x);
        }
    }

    #[test]
    fn decodes_to_nearest_f32() {
        let value = I256::try_from(253_579_i64).unwrap();
        assert_eq!(decode(value, 2), 2535.79_f32);
        assert_eq!(decode(I256::try_from(-1000_i64).unwrap(), 2), -10.0);
        assert_eq!(decode(I256::try_from(1_000_000_000_i64).unwrap(), 8), 10.0);
        assert_eq!(decode(I256::ZERO, 0), 0.0);
    }

    #[test]
    fn huge_decimal_counts_decode_to_zero() {
        assert_eq!(decode(I256::ONE, 400_000_000), 0.0);
        assert_eq!(decode_f64(I256::MINUS_ONE, u32::MAX), -0.0);
        assert_eq!(decode_f64(I256::MAX, 400), 0.0);
    }

    #[test]
    fn rejects_non_numeric_literals() {
        for literal in ["", "abc", "1.2.3", "--1", "1e", "e5", ".", "NaN", "inf"] {
            assert!(
                matches!(encode_decimal(literal), Err(TensorError::InvalidDecimal { .. })),
                "{literal}"
            );
        }
        assert!(encode_f64(f64::NAN).is_err());
    }

    #[test]
    fn rejects_values_outside_the_mantissa_range() {
        assert!(matches!(
            encode_f64(1e300),
            Err(TensorError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            encode_decimal("1e-99999999999"),
            Err(TensorError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            encode_decimal("1e-77"),
            Err(TensorError::ValueOutOfRange { .. })
        ));
        assert_eq!(parts(&encode_decimal("1e-76").unwrap()), ("1".into(), 76));
    }

    #[test]
    fn dynamic_values_accept_numbers_and_strings_only() {
        assert_eq!(
            parts(&encode_value(&serde_json::json!(2535.79)).unwrap()),
            ("253579".into(), 2)
        );
        assert_eq!(
            parts(&encode_value(&serde_json::json!("-12.5")).unwrap()),
            ("-125".into(), 1)
        );

        let err = encode_value(&serde_json::json!(true)).unwrap_err();
        assert!(matches!(err, TensorError::UnsupportedType { ref dtype, .. } if dtype == "bool"));
        assert!(encode_value(&serde_json::json!({"a": 1})).is_err());
    }
}
