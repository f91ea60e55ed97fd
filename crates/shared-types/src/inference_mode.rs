// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Inference execution modes
//!
//! Each mode has a distinct trust and verification model and wraps its
//! out-of-band result in a differently shaped envelope.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Inference execution mode, encoded on chain as a `uint8` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InferenceMode {
    /// Plain execution on the inference node - tag 0
    #[default]
    Vanilla = 0,
    /// Zero-knowledge proven execution - tag 1
    Zkml = 1,
    /// Execution inside a trusted execution environment - tag 2
    Tee = 2,
}

impl InferenceMode {
    /// Returns the on-chain tag
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Vanilla => 0,
            Self::Zkml => 1,
            Self::Tee => 2,
        }
    }

    /// Returns the canonical upper-case name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vanilla => "VANILLA",
            Self::Zkml => "ZKML",
            Self::Tee => "TEE",
        }
    }

    /// Returns all modes
    pub const fn all() -> &'static [Self] {
        &[Self::Vanilla, Self::Zkml, Self::Tee]
    }

    /// Field path from the node's `InferenceResult` object down to the model output
    ///
    /// Every key on the path is required; the first absent key is reported
    /// back to the caller by name.
    pub const fn result_path(self) -> &'static [&'static str] {
        match self {
            Self::Vanilla => &["VanillaResult", "model_output"],
            Self::Zkml => &["ZkmlResult", "model_output"],
            Self::Tee => &["TeeNodeResult", "Response", "VanillaResponse", "model_output"],
        }
    }
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for InferenceMode {
    type Err = InferenceModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(tag) = s.parse::<u8>() {
            return Self::try_from(tag);
        }

        match s.to_uppercase().as_str() {
            "VANILLA" => Ok(Self::Vanilla),
            "ZKML" => Ok(Self::Zkml),
            "TEE" => Ok(Self::Tee),
            _ => Err(InferenceModeParseError::InvalidName(s.to_string())),
        }
    }
}

impl TryFrom<u8> for InferenceMode {
    type Error = InferenceModeParseError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Self::Vanilla),
            1 => Ok(Self::Zkml),
            2 => Ok(Self::Tee),
            _ => Err(InferenceModeParseError::InvalidTag(tag)),
        }
    }
}

impl From<InferenceMode> for u8 {
    fn from(mode: InferenceMode) -> Self {
        mode.as_u8()
    }
}

impl Serialize for InferenceMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for InferenceMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct InferenceModeVisitor;

        impl serde::de::Visitor<'_> for InferenceModeVisitor {
            type Value = InferenceMode;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "an inference mode tag (0, 1, 2) or name (VANILLA, ZKML, TEE)"
                )
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u8::try_from(value)
                    .ok()
                    .and_then(|tag| InferenceMode::try_from(tag).ok())
                    .ok_or_else(|| {
                        E::invalid_value(
                            serde::de::Unexpected::Unsigned(value),
                            &"an inference mode tag (0, 1, 2)",
                        )
                    })
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                InferenceMode::from_str(value).map_err(|_| {
                    E::invalid_value(
                        serde::de::Unexpected::Str(value),
                        &"an inference mode name (VANILLA, ZKML, TEE)",
                    )
                })
            }
        }

        deserializer.deserialize_any(InferenceModeVisitor)
    }
}

/// Error type for inference mode parsing
#[derive(Debug, thiserror::Error)]
pub enum InferenceModeParseError {
    /// Unknown on-chain tag
    #[error("unsupported inference mode tag: {0}. Supported tags are: 0 (VANILLA), 1 (ZKML), 2 (TEE)")]
    InvalidTag(u8),
    /// Unknown mode name
    #[error("unsupported inference mode: {0}. Supported modes are: VANILLA, ZKML, TEE")]
    InvalidName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for &mode in InferenceMode::all() {
            assert_eq!(InferenceMode::try_from(mode.as_u8()).unwrap(), mode);
        }
        assert!(matches!(
            InferenceMode::try_from(7),
            Err(InferenceModeParseError::InvalidTag(7))
        ));
    }

    #[test]
    fn parse_names_case_insensitively() {
        assert_eq!("vanilla".parse::<InferenceMode>().unwrap(), InferenceMode::Vanilla);
        assert_eq!("Tee".parse::<InferenceMode>().unwrap(), InferenceMode::Tee);
        assert_eq!("1".parse::<InferenceMode>().unwrap(), InferenceMode::Zkml);
        assert!("optimistic".parse::<InferenceMode>().is_err());
    }

    #[test]
    fn serde_accepts_tag_or_name() {
        let from_tag: InferenceMode = serde_json::from_str("2").unwrap();
        let from_name: InferenceMode = serde_json::from_str("\"zkml\"").unwrap();
        assert_eq!(from_tag, InferenceMode::Tee);
        assert_eq!(from_name, InferenceMode::Zkml);
        assert_eq!(
            serde_json::to_string(&InferenceMode::Vanilla).unwrap(),
            "\"VANILLA\""
        );
    }

    #[test]
    fn every_mode_ends_at_model_output() {
        for &mode in InferenceMode::all() {
            assert_eq!(mode.result_path().last(), Some(&"model_output"));
        }
        assert_eq!(InferenceMode::Tee.result_path().len(), 4);
    }
}
