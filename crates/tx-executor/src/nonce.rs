// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Nonce-conflict classification
//!
//! RPC providers report nonce races only through free-form error text, so the
//! match is a case-insensitive substring search. The wording is not
//! standardized across providers; extend [`NONCE_CONFLICT_PATTERNS`] when a
//! provider phrases it differently.

/// Lowercase fragments that identify a nonce race
pub const NONCE_CONFLICT_PATTERNS: &[&str] = &["nonce too low", "nonce too high", "invalid nonce"];

/// Whether an error message describes a nonce conflict
pub fn is_nonce_conflict(message: &str) -> bool {
    let message = message.to_lowercase();
    NONCE_CONFLICT_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_phrasings() {
        assert!(is_nonce_conflict("nonce too low"));
        assert!(is_nonce_conflict("Nonce Too High: expected 3"));
        assert!(is_nonce_conflict("{'code': -32000, 'message': 'invalid nonce'}"));
        assert!(is_nonce_conflict("server returned an error response: NONCE TOO LOW"));
    }

    #[test]
    fn ignores_unrelated_failures() {
        assert!(!is_nonce_conflict("execution reverted"));
        assert!(!is_nonce_conflict("replacement transaction underpriced"));
        assert!(!is_nonce_conflict("nonce"));
        assert!(!is_nonce_conflict(""));
    }
}
