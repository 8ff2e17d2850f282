//! Swap Size Policy Module
//!
//! Swap sizes are discrete decimal denominations. This module provides the
//! canonical [`SwapSize`] representation and the process-wide policy that
//! decides which sizes are accepted.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

use crate::structs::ValidationError;

// ============================================================================
// SWAP SIZE
// ============================================================================

/// A positive decimal swap denomination in canonical form.
///
/// Canonical form has no leading zeros in the integer part, no trailing zeros
/// in the fraction and no dangling decimal point, so `"01.50"`, `"1.5"` and
/// `1.5` are the same size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapSize(String);

impl SwapSize {
    /// Parses and canonicalises a decimal swap size.
    ///
    /// # Arguments
    ///
    /// * `raw` - Decimal string such as `"10"` or `"0.5"`
    ///
    /// # Returns
    ///
    /// * `Ok(SwapSize)` - Canonical size
    /// * `Err(ValidationError)` - Not a plain positive decimal
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidField {
            field: "swapSize",
            reason: format!("{} (got {:?})", reason, raw),
        };

        let (int_part, frac_part) = match raw.split_once('.') {
            Some((int_part, frac_part)) => {
                if frac_part.is_empty() {
                    return Err(invalid("expected a decimal number"));
                }
                (int_part, frac_part)
            }
            None => (raw, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid("expected a decimal number"));
        }

        let int_part = match int_part.trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        };
        let frac_part = frac_part.trim_end_matches('0');

        if int_part == "0" && frac_part.is_empty() {
            return Err(invalid("must be greater than zero"));
        }

        if frac_part.is_empty() {
            Ok(SwapSize(int_part.to_string()))
        } else {
            Ok(SwapSize(format!("{}.{}", int_part, frac_part)))
        }
    }

    /// Canonical decimal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SwapSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SwapSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SwapSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawSwapSize {
            Text(String),
            Number(serde_json::Number),
        }

        let raw = match RawSwapSize::deserialize(deserializer).map_err(|_| {
            <D::Error as serde::de::Error>::custom("swapSize must be a decimal string or number")
        })? {
            RawSwapSize::Text(text) => text,
            RawSwapSize::Number(number) => number.to_string(),
        };
        SwapSize::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Process-wide set of accepted swap sizes.
///
/// The set is fixed at construction; every deposit and withdraw request is
/// checked against it before its matching engine is called.
#[derive(Debug, Clone)]
pub struct SwapSizePolicy {
    supported: BTreeSet<SwapSize>,
}

impl SwapSizePolicy {
    /// Creates a policy accepting exactly `sizes`.
    pub fn new(sizes: impl IntoIterator<Item = SwapSize>) -> Self {
        Self {
            supported: sizes.into_iter().collect(),
        }
    }

    /// Builds a policy from configured size strings.
    ///
    /// # Arguments
    ///
    /// * `sizes` - Decimal strings from `swap.supported_sizes`
    ///
    /// # Returns
    ///
    /// * `Ok(SwapSizePolicy)` - All sizes parsed
    /// * `Err(ValidationError)` - First size that failed to parse
    pub fn from_config(sizes: &[String]) -> Result<Self, ValidationError> {
        let sizes = sizes
            .iter()
            .map(|size| SwapSize::parse(size))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(sizes))
    }

    /// Returns whether requests of `size` may reach a matching engine.
    pub fn is_supported(&self, size: &SwapSize) -> bool {
        self.supported.contains(size)
    }

    /// Accepted sizes in ascending canonical-string order.
    pub fn supported_sizes(&self) -> impl Iterator<Item = &SwapSize> {
        self.supported.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonicalises() {
        assert_eq!(SwapSize::parse("10").unwrap().as_str(), "10");
        assert_eq!(SwapSize::parse("010").unwrap().as_str(), "10");
        assert_eq!(SwapSize::parse("1.50").unwrap().as_str(), "1.5");
        assert_eq!(SwapSize::parse("0.10").unwrap().as_str(), "0.1");
        assert_eq!(SwapSize::parse("5.000").unwrap().as_str(), "5");
    }

    #[test]
    fn test_parse_rejects_non_decimal() {
        for raw in ["", "abc", "1.", ".5", "-1", "1e3", "1.2.3", " 1"] {
            assert!(SwapSize::parse(raw).is_err(), "{:?} should be rejected", raw);
        }
    }

    #[test]
    fn test_parse_rejects_zero() {
        let err = SwapSize::parse("0.00").unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_deserialize_accepts_string_and_number() {
        let from_str: SwapSize = serde_json::from_str(r#""1.0""#).unwrap();
        let from_int: SwapSize = serde_json::from_str("1").unwrap();
        let from_float: SwapSize = serde_json::from_str("1.0").unwrap();
        assert_eq!(from_str, from_int);
        assert_eq!(from_int, from_float);
        assert!(serde_json::from_str::<SwapSize>("true").is_err());
    }

    #[test]
    fn test_policy_membership() {
        let policy =
            SwapSizePolicy::from_config(&["0.1".to_string(), "1".to_string()]).unwrap();
        assert!(policy.is_supported(&SwapSize::parse("1.00").unwrap()));
        assert!(policy.is_supported(&SwapSize::parse("0.1").unwrap()));
        assert!(!policy.is_supported(&SwapSize::parse("2").unwrap()));
    }

    #[test]
    fn test_supported_sizes_are_canonical_and_deduplicated() {
        let policy = SwapSizePolicy::from_config(&[
            "10".to_string(),
            "0.10".to_string(),
            "1".to_string(),
            "0.1".to_string(),
        ])
        .unwrap();
        let sizes: Vec<&str> = policy.supported_sizes().map(SwapSize::as_str).collect();
        assert_eq!(sizes, vec!["0.1", "1", "10"]);
    }
}
