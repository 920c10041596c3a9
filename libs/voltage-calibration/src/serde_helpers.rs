//! Lenient numeric deserializers
//!
//! `period` and `decimals` are optional tuning knobs. Hand-edited files and
//! environment overrides deliver them in several shapes, so parsing is
//! permissive and anything unusable disables the feature instead of
//! rejecting the whole configuration:
//! - native number `360` → Some(360.0)
//! - string number `"360"` → Some(360.0)
//! - `null`, `""`, `"abc"`, objects, arrays → None

use serde::{Deserialize, Deserializer};

/// Largest precision accepted for `decimals`
pub const MAX_DECIMALS: u32 = 100;

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    String(String),
    Other(serde::de::IgnoredAny),
}

impl LenientNumber {
    fn into_f64(self) -> Option<f64> {
        match self {
            LenientNumber::Number(n) => Some(n),
            LenientNumber::String(s) => s.trim().parse::<f64>().ok(),
            LenientNumber::Other(_) => None,
        }
        .filter(|n| !n.is_nan())
    }
}

/// Deserialize an optional f64, treating unparseable input as absent
pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<LenientNumber>::deserialize(deserializer)?.and_then(LenientNumber::into_f64))
}

/// Deserialize an optional decimal precision
///
/// Fractional values are truncated (`2.7` → 2), negative or non-finite values
/// disable rounding, and very large values are capped at [`MAX_DECIMALS`].
pub fn deserialize_lenient_decimals<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_lenient_f64(deserializer)?
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| (n.trunc() as u32).min(MAX_DECIMALS)))
}
