//! Denomination helpers for wei, gwei and ether amounts.

use alloy::primitives::utils::{format_units, parse_units, ParseUnits};

use crate::{errors::ParseError, U256};

/// Wei per gwei.
pub const GWEI: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Wei per ether.
pub const ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Converts a gwei amount (possibly fractional) to wei.
///
/// Returns `None` for negative, non-finite or over-precise input.
pub fn gwei_to_wei(gwei: f64) -> Option<U256> {
    if !gwei.is_finite() || gwei < 0.0 {
        return None;
    }

    let wei: U256 = parse_units(&format!("{gwei:.9}"), "gwei").ok()?.into();
    Some(wei)
}

/// Parses a decimal ether amount such as `"1.5"` into wei.
pub fn parse_ether(amount: &str) -> Result<U256, ParseError> {
    match parse_units(amount.trim(), "ether") {
        Ok(ParseUnits::U256(wei)) => Ok(wei),
        Ok(ParseUnits::I256(_)) => Err(ParseError::Amount(format!("{amount} is negative"))),
        Err(e) => Err(ParseError::Amount(format!("{amount}: {e}"))),
    }
}

/// Lossy conversion to `f64`, for logging and threshold comparisons.
pub fn to_f64(v: U256) -> f64 {
    v.as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * 2f64.powi(64) + limb as f64)
}

/// Narrows to `u64` when the value fits.
pub fn to_u64(v: U256) -> Option<u64> {
    u64::try_from(v).ok()
}

fn format_float(wei: U256, units: &str) -> f64 {
    format_units(wei, units)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(f64::INFINITY)
}

/// Converts wei to gwei as a float.
pub fn wei_to_gwei(wei: U256) -> f64 {
    format_float(wei, "gwei")
}

/// Converts wei to ether as a float.
pub fn wei_to_eth(wei: U256) -> f64 {
    format_float(wei, "ether")
}
