//! Gas limit and fee defaults.

use serde::{Deserialize, Serialize};

use crate::default::{
    DEFAULT_PRIORITY_FEE_GWEI, GAS_LIMIT_MULTIPLIER_DEN, GAS_LIMIT_MULTIPLIER_NUM, MAX_GAS_LIMIT,
};

/// Parameters used to turn a gas estimate into a gas limit and to fill in missing fees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasParams {
    /// Priority fee substituted when none is configured, in gwei.
    pub default_priority_fee_gwei: f64,

    /// Numerator of the safety factor applied to estimates.
    pub limit_multiplier_num: u64,

    /// Denominator of the safety factor applied to estimates.
    pub limit_multiplier_den: u64,

    /// Ceiling on the safe gas limit.
    pub max_gas_limit: u64,
}

impl GasParams {
    /// Scales `estimate` by the safety factor, capped at [`GasParams::max_gas_limit`].
    pub fn safe_gas_limit(&self, estimate: u64) -> u64 {
        let den = self.limit_multiplier_den.max(1);
        let scaled = (estimate as u128 * self.limit_multiplier_num as u128).div_ceil(den as u128);
        u64::try_from(scaled)
            .unwrap_or(u64::MAX)
            .min(self.max_gas_limit)
    }
}

impl Default for GasParams {
    fn default() -> Self {
        Self {
            default_priority_fee_gwei: DEFAULT_PRIORITY_FEE_GWEI,
            limit_multiplier_num: GAS_LIMIT_MULTIPLIER_NUM,
            limit_multiplier_den: GAS_LIMIT_MULTIPLIER_DEN,
            max_gas_limit: MAX_GAS_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_limit_is_one_and_a_half_times_the_estimate() {
        let p = GasParams::default();
        assert_eq!(p.safe_gas_limit(100_000), 150_000);
        assert_eq!(p.safe_gas_limit(3), 5);
    }

    #[test]
    fn safe_limit_is_capped() {
        let p = GasParams::default();
        assert_eq!(p.safe_gas_limit(10_000_000), MAX_GAS_LIMIT);
    }
}
