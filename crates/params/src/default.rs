//! Default values for the daemon parameters.

use std::time::Duration;

/// Number of blocks a price reporting period must trail the head by before it is reported.
pub(crate) const PRICES_FOLLOW_DISTANCE: u64 = 2;

/// Number of blocks after which a coarse price submission is treated as settled.
pub(crate) const PRICES_CONFIRM_DISTANCE: u64 = 30;

/// Number of blocks a balance reporting period must trail the head by before it is reported.
pub(crate) const BALANCES_FOLLOW_DISTANCE: u64 = 2;

/// Number of blocks after which a coarse balance submission is treated as settled.
pub(crate) const BALANCES_CONFIRM_DISTANCE: u64 = 30;

/// Lower bound of the watchtower's sleep between cycles.
pub(crate) const WATCHTOWER_MIN_INTERVAL: Duration = Duration::from_secs(4 * 60);

/// Upper bound of the watchtower's sleep between cycles.
pub(crate) const WATCHTOWER_MAX_INTERVAL: Duration = Duration::from_secs(6 * 60);

/// Sleep between node daemon cycles.
pub(crate) const NODE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Pause between two tasks of the same cycle.
pub(crate) const TASK_COOLDOWN: Duration = Duration::from_secs(10);

/// Interval at which inclusion of a submitted transaction is polled.
pub(crate) const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Priority fee used when none (or zero) is configured, in gwei.
pub(crate) const DEFAULT_PRIORITY_FEE_GWEI: f64 = 2.0;

/// Numerator of the factor applied to a gas estimate to obtain a safe gas limit.
pub(crate) const GAS_LIMIT_MULTIPLIER_NUM: u64 = 3;

/// Denominator of the factor applied to a gas estimate to obtain a safe gas limit.
pub(crate) const GAS_LIMIT_MULTIPLIER_DEN: u64 = 2;

/// Ceiling on any safe gas limit.
pub(crate) const MAX_GAS_LIMIT: u64 = 12_000_000;
