//! Fee resolution and cost gating.

use serde::{Deserialize, Serialize};
use smartnode_ledger::LedgerClient;
use smartnode_params::gas::GasParams;
use smartnode_primitives::{
    types::TxFees,
    units::{gwei_to_wei, wei_to_eth, wei_to_gwei},
    U256,
};
use tracing::{info, warn};

use crate::errors::{ConfigError, TxError, TxResult};

/// Fee settings as configured by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasConfig {
    /// Fee cap per gas in gwei. Unset or zero uses the node's suggested fee.
    #[serde(default)]
    pub max_fee_gwei: Option<f64>,

    /// Priority fee per gas in gwei. Unset or zero uses the default.
    #[serde(default)]
    pub max_priority_fee_gwei: Option<f64>,

    /// Fixed gas limit. Unset uses the safe limit derived from each estimate.
    #[serde(default)]
    pub gas_limit: Option<u64>,

    /// Whether the node's suggested fee may stand in for an unset max fee.
    #[serde(default = "default_live_fee_fallback")]
    pub live_fee_fallback: bool,
}

const fn default_live_fee_fallback() -> bool {
    true
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            max_fee_gwei: None,
            max_priority_fee_gwei: None,
            gas_limit: None,
            live_fee_fallback: default_live_fee_fallback(),
        }
    }
}

/// Gas a transaction is expected to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    /// Gas reported by the node's estimate.
    pub estimated_gas: u64,

    /// Estimate scaled by the safety factor.
    pub safe_gas_limit: u64,
}

/// Whether an action is checked against a cost threshold before it is sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CostGate {
    /// Always proceed; for operator-initiated actions and reporting duties.
    Unchecked,

    /// Skip while the max fee exceeds the threshold, in gwei.
    Threshold(f64),

    /// The automation is turned off.
    Disabled,
}

impl CostGate {
    /// Builds the gate for an unattended task from its configured threshold. A threshold of
    /// zero turns the task off.
    pub fn from_threshold_gwei(threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidFee {
                field: "threshold",
                value: threshold,
            });
        }

        Ok(if threshold == 0.0 {
            CostGate::Disabled
        } else {
            CostGate::Threshold(threshold)
        })
    }

    /// Gate for a duty that runs unchecked unless a threshold is configured.
    pub fn from_optional_threshold_gwei(threshold: Option<f64>) -> Result<Self, ConfigError> {
        threshold.map_or(Ok(CostGate::Unchecked), Self::from_threshold_gwei)
    }

    /// Whether the gate turns its task off entirely.
    pub const fn is_disabled(&self) -> bool {
        matches!(self, CostGate::Disabled)
    }
}

/// Why the policy declined to send a transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    /// The task's automation is turned off.
    AutomationDisabled,

    /// The fee exceeds the task's threshold.
    FeeAboveThreshold {
        /// Resolved max fee, in gwei.
        max_fee_gwei: f64,

        /// Configured threshold, in gwei.
        threshold_gwei: f64,
    },
}

/// Outcome of applying the policy to an estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GasDecision {
    /// Send with these fees.
    Proceed(TxFees),

    /// Do not send.
    Skip(SkipReason),
}

/// Resolves fees for a transaction and decides whether it is worth sending.
#[derive(Debug, Clone)]
pub struct GasPolicy {
    max_fee: Option<U256>,
    priority_fee: U256,
    gas_limit: Option<u64>,
    live_fee_fallback: bool,
    params: GasParams,
}

fn configured_wei(field: &'static str, gwei: Option<f64>) -> Result<Option<U256>, ConfigError> {
    match gwei {
        None => Ok(None),
        Some(v) => match gwei_to_wei(v) {
            Some(wei) if wei == U256::ZERO => Ok(None),
            Some(wei) => Ok(Some(wei)),
            None => Err(ConfigError::InvalidFee { field, value: v }),
        },
    }
}

impl GasPolicy {
    /// Validates `config` and builds the policy.
    pub fn new(config: &GasConfig, params: GasParams) -> Result<Self, ConfigError> {
        let max_fee = configured_wei("max_fee_gwei", config.max_fee_gwei)?;
        if max_fee.is_none() && !config.live_fee_fallback {
            return Err(ConfigError::NoFeeSource);
        }

        let priority_fee = match configured_wei(
            "max_priority_fee_gwei",
            config.max_priority_fee_gwei,
        )? {
            Some(fee) => fee,
            None => {
                warn!(
                    default_gwei = params.default_priority_fee_gwei,
                    "priority fee not set, using default"
                );
                gwei_to_wei(params.default_priority_fee_gwei).ok_or(ConfigError::InvalidFee {
                    field: "default_priority_fee_gwei",
                    value: params.default_priority_fee_gwei,
                })?
            }
        };

        Ok(Self {
            max_fee,
            priority_fee,
            gas_limit: config.gas_limit.filter(|l| *l > 0),
            live_fee_fallback: config.live_fee_fallback,
            params,
        })
    }

    /// Turns a raw gas estimate into a [`GasEstimate`].
    pub fn estimate_from(&self, estimated_gas: u64) -> GasEstimate {
        GasEstimate {
            estimated_gas,
            safe_gas_limit: self.params.safe_gas_limit(estimated_gas),
        }
    }

    /// Resolves the max fee per gas: the configured value, else the node's suggestion.
    pub async fn resolve_max_fee(&self, ledger: &dyn LedgerClient) -> TxResult<U256> {
        if let Some(fee) = self.max_fee {
            return Ok(fee);
        }
        if !self.live_fee_fallback {
            return Err(TxError::FeeUnavailable(
                "live fee fallback disabled".to_owned(),
            ));
        }

        match ledger.gas_price().await {
            Ok(price) if price > U256::ZERO => Ok(price),
            Ok(_) => Err(TxError::FeeUnavailable(
                "node suggested a zero fee".to_owned(),
            )),
            Err(e) => Err(TxError::FeeUnavailable(e.to_string())),
        }
    }

    /// Resolves fees for `estimate` and applies `gate`.
    pub async fn evaluate(
        &self,
        ledger: &dyn LedgerClient,
        estimate: &GasEstimate,
        gate: CostGate,
    ) -> TxResult<GasDecision> {
        if gate.is_disabled() {
            return Ok(GasDecision::Skip(SkipReason::AutomationDisabled));
        }

        let max_fee = self.resolve_max_fee(ledger).await?;
        let fees = TxFees {
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: self.priority_fee.min(max_fee),
            gas_limit: self.gas_limit.unwrap_or(estimate.safe_gas_limit),
        };

        let max_fee_gwei = wei_to_gwei(max_fee);
        let cost_eth = wei_to_eth(max_fee.saturating_mul(U256::from(fees.gas_limit)));
        let expected_eth =
            wei_to_eth(max_fee.saturating_mul(U256::from(estimate.estimated_gas)));

        if let CostGate::Threshold(threshold_gwei) = gate {
            if max_fee_gwei > threshold_gwei {
                info!(
                    %max_fee_gwei,
                    %threshold_gwei,
                    %expected_eth,
                    "fee exceeds threshold, skipping"
                );
                return Ok(GasDecision::Skip(SkipReason::FeeAboveThreshold {
                    max_fee_gwei,
                    threshold_gwei,
                }));
            }
        }

        info!(
            gas = estimate.estimated_gas,
            gas_limit = fees.gas_limit,
            %max_fee_gwei,
            %expected_eth,
            max_cost_eth = %cost_eth,
            "resolved transaction fees"
        );
        Ok(GasDecision::Proceed(fees))
    }
}
