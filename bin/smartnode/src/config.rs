use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use smartnode_params::{reporting::ReportingWindow, schedule::ScheduleParams};
use smartnode_primitives::types::Address;
use smartnode_tx_engine::gas::GasConfig;

/// The configuration values that dictate the behavior of the daemons.
///
/// None of these values are shared with other operators; each operator tunes its own fees and
/// schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Config {
    /// File holding the hex-encoded private key of the operator account. Every transaction is
    /// sent from, and signed for, this account.
    pub signer_key_file: PathBuf,

    /// Address of the protocol's storage contract, where every other contract is registered.
    pub storage_address: Address,

    /// Address of the price oracle the price reports are read from.
    pub price_oracle: Address,

    /// How long to wait for in-flight work to finish after a shutdown request.
    pub shutdown_timeout: Duration,

    /// Number of runtime worker threads.
    pub num_threads: Option<u8>,

    /// Stack size of the runtime worker threads, in bytes.
    pub thread_stack_size: Option<usize>,

    /// The execution node.
    pub ledger: EndpointConfig,

    /// The consensus client.
    pub consensus: EndpointConfig,

    /// The remote deposit signer.
    pub deposit_signer: EndpointConfig,

    /// Fee settings.
    pub gas: GasConfig,

    /// Timing of the daemons.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Reporting windows and the cost thresholds of unattended tasks.
    pub reporting: ReportingConfig,
}

/// An HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EndpointConfig {
    /// Base URL.
    pub url: String,

    /// Timeout of a single request.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SchedulerConfig {
    /// Schedule of the watchtower daemon.
    pub watchtower: ScheduleParams,

    /// Schedule of the node daemon.
    pub node: ScheduleParams,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            watchtower: ScheduleParams::watchtower(),
            node: ScheduleParams::node(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ReportingConfig {
    /// Window of the price reporting duty.
    #[serde(default = "ReportingWindow::prices")]
    pub prices: ReportingWindow,

    /// Window of the balance reporting duty.
    #[serde(default = "ReportingWindow::balances")]
    pub balances: ReportingWindow,

    /// Max fee, in gwei, above which each unattended task waits. Zero turns the task off.
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ThresholdConfig {
    pub claim_trusted_node_rewards_gwei: f64,
    pub claim_node_rewards_gwei: f64,
    pub stake_minipools_gwei: f64,

    /// Price and balance reports are submitted at any fee unless this is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_gwei: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_toml() {
        let config = r#"
            signer_key_file = "/etc/smartnode/operator.key"
            storage_address = "0x2222222222222222222222222222222222222222"
            price_oracle = "0x3333333333333333333333333333333333333333"
            shutdown_timeout = { secs = 30, nanos = 0 }
            num_threads = 4
            thread_stack_size = 8388608

            [ledger]
            url = "http://localhost:8545"
            request_timeout = { secs = 30, nanos = 0 }

            [consensus]
            url = "http://localhost:5052"
            request_timeout = { secs = 30, nanos = 0 }

            [deposit_signer]
            url = "http://localhost:9000"
            request_timeout = { secs = 10, nanos = 0 }

            [gas]
            max_fee_gwei = 40.0
            max_priority_fee_gwei = 2.0
            gas_limit = 500000
            live_fee_fallback = false

            [scheduler.watchtower]
            min_interval = { secs = 240, nanos = 0 }
            max_interval = { secs = 360, nanos = 0 }
            task_cooldown = { secs = 10, nanos = 0 }
            receipt_poll_interval = { secs = 5, nanos = 0 }

            [scheduler.node]
            min_interval = { secs = 300, nanos = 0 }
            max_interval = { secs = 300, nanos = 0 }
            task_cooldown = { secs = 10, nanos = 0 }
            receipt_poll_interval = { secs = 5, nanos = 0 }

            [reporting.prices]
            follow_distance = 2
            confirm_distance = 30

            [reporting.thresholds]
            claim_trusted_node_rewards_gwei = 150.0
            claim_node_rewards_gwei = 150.0
            stake_minipools_gwei = 0.0
            report_gwei = 300.0
        "#;

        let config = toml::from_str::<Config>(config);
        assert!(
            config.is_ok(),
            "must be able to deserialize config from toml but got: {}",
            config.unwrap_err()
        );

        let config = config.unwrap();
        assert_eq!(config.reporting.balances, ReportingWindow::balances());
        assert_eq!(config.reporting.thresholds.report_gwei, Some(300.0));
        assert_eq!(config.scheduler, SchedulerConfig::default());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized = toml::from_str::<Config>(&serialized).unwrap();
        assert_eq!(
            deserialized, config,
            "must be able to serialize and deserialize config to toml"
        );
    }

    #[test]
    fn scheduler_section_is_optional() {
        let config = r#"
            signer_key_file = "/etc/smartnode/operator.key"
            storage_address = "0x2222222222222222222222222222222222222222"
            price_oracle = "0x3333333333333333333333333333333333333333"
            shutdown_timeout = { secs = 30, nanos = 0 }

            [ledger]
            url = "http://localhost:8545"
            request_timeout = { secs = 30, nanos = 0 }

            [consensus]
            url = "http://localhost:5052"
            request_timeout = { secs = 30, nanos = 0 }

            [deposit_signer]
            url = "http://localhost:9000"
            request_timeout = { secs = 10, nanos = 0 }

            [gas]

            [reporting.thresholds]
            claim_trusted_node_rewards_gwei = 150.0
            claim_node_rewards_gwei = 150.0
            stake_minipools_gwei = 150.0
        "#;

        let config = toml::from_str::<Config>(config).unwrap();
        assert_eq!(config.scheduler.node, ScheduleParams::node());
        assert_eq!(config.gas, GasConfig::default());
        assert_eq!(config.num_threads, None);
        assert_eq!(config.reporting.thresholds.report_gwei, None);
    }
}
