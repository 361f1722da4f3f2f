//! Parses command-line arguments for the smartnode CLI.

use std::{fmt::Display, path::PathBuf};

use clap::{crate_version, Parser, Subcommand};
use smartnode_primitives::{deposit::ValidatorPubkey, units, U256};

#[derive(Debug, Parser)]
#[clap(
    name = "smartnode",
    about = "Operator daemon for the staking protocol",
    version = crate_version!()
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(
        long,
        short = 'c',
        help = "The file containing the configuration for the daemon",
        default_value = "config.toml",
        global = true
    )]
    pub config: PathBuf,

    #[clap(
        long,
        help = "Nonce of the first transaction sent; later transactions use the following values",
        global = true
    )]
    pub nonce: Option<u64>,

    #[clap(
        long,
        help = "Print whether the operation may be performed as JSON instead of performing it",
        global = true
    )]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Command {
    /// Run the trusted node daemon: claim trusted node rewards, report prices and balances.
    Watchtower,

    /// Run the node daemon: claim node rewards and stake prelaunch minipools.
    Node,

    /// Stake GGP, approving the staking contract first if needed.
    StakeGgp {
        /// Amount in GGP.
        #[arg(value_parser = parse_ether)]
        amount: U256,
    },

    /// Swap legacy GGP for GGP, approving the swap first if needed.
    SwapGgp {
        /// Amount in legacy GGP.
        #[arg(value_parser = parse_ether)]
        amount: U256,
    },

    /// Withdraw staked GGP.
    WithdrawGgp {
        /// Amount in GGP.
        #[arg(value_parser = parse_ether)]
        amount: U256,
    },

    /// Join the trusted node DAO after an invitation, approving the bond first if needed.
    JoinOdao,

    /// Create a collateral auction lot.
    CreateLot,

    /// Bid on a collateral auction lot.
    BidOnLot {
        /// Index of the lot.
        lot: u64,

        /// Amount in ETH.
        #[arg(value_parser = parse_ether)]
        amount: U256,
    },

    /// Return the unsold GGP of a finished auction lot.
    RecoverLot {
        /// Index of the lot.
        lot: u64,
    },

    /// Create a minipool, depositing ETH for a new validator.
    NodeDeposit {
        /// Amount in ETH; trusted members may deposit 0.
        #[arg(value_parser = parse_ether)]
        amount: U256,

        /// Hex-encoded public key of the validator.
        #[arg(value_parser = parse_pubkey)]
        pubkey: ValidatorPubkey,

        /// Lowest commission rate accepted, as a fraction such as 0.15.
        #[arg(long, value_parser = parse_ether, default_value = "0")]
        min_node_fee: U256,
    },
}

impl Command {
    /// Whether the command runs a long-lived daemon.
    pub(crate) const fn is_daemon(&self) -> bool {
        matches!(self, Command::Watchtower | Command::Node)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Watchtower => write!(f, "watchtower"),
            Command::Node => write!(f, "node"),
            Command::StakeGgp { .. } => write!(f, "stake-ggp"),
            Command::SwapGgp { .. } => write!(f, "swap-ggp"),
            Command::WithdrawGgp { .. } => write!(f, "withdraw-ggp"),
            Command::JoinOdao => write!(f, "join-odao"),
            Command::CreateLot => write!(f, "create-lot"),
            Command::BidOnLot { .. } => write!(f, "bid-on-lot"),
            Command::RecoverLot { .. } => write!(f, "recover-lot"),
            Command::NodeDeposit { .. } => write!(f, "node-deposit"),
        }
    }
}

/// Parses a decimal amount of 18-decimal tokens into base units.
pub(crate) fn parse_ether(s: &str) -> Result<U256, String> {
    units::parse_ether(s).map_err(|e| e.to_string())
}

fn parse_pubkey(s: &str) -> Result<ValidatorPubkey, String> {
    s.parse().map_err(|e| format!("invalid validator pubkey {s}: {e}"))
}

#[cfg(test)]
mod tests {
    use smartnode_primitives::units::ETHER;

    use super::*;

    #[test]
    fn parses_decimal_amounts() {
        assert_eq!(parse_ether("1").unwrap(), ETHER);
        assert_eq!(parse_ether("0.5").unwrap(), ETHER / U256::from(2));
        assert_eq!(parse_ether("0.000000000000000001").unwrap(), U256::from(1));

        assert!(parse_ether("").is_err());
        assert!(parse_ether("-1").is_err());
        assert!(parse_ether("one").is_err());
    }

    #[test]
    fn node_deposit_takes_a_pubkey_and_fee() {
        let pubkey = format!("0x{}", "ab".repeat(48));
        let cli = Cli::try_parse_from([
            "smartnode",
            "node-deposit",
            "16",
            &pubkey,
            "--min-node-fee",
            "0.15",
        ])
        .unwrap();

        let Command::NodeDeposit {
            amount,
            pubkey,
            min_node_fee,
        } = cli.command
        else {
            panic!("expected node-deposit");
        };
        assert_eq!(amount, U256::from(16) * ETHER);
        assert_eq!(pubkey, ValidatorPubkey::repeat_byte(0xab));
        assert_eq!(min_node_fee, ETHER * U256::from(15) / U256::from(100));

        assert!(Cli::try_parse_from(["smartnode", "node-deposit", "16", "0xab"]).is_err());
    }

    #[test]
    fn parses_subcommands_with_global_flags() {
        let cli = Cli::try_parse_from([
            "smartnode",
            "bid-on-lot",
            "3",
            "1.5",
            "--nonce",
            "7",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.nonce, Some(7));
        assert!(cli.dry_run);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        let Command::BidOnLot { lot, amount } = cli.command else {
            panic!("expected bid-on-lot");
        };
        assert_eq!(lot, 3);
        assert_eq!(amount, ETHER * U256::from(3) / U256::from(2));

        let cli = Cli::try_parse_from(["smartnode", "-c", "node.toml", "node"]).unwrap();
        assert!(cli.command.is_daemon());
        assert_eq!(cli.command.to_string(), "node");
    }
}
