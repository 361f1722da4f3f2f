//! Bootstraps the shared services and dispatches to the selected command.

use std::{fs, sync::Arc, time::Duration};

use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use smartnode_ledger::{
    beacon::BeaconHttpClient,
    rpc::JsonRpcLedger,
    storage::{StorageFlags, TokenAllowances},
    web3signer::RemoteDepositSigner,
    LedgerClient,
};
use smartnode_params::gas::GasParams;
use smartnode_protocol::{contracts::ALL_CONTRACTS, ContractRegistry, ProtocolClient};
use smartnode_tx_engine::{gas::GasPolicy, nonce::NonceManager, tx_driver::TxDriver};
use smartnode_watchtower::ServiceContext;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    args::{Cli, Command},
    config::Config,
};

mod node;
mod ops;
mod watchtower;

/// Runs the command selected on the command line.
pub(crate) async fn run(cli: Cli, config: Config, cancel: CancellationToken) -> anyhow::Result<()> {
    match cli.command {
        Command::Watchtower => {
            let params = config.scheduler.watchtower;
            let ctx = bootstrap(&config, cli.nonce, params.receipt_poll_interval, cancel).await?;
            watchtower::run(ctx, &config, params).await
        }
        Command::Node => {
            let params = config.scheduler.node;
            let ctx = bootstrap(&config, cli.nonce, params.receipt_poll_interval, cancel).await?;
            node::run(ctx, &config, params).await
        }
        op => {
            let poll = config.scheduler.node.receipt_poll_interval;
            let ctx = bootstrap(&config, cli.nonce, poll, cancel).await?;
            ops::run(&ctx, op, cli.dry_run).await
        }
    }
}

/// Connects to every collaborator and resolves the protocol contracts.
async fn bootstrap(
    config: &Config,
    nonce: Option<u64>,
    receipt_poll_interval: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<Arc<ServiceContext>> {
    let key = fs::read_to_string(&config.signer_key_file).with_context(|| {
        format!("failed to read key file {}", config.signer_key_file.display())
    })?;
    let key: PrivateKeySigner = key
        .trim()
        .parse()
        .context("key file does not hold a valid private key")?;
    let account = key.address();
    info!(%account, "bootstrapping services");

    let ledger = JsonRpcLedger::connect(&config.ledger.url, config.ledger.request_timeout, key)
        .await?;
    let ledger: Arc<dyn LedgerClient> = Arc::new(ledger);
    let consensus = Arc::new(BeaconHttpClient::new(
        &config.consensus.url,
        config.consensus.request_timeout,
    )?);
    let signer = Arc::new(RemoteDepositSigner::new(
        &config.deposit_signer.url,
        config.deposit_signer.request_timeout,
    )?);

    let registry = Arc::new(
        ContractRegistry::load(ledger.as_ref(), config.storage_address, &ALL_CONTRACTS).await?,
    );
    let protocol = ProtocolClient::new(ledger.clone(), registry.clone(), config.price_oracle);

    let policy = GasPolicy::new(&config.gas, GasParams::default())?;
    if let Some(nonce) = nonce {
        info!(%nonce, "using nonce override");
    }
    let driver = TxDriver::new(
        ledger.clone(),
        policy,
        Arc::new(NonceManager::new(nonce)),
        receipt_poll_interval,
        cancel.clone(),
    );

    Ok(Arc::new(ServiceContext {
        account,
        protocol,
        driver,
        flags: Arc::new(StorageFlags::new(ledger.clone(), config.storage_address)),
        allowances: Arc::new(TokenAllowances::new(ledger, registry.token_addresses())),
        consensus,
        signer,
        cancel,
    }))
}
