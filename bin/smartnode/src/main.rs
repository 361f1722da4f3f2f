//! The smartnode is the operator daemon and CLI of the staking protocol.

use std::{fs, path::Path, process, time::Duration};

use clap::Parser;
use config::Config;
use constants::{DEFAULT_THREAD_COUNT, DEFAULT_THREAD_STACK_SIZE};
use serde::de::DeserializeOwned;
use smartnode_common::{logging, logging::LoggerConfig};
use tokio::{runtime, signal, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

mod args;
mod config;
mod mode;

mod constants;

fn main() {
    if let Err(e) = logging::init(LoggerConfig::with_base_name("smartnode").with_env_otlp_url()) {
        eprintln!("could not initialize logging: {e}");
    }

    let cli = args::Cli::parse();
    info!(command = %cli.command, "starting smartnode");

    let config = parse_toml::<Config>(&cli.config);
    let shutdown_timeout = config.shutdown_timeout;

    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(config.num_threads.unwrap_or(DEFAULT_THREAD_COUNT).into())
        .thread_stack_size(
            config
                .thread_stack_size
                .unwrap_or(DEFAULT_THREAD_STACK_SIZE),
        )
        .enable_all()
        .build()
        .expect("must be able to create runtime");

    let cancel = CancellationToken::new();
    runtime.spawn(cancel_on_ctrl_c(cancel.clone()));

    let result = runtime.block_on(run_until_shutdown(
        mode::run(cli, config, cancel.clone()),
        cancel,
        shutdown_timeout,
    ));
    runtime.shutdown_timeout(shutdown_timeout);

    if let Err(e) = result {
        error!(?e, "smartnode failed");
        process::exit(1);
    }
    info!("smartnode shutdown complete");
}

/// Cancels `cancel` on the first ctrl-c.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("received ctrl-c, shutting down");
            cancel.cancel();
        }
        Err(e) => warn!(%e, "could not listen for ctrl-c"),
    }
}

/// Drives `work` to completion, giving it at most `timeout` to wind down once `cancel` fires.
async fn run_until_shutdown(
    work: impl std::future::Future<Output = anyhow::Result<()>>,
    cancel: CancellationToken,
    timeout: Duration,
) -> anyhow::Result<()> {
    tokio::pin!(work);

    tokio::select! {
        res = &mut work => return res,
        _ = cancel.cancelled() => {}
    }

    info!(?timeout, "waiting for in-flight work");
    match time::timeout(timeout, work).await {
        Ok(res) => res,
        Err(_) => {
            warn!("in-flight work did not finish before the shutdown timeout");
            Ok(())
        }
    }
}

/// Reads and parses a TOML file from the given path into the given type `T`.
///
/// # Panics
///
/// 1. If the file is not readable.
/// 2. If the contents of the file cannot be deserialized into the given type `T`.
fn parse_toml<T>(path: impl AsRef<Path>) -> T
where
    T: std::fmt::Debug + DeserializeOwned,
{
    fs::read_to_string(path)
        .map(|p| {
            trace!(?p, "read file");

            let parsed = toml::from_str::<T>(&p).unwrap_or_else(|e| {
                panic!("failed to parse TOML file: {e:?}");
            });
            debug!(?parsed, "parsed TOML file");

            parsed
        })
        .unwrap_or_else(|_| {
            panic!("failed to read TOML file");
        })
}
