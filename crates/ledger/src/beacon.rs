//! [`ConsensusClient`] over the standard beacon node HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use smartnode_primitives::{deposit::ValidatorPubkey, errors::ParseError, types::FixedBytes};
use tracing::trace;

use crate::{
    consensus::{BeaconBlockId, BeaconHead, ConsensusClient, ConsensusConfig, ValidatorStatus},
    errors::{LedgerError, LedgerResult},
};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct HeaderData {
    header: SignedHeader,
}

#[derive(Debug, Deserialize)]
struct SignedHeader {
    message: HeaderMessage,
}

#[derive(Debug, Deserialize)]
struct HeaderMessage {
    slot: String,
}

#[derive(Debug, Deserialize)]
struct ValidatorData {
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct SpecData {
    genesis_fork_version: String,
    seconds_per_slot: String,
    slots_per_epoch: String,
}

fn parse_decimal(field: &str, s: &str) -> LedgerResult<u64> {
    s.parse()
        .map_err(|_| ParseError::OutOfRange(format!("{field}: {s}")).into())
}

fn parse_fork_version(s: &str) -> LedgerResult<[u8; 4]> {
    let version: FixedBytes<4> = s
        .parse()
        .map_err(|e| ParseError::InvalidHex(format!("fork version {s}: {e}")))?;
    Ok(version.0)
}

/// A beacon node reachable over HTTP.
#[derive(Debug, Clone)]
pub struct BeaconHttpClient {
    base_url: String,
    http: Client,
}

impl BeaconHttpClient {
    /// Creates a client for the beacon node at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> LedgerResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> LedgerResult<Option<T>> {
        let url = format!("{}{path}", self.base_url);
        trace!(%url, "beacon request");

        let resp = self.http.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = resp.error_for_status()?.json::<Envelope<T>>().await?;
        Ok(Some(body.data))
    }
}

#[async_trait]
impl ConsensusClient for BeaconHttpClient {
    async fn head_at(&self, block: BeaconBlockId) -> LedgerResult<BeaconHead> {
        let data: HeaderData = self
            .get(&format!("/eth/v1/beacon/headers/{block}"))
            .await?
            .ok_or_else(|| LedgerError::Missing(format!("beacon block {block}")))?;

        Ok(BeaconHead {
            slot: parse_decimal("slot", &data.header.message.slot)?,
        })
    }

    async fn validator_status(&self, pubkey: &ValidatorPubkey) -> LedgerResult<ValidatorStatus> {
        let data: Option<ValidatorData> = self
            .get(&format!("/eth/v1/beacon/states/head/validators/{pubkey}"))
            .await?;

        let Some(data) = data else {
            return Ok(ValidatorStatus::Unknown);
        };

        ValidatorStatus::from_api_str(&data.status)
            .ok_or_else(|| LedgerError::Missing(format!("unknown validator status {}", data.status)))
    }

    async fn config(&self) -> LedgerResult<ConsensusConfig> {
        let spec: SpecData = self
            .get("/eth/v1/config/spec")
            .await?
            .ok_or_else(|| LedgerError::Missing("beacon chain spec".to_owned()))?;

        Ok(ConsensusConfig {
            genesis_fork_version: parse_fork_version(&spec.genesis_fork_version)?,
            seconds_per_slot: parse_decimal("SECONDS_PER_SLOT", &spec.seconds_per_slot)?,
            slots_per_epoch: parse_decimal("SLOTS_PER_EPOCH", &spec.slots_per_epoch)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_response_shape() {
        let raw = r#"{"data": {
            "GENESIS_FORK_VERSION": "0x00001020",
            "SECONDS_PER_SLOT": "12",
            "SLOTS_PER_EPOCH": "32",
            "DEPOSIT_CONTRACT_ADDRESS": "0x00000000219ab540356cBB839Cbe05303d7705Fa"
        }}"#;
        let env: Envelope<SpecData> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parse_fork_version(&env.data.genesis_fork_version).unwrap(),
            [0x00, 0x00, 0x10, 0x20]
        );
        assert!(parse_fork_version("0x0000").is_err());
    }

    #[test]
    fn header_response_shape() {
        let raw = r#"{"data": {"root": "0x00", "header": {"message": {"slot": "4242", "proposer_index": "1"}}}}"#;
        let env: Envelope<HeaderData> = serde_json::from_str(raw).unwrap();
        assert_eq!(parse_decimal("slot", &env.data.header.message.slot).unwrap(), 4242);
    }
}
