//! [`DepositSigner`] backed by a remote signing service speaking the Web3Signer eth2 API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use smartnode_primitives::{deposit::ValidatorSignature, errors::ParseError};
use tracing::debug;

use crate::{
    errors::{LedgerError, LedgerResult},
    signer::{DepositSigner, DepositSigningRequest},
};

#[derive(Debug, Serialize)]
struct DepositPayload {
    pubkey: String,
    withdrawal_credentials: String,
    amount: String,
    genesis_fork_version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignBody {
    #[serde(rename = "type")]
    kind: &'static str,
    signing_root: String,
    deposit: DepositPayload,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    signature: String,
}

impl From<&DepositSigningRequest> for SignBody {
    fn from(req: &DepositSigningRequest) -> Self {
        Self {
            kind: "DEPOSIT",
            signing_root: req.signing_root.to_string(),
            deposit: DepositPayload {
                pubkey: req.message.pubkey.to_string(),
                withdrawal_credentials: req.message.withdrawal_credentials.to_string(),
                amount: req.message.amount_gwei.to_string(),
                genesis_fork_version: format!("0x{}", hex::encode(req.genesis_fork_version)),
            },
        }
    }
}

/// Remote signer holding the validator keys.
#[derive(Debug, Clone)]
pub struct RemoteDepositSigner {
    base_url: String,
    http: Client,
}

impl RemoteDepositSigner {
    /// Creates a signer client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> LedgerResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }
}

#[async_trait]
impl DepositSigner for RemoteDepositSigner {
    async fn sign_deposit(
        &self,
        request: &DepositSigningRequest,
    ) -> LedgerResult<ValidatorSignature> {
        let url = format!(
            "{}/api/v1/eth2/sign/{}",
            self.base_url, request.message.pubkey
        );

        let resp: SignResponse = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&SignBody::from(request))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(pubkey = %request.message.pubkey, "obtained deposit signature");
        resp.signature.parse().map_err(|e| {
            LedgerError::Parse(ParseError::InvalidHex(format!(
                "signature {}: {e}",
                resp.signature
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use smartnode_primitives::{
        deposit::{DepositMessage, ValidatorPubkey},
        types::B256,
    };

    use super::*;

    #[test]
    fn sign_body_shape() {
        let req = DepositSigningRequest::new(
            DepositMessage {
                pubkey: ValidatorPubkey::repeat_byte(0xaa),
                withdrawal_credentials: B256::ZERO,
                amount_gwei: 16_000_000_000,
            },
            [0, 0, 0, 0],
        );

        let body = serde_json::to_value(SignBody::from(&req)).unwrap();
        assert_eq!(body["type"], "DEPOSIT");
        assert_eq!(body["deposit"]["amount"], "16000000000");
        assert_eq!(body["deposit"]["genesis_fork_version"], "0x00000000");
        assert_eq!(body["signingRoot"], req.signing_root.to_string());
    }
}
