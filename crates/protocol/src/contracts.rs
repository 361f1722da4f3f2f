//! Contract address resolution.
//!
//! Every protocol contract is registered in the storage contract under
//! `keccak("contract.address" ++ name)`. The registry resolves the names the daemon needs once
//! at start and never re-reads them.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use smartnode_ledger::{read_call, LedgerClient, LedgerError, LedgerResult};
use smartnode_primitives::{
    bindings::IRocketStorage,
    keys::contract_address_key,
    token::TokenKind,
    types::{Address, BlockId},
};
use tracing::{debug, info};

use crate::errors::{ProtocolError, ProtocolResult};

/// Registry names of the contracts the daemon talks to.
pub mod names {
    #![allow(missing_docs)]

    pub const DAO_NODE_TRUSTED: &str = "rocketDAONodeTrusted";
    pub const DAO_NODE_TRUSTED_ACTIONS: &str = "rocketDAONodeTrustedActions";
    pub const DAO_NODE_TRUSTED_SETTINGS_MEMBERS: &str = "rocketDAONodeTrustedSettingsMembers";
    pub const DAO_NODE_TRUSTED_SETTINGS_PROPOSALS: &str = "rocketDAONodeTrustedSettingsProposals";
    pub const DAO_PROTOCOL_SETTINGS_AUCTION: &str = "rocketDAOProtocolSettingsAuction";
    pub const DAO_PROTOCOL_SETTINGS_NETWORK: &str = "rocketDAOProtocolSettingsNetwork";
    pub const DAO_PROTOCOL_SETTINGS_REWARDS: &str = "rocketDAOProtocolSettingsRewards";
    pub const DAO_PROTOCOL_SETTINGS_NODE: &str = "rocketDAOProtocolSettingsNode";
    pub const NETWORK_PRICES: &str = "rocketNetworkPrices";
    pub const NETWORK_BALANCES: &str = "rocketNetworkBalances";
    pub const NODE_STAKING: &str = "rocketNodeStaking";
    pub const MINIPOOL_MANAGER: &str = "rocketMinipoolManager";
    pub const MINIPOOL_FACTORY: &str = "rocketMinipoolFactory";
    pub const NODE_DEPOSIT: &str = "rocketNodeDeposit";
    pub const DEPOSIT_POOL: &str = "rocketDepositPool";
    pub const CLAIM_TRUSTED_NODE: &str = "rocketClaimTrustedNode";
    pub const CLAIM_NODE: &str = "rocketClaimNode";
    pub const AUCTION_MANAGER: &str = "rocketAuctionManager";
}

/// Every contract the daemons resolve at start.
pub const ALL_CONTRACTS: [&str; 21] = [
    names::DAO_NODE_TRUSTED,
    names::DAO_NODE_TRUSTED_ACTIONS,
    names::DAO_NODE_TRUSTED_SETTINGS_MEMBERS,
    names::DAO_NODE_TRUSTED_SETTINGS_PROPOSALS,
    names::DAO_PROTOCOL_SETTINGS_AUCTION,
    names::DAO_PROTOCOL_SETTINGS_NETWORK,
    names::DAO_PROTOCOL_SETTINGS_REWARDS,
    names::DAO_PROTOCOL_SETTINGS_NODE,
    names::NETWORK_PRICES,
    names::NETWORK_BALANCES,
    names::NODE_STAKING,
    names::MINIPOOL_MANAGER,
    names::MINIPOOL_FACTORY,
    names::NODE_DEPOSIT,
    names::DEPOSIT_POOL,
    names::CLAIM_TRUSTED_NODE,
    names::CLAIM_NODE,
    names::AUCTION_MANAGER,
    TokenKind::Ggp.contract_name(),
    TokenKind::LegacyGgp.contract_name(),
    TokenKind::Reth.contract_name(),
];

async fn resolve(
    ledger: &dyn LedgerClient,
    storage: Address,
    name: &'static str,
) -> ProtocolResult<(&'static str, Address)> {
    let call = IRocketStorage::getAddressCall {
        key: contract_address_key(name),
    };
    let address = read_call(ledger, storage, &call, BlockId::Latest).await?._0;
    if address == Address::ZERO {
        return Err(ProtocolError::ZeroAddress(name));
    }

    debug!(%name, %address, "resolved contract");
    Ok((name, address))
}

/// Resolved contract addresses.
#[derive(Debug, Clone)]
pub struct ContractRegistry {
    storage: Address,
    addresses: BTreeMap<&'static str, Address>,
}

impl ContractRegistry {
    /// Resolves `names` from the storage contract at `storage`, concurrently.
    ///
    /// A name that resolves to the zero address is an error: the daemon cannot work against a
    /// partially deployed protocol.
    pub async fn load(
        ledger: &dyn LedgerClient,
        storage: Address,
        names: &[&'static str],
    ) -> ProtocolResult<Self> {
        let lookups = names.iter().map(|&name| resolve(ledger, storage, name));
        let addresses: BTreeMap<_, _> = try_join_all(lookups).await?.into_iter().collect();
        info!(%storage, count = addresses.len(), "contract registry loaded");

        Ok(Self { storage, addresses })
    }

    /// Builds a registry from known addresses.
    pub fn from_addresses(
        storage: Address,
        addresses: impl IntoIterator<Item = (&'static str, Address)>,
    ) -> Self {
        Self {
            storage,
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Address of the storage contract.
    pub const fn storage(&self) -> Address {
        self.storage
    }

    /// Address registered under `name`.
    pub fn get(&self, name: &str) -> LedgerResult<Address> {
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| LedgerError::Missing(format!("contract {name} not in registry")))
    }

    /// Addresses of the token contracts that were resolved.
    pub fn token_addresses(&self) -> BTreeMap<TokenKind, Address> {
        TokenKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.addresses
                    .get(kind.contract_name())
                    .map(|addr| (kind, *addr))
            })
            .collect()
    }
}
