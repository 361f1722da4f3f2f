//! A scripted service context for task tests.

use std::{sync::Arc, time::Duration};

use smartnode_ledger::{
    inmemory::{DeterministicSigner, InMemoryConsensus, InMemoryLedger},
    storage::{StorageFlags, TokenAllowances},
};
use smartnode_params::gas::GasParams;
use alloy::sol_types::{SolCall, SolValue};
use smartnode_primitives::{
    bindings::{IRocketDAONodeTrusted, IRocketStorage},
    types::{Address, B256},
};
use smartnode_protocol::{
    contracts::{names, ContractRegistry, ALL_CONTRACTS},
    ProtocolClient,
};
use smartnode_test_utils::prelude::*;
use smartnode_tx_engine::{
    gas::{GasConfig, GasPolicy},
    nonce::NonceManager,
    tx_driver::TxDriver,
};
use tokio_util::sync::CancellationToken;

use crate::context::ServiceContext;

pub(crate) const FORK_VERSION: [u8; 4] = [0x00, 0x00, 0x10, 0x20];

pub(crate) struct Fixture {
    pub(crate) ledger: Arc<InMemoryLedger>,
    pub(crate) consensus: Arc<InMemoryConsensus>,
    pub(crate) signer: Arc<DeterministicSigner>,
    pub(crate) oracle: Address,
    pub(crate) ctx: Arc<ServiceContext>,
}

impl Fixture {
    /// Head at 1_000, every contract registered, max fee 10 gwei.
    pub(crate) fn new() -> Self {
        Self::with_max_fee(10.0)
    }

    pub(crate) fn with_max_fee(max_fee_gwei: f64) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(1_000));
        let consensus = Arc::new(InMemoryConsensus::new(FORK_VERSION));
        let signer = Arc::new(DeterministicSigner::default());
        let oracle = random_address();
        let cancel = CancellationToken::new();

        let storage = random_address();
        let registry = Arc::new(ContractRegistry::from_addresses(
            storage,
            ALL_CONTRACTS.map(|name| (name, random_address())),
        ));
        let protocol = ProtocolClient::new(ledger.clone(), registry.clone(), oracle);

        let policy = GasPolicy::new(
            &GasConfig {
                max_fee_gwei: Some(max_fee_gwei),
                ..Default::default()
            },
            GasParams::default(),
        )
        .expect("valid config");
        let driver = TxDriver::new(
            ledger.clone(),
            policy,
            Arc::new(NonceManager::new(None)),
            Duration::from_millis(1),
            cancel.clone(),
        );

        let ctx = Arc::new(ServiceContext {
            account: random_address(),
            protocol,
            driver,
            flags: Arc::new(StorageFlags::new(ledger.clone(), storage)),
            allowances: Arc::new(TokenAllowances::new(
                ledger.clone(),
                registry.token_addresses(),
            )),
            consensus: consensus.clone(),
            signer: signer.clone(),
            cancel,
        });

        Self {
            ledger,
            consensus,
            signer,
            oracle,
            ctx,
        }
    }

    pub(crate) fn at(&self, name: &str) -> Address {
        self.ctx.protocol.registry().get(name).unwrap()
    }

    pub(crate) fn random_target(&self) -> Address {
        random_address()
    }

    pub(crate) fn script<C: SolCall, T: SolValue>(&self, contract: &str, call: C, ret: T) {
        script_call(&self.ledger, self.at(contract), &call, ret);
    }

    pub(crate) fn script_at<C: SolCall, T: SolValue>(&self, to: Address, call: C, ret: T) {
        script_call(&self.ledger, to, &call, ret);
    }

    /// Makes the account a trusted member.
    pub(crate) fn trust(&self) {
        self.script(
            names::DAO_NODE_TRUSTED,
            IRocketDAONodeTrusted::getMemberIsValidCall {
                node: self.ctx.account,
            },
            true,
        );
    }

    fn flag_script(&self, key: B256, value: bool) -> CallScript {
        CallScript::new(
            self.ctx.protocol.registry().storage(),
            &IRocketStorage::getBoolCall { key },
            value,
        )
    }

    pub(crate) fn set_flag(&self, key: B256, value: bool) {
        let script = self.flag_script(key, value);
        self.ledger.set_call(script.to, script.calldata, script.ret);
    }

    /// Sets `key` once a transaction calling `C` on `tx_to` is included.
    pub(crate) fn flag_on_inclusion<C: SolCall>(&self, tx_to: Address, key: B256) {
        script_effect::<C>(&self.ledger, tx_to, &self.flag_script(key, true));
    }

    pub(crate) fn sends_of<C: SolCall>(&self) -> usize {
        self.ledger
            .journal()
            .iter()
            .filter(|op| op.is_send_of(C::SELECTOR))
            .count()
    }
}
