//! Scripting helpers for [`InMemoryLedger`].

use alloy::sol_types::{SolCall, SolValue};
use smartnode_ledger::inmemory::InMemoryLedger;
use smartnode_primitives::types::{Address, Bytes};

/// Return data of a view returning the single value `value`.
pub fn returns<T: SolValue>(value: T) -> Vec<u8> {
    (value,).abi_encode_params()
}

/// A contract call and the data it returns.
#[derive(Debug, Clone)]
pub struct CallScript {
    /// Contract the call goes to.
    pub to: Address,

    /// Encoded calldata.
    pub calldata: Bytes,

    /// Encoded return data.
    pub ret: Bytes,
}

impl CallScript {
    /// `call` against `to`, returning the single value `ret`.
    pub fn new<C: SolCall, T: SolValue>(to: Address, call: &C, ret: T) -> Self {
        Self {
            to,
            calldata: call.abi_encode().into(),
            ret: returns(ret).into(),
        }
    }
}

/// Makes `call` against `to` return `ret` on `ledger`.
pub fn script_call<C: SolCall, T: SolValue>(ledger: &InMemoryLedger, to: Address, call: &C, ret: T) {
    ledger.set_call(to, call.abi_encode(), returns(ret));
}

/// Makes the call in `after` return its value once a transaction to `tx_to` calling `C` is
/// included.
pub fn script_effect<C: SolCall>(ledger: &InMemoryLedger, tx_to: Address, after: &CallScript) {
    ledger.on_inclusion(
        tx_to,
        C::SELECTOR,
        after.to,
        after.calldata.clone(),
        after.ret.clone(),
    );
}
