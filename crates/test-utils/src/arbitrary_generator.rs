//! Random values for tests.

use proptest::prelude::*;
use rand::{thread_rng, Rng};
use smartnode_primitives::{
    types::{Address, B256},
    U256,
};

/// Generates a random non-zero address.
pub fn random_address() -> Address {
    let mut rng = thread_rng();
    loop {
        let addr = Address::from(rng.gen::<[u8; 20]>());
        if addr != Address::ZERO {
            return addr;
        }
    }
}

/// Generates a random 32-byte hash.
pub fn random_hash() -> B256 {
    B256::from(thread_rng().gen::<[u8; 32]>())
}

/// Generates a random 256-bit integer.
pub fn random_u256() -> U256 {
    U256::from_be_bytes(thread_rng().gen::<[u8; 32]>())
}

/// Alias of [`random_address`] for readability where the address is a node account.
pub fn random_account() -> Address {
    random_address()
}

prop_compose! {
    /// Strategy yielding arbitrary addresses.
    pub fn arb_address()(bytes in any::<[u8; 20]>()) -> Address {
        Address::from(bytes)
    }
}

prop_compose! {
    /// Strategy yielding arbitrary 256-bit integers.
    pub fn arb_u256()(bytes in any::<[u8; 32]>()) -> U256 {
        U256::from_be_bytes(bytes)
    }
}
