//! Storage keys under which the protocol records contract addresses and oracle submissions.
//!
//! Keys are keccak-256 digests of tightly packed (`abi.encodePacked`) inputs: strings verbatim,
//! addresses as 20 bytes, integers as 32 big-endian bytes.

use alloy::primitives::keccak256;

use crate::{
    types::{Address, BlockNumber, B256},
    U256,
};

/// Prefix of the registry entry holding a contract's address.
pub const CONTRACT_ADDRESS_PREFIX: &str = "contract.address";

/// Namespace of price submissions.
pub const PRICES_SUBMITTED_NAMESPACE: &str = "network.prices.submitted.node";

/// Namespace of balance submissions.
pub const BALANCES_SUBMITTED_NAMESPACE: &str = "network.balances.submitted.node";

/// Key of the registry entry for the contract named `name`.
pub fn contract_address_key(name: &str) -> B256 {
    let mut packed = Vec::with_capacity(CONTRACT_ADDRESS_PREFIX.len() + name.len());
    packed.extend_from_slice(CONTRACT_ADDRESS_PREFIX.as_bytes());
    packed.extend_from_slice(name.as_bytes());
    keccak256(packed)
}

/// Identifies a submission in the shared ledger.
///
/// The coarse key covers (account, block) and is set by any submission for that block. The fine
/// key additionally covers the submitted values and is set only by a submission of exactly
/// those values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionKeys {
    /// Set when `account` submitted anything for the block.
    pub coarse: B256,

    /// Set when `account` submitted exactly these values for the block.
    pub fine: B256,
}

fn packed_prefix(namespace: &str, account: Address, block: BlockNumber) -> Vec<u8> {
    let mut packed = Vec::with_capacity(namespace.len() + 20 + 32);
    packed.extend_from_slice(namespace.as_bytes());
    packed.extend_from_slice(account.as_slice());
    packed.extend_from_slice(&U256::from(block).to_be_bytes::<32>());
    packed
}

/// Key recording that `account` submitted something for `block` in `namespace`.
pub fn submission_key(namespace: &str, account: Address, block: BlockNumber) -> B256 {
    keccak256(packed_prefix(namespace, account, block))
}

/// Key recording that `account` submitted exactly `values` for `block` in `namespace`.
pub fn submission_value_key(
    namespace: &str,
    account: Address,
    block: BlockNumber,
    values: &[U256],
) -> B256 {
    let mut packed = packed_prefix(namespace, account, block);
    for v in values {
        packed.extend_from_slice(&v.to_be_bytes::<32>());
    }
    keccak256(packed)
}

/// Both keys for a submission of `values`.
pub fn submission_keys(
    namespace: &str,
    account: Address,
    block: BlockNumber,
    values: &[U256],
) -> SubmissionKeys {
    SubmissionKeys {
        coarse: submission_key(namespace, account, block),
        fine: submission_value_key(namespace, account, block, values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_key_is_keccak_of_packed_name() {
        assert_eq!(
            contract_address_key("rocketTokenGGP"),
            keccak256(b"contract.addressrocketTokenGGP")
        );
    }

    #[test]
    fn coarse_key_ignores_values_and_fine_key_does_not() {
        let account = Address::repeat_byte(7);
        let a = submission_keys(PRICES_SUBMITTED_NAMESPACE, account, 100, &[U256::from(1)]);
        let b = submission_keys(PRICES_SUBMITTED_NAMESPACE, account, 100, &[U256::from(2)]);

        assert_eq!(a.coarse, b.coarse);
        assert_ne!(a.fine, b.fine);
        assert_ne!(a.coarse, a.fine);
    }

    #[test]
    fn namespaces_and_blocks_separate_keys() {
        let account = Address::repeat_byte(7);
        assert_ne!(
            submission_key(PRICES_SUBMITTED_NAMESPACE, account, 100),
            submission_key(BALANCES_SUBMITTED_NAMESPACE, account, 100)
        );
        assert_ne!(
            submission_key(PRICES_SUBMITTED_NAMESPACE, account, 100),
            submission_key(PRICES_SUBMITTED_NAMESPACE, account, 101)
        );
    }

    #[test]
    fn packed_layout() {
        let account = Address::repeat_byte(7);
        let mut expected = b"network.prices.submitted.node".to_vec();
        expected.extend_from_slice(&[7; 20]);
        expected.extend_from_slice(&[0; 31]);
        expected.push(5);
        assert_eq!(
            submission_key(PRICES_SUBMITTED_NAMESPACE, account, 5),
            keccak256(expected)
        );
    }
}
