//! Consensus-layer deposit data: withdrawal credentials and the SSZ roots a validator deposit
//! commits to.

use sha2::{Digest, Sha256};

use crate::types::{Address, FixedBytes, B256};

/// Domain type of validator deposits.
pub const DOMAIN_DEPOSIT: [u8; 4] = [0x03, 0x00, 0x00, 0x00];

/// Amount credited to the validator by the prelaunch deposit, in gwei.
pub const PRELAUNCH_DEPOSIT_GWEI: u64 = 16_000_000_000;

/// Prefix byte of withdrawal credentials that point at an execution-layer address.
pub const ETH1_WITHDRAWAL_PREFIX: u8 = 0x01;

/// A BLS12-381 validator public key.
pub type ValidatorPubkey = FixedBytes<48>;

/// A BLS12-381 signature.
pub type ValidatorSignature = FixedBytes<96>;

/// Withdrawal credentials directing validator withdrawals to `address`.
pub fn withdrawal_credentials(address: Address) -> B256 {
    let mut wc = [0u8; 32];
    wc[0] = ETH1_WITHDRAWAL_PREFIX;
    wc[12..].copy_from_slice(address.as_slice());
    B256::new(wc)
}

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p);
    }
    hasher.finalize().into()
}

fn pubkey_root(pubkey: &ValidatorPubkey) -> [u8; 32] {
    sha256(&[pubkey.as_slice(), &[0u8; 16]])
}

fn signature_root(sig: &ValidatorSignature) -> [u8; 32] {
    let left = sha256(&[&sig[..64]]);
    let right = sha256(&[&sig[64..], &[0u8; 32]]);
    sha256(&[&left, &right])
}

fn amount_chunk(amount_gwei: u64) -> [u8; 32] {
    let mut chunk = [0u8; 32];
    chunk[..8].copy_from_slice(&amount_gwei.to_le_bytes());
    chunk
}

/// The message a validator key signs to authorise a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositMessage {
    /// Validator public key.
    pub pubkey: ValidatorPubkey,

    /// Where withdrawals are paid.
    pub withdrawal_credentials: B256,

    /// Deposit amount in gwei.
    pub amount_gwei: u64,
}

impl DepositMessage {
    /// SSZ hash tree root.
    pub fn hash_tree_root(&self) -> B256 {
        let left = sha256(&[
            &pubkey_root(&self.pubkey),
            self.withdrawal_credentials.as_slice(),
        ]);
        let right = sha256(&[&amount_chunk(self.amount_gwei), &[0u8; 32]]);
        B256::new(sha256(&[&left, &right]))
    }

    /// Root the validator key must sign, under the deposit domain for `fork_version`.
    pub fn signing_root(&self, fork_version: [u8; 4]) -> B256 {
        let domain = compute_deposit_domain(fork_version);
        B256::new(sha256(&[self.hash_tree_root().as_slice(), &domain]))
    }

    /// Attaches a signature, producing the full deposit data.
    pub fn with_signature(self, signature: ValidatorSignature) -> DepositData {
        DepositData {
            message: self,
            signature,
        }
    }
}

/// A signed deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositData {
    /// The signed message.
    pub message: DepositMessage,

    /// Signature over [`DepositMessage::signing_root`].
    pub signature: ValidatorSignature,
}

impl DepositData {
    /// SSZ hash tree root, as checked by the deposit contract.
    pub fn hash_tree_root(&self) -> B256 {
        let left = sha256(&[
            &pubkey_root(&self.message.pubkey),
            self.message.withdrawal_credentials.as_slice(),
        ]);
        let right = sha256(&[
            &amount_chunk(self.message.amount_gwei),
            &signature_root(&self.signature),
        ]);
        B256::new(sha256(&[&left, &right]))
    }
}

/// Deposit domain for `fork_version`. Deposits are valid across forks, so the genesis validators
/// root is always zero.
pub fn compute_deposit_domain(fork_version: [u8; 4]) -> [u8; 32] {
    let mut version_chunk = [0u8; 32];
    version_chunk[..4].copy_from_slice(&fork_version);
    let fork_data_root = sha256(&[&version_chunk, &[0u8; 32]]);

    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(&DOMAIN_DEPOSIT);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawal_credentials_layout() {
        let addr = Address::repeat_byte(0xab);
        let wc = withdrawal_credentials(addr);
        assert_eq!(wc[0], 0x01);
        assert!(wc[1..12].iter().all(|b| *b == 0));
        assert_eq!(&wc[12..], addr.as_slice());
    }

    #[test]
    fn mainnet_deposit_domain() {
        // well-known value for genesis fork version 0x00000000
        let domain = compute_deposit_domain([0, 0, 0, 0]);
        assert_eq!(
            hex::encode(domain),
            "03000000f5a5fd42d16a20302798ef6ed309979b43003d2320d9f0e8ea9831a9"
        );
    }

    #[test]
    fn signature_changes_data_root_but_not_message_root() {
        let msg = DepositMessage {
            pubkey: ValidatorPubkey::repeat_byte(1),
            withdrawal_credentials: withdrawal_credentials(Address::repeat_byte(2)),
            amount_gwei: PRELAUNCH_DEPOSIT_GWEI,
        };

        let a = msg.with_signature(ValidatorSignature::repeat_byte(3));
        let b = msg.with_signature(ValidatorSignature::repeat_byte(4));
        assert_ne!(a.hash_tree_root(), b.hash_tree_root());
        assert_ne!(a.hash_tree_root(), msg.hash_tree_root());
        assert_ne!(msg.signing_root([0; 4]), msg.signing_root([1, 0, 0, 0]));
    }

    #[test]
    fn pubkey_from_slice_checks_length() {
        assert!(ValidatorPubkey::try_from(&[0u8; 47][..]).is_err());
        assert!(ValidatorPubkey::try_from(&[0u8; 48][..]).is_ok());
        assert!("0x00ff".parse::<ValidatorPubkey>().is_err());
    }
}
