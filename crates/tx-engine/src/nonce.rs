//! Sequencing of explicit account nonces.

use parking_lot::Mutex;
use tracing::debug;

/// Hands out explicit nonces when the operator overrides the node's nonce tracking.
///
/// Without an override every transaction is sent without a nonce and the node assigns one.
/// With an override each transaction uses the next sequential value, and the manager is
/// advanced once the transaction has been accepted.
#[derive(Debug, Default)]
pub struct NonceManager {
    next: Mutex<Option<u64>>,
}

impl NonceManager {
    /// Creates a manager starting at `initial`, if set.
    pub fn new(initial: Option<u64>) -> Self {
        Self {
            next: Mutex::new(initial),
        }
    }

    /// Nonce for the next transaction.
    pub fn current(&self) -> Option<u64> {
        *self.next.lock()
    }

    /// Moves past the nonce just used.
    pub fn advance(&self) {
        let mut next = self.next.lock();
        if let Some(n) = next.as_mut() {
            *n += 1;
            debug!(next = *n, "advanced nonce override");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_override_stays_unset() {
        let nonces = NonceManager::default();
        nonces.advance();
        assert_eq!(nonces.current(), None);
    }

    #[test]
    fn override_is_sequential() {
        let nonces = NonceManager::new(Some(7));
        assert_eq!(nonces.current(), Some(7));
        nonces.advance();
        nonces.advance();
        assert_eq!(nonces.current(), Some(9));
    }
}
