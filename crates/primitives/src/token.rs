//! The token contracts the daemon moves value through.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fungible token known to the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    /// The collateral token staked by node operators.
    Ggp,

    /// The fixed-supply token that can be swapped one-to-one into [`TokenKind::Ggp`].
    LegacyGgp,

    /// The liquid staking token minted against deposited ether.
    Reth,
}

impl TokenKind {
    /// All kinds, in a stable order.
    pub const ALL: [TokenKind; 3] = [TokenKind::Ggp, TokenKind::LegacyGgp, TokenKind::Reth];

    /// Name of the token contract in the protocol's contract registry.
    pub const fn contract_name(self) -> &'static str {
        match self {
            TokenKind::Ggp => "rocketTokenGGP",
            TokenKind::LegacyGgp => "rocketTokenGGPFixedSupply",
            TokenKind::Reth => "rocketTokenRETH",
        }
    }

    /// Ticker used in logs.
    pub const fn symbol(self) -> &'static str {
        match self {
            TokenKind::Ggp => "GGP",
            TokenKind::LegacyGgp => "legacy GGP",
            TokenKind::Reth => "rETH",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
