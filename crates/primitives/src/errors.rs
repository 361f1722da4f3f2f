//! Errors for parsing primitive values.

use thiserror::Error;

/// Error while parsing a primitive from text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// The decoded input had the wrong length.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Number of bytes expected.
        expected: usize,

        /// Number of bytes found.
        actual: usize,
    },

    /// A quantity did not fit the target integer.
    #[error("quantity out of range: {0}")]
    OutOfRange(String),

    /// A decimal token amount could not be parsed.
    #[error("invalid amount: {0}")]
    Amount(String),
}
