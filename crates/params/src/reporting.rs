//! Windows that decide when a reporting period may be reported and when a report is settled.

use serde::{Deserialize, Serialize};

use crate::default::{
    BALANCES_CONFIRM_DISTANCE, BALANCES_FOLLOW_DISTANCE, PRICES_CONFIRM_DISTANCE,
    PRICES_FOLLOW_DISTANCE,
};

/// Distances, in blocks, that gate a reporting duty relative to the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    /// A period is reportable once the head is at least this many blocks past it.
    pub follow_distance: u64,

    /// A coarse submission for a period this far behind the head is considered settled and
    /// the period is not looked at again.
    pub confirm_distance: u64,
}

impl ReportingWindow {
    /// Window for the price reporting duty.
    pub const fn prices() -> Self {
        Self {
            follow_distance: PRICES_FOLLOW_DISTANCE,
            confirm_distance: PRICES_CONFIRM_DISTANCE,
        }
    }

    /// Window for the balance reporting duty.
    pub const fn balances() -> Self {
        Self {
            follow_distance: BALANCES_FOLLOW_DISTANCE,
            confirm_distance: BALANCES_CONFIRM_DISTANCE,
        }
    }

    /// Whether `period` trails `head` by at least the follow distance.
    pub const fn is_followed(&self, period: u64, head: u64) -> bool {
        period.saturating_add(self.follow_distance) <= head
    }

    /// Whether `period` trails `head` by at least the confirm distance.
    pub const fn is_confirmed(&self, period: u64, head: u64) -> bool {
        period.saturating_add(self.confirm_distance) <= head
    }

    /// Followed height for `head`.
    pub const fn followed_height(&self, head: u64) -> u64 {
        head.saturating_sub(self.follow_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_gate_is_inclusive() {
        let w = ReportingWindow::prices();
        assert!(!w.is_followed(100, 101));
        assert!(w.is_followed(100, 102));
        assert!(w.is_followed(100, 150));
        assert_eq!(w.followed_height(102), 100);
        assert_eq!(w.followed_height(1), 0);
    }

    #[test]
    fn confirm_gate() {
        let w = ReportingWindow::prices();
        assert!(!w.is_confirmed(100, 129));
        assert!(w.is_confirmed(100, 130));
    }

    #[test]
    fn toml_roundtrip() {
        let w: ReportingWindow = toml::from_str("follow_distance = 4\nconfirm_distance = 64\n")
            .expect("must parse");
        assert_eq!(
            w,
            ReportingWindow {
                follow_distance: 4,
                confirm_distance: 64
            }
        );
    }
}
