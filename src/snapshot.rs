//! Quota snapshots returned by admission checks.

/// Result of one admission check against the quota store.
///
/// A snapshot is created fresh per request, attached to the request context
/// for the rest of that request's lifecycle, and never mutated.
///
/// `remaining` follows the pre-decrement convention: it counts the attempts
/// available *including* the current one. The admission check is
/// `remaining > 0`, and the value reported to callers is
/// [`reported_remaining`](Self::reported_remaining), which subtracts the
/// current attempt and clamps at zero. Every consumer of a snapshot uses
/// this single convention.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuotaSnapshot {
    /// The maximum attempts applicable for this check.
    pub total: u64,
    /// Attempts available including the current one (pre-decrement).
    pub remaining: u64,
    /// Epoch seconds when the current window resets.
    pub reset: u64,
}

impl QuotaSnapshot {
    /// Whether the current attempt fits in the quota.
    ///
    /// A `remaining` of exactly 0 is exceeded, not in-quota.
    pub fn is_in_quota(&self) -> bool {
        self.remaining > 0
    }

    /// The remaining value exposed on responses: attempts left after the
    /// current one is counted, never negative.
    pub fn reported_remaining(&self) -> u64 {
        self.remaining.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_remaining_is_exceeded() {
        let snapshot = QuotaSnapshot { total: 1, remaining: 0, reset: 100 };
        assert!(!snapshot.is_in_quota());
        assert_eq!(snapshot.reported_remaining(), 0);
    }

    #[test]
    fn one_remaining_is_in_quota_but_reports_zero() {
        let snapshot = QuotaSnapshot { total: 1, remaining: 1, reset: 100 };
        assert!(snapshot.is_in_quota());
        assert_eq!(snapshot.reported_remaining(), 0);
    }

    #[test]
    fn reported_remaining_subtracts_current_attempt() {
        let snapshot = QuotaSnapshot { total: 10, remaining: 7, reset: 100 };
        assert_eq!(snapshot.reported_remaining(), 6);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = QuotaSnapshot { total: 60, remaining: 12, reset: 1_700_000_000 };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: QuotaSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
