use core::fmt;
use datgen::{BinKey, BinnedStore, Rejection};
use std::collections::BTreeMap;

/// Rejected candidates, by failed check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RejectionCounts {
    pub time_windows: u64,
    pub urgency: u64,
    pub order_count: u64,
    pub dynamism: u64,
    pub other: u64,
}

impl RejectionCounts {
    pub fn record(&mut self, rejection: &Rejection) {
        let counter = match rejection {
            Rejection::TimeWindows => &mut self.time_windows,
            Rejection::Urgency { .. } => &mut self.urgency,
            Rejection::OrderCount { .. } => &mut self.order_count,
            Rejection::Dynamism { .. } => &mut self.dynamism,
            _ => &mut self.other,
        };
        *counter += 1;
    }

    pub const fn total(&self) -> u64 {
        self.time_windows + self.urgency + self.order_count + self.dynamism + self.other
    }
}

/// Counters for one bin group (one urgency and scale, every dynamism
/// center).
///
/// Every committed attempt is either accepted or rejected, so
/// `attempts == accepted + rejections.total()`. Accepted candidates are then
/// either stored, discarded because their bin was full, or dropped as
/// duplicates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupStats {
    pub urgency: i64,
    pub scale: f64,
    pub attempts: u64,
    pub accepted: u64,
    pub rejections: RejectionCounts,
    /// Accepted candidates whose bin already held its quota.
    pub discarded: u64,
    pub duplicates: u64,
    /// Checks tolerated under a lenient policy.
    pub violations: u64,
    /// Instances stored per bin.
    pub stored: BTreeMap<BinKey, u64>,
}

impl GroupStats {
    pub const fn new(urgency: i64, scale: f64) -> Self {
        Self {
            urgency,
            scale,
            attempts: 0,
            accepted: 0,
            rejections: RejectionCounts {
                time_windows: 0,
                urgency: 0,
                order_count: 0,
                dynamism: 0,
                other: 0,
            },
            discarded: 0,
            duplicates: 0,
            violations: 0,
            stored: BTreeMap::new(),
        }
    }

    /// Fraction of attempts that passed validation.
    #[allow(clippy::cast_precision_loss)]
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }
}

impl fmt::Display for GroupStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "urgency {} scale {}: {} attempts, {} accepted, {} rejected, {} discarded",
            self.urgency,
            self.scale,
            self.attempts,
            self.accepted,
            self.rejections.total(),
            self.discarded
        )
    }
}

/// Counters for a whole run, one entry per bin group in config order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriverStats {
    pub groups: Vec<GroupStats>,
}

impl DriverStats {
    pub fn attempts(&self) -> u64 {
        self.groups.iter().map(|g| g.attempts).sum()
    }

    pub fn accepted(&self) -> u64 {
        self.groups.iter().map(|g| g.accepted).sum()
    }

    pub fn rejected(&self) -> u64 {
        self.groups.iter().map(|g| g.rejections.total()).sum()
    }
}

/// The filled store of a finished run, with its counters.
#[derive(Debug)]
pub struct Dataset<T> {
    pub store: BinnedStore<T>,
    pub stats: DriverStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_tallied_by_check() {
        let mut counts = RejectionCounts::default();
        counts.record(&Rejection::TimeWindows);
        counts.record(&Rejection::Dynamism { score: 0.9 });
        counts.record(&Rejection::Dynamism { score: 0.1 });
        counts.record(&Rejection::OrderCount {
            expected: 3,
            actual: 2,
        });
        assert_eq!(counts.time_windows, 1);
        assert_eq!(counts.dynamism, 2);
        assert_eq!(counts.order_count, 1);
        assert_eq!(counts.urgency, 0);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn group_summary() {
        let mut stats = GroupStats::new(5, 1.0);
        assert_eq!(stats.acceptance_rate(), 0.0);
        stats.attempts = 8;
        stats.accepted = 2;
        stats.rejections.urgency = 6;
        assert_eq!(stats.acceptance_rate(), 0.25);
        assert_eq!(
            stats.to_string(),
            "urgency 5 scale 1: 8 attempts, 2 accepted, 6 rejected, 0 discarded"
        );
    }
}
