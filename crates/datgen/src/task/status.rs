use core::fmt;

use crate::binned::BinKey;

/// An `(id, seed)` pair identifying one candidate.
///
/// The id names the scenario; the seed drives its random stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdSeed {
    pub id: u64,
    pub seed: u64,
}

impl IdSeed {
    #[must_use]
    pub const fn new(id: u64, seed: u64) -> Self {
        Self { id, seed }
    }
}

/// Why a candidate missed its target bin.
///
/// Each variant carries what was measured so a driver can tell a bin whose
/// tolerance is unreachable from plain bad luck.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Rejection {
    /// The time-window strictness check failed.
    TimeWindows,
    /// Urgency mean or standard deviation is outside the tolerance.
    Urgency {
        expected: i64,
        mean: f64,
        std_dev: f64,
    },
    /// The number of new-order events differs from the target.
    OrderCount { expected: usize, actual: usize },
    /// The dynamism score falls in no registered bin.
    Dynamism { score: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeWindows => f.write_str("time windows too strict"),
            Self::Urgency {
                expected,
                mean,
                std_dev,
            } => write!(
                f,
                "urgency mean {mean} (std dev {std_dev}) does not match {expected}"
            ),
            Self::OrderCount { expected, actual } => {
                write!(f, "{actual} orders, expected {expected}")
            }
            Self::Dynamism { score } => write!(f, "dynamism {score} fits no bin"),
        }
    }
}

/// An accepted candidate, ready to be filed in a [`BinnedStore`].
///
/// [`BinnedStore`]: crate::BinnedStore
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome<S> {
    /// The resolved bin: dynamism bin center, target urgency, target scale.
    pub key: BinKey,
    pub scenario: S,
    pub id: u64,
    pub seed: u64,
    /// The bin center the raw score resolved to.
    pub dynamism_bin: f64,
    /// The raw dynamism score.
    pub dynamism: f64,
    /// Checks that failed but were tolerated. Always empty under
    /// [`ValidationPolicy::Strict`].
    ///
    /// [`ValidationPolicy::Strict`]: crate::ValidationPolicy::Strict
    pub violations: Vec<Rejection>,
}

/// The result of running a [`GenerationTask`].
///
/// - [`TaskStatus::Accepted`]: the candidate qualifies for its bin.
/// - [`TaskStatus::Rejected`]: the candidate missed; try another seed.
///
/// Rejection is the frequent, expected case of rejection sampling and is not
/// an error.
///
/// [`GenerationTask`]: crate::GenerationTask
#[derive(Clone, Debug, PartialEq)]
pub enum TaskStatus<S> {
    /// The candidate passed validation.
    Accepted(Outcome<S>),
    /// The candidate failed the given check.
    Rejected(Rejection),
}

impl<S> TaskStatus<S> {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Returns the outcome, discarding a rejection.
    pub fn accepted(self) -> Option<Outcome<S>> {
        match self {
            Self::Accepted(outcome) => Some(outcome),
            Self::Rejected(_) => None,
        }
    }

    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}
