use core::fmt;
use rand::Rng;

use crate::settings::TimeWindow;

/// Turns a random stream into a candidate scenario.
///
/// Implementations must be deterministic given the state of `rng`: the same
/// seed and `id` must always produce the same scenario. The generator is
/// shared between worker threads, so any per-call state lives on the stack.
///
/// # Example
/// ```
/// use datgen::ScenarioGenerator;
/// use rand::{Rng, SeedableRng, rngs::StdRng};
///
/// struct Arrivals;
///
/// impl ScenarioGenerator for Arrivals {
///     type Scenario = Vec<u32>;
///     type Error = std::convert::Infallible;
///
///     fn generate<R: Rng + ?Sized>(&self, rng: &mut R, _id: &str) -> Result<Vec<u32>, Self::Error> {
///         Ok((0..4).map(|_| rng.random_range(0..100)).collect())
///     }
/// }
///
/// let a = Arrivals.generate(&mut StdRng::seed_from_u64(7), "0").unwrap();
/// let b = Arrivals.generate(&mut StdRng::seed_from_u64(7), "0").unwrap();
/// assert_eq!(a, b);
/// ```
pub trait ScenarioGenerator {
    /// The candidate type produced.
    type Scenario;
    /// Raised on malformed settings or impossible configurations.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Generates the scenario named `id` from `rng`.
    ///
    /// # Errors
    ///
    /// Returns an error if no scenario can be built at all. An unlucky
    /// candidate that misses its targets is not an error; validation rejects
    /// it later.
    fn generate<R: Rng + ?Sized>(&self, rng: &mut R, id: &str)
    -> Result<Self::Scenario, Self::Error>;
}

/// Mean and standard deviation of the urgency over a scenario's orders.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UrgencySummary {
    pub mean: f64,
    pub std_dev: f64,
}

/// The kinds of scenario event the metrics engine can count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum EventKind {
    /// A new order (pickup and delivery pair) becomes known.
    NewOrder,
    AddVehicle,
    AddDepot,
    /// The end of the scenario.
    TimeOut,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NewOrder => "new-order",
            Self::AddVehicle => "add-vehicle",
            Self::AddDepot => "add-depot",
            Self::TimeOut => "time-out",
        };
        f.write_str(name)
    }
}

/// The statistics a [`GenerationTask`] needs to classify a scenario.
///
/// The formulas are owned by the implementation; the task only compares the
/// results against its settings.
///
/// [`GenerationTask`]: crate::GenerationTask
pub trait ScenarioMetrics<S: ?Sized> {
    /// Raised when a statistic cannot be computed for the scenario.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Returns `false` if some time window is too tight to be served.
    ///
    /// # Errors
    ///
    /// May fail on a scenario whose time windows are malformed.
    fn check_time_window_strictness(&self, scenario: &S) -> Result<bool, Self::Error>;

    /// Summarizes the urgency of every order in `scenario`.
    ///
    /// # Errors
    ///
    /// May fail if urgency is undefined for the scenario.
    fn measure_urgency(&self, scenario: &S) -> Result<UrgencySummary, Self::Error>;

    /// Counts events of one kind.
    ///
    /// # Errors
    ///
    /// May fail if the event list cannot be read.
    fn count_events(&self, scenario: &S, kind: EventKind) -> Result<usize, Self::Error>;

    /// Computes the raw dynamism score over `office_hours`.
    ///
    /// # Errors
    ///
    /// May fail if the office hours do not fit the scenario.
    fn measure_dynamism(&self, scenario: &S, office_hours: TimeWindow) -> Result<f64, Self::Error>;
}
