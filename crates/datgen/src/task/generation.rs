use rand::{SeedableRng, rngs::StdRng};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    binned::BinKey,
    interface::{EventKind, ScenarioGenerator, ScenarioMetrics, UrgencySummary},
    settings::GeneratorSettings,
    task::{IdSeed, Outcome, Rejection, TaskError, TaskStatus, ValidationPolicy},
};

/// Absolute tolerance on both the urgency mean (around the target) and the
/// urgency standard deviation.
pub const URGENCY_THRESHOLD: f64 = 0.01;

/// The bin center a [`ValidationPolicy::Lenient`] task files a candidate
/// under when its dynamism score fits no registered bin.
pub const LENIENT_DYNAMISM_BIN: f64 = 0.5;

/// Returns `true` if `urgency` is within [`URGENCY_THRESHOLD`] of `expected`
/// and its standard deviation is below it. Both comparisons are strict.
///
/// The deviation is computed in `f64`, so a mean that reads as exactly
/// `expected ± 0.01` can round just below the threshold and pass. At
/// `expected = 5`, a mean of `5.01` passes while `5.010001` fails. Only at
/// `expected = 0` does `±0.01` land exactly on the threshold.
#[must_use]
pub fn urgency_matches(urgency: UrgencySummary, expected: i64) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let deviation = (urgency.mean - expected as f64).abs();
    deviation < URGENCY_THRESHOLD && urgency.std_dev < URGENCY_THRESHOLD
}

/// One generate-validate unit of rejection sampling.
///
/// Running the task seeds a [`StdRng`] from its seed, asks the generator
/// for a candidate, then checks, in order:
///
/// 1. time-window strictness,
/// 2. urgency against [`GeneratorSettings::urgency`] (see
///    [`urgency_matches`]),
/// 3. the new-order event count against [`GeneratorSettings::num_orders`],
/// 4. that the dynamism score resolves to a bin center via
///    [`GeneratorSettings::dynamism_bins`].
///
/// The seeded rng is the only source of randomness, so running the same
/// task twice yields the same status given a deterministic generator. The
/// task holds no shared mutable state; filing an accepted [`Outcome`] into a
/// store is up to the caller.
///
/// ## Recommended When
/// - Fanning candidates out over worker threads (the task is `Send` when
///   its generator and metrics are `Send + Sync`)
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use datgen::*;
/// use rand::Rng;
///
/// #[derive(Debug)]
/// struct Candidate { urgency: f64, orders: usize, dynamism: f64 }
///
/// struct Fixed;
/// impl ScenarioGenerator for Fixed {
///     type Scenario = Candidate;
///     type Error = std::convert::Infallible;
///     fn generate<R: Rng + ?Sized>(&self, _: &mut R, _: &str) -> Result<Candidate, Self::Error> {
///         Ok(Candidate { urgency: 5.0, orders: 10, dynamism: 0.42 })
///     }
/// }
///
/// struct Read;
/// impl ScenarioMetrics<Candidate> for Read {
///     type Error = std::convert::Infallible;
///     fn check_time_window_strictness(&self, _: &Candidate) -> Result<bool, Self::Error> { Ok(true) }
///     fn measure_urgency(&self, c: &Candidate) -> Result<UrgencySummary, Self::Error> {
///         Ok(UrgencySummary { mean: c.urgency, std_dev: 0.0 })
///     }
///     fn count_events(&self, c: &Candidate, _: EventKind) -> Result<usize, Self::Error> { Ok(c.orders) }
///     fn measure_dynamism(&self, c: &Candidate, _: TimeWindow) -> Result<f64, Self::Error> { Ok(c.dynamism) }
/// }
///
/// let settings = GeneratorSettings::builder()
///     .urgency(5)
///     .num_orders(10)
///     .office_hours(TimeWindow::new(0, 480).unwrap())
///     .dynamism_bins(DynamismBins::builder().bin(DynamismRange::point(0.42), 0.4).build().unwrap())
///     .build()
///     .unwrap();
///
/// let task = GenerationTask::new(IdSeed::new(0, 123), Arc::new(settings), Arc::new(Fixed), Arc::new(Read));
/// let outcome = task.run().unwrap().accepted().unwrap();
/// assert_eq!(outcome.key, BinKey::new(0.4, 5, 1.0));
/// ```
pub struct GenerationTask<G, M> {
    id: u64,
    seed: u64,
    settings: Arc<GeneratorSettings>,
    generator: Arc<G>,
    metrics: Arc<M>,
    policy: ValidationPolicy,
}

impl<G, M> Clone for GenerationTask<G, M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            seed: self.seed,
            settings: Arc::clone(&self.settings),
            generator: Arc::clone(&self.generator),
            metrics: Arc::clone(&self.metrics),
            policy: self.policy,
        }
    }
}

impl<G, M> GenerationTask<G, M> {
    /// Creates a strict task for one candidate.
    pub const fn new(
        id_seed: IdSeed,
        settings: Arc<GeneratorSettings>,
        generator: Arc<G>,
        metrics: Arc<M>,
    ) -> Self {
        Self {
            id: id_seed.id,
            seed: id_seed.seed,
            settings,
            generator,
            metrics,
            policy: ValidationPolicy::Strict,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub const fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Lenient tasks keep going after a failed check; strict ones stop.
    fn tolerate(&self, rejection: Rejection, violations: &mut Vec<Rejection>) -> Result<(), Rejection> {
        match self.policy {
            ValidationPolicy::Strict => {
                #[cfg(feature = "tracing")]
                tracing::trace!(id = self.id, %rejection, "candidate rejected");
                Err(rejection)
            }
            ValidationPolicy::Lenient => {
                #[cfg(feature = "tracing")]
                tracing::warn!(id = self.id, %rejection, "candidate kept despite failed check");
                violations.push(rejection);
                Ok(())
            }
        }
    }
}

impl<G, M> GenerationTask<G, M>
where
    G: ScenarioGenerator,
    M: ScenarioMetrics<G::Scenario>,
{
    /// Generates and validates the candidate.
    ///
    /// # Returns
    /// - `Ok(TaskStatus::Accepted(outcome))`: the candidate fits its bin
    /// - `Ok(TaskStatus::Rejected(reason))`: the candidate missed
    /// - `Err(e)`: the generator or metrics engine failed
    ///
    /// # Errors
    /// - [`TaskError::Generation`] if the generator fails
    /// - [`TaskError::Metrics`] if a statistic cannot be computed
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(id = self.id, seed = self.seed))
    )]
    pub fn run(&self) -> Result<TaskStatus<G::Scenario>, TaskError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let scenario = self
            .generator
            .generate(&mut rng, &self.id.to_string())
            .map_err(|e| TaskError::generation(self.id, e))?;

        let mut violations = Vec::new();
        let settings = &*self.settings;

        let strict_enough = self
            .metrics
            .check_time_window_strictness(&scenario)
            .map_err(|e| TaskError::metrics(self.id, e))?;
        if !strict_enough {
            if let Err(rejection) = self.tolerate(Rejection::TimeWindows, &mut violations) {
                return Ok(TaskStatus::Rejected(rejection));
            }
        }

        let urgency = self
            .metrics
            .measure_urgency(&scenario)
            .map_err(|e| TaskError::metrics(self.id, e))?;
        if !urgency_matches(urgency, settings.urgency) {
            let rejection = Rejection::Urgency {
                expected: settings.urgency,
                mean: urgency.mean,
                std_dev: urgency.std_dev,
            };
            if let Err(rejection) = self.tolerate(rejection, &mut violations) {
                return Ok(TaskStatus::Rejected(rejection));
            }
        }

        let orders = self
            .metrics
            .count_events(&scenario, EventKind::NewOrder)
            .map_err(|e| TaskError::metrics(self.id, e))?;
        if orders != settings.num_orders {
            let rejection = Rejection::OrderCount {
                expected: settings.num_orders,
                actual: orders,
            };
            if let Err(rejection) = self.tolerate(rejection, &mut violations) {
                return Ok(TaskStatus::Rejected(rejection));
            }
        }

        let dynamism = self
            .metrics
            .measure_dynamism(&scenario, settings.office_hours)
            .map_err(|e| TaskError::metrics(self.id, e))?;
        let dynamism_bin = match settings.dynamism_bins.resolve(dynamism) {
            Some(center) => center,
            None => {
                let rejection = Rejection::Dynamism { score: dynamism };
                if let Err(rejection) = self.tolerate(rejection, &mut violations) {
                    return Ok(TaskStatus::Rejected(rejection));
                }
                LENIENT_DYNAMISM_BIN
            }
        };

        Ok(TaskStatus::Accepted(Outcome {
            key: BinKey::new(dynamism_bin, settings.urgency, settings.scale),
            scenario,
            id: self.id,
            seed: self.seed,
            dynamism_bin,
            dynamism,
            violations,
        }))
    }
}
