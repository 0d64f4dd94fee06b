use core::{fmt, hash::Hash};
use crossbeam_channel::{Receiver, Sender, unbounded};
use datgen::{
    BinKey, BinnedStore, GenerationTask, GeneratorSettings, IdSeed, Outcome, ScenarioGenerator,
    ScenarioMetrics, TaskStatus,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::DriverConfig,
    error::{Error, Result},
    pool::{Completion, WorkRequest, WorkerPool},
    seeds::SeedSource,
    stats::{Dataset, DriverStats, GroupStats},
};

/// Packs a group index and an attempt number into a task id.
pub const fn task_id(group: usize, attempt: u32) -> u64 {
    ((group as u64) << 32) | attempt as u64
}

/// Fills a [`BinnedStore`] by rejection sampling on a worker pool.
///
/// Bin groups are processed one after another in config order. Within a
/// group, tasks are dispatched round-robin with at most
/// [`DriverConfig::window`] outstanding, and completions are committed
/// strictly in id order. Whether a group is done depends only on the
/// committed prefix, so the resulting store and stats are identical for any
/// worker count.
///
/// Each group gets its own generator, built from its settings when the
/// driver is created.
pub struct Driver<G, M> {
    config: DriverConfig,
    generators: Vec<Arc<G>>,
    metrics: Arc<M>,
}

impl<G, M> Driver<G, M>
where
    G: ScenarioGenerator + Send + Sync + 'static,
    G::Scenario: Clone + Eq + Hash + Ord + fmt::Debug + Send + 'static,
    M: ScenarioMetrics<G::Scenario> + Send + Sync + 'static,
{
    /// Creates a driver, calling `make_generator` once per bin group.
    pub fn new(
        config: DriverConfig,
        metrics: M,
        make_generator: impl Fn(&GeneratorSettings) -> G,
    ) -> Self {
        let generators = config
            .bins
            .iter()
            .map(|settings| Arc::new(make_generator(settings)))
            .collect();
        Self {
            config,
            generators,
            metrics: Arc::new(metrics),
        }
    }

    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Runs every bin group to its quota.
    ///
    /// # Errors
    /// - [`Error::Config`] if the config fails [`DriverConfig::validate`]
    /// - [`Error::BinUnreachable`] if a group runs out of attempts
    /// - [`Error::Task`] if the generator or metrics engine fails
    /// - [`Error::Store`] if the store refuses an insert
    /// - [`Error::Spawn`], [`Error::ChannelError`] or
    ///   [`Error::WorkerPanicked`] if the pool breaks down
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self),
            fields(groups = self.config.bins.len(), workers = self.config.num_workers)
        )
    )]
    pub fn run(&self) -> Result<Dataset<G::Scenario>> {
        self.config.validate()?;
        let store = BinnedStore::natural_order().with_duplicate_policy(self.config.duplicates);
        let pool = WorkerPool::spawn(self.config.num_workers, self.config.in_flight_per_worker)?;
        let (results_tx, results_rx) = unbounded();
        let mut seeds = SeedSource::new(self.config.master_seed, self.config.bins.len());
        let mut stats = DriverStats::default();

        for group in 0..self.config.bins.len() {
            let run = GroupRun {
                driver: self,
                group,
                pool: &pool,
                results_tx: &results_tx,
                results_rx: &results_rx,
                store: &store,
            };
            let (group_stats, committed) = run.fill(&mut seeds)?;

            #[cfg(feature = "tracing")]
            tracing::info!("Group {group} done: {group_stats}");

            seeds.retire(committed);
            stats.groups.push(group_stats);
        }

        pool.shutdown()?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            size = store.size(),
            attempts = stats.attempts(),
            "Dataset complete"
        );

        Ok(Dataset { store, stats })
    }
}

/// The state shared by the rounds of one group.
struct GroupRun<'a, G: ScenarioGenerator, M> {
    driver: &'a Driver<G, M>,
    group: usize,
    pool: &'a WorkerPool<G, M>,
    results_tx: &'a Sender<Completion<G::Scenario>>,
    results_rx: &'a Receiver<Completion<G::Scenario>>,
    store: &'a BinnedStore<G::Scenario>,
}

impl<G, M> GroupRun<'_, G, M>
where
    G: ScenarioGenerator,
    G::Scenario: Clone + Eq + Hash + Ord + fmt::Debug,
    M: ScenarioMetrics<G::Scenario>,
{
    fn settings(&self) -> &GeneratorSettings {
        &self.driver.config.bins[self.group]
    }

    fn targets(&self) -> BTreeSet<BinKey> {
        let settings = self.settings();
        settings
            .dynamism_bins
            .centers()
            .into_iter()
            .map(|center| BinKey::new(center, settings.urgency, settings.scale))
            .collect()
    }

    fn bin_len(&self, key: &BinKey) -> usize {
        self.store.bin_len(key.dynamism, key.urgency, key.scale)
    }

    fn first_unfilled(&self, targets: &BTreeSet<BinKey>) -> Option<BinKey> {
        let quota = self.driver.config.quota_per_bin;
        targets.iter().find(|key| self.bin_len(key) < quota).copied()
    }

    /// Dispatches and commits until every target bin holds its quota.
    /// Returns the group's stats and the seeds of its committed attempts.
    fn fill(&self, seeds: &mut SeedSource) -> Result<(GroupStats, Vec<u64>)> {
        let config = &self.driver.config;
        let settings = Arc::new(self.settings().clone());
        let targets = self.targets();
        let mut stats = GroupStats::new(settings.urgency, settings.scale);
        let mut stream = seeds.group(self.group);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Filling group {} (urgency {}, scale {}, {} bins)",
            self.group,
            settings.urgency,
            settings.scale,
            targets.len()
        );

        let window = config.window();
        let mut dispatched: u32 = 0;
        let mut committed: u32 = 0;
        let mut in_flight = 0_usize;
        let mut pending = BTreeMap::new();
        let mut unfilled = self.first_unfilled(&targets);

        while let Some(key) = unfilled {
            while in_flight < window && dispatched < config.max_attempts_per_group {
                let id = IdSeed::new(task_id(self.group, dispatched), stream.next_seed());
                let task = GenerationTask::new(
                    id,
                    Arc::clone(&settings),
                    Arc::clone(&self.driver.generators[self.group]),
                    Arc::clone(&self.driver.metrics),
                )
                .with_policy(config.policy);
                self.pool.send_to_next_worker(WorkRequest::Generate {
                    task,
                    response: self.results_tx.clone(),
                })?;
                dispatched += 1;
                in_flight += 1;
            }

            if in_flight == 0 {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    "Bin {key} unreachable after {committed} attempts ({} in bin)",
                    self.bin_len(&key)
                );
                return Err(Error::BinUnreachable {
                    key,
                    attempts: u64::from(committed),
                });
            }

            let completion = self.recv()?;
            in_flight -= 1;
            pending.insert(completion.id, completion.result);

            while let Some(result) = pending.remove(&task_id(self.group, committed)) {
                committed += 1;
                self.commit(result?, &mut stats)?;
                unfilled = self.first_unfilled(&targets);
                if unfilled.is_none() {
                    break;
                }
            }
        }

        // Results past the committed prefix are dropped.
        while in_flight > 0 {
            self.recv()?;
            in_flight -= 1;
        }

        stats.attempts = u64::from(committed);
        Ok((stats, stream.into_committed(committed as usize)))
    }

    fn recv(&self) -> Result<Completion<G::Scenario>> {
        self.results_rx.recv().map_err(|_| Error::ChannelError {
            context: "result channel disconnected".to_string(),
        })
    }

    fn commit(&self, status: TaskStatus<G::Scenario>, stats: &mut GroupStats) -> Result<()> {
        match status {
            TaskStatus::Rejected(rejection) => {
                stats.rejections.record(&rejection);
                Ok(())
            }
            TaskStatus::Accepted(outcome) => {
                stats.accepted += 1;
                stats.violations += outcome.violations.len() as u64;
                self.store_outcome(outcome, stats)
            }
        }
    }

    fn store_outcome(&self, outcome: Outcome<G::Scenario>, stats: &mut GroupStats) -> Result<()> {
        let key = outcome.key;
        if self.bin_len(&key) >= self.driver.config.quota_per_bin {
            #[cfg(feature = "tracing")]
            tracing::trace!("Discarding scenario {} for full bin {key}", outcome.id);
            stats.discarded += 1;
            return Ok(());
        }

        match self
            .store
            .put(key.dynamism, key.urgency, key.scale, outcome.scenario)
        {
            Ok(true) => {
                *stats.stored.entry(key).or_default() += 1;
                #[cfg(feature = "tracing")]
                if self.bin_len(&key) == self.driver.config.quota_per_bin {
                    tracing::debug!("Bin {key} full after scenario {}", outcome.id);
                }
                Ok(())
            }
            Ok(false) | Err(datgen::Error::DuplicateValue { .. }) => {
                stats.duplicates += 1;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
