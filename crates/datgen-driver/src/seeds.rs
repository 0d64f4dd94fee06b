use rand::{RngCore, SeedableRng, rngs::StdRng};
use std::collections::HashSet;

/// Deterministic seeds for every bin group of a run.
///
/// The master seed fixes one group seed per group up front, and each group
/// seed drives its own [`StdRng`]. A seed already spent by an earlier group
/// is skipped, so no two committed candidates of a run share a seed.
pub struct SeedSource {
    group_seeds: Vec<u64>,
    used: HashSet<u64>,
}

impl SeedSource {
    pub fn new(master_seed: u64, groups: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(master_seed);
        Self {
            group_seeds: (0..groups).map(|_| rng.next_u64()).collect(),
            used: HashSet::new(),
        }
    }

    /// Starts the seed stream for `group`.
    ///
    /// # Panics
    ///
    /// If `group` is not below the group count passed to [`SeedSource::new`].
    pub fn group(&self, group: usize) -> GroupSeeds<'_> {
        GroupSeeds {
            rng: StdRng::seed_from_u64(self.group_seeds[group]),
            used: &self.used,
            drawn: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Marks seeds as spent for every later group.
    pub fn retire(&mut self, seeds: impl IntoIterator<Item = u64>) {
        self.used.extend(seeds);
    }

    pub fn used(&self) -> usize {
        self.used.len()
    }
}

/// The seed stream of one group.
///
/// The n-th seed depends only on the group seed and the seeds retired before
/// the stream started, never on how far ahead the driver dispatched.
pub struct GroupSeeds<'a> {
    rng: StdRng,
    used: &'a HashSet<u64>,
    drawn: Vec<u64>,
    seen: HashSet<u64>,
}

impl GroupSeeds<'_> {
    pub fn next_seed(&mut self) -> u64 {
        loop {
            let seed = self.rng.next_u64();
            if !self.used.contains(&seed) && self.seen.insert(seed) {
                self.drawn.push(seed);
                return seed;
            }
        }
    }

    /// Ends the stream, keeping only the first `n` seeds drawn.
    pub fn into_committed(mut self, n: usize) -> Vec<u64> {
        self.drawn.truncate(n);
        self.drawn
    }
}
