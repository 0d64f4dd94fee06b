//! Thread pool that runs generation tasks.
//!
//! This module defines the [`WorkerPool`] struct, which owns a fixed set of OS
//! threads, each running [`worker_loop`] over its own bounded
//! [`crossbeam_channel`]. Work is distributed round-robin and shutdown is
//! acknowledged by every worker before its thread is joined.

use core::time::Duration;
use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use datgen::{ScenarioGenerator, ScenarioMetrics};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread::{self, JoinHandle},
};

use crate::{
    config::ConfigError,
    error::{Error, Result},
    pool::{WorkRequest, worker_loop},
};

/// How long [`WorkerPool::shutdown`] waits for each acknowledgement.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// A fixed pool of worker threads processing [`WorkRequest`]s.
///
/// Dropping the pool without calling [`WorkerPool::shutdown`] closes every
/// channel and joins the threads once their queues are drained.
pub struct WorkerPool<G: ScenarioGenerator, M> {
    workers: Vec<Sender<WorkRequest<G, M>>>,
    handles: Vec<JoinHandle<()>>,
    next_worker: AtomicUsize,
}

impl<G, M> WorkerPool<G, M>
where
    G: ScenarioGenerator + Send + Sync + 'static,
    G::Scenario: Send + 'static,
    M: ScenarioMetrics<G::Scenario> + Send + Sync + 'static,
{
    /// Starts `num_workers` threads, each accepting up to `capacity` queued
    /// requests.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `num_workers` is zero
    /// - [`Error::Spawn`] if a thread cannot be started. Threads already
    ///   running are stopped before returning.
    pub fn spawn(num_workers: usize, capacity: usize) -> Result<Self> {
        if num_workers == 0 {
            return Err(ConfigError::Zero("num_workers").into());
        }
        let mut pool = Self {
            workers: Vec::with_capacity(num_workers),
            handles: Vec::with_capacity(num_workers),
            next_worker: AtomicUsize::new(0),
        };

        for worker_id in 0..num_workers {
            let (tx, rx) = bounded(capacity);
            let handle = thread::Builder::new()
                .name(format!("datgen-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, rx))?;
            pool.workers.push(tx);
            pool.handles.push(handle);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Started {num_workers} workers");

        Ok(pool)
    }
}

impl<G: ScenarioGenerator, M> WorkerPool<G, M> {
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Returns the index of the next worker to receive work (round-robin).
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Sends a [`WorkRequest`] to the next worker, blocking while its queue is
    /// full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelError`] if the worker's channel is closed.
    pub fn send_to_next_worker(&self, request: WorkRequest<G, M>) -> Result<()> {
        let worker_idx = self.next_worker_index();
        self.workers[worker_idx]
            .send(request)
            .map_err(|_| Error::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            })
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Sends a [`WorkRequest::Shutdown`] to each worker, behind any work
    ///   already queued.
    /// - Waits up to 3 seconds per worker for the acknowledgement.
    /// - Joins every thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerPanicked`] for the first worker whose thread
    /// panicked.
    pub fn shutdown(mut self) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying all workers to shut down");

        let mut acks = Vec::with_capacity(self.workers.len());
        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = bounded(1);
            if let Err(_e) = worker.send(WorkRequest::Shutdown { response: tx }) {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to send shutdown to worker {i}: {_e}");
            } else {
                acks.push((i, rx));
            }
        }

        for (_i, rx) in acks {
            match rx.recv_timeout(SHUTDOWN_TIMEOUT) {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {_i} shutdown acknowledged");
                }
                Err(RecvTimeoutError::Timeout) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {_i} shutdown timed out");
                }
                Err(RecvTimeoutError::Disconnected) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {_i} exited without acknowledging");
                }
            }
        }

        let result = self.join_all();

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker pool shutdown complete");

        result
    }

    fn join_all(&mut self) -> Result<()> {
        self.workers.clear();
        let mut result = Ok(());
        for (worker, handle) in self.handles.drain(..).enumerate() {
            if handle.join().is_err() && result.is_ok() {
                result = Err(Error::WorkerPanicked { worker });
            }
        }
        result
    }
}

impl<G: ScenarioGenerator, M> Drop for WorkerPool<G, M> {
    fn drop(&mut self) {
        if let Err(_e) = self.join_all() {
            #[cfg(feature = "tracing")]
            tracing::error!("Worker pool dropped: {_e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Completion;
    use datgen::{
        DynamismBins, DynamismRange, EventKind, GenerationTask, GeneratorSettings, IdSeed,
        TimeWindow, UrgencySummary,
    };
    use rand::Rng;
    use std::{collections::HashSet, convert::Infallible, sync::Arc};

    struct Seeded;

    impl ScenarioGenerator for Seeded {
        type Scenario = u64;
        type Error = Infallible;

        fn generate<R: Rng + ?Sized>(&self, rng: &mut R, _id: &str) -> Result<u64, Infallible> {
            Ok(rng.next_u64())
        }
    }

    struct Perfect;

    impl ScenarioMetrics<u64> for Perfect {
        type Error = Infallible;

        fn check_time_window_strictness(&self, _: &u64) -> Result<bool, Infallible> {
            Ok(true)
        }

        fn measure_urgency(&self, _: &u64) -> Result<UrgencySummary, Infallible> {
            Ok(UrgencySummary {
                mean: 1.0,
                std_dev: 0.0,
            })
        }

        fn count_events(&self, _: &u64, _: EventKind) -> Result<usize, Infallible> {
            Ok(1)
        }

        fn measure_dynamism(&self, _: &u64, _: TimeWindow) -> Result<f64, Infallible> {
            Ok(0.5)
        }
    }

    fn settings() -> Arc<GeneratorSettings> {
        Arc::new(
            GeneratorSettings::builder()
                .urgency(1)
                .num_orders(1)
                .office_hours(TimeWindow::new(0, 10).unwrap())
                .dynamism_bins(
                    DynamismBins::builder()
                        .bin(DynamismRange::point(0.5), 0.5)
                        .build()
                        .unwrap(),
                )
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn round_robin_wraps() {
        let pool = WorkerPool::<Seeded, Perfect>::spawn(3, 1).unwrap();
        let order: Vec<_> = (0..7).map(|_| pool.next_worker_index()).collect();
        assert_eq!(order, [0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(pool.len(), 3);
        pool.shutdown().unwrap();
    }

    #[test]
    fn every_request_completes_once() {
        const TASKS: u64 = 200;

        let pool = WorkerPool::spawn(4, 2).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let settings = settings();
        let generator = Arc::new(Seeded);
        let metrics = Arc::new(Perfect);

        let handle = thread::spawn(move || {
            let mut seen = HashSet::new();
            for _ in 0..TASKS {
                let completion: Completion<u64> = rx.recv().unwrap();
                assert!(completion.result.unwrap().is_accepted());
                assert!(seen.insert(completion.id));
            }
            seen
        });

        for id in 0..TASKS {
            let task = GenerationTask::new(
                IdSeed::new(id, id),
                Arc::clone(&settings),
                Arc::clone(&generator),
                Arc::clone(&metrics),
            );
            pool.send_to_next_worker(WorkRequest::Generate {
                task,
                response: tx.clone(),
            })
            .unwrap();
        }

        let seen = handle.join().unwrap();
        assert_eq!(seen.len() as u64, TASKS);
        pool.shutdown().unwrap();
    }

    #[test]
    fn empty_pool_is_refused() {
        let err = WorkerPool::<Seeded, Perfect>::spawn(0, 1).err().unwrap();
        assert!(matches!(err, Error::Config(ConfigError::Zero("num_workers"))));
    }

    #[test]
    fn drop_joins_workers() {
        let pool = WorkerPool::<Seeded, Perfect>::spawn(2, 1).unwrap();
        drop(pool);
    }
}
