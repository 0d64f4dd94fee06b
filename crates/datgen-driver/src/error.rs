//! Error types for a driver run.
//!
//! Rejected candidates never show up here: they are counted in
//! [`DriverStats`] and the driver simply draws another seed. An [`Error`]
//! ends the run.
//!
//! ## Error Cases
//! - `Config`: the [`DriverConfig`] failed validation.
//! - `Store`: the binned store refused an insert for a reason other than a
//!   duplicate.
//! - `Task`: the generator or metrics engine failed; retrying will not help.
//! - `BinUnreachable`: a bin group used up its attempts before every bin was
//!   filled.
//! - `Spawn`: the OS refused to start a worker thread.
//! - `ChannelError`: a worker channel closed unexpectedly.
//! - `WorkerPanicked`: a worker thread panicked.
//!
//! [`DriverStats`]: crate::DriverStats
//! [`DriverConfig`]: crate::DriverConfig

use datgen::{BinKey, TaskError};

use crate::config::ConfigError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid driver config: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] datgen::Error),

    #[error(transparent)]
    Task(#[from] TaskError),

    /// Attempts for the group holding `key` ran out with `key` still short of
    /// its quota.
    #[error("bin {key} still below quota after {attempts} attempts")]
    BinUnreachable { key: BinKey, attempts: u64 },

    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// Internal channel send/receive failure.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}
