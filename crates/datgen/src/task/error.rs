type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// A [`GenerationTask`] failed to produce or measure its candidate.
///
/// This is distinct from a rejected candidate: rejections are ordinary
/// [`TaskStatus::Rejected`] values and a new seed may succeed, whereas this
/// error points at a broken generator or configuration and retrying will not
/// help.
///
/// [`GenerationTask`]: crate::GenerationTask
/// [`TaskStatus::Rejected`]: crate::TaskStatus::Rejected
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TaskError {
    /// The scenario generator returned an error.
    #[error("generator failed for scenario {id}: {source}")]
    Generation { id: u64, source: BoxError },

    /// A metric could not be computed for the generated scenario.
    #[error("metrics failed for scenario {id}: {source}")]
    Metrics { id: u64, source: BoxError },
}

impl TaskError {
    pub(crate) fn generation<E>(id: u64, source: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Generation {
            id,
            source: Box::new(source),
        }
    }

    pub(crate) fn metrics<E>(id: u64, source: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Metrics {
            id,
            source: Box::new(source),
        }
    }

    /// Returns the id of the task that failed.
    pub const fn id(&self) -> u64 {
        match self {
            Self::Generation { id, .. } | Self::Metrics { id, .. } => *id,
        }
    }
}
