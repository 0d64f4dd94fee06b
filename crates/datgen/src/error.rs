use crate::binned::BinKey;

/// A result type defaulting to the store [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants a [`BinnedStore`] can emit.
///
/// Reads never fail. Only [`BinnedStore::put`] returns this error, either
/// because a [`DuplicatePolicy`] refused the value or because the std lock
/// was poisoned.
///
/// [`BinnedStore`]: crate::BinnedStore
/// [`BinnedStore::put`]: crate::BinnedStore::put
/// [`DuplicatePolicy`]: crate::DuplicatePolicy
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The value is already stored and the store rejects duplicates.
    ///
    /// `key` is the bin the caller tried to insert into; `value` is the
    /// `Debug` rendering of the offending value.
    #[error("at {key} value {value} already exists")]
    DuplicateValue { key: BinKey, value: String },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the write lock. When
    /// the `parking-lot` feature is enabled, locks do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("store lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use crate::sync::{PoisonError, RwLockWriteGuard};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<RwLockWriteGuard<'_, T>>> for Error {
    fn from(_: PoisonError<RwLockWriteGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
