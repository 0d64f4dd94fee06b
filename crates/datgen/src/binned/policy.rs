/// What [`BinnedStore::put`] does with a value that is already stored.
///
/// Checking costs a lookup under the write lock on every insert, which adds
/// up for large corpora, so the default is [`DuplicatePolicy::Allow`].
///
/// [`BinnedStore::put`]: crate::BinnedStore::put
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DuplicatePolicy {
    /// Never fail. A comparator-equal value already in the bin is kept and
    /// the new one is ignored.
    #[default]
    Allow,
    /// Fail if a comparator-equal value already occupies the target bin.
    RejectInBin,
    /// Fail if an equal value is stored anywhere in the store.
    RejectGlobal,
}
