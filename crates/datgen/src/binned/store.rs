use core::fmt;
use core::hash::Hash;
use std::collections::{BTreeMap, HashSet};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    binned::{BinKey, DuplicatePolicy, bin::SortedBin},
    error::{Error, Result},
    order::{Comparator, Coord, NaturalOrder},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

type Cells<T> = BTreeMap<(i64, Coord), SortedBin<T>>;

struct Inner<T> {
    data: BTreeMap<Coord, Cells<T>>,
    values: HashSet<T>,
}

impl<T> Inner<T> {
    fn bin(&self, dynamism: f64, urgency: i64, scale: f64) -> Option<&SortedBin<T>> {
        self.data
            .get(&Coord(dynamism))
            .and_then(|cells| cells.get(&(urgency, Coord(scale))))
    }

    fn bins(&self) -> impl Iterator<Item = (BinKey, &SortedBin<T>)> {
        self.data.iter().flat_map(|(dynamism, cells)| {
            cells.iter().map(move |((urgency, scale), bin)| {
                (BinKey::new(dynamism.get(), *urgency, scale.get()), bin)
            })
        })
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.data
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(SortedBin::iter)
    }
}

/// A thread-safe store that classifies values into (dynamism, urgency,
/// scale) bins.
///
/// Each bin keeps its values in the order of a [`Comparator`] (the natural
/// order by default), without comparator-equal duplicates. Alongside the
/// bins, the store tracks every distinct value it has seen so
/// [`BinnedStore::size`] counts values once even when they were filed under
/// several keys.
///
/// All mutation goes through [`BinnedStore::put`], which creates missing key
/// levels and inserts under a single write lock covering the whole
/// structure. Readers share a read lock, so a key path only becomes visible
/// once its bin exists. Nothing is ever removed.
///
/// Iteration (and therefore equality and `Debug`) walks ascending dynamism,
/// then ascending (urgency, scale), then bin order. That sequence is the
/// output order of a persisted corpus.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Deterministic iteration regardless of insertion order
///
/// # Example
/// ```
/// use datgen::BinnedStore;
///
/// let store = BinnedStore::natural_order();
/// store.put(0.4, 5, 1.0, 7_u32).unwrap();
/// store.put(0.4, 5, 1.0, 3_u32).unwrap();
/// store.put(0.2, 5, 1.0, 7_u32).unwrap();
///
/// assert_eq!(store.get(0.4, 5, 1.0), [3, 7]);
/// assert_eq!(store.size(), 2);
/// assert_eq!(store.to_vec(), [7, 3, 7]);
/// ```
pub struct BinnedStore<T, C = NaturalOrder> {
    comparator: C,
    duplicates: DuplicatePolicy,
    inner: RwLock<Inner<T>>,
}

impl<T: Ord> BinnedStore<T, NaturalOrder> {
    /// Creates an empty store ordering each bin by `T`'s [`Ord`].
    #[must_use]
    pub fn natural_order() -> Self {
        Self::ordered_by(NaturalOrder)
    }
}

impl<T: Ord> Default for BinnedStore<T, NaturalOrder> {
    fn default() -> Self {
        Self::natural_order()
    }
}

impl<T, C> BinnedStore<T, C> {
    /// Creates an empty store ordering each bin by `comparator`.
    pub fn ordered_by(comparator: C) -> Self {
        Self {
            comparator,
            duplicates: DuplicatePolicy::default(),
            inner: RwLock::new(Inner {
                data: BTreeMap::new(),
                values: HashSet::new(),
            }),
        }
    }

    /// Sets how [`BinnedStore::put`] treats values that are already stored.
    #[must_use]
    pub fn with_duplicate_policy(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Returns the active duplicate policy.
    pub const fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    /// Returns the number of values in one bin, `0` if the bin does not
    /// exist.
    pub fn bin_len(&self, dynamism: f64, urgency: i64, scale: f64) -> usize {
        self.read()
            .bin(dynamism, urgency, scale)
            .map_or(0, SortedBin::len)
    }

    /// Returns the number of distinct values inserted so far, across all
    /// bins.
    pub fn size(&self) -> usize {
        self.read().values.len()
    }

    /// Returns `true` if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.read().values.is_empty()
    }

    /// Returns the keys of all existing bins in iteration order.
    pub fn keys(&self) -> Vec<BinKey> {
        self.read().bins().map(|(key, _)| key).collect()
    }

    /// Calls `f` with every value and its bin, in iteration order.
    ///
    /// The read lock is held for the whole walk; `f` must not call
    /// [`BinnedStore::put`] on the same store.
    pub fn for_each(&self, mut f: impl FnMut(&BinKey, &T)) {
        let inner = self.read();
        for (key, bin) in inner.bins() {
            for value in bin.iter() {
                f(&key, value);
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<T>> {
        #[cfg(feature = "parking-lot")]
        {
            self.inner.read()
        }
        // Puts are all-or-nothing on the structure, so a poisoned lock still
        // guards a consistent store.
        #[cfg(not(feature = "parking-lot"))]
        {
            self.inner
                .read()
                .unwrap_or_else(crate::sync::PoisonError::into_inner)
        }
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner<T>>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.inner.write())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.inner.write()?)
        }
    }

    fn into_inner(self) -> Inner<T> {
        #[cfg(feature = "parking-lot")]
        {
            self.inner.into_inner()
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            self.inner
                .into_inner()
                .unwrap_or_else(crate::sync::PoisonError::into_inner)
        }
    }
}

impl<T, C> BinnedStore<T, C>
where
    T: Clone + Eq + Hash + fmt::Debug,
    C: Comparator<T>,
{
    /// Files `value` under the exact key (`dynamism`, `urgency`, `scale`).
    ///
    /// The coordinates must be resolved bin coordinates, not raw
    /// measurements: floats are matched bit for bit.
    ///
    /// Missing key levels are created on first use. The bin insert and the
    /// update of the distinct-value tracker happen under the same write lock.
    ///
    /// # Returns
    /// - `Ok(true)`: the bin gained `value`
    /// - `Ok(false)`: a comparator-equal value already sat in the bin, so the
    ///   bin is unchanged (the value still counts towards
    ///   [`BinnedStore::size`])
    ///
    /// # Errors
    /// - [`Error::DuplicateValue`] if the [`DuplicatePolicy`] rejects the
    ///   value
    /// - `Error::LockPoisoned` if another thread panicked mid-insert (std
    ///   lock only)
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, value)))]
    pub fn put(&self, dynamism: f64, urgency: i64, scale: f64, value: T) -> Result<bool> {
        let mut guard = self.write()?;
        let inner = &mut *guard;

        let duplicate = match self.duplicates {
            DuplicatePolicy::Allow => false,
            DuplicatePolicy::RejectInBin => inner
                .bin(dynamism, urgency, scale)
                .is_some_and(|bin| bin.contains(&value, &self.comparator)),
            DuplicatePolicy::RejectGlobal => inner.values.contains(&value),
        };
        if duplicate {
            return Err(Self::cold_duplicate(dynamism, urgency, scale, &value));
        }

        let added = inner
            .data
            .entry(Coord(dynamism))
            .or_default()
            .entry((urgency, Coord(scale)))
            .or_default()
            .insert(value.clone(), &self.comparator);
        inner.values.insert(value);
        Ok(added)
    }

    #[cold]
    #[inline(never)]
    fn cold_duplicate(dynamism: f64, urgency: i64, scale: f64, value: &T) -> Error {
        Error::DuplicateValue {
            key: BinKey::new(dynamism, urgency, scale),
            value: format!("{value:?}"),
        }
    }
}

impl<T, C: Comparator<T>> BinnedStore<T, C> {
    /// Returns `true` if the bin at the exact key holds a value
    /// comparator-equal to `value`. Missing key levels yield `false`.
    pub fn contains_entry(&self, dynamism: f64, urgency: i64, scale: f64, value: &T) -> bool {
        self.read()
            .bin(dynamism, urgency, scale)
            .is_some_and(|bin| bin.contains(value, &self.comparator))
    }
}

impl<T: Clone, C> BinnedStore<T, C> {
    /// Returns the values of one bin in bin order, or an empty `Vec` if the
    /// key path does not exist.
    ///
    /// The result is a copy taken under the read lock; values put afterwards
    /// are not reflected.
    pub fn get(&self, dynamism: f64, urgency: i64, scale: f64) -> Vec<T> {
        self.read()
            .bin(dynamism, urgency, scale)
            .map(|bin| bin.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns every bin with its values, in iteration order.
    pub fn bins(&self) -> Vec<(BinKey, Vec<T>)> {
        self.read()
            .bins()
            .map(|(key, bin)| (key, bin.iter().cloned().collect()))
            .collect()
    }

    /// Returns all values in iteration order.
    pub fn to_vec(&self) -> Vec<T> {
        self.read().values().cloned().collect()
    }
}

impl<T, C> IntoIterator for BinnedStore<T, C> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_inner()
            .data
            .into_values()
            .flat_map(BTreeMap::into_values)
            .flat_map(SortedBin::into_vec)
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl<T: PartialEq, C, D> PartialEq<BinnedStore<T, D>> for BinnedStore<T, C> {
    /// Two stores are equal iff their iteration sequences are element-wise
    /// equal. Keys, comparators and duplicate policies are not compared.
    fn eq(&self, other: &BinnedStore<T, D>) -> bool {
        let this: *const () = (self as *const Self).cast();
        let that: *const () = (other as *const BinnedStore<T, D>).cast();
        if this == that {
            return true;
        }
        // Lock in address order so concurrent `a == b` and `b == a` cannot
        // interleave with queued writers into a deadlock.
        let (lhs, rhs) = if this < that {
            let lhs = self.read();
            (lhs, other.read())
        } else {
            let rhs = other.read();
            (self.read(), rhs)
        };
        lhs.values().eq(rhs.values())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for BinnedStore<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.read().values()).finish()
    }
}
