use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// A total order over stored values.
///
/// Every bin of a [`BinnedStore`] keeps its values sorted by one
/// `Comparator`. Two values the comparator reports as [`Ordering::Equal`]
/// are the same entry as far as the bin is concerned, so the order must be
/// total and consistent for the whole lifetime of the store.
///
/// Closures of the shape `Fn(&T, &T) -> Ordering` implement this trait, which
/// makes it easy to inject an ordering without defining a type:
///
/// ```
/// use datgen::BinnedStore;
///
/// // Longest names first, ties broken alphabetically.
/// let store = BinnedStore::ordered_by(|a: &String, b: &String| {
///     b.len().cmp(&a.len()).then_with(|| a.cmp(b))
/// });
/// store.put(0.5, 1, 1.0, "ab".to_string()).unwrap();
/// store.put(0.5, 1, 1.0, "abc".to_string()).unwrap();
/// assert_eq!(store.get(0.5, 1, 1.0), ["abc", "ab"]);
/// ```
///
/// [`BinnedStore`]: crate::BinnedStore
pub trait Comparator<T: ?Sized> {
    /// Compares two values.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// The natural ([`Ord`]) order of `T`.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// An `f64` bin coordinate with bit-exact equality and a total order.
///
/// Dynamism and scale are continuous values, but the store only ever uses
/// them as exact lookup keys: two coordinates address the same bin only if
/// their bit patterns match. Ordering follows [`f64::total_cmp`], which
/// agrees with that equality (`-0.0` and `0.0` are distinct keys, and
/// `-0.0` sorts first).
#[derive(Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Coord(pub f64);

impl Coord {
    /// Returns the wrapped value.
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for Coord {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl PartialEq for Coord {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Coord {}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Coord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn coords_compare_by_bits() {
        assert_eq!(Coord(0.4), Coord(0.4));
        assert_ne!(Coord(0.0), Coord(-0.0));
        assert_ne!(Coord(0.1 + 0.2), Coord(0.3));
        assert_eq!(Coord(f64::NAN), Coord(f64::NAN));
    }

    #[test]
    fn coords_sort_ascending() {
        let set: BTreeSet<Coord> = [0.5, -1.0, 0.25, 0.0, -0.0]
            .into_iter()
            .map(Coord)
            .collect();
        let sorted: Vec<f64> = set.into_iter().map(Coord::get).collect();
        assert_eq!(sorted.len(), 5);
        assert_eq!(sorted[0], -1.0);
        assert!(sorted[1].is_sign_negative() && sorted[1] == 0.0);
        assert!(sorted[2].is_sign_positive() && sorted[2] == 0.0);
        assert_eq!(&sorted[3..], &[0.25, 0.5]);
    }

    #[test]
    fn closures_are_comparators() {
        let reverse = |a: &u32, b: &u32| b.cmp(a);
        assert_eq!(reverse.compare(&1, &2), Ordering::Greater);
        assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
    }
}
