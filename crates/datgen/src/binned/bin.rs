use crate::order::Comparator;

/// The values of a single bin, kept sorted by the store's comparator.
///
/// The comparator is owned by the store and passed into every call.
pub(crate) struct SortedBin<T> {
    values: Vec<T>,
}

impl<T> Default for SortedBin<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T> SortedBin<T> {
    /// Inserts `value` at its sorted position. Returns `false`, dropping
    /// `value`, if a comparator-equal value is already present.
    pub(crate) fn insert<C: Comparator<T>>(&mut self, value: T, comparator: &C) -> bool {
        match self
            .values
            .binary_search_by(|probe| comparator.compare(probe, &value))
        {
            Ok(_) => false,
            Err(pos) => {
                self.values.insert(pos, value);
                true
            }
        }
    }

    pub(crate) fn contains<C: Comparator<T>>(&self, value: &T, comparator: &C) -> bool {
        self.values
            .binary_search_by(|probe| comparator.compare(probe, value))
            .is_ok()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn iter(&self) -> core::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        self.values
    }
}
