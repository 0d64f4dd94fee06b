use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::order::Coord;

/// The resolved coordinates of one bin.
///
/// `dynamism` is a registered bin center (see [`DynamismBins`]), never a raw
/// score. Float coordinates compare bit-exactly, like [`Coord`].
///
/// [`DynamismBins`]: crate::DynamismBins
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinKey {
    pub dynamism: f64,
    pub urgency: i64,
    pub scale: f64,
}

impl BinKey {
    #[must_use]
    pub const fn new(dynamism: f64, urgency: i64, scale: f64) -> Self {
        Self {
            dynamism,
            urgency,
            scale,
        }
    }

    fn as_tuple(&self) -> (Coord, i64, Coord) {
        (Coord(self.dynamism), self.urgency, Coord(self.scale))
    }
}

impl PartialEq for BinKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_tuple() == other.as_tuple()
    }
}

impl Eq for BinKey {}

impl PartialOrd for BinKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BinKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_tuple().cmp(&other.as_tuple())
    }
}

impl Hash for BinKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_tuple().hash(state);
    }
}

impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.dynamism, self.urgency, self.scale)
    }
}
