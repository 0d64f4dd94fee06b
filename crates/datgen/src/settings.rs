use core::fmt;

/// A half-open time interval `[begin, end)` in scenario time units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    pub begin: i64,
    pub end: i64,
}

impl TimeWindow {
    /// Creates a window, or `None` if `end < begin`.
    #[must_use]
    pub const fn new(begin: i64, end: i64) -> Option<Self> {
        if end < begin {
            None
        } else {
            Some(Self { begin, end })
        }
    }

    #[must_use]
    pub const fn length(&self) -> u64 {
        self.end.abs_diff(self.begin)
    }

    #[must_use]
    pub const fn contains(&self, t: i64) -> bool {
        self.begin <= t && t < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// An interval of raw dynamism scores with independently open or closed
/// ends.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamismRange {
    pub lower: f64,
    pub lower_inclusive: bool,
    pub upper: f64,
    pub upper_inclusive: bool,
}

impl DynamismRange {
    /// `[lower, upper)`
    #[must_use]
    pub const fn half_open(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            lower_inclusive: true,
            upper,
            upper_inclusive: false,
        }
    }

    /// `[lower, upper]`
    #[must_use]
    pub const fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            lower_inclusive: true,
            upper,
            upper_inclusive: true,
        }
    }

    /// `[score, score]`, matching exactly one score.
    #[must_use]
    pub const fn point(score: f64) -> Self {
        Self::closed(score, score)
    }

    /// `[center - tolerance, center + tolerance)`
    #[must_use]
    pub fn around(center: f64, tolerance: f64) -> Self {
        Self::half_open(center - tolerance, center + tolerance)
    }

    /// Returns `true` if `score` lies in the range. NaN is never contained.
    #[must_use]
    pub fn contains(&self, score: f64) -> bool {
        let above = if self.lower_inclusive {
            score >= self.lower
        } else {
            score > self.lower
        };
        let below = if self.upper_inclusive {
            score <= self.upper
        } else {
            score < self.upper
        };
        above && below
    }

    /// Returns `true` if no score can lie in the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        if self.lower.is_nan() || self.upper.is_nan() {
            return true;
        }
        self.lower > self.upper
            || (self.lower == self.upper && !(self.lower_inclusive && self.upper_inclusive))
    }

    /// Returns `true` if some score lies in both ranges.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let (lower, lower_inclusive) = if self.lower > other.lower {
            (self.lower, self.lower_inclusive)
        } else if other.lower > self.lower {
            (other.lower, other.lower_inclusive)
        } else {
            (self.lower, self.lower_inclusive && other.lower_inclusive)
        };
        let (upper, upper_inclusive) = if self.upper < other.upper {
            (self.upper, self.upper_inclusive)
        } else if other.upper < self.upper {
            (other.upper, other.upper_inclusive)
        } else {
            (self.upper, self.upper_inclusive && other.upper_inclusive)
        };
        !Self {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        }
        .is_empty()
    }
}

impl fmt::Display for DynamismRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower_inclusive { '[' } else { '(' };
        let close = if self.upper_inclusive { ']' } else { ')' };
        write!(f, "{open}{}, {}{close}", self.lower, self.upper)
    }
}

/// Errors raised while building [`GeneratorSettings`] or [`DynamismBins`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("dynamism range {range} is empty")]
    EmptyRange { range: DynamismRange },

    #[error("dynamism range {range} overlaps {existing}")]
    OverlappingRanges {
        range: DynamismRange,
        existing: DynamismRange,
    },

    #[error("bin center {center} is not a finite number")]
    InvalidCenter { center: f64 },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("scale {0} must be finite and positive")]
    InvalidScale(f64),

    #[error("no dynamism bins registered")]
    NoDynamismBins,
}

/// Maps raw dynamism scores to the center of the bin they fall in.
///
/// Bins are non-overlapping [`DynamismRange`]s, so a score resolves to at
/// most one center. Exact lookup is the special case of registering
/// [`DynamismRange::point`]s.
///
/// # Example
/// ```
/// use datgen::{DynamismBins, DynamismRange};
///
/// let bins = DynamismBins::builder()
///     .bin(DynamismRange::around(0.2, 0.05), 0.2)
///     .bin(DynamismRange::point(0.42), 0.4)
///     .build()
///     .unwrap();
///
/// assert_eq!(bins.resolve(0.18), Some(0.2));
/// assert_eq!(bins.resolve(0.42), Some(0.4));
/// assert_eq!(bins.resolve(0.43), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "DynamismBinsBuilder"))]
pub struct DynamismBins {
    bins: Vec<(DynamismRange, f64)>,
}

impl DynamismBins {
    #[must_use]
    pub fn builder() -> DynamismBinsBuilder {
        DynamismBinsBuilder::default()
    }

    /// Returns the center of the bin containing `score`, if any.
    #[must_use]
    pub fn resolve(&self, score: f64) -> Option<f64> {
        self.bins
            .iter()
            .find(|(range, _)| range.contains(score))
            .map(|&(_, center)| center)
    }

    /// Returns the registered centers in ascending order, without repeats.
    #[must_use]
    pub fn centers(&self) -> Vec<f64> {
        let mut centers: Vec<f64> = self.bins.iter().map(|&(_, center)| center).collect();
        centers.sort_by(f64::total_cmp);
        centers.dedup_by(|a, b| a.to_bits() == b.to_bits());
        centers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DynamismRange, f64)> {
        self.bins.iter().map(|(range, center)| (range, *center))
    }
}

/// Collects bins and validates them on [`DynamismBinsBuilder::build`].
///
/// Deserializing a [`DynamismBins`] goes through this builder.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct DynamismBinsBuilder {
    bins: Vec<(DynamismRange, f64)>,
}

impl DynamismBinsBuilder {
    /// Maps every score in `range` to `center`.
    #[must_use]
    pub fn bin(mut self, range: DynamismRange, center: f64) -> Self {
        self.bins.push((range, center));
        self
    }

    /// Registers each center with a symmetric `tolerance` around it.
    #[must_use]
    pub fn centered(mut self, centers: impl IntoIterator<Item = f64>, tolerance: f64) -> Self {
        self.bins.extend(
            centers
                .into_iter()
                .map(|center| (DynamismRange::around(center, tolerance), center)),
        );
        self
    }

    /// Validates the bins.
    ///
    /// # Errors
    /// - [`SettingsError::InvalidCenter`] for a NaN or infinite center
    /// - [`SettingsError::EmptyRange`] for a range that contains no score
    /// - [`SettingsError::OverlappingRanges`] if two ranges share a score
    pub fn build(self) -> Result<DynamismBins, SettingsError> {
        for (i, (range, center)) in self.bins.iter().enumerate() {
            if !center.is_finite() {
                return Err(SettingsError::InvalidCenter { center: *center });
            }
            if range.is_empty() {
                return Err(SettingsError::EmptyRange { range: *range });
            }
            if let Some((existing, _)) = self.bins[..i].iter().find(|(r, _)| r.overlaps(range)) {
                return Err(SettingsError::OverlappingRanges {
                    range: *range,
                    existing: *existing,
                });
            }
        }
        Ok(DynamismBins { bins: self.bins })
    }
}

impl TryFrom<DynamismBinsBuilder> for DynamismBins {
    type Error = SettingsError;

    fn try_from(builder: DynamismBinsBuilder) -> Result<Self, SettingsError> {
        builder.build()
    }
}

/// The target description a [`GenerationTask`] validates candidates against.
///
/// One settings value describes one (urgency, scale) group and every
/// dynamism bin registered in `dynamism_bins`.
///
/// [`GenerationTask`]: crate::GenerationTask
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "GeneratorSettingsBuilder"))]
pub struct GeneratorSettings {
    /// Expected urgency every order in a candidate should have.
    pub urgency: i64,
    /// Exact number of new-order events a candidate must contain.
    pub num_orders: usize,
    /// Period in which the scenario is operational; dynamism is measured
    /// over it.
    pub office_hours: TimeWindow,
    pub dynamism_bins: DynamismBins,
    pub scale: f64,
}

impl GeneratorSettings {
    #[must_use]
    pub fn builder() -> GeneratorSettingsBuilder {
        GeneratorSettingsBuilder::default()
    }

    /// Re-checks settings whose public fields were edited after building.
    ///
    /// # Errors
    /// - [`SettingsError::NoDynamismBins`] if the bins are empty
    /// - [`SettingsError::InvalidScale`] for a non-finite or non-positive
    ///   scale
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(SettingsError::InvalidScale(self.scale));
        }
        if self.dynamism_bins.is_empty() {
            return Err(SettingsError::NoDynamismBins);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct GeneratorSettingsBuilder {
    urgency: Option<i64>,
    num_orders: Option<usize>,
    office_hours: Option<TimeWindow>,
    dynamism_bins: Option<DynamismBins>,
    scale: Option<f64>,
}

impl GeneratorSettingsBuilder {
    #[must_use]
    pub fn urgency(mut self, urgency: i64) -> Self {
        self.urgency = Some(urgency);
        self
    }

    #[must_use]
    pub fn num_orders(mut self, num_orders: usize) -> Self {
        self.num_orders = Some(num_orders);
        self
    }

    #[must_use]
    pub fn office_hours(mut self, office_hours: TimeWindow) -> Self {
        self.office_hours = Some(office_hours);
        self
    }

    #[must_use]
    pub fn dynamism_bins(mut self, dynamism_bins: DynamismBins) -> Self {
        self.dynamism_bins = Some(dynamism_bins);
        self
    }

    /// Defaults to `1.0`.
    #[must_use]
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// # Errors
    /// - [`SettingsError::Missing`] if urgency, order count, office hours or
    ///   dynamism bins were not set
    /// - [`SettingsError::NoDynamismBins`] if the bins are empty
    /// - [`SettingsError::InvalidScale`] for a non-finite or non-positive
    ///   scale
    pub fn build(self) -> Result<GeneratorSettings, SettingsError> {
        let dynamism_bins = self
            .dynamism_bins
            .ok_or(SettingsError::Missing("dynamism_bins"))?;
        let settings = GeneratorSettings {
            urgency: self.urgency.ok_or(SettingsError::Missing("urgency"))?,
            num_orders: self.num_orders.ok_or(SettingsError::Missing("num_orders"))?,
            office_hours: self
                .office_hours
                .ok_or(SettingsError::Missing("office_hours"))?,
            dynamism_bins,
            scale: self.scale.unwrap_or(1.0),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl TryFrom<GeneratorSettingsBuilder> for GeneratorSettings {
    type Error = SettingsError;

    fn try_from(builder: GeneratorSettingsBuilder) -> Result<Self, SettingsError> {
        builder.build()
    }
}
