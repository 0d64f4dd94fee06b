/// How a [`GenerationTask`] reacts to a candidate that misses its target.
///
/// [`GenerationTask`]: crate::GenerationTask
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ValidationPolicy {
    /// Any failed check rejects the candidate. Use this for corpus
    /// production.
    #[default]
    Strict,
    /// Diagnostic mode for judging generator quality. Failed time-window,
    /// urgency and order-count checks are logged and recorded on the
    /// [`Outcome`], and a dynamism score outside every bin is filed under
    /// [`LENIENT_DYNAMISM_BIN`] instead of rejecting.
    ///
    /// [`Outcome`]: crate::Outcome
    /// [`LENIENT_DYNAMISM_BIN`]: crate::LENIENT_DYNAMISM_BIN
    Lenient,
}
