//! Engine run metrics.
//!
//! Both phases report a [`PhaseMetrics`]; [`Tagger::annotate`] bundles them
//! into a [`RunMetrics`] together with the total wall time.
//!
//! [`Tagger::annotate`]: crate::api::Tagger::annotate

use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunMetrics {
    /// Total elapsed time for one annotation run.
    pub total: Duration,
    pub recognition: PhaseMetrics,
    pub normalisation: PhaseMetrics,
}

/// Timing and counters for one phase.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PhaseMetrics {
    pub duration: Duration,
    /// Plan entries (rules or blocks) that reported a match.
    pub rules_fired: usize,
    /// Recognition: tags created. Normalisation: tags at least one rule applied to.
    pub tags_touched: usize,
}
