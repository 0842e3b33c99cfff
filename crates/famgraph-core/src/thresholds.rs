use serde::{Deserialize, Serialize};

use crate::Severity;

/// Severity cut-offs used across the metric engines.
///
/// The defaults reproduce the research-derived values the engines were
/// calibrated with; none of them is a proven universal, so adopting teams can
/// override individual fields instead of patching the engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityThresholds {
    /// Gini coefficient over per-person anticipation counts.
    pub gini_high: f64,
    pub gini_medium: f64,
    /// Hours per week the top monitor spends following up.
    pub monitoring_hours_high: f64,
    pub monitoring_hours_medium: f64,
    /// Hours of invisible research attributed to a non-decider.
    pub research_hours_high: f64,
    pub research_hours_medium: f64,
    /// Max |creation ratio - execution ratio| for any one person.
    pub split_gap_high: f64,
    pub split_gap_medium: f64,
    /// Share of a person's labor spent in invisible phases.
    pub invisible_share_high: f64,
    pub invisible_share_medium: f64,
    /// Betweenness-style centrality score of the top coordinator.
    pub bottleneck_high: f64,
    pub bottleneck_medium: f64,
    /// Task clusters divided by people.
    pub fragmentation_high: f64,
    pub fragmentation_medium: f64,
    /// Tasks affected by a single disruption.
    pub ripple_tasks_high: usize,
    pub ripple_tasks_medium: usize,
    /// Blocking-chain length considered high risk.
    pub chain_length_high: usize,
    /// Share of weekly task creation in the late-Sunday window.
    pub sunday_night_share: f64,
    /// Share of yearly task creation in a two-month seasonal window.
    pub seasonal_share: f64,
    /// Coefficient of variation across the seven day buckets.
    pub rhythm_cv_high: f64,
    pub rhythm_cv_medium: f64,
    /// Cognitive-load attribution for task creation vs execution.
    /// 0.6 follows the research convention; tune rather than trust.
    pub creation_weight: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            gini_high: 0.4,
            gini_medium: 0.25,
            monitoring_hours_high: 4.0,
            monitoring_hours_medium: 2.0,
            research_hours_high: 3.0,
            research_hours_medium: 1.5,
            split_gap_high: 0.3,
            split_gap_medium: 0.15,
            invisible_share_high: 0.8,
            invisible_share_medium: 0.65,
            bottleneck_high: 0.5,
            bottleneck_medium: 0.3,
            fragmentation_high: 0.7,
            fragmentation_medium: 0.5,
            ripple_tasks_high: 5,
            ripple_tasks_medium: 2,
            chain_length_high: 3,
            sunday_night_share: 0.20,
            seasonal_share: 0.25,
            rhythm_cv_high: 0.5,
            rhythm_cv_medium: 0.3,
            creation_weight: 0.6,
        }
    }
}

impl SeverityThresholds {
    /// Grade a value against a high/medium pair, low otherwise.
    pub fn grade(value: f64, high: f64, medium: f64) -> Severity {
        if value > high {
            Severity::High
        } else if value > medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grading_is_exclusive_at_boundaries() {
        let t = SeverityThresholds::default();
        assert_eq!(
            SeverityThresholds::grade(0.4, t.gini_high, t.gini_medium),
            Severity::Medium
        );
        assert_eq!(
            SeverityThresholds::grade(0.41, t.gini_high, t.gini_medium),
            Severity::High
        );
        assert_eq!(
            SeverityThresholds::grade(0.25, t.gini_high, t.gini_medium),
            Severity::Low
        );
    }

    #[test]
    fn defaults_match_calibration() {
        let t = SeverityThresholds::default();
        assert_eq!(t.creation_weight, 0.6);
        assert_eq!(t.monitoring_hours_high, 4.0);
        assert_eq!(t.chain_length_high, 3);
    }
}
