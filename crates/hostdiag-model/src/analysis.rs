//! Analysis-layer output types: USE metrics, anomalies, recommendations.

use serde::Serialize;

/// Utilization/Saturation/Errors triple for one resource category.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct UseMetric {
    /// Percent of capacity in active use.
    pub utilization: f64,
    /// Percent (or count, category-dependent) of queued/blocked demand.
    pub saturation: f64,
    /// Error count attributable to this resource.
    pub errors: f64,
}

/// Anomaly severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Crossed the warning threshold but not the critical one.
    Warning,
    /// Crossed the critical threshold.
    Critical,
}

/// One threshold violation surfaced by anomaly detection.
#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    /// Warning or critical.
    pub severity: Severity,
    /// Category the violated metric belongs to.
    pub category: String,
    /// Stable identifier of the threshold rule that fired.
    pub metric_id: String,
    /// Human-readable message.
    pub message: String,
    /// The observed value, stringified for display.
    pub value: String,
    /// The threshold(s) crossed, stringified for display.
    pub thresholds: String,
}

/// One remediation suggestion produced by the recommendation pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// 1 = highest priority; stamped at emission time, monotonically
    /// increasing across the pipeline run.
    pub priority: u32,
    /// Category this recommendation addresses.
    pub category: String,
    /// Short human-readable title.
    pub title: String,
    /// Commands to apply the fix immediately (not persisted across reboot).
    pub one_shot_commands: Vec<String>,
    /// Commands/config edits to make the fix persistent.
    pub persistence_commands: Vec<String>,
    /// Expected effect of applying this recommendation.
    pub expected_impact: String,
    /// The observed data that triggered this recommendation.
    pub evidence: String,
    /// Reference for further reading (doc, man page, kernel changelog).
    pub citation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_warning_below_critical() {
        assert!(Severity::Warning < Severity::Critical);
    }
}
