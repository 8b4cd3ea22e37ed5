//! `CollectResult` and the final `Report`.
//!
//! `Report`'s shape (metadata + per-category result lists + a summary
//! block) is grounded on `probe-metrics`'s `AllMetrics` aggregate,
//! which bundles every per-category collector's output into one
//! serializable struct; here the per-category slot becomes a
//! `Vec<CollectResult>` keyed by category name rather than a fixed
//! field per metric family, since the category payload is polymorphic
//! (I7: a collector never writes outside its own `Result`).

use std::collections::HashMap;
use std::time::SystemTime;

use serde::Serialize;

use crate::analysis::{Anomaly, Recommendation, UseMetric};
use crate::category::{
    ContainerData, CpuData, DiskData, MemoryData, NetworkData, ProcessData, SystemData,
};
use crate::collector::Tier;
use crate::event::Event;
use crate::histogram::Histogram;
use crate::stack::StackTrace;

/// The polymorphic payload a single collector's [`CollectResult`] carries.
///
/// A tagged sum rather than a `Box<dyn Any>`: every variant a procfs or
/// tool-backed collector can produce is enumerated up front, so callers
/// match exhaustively instead of downcasting.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// CPU category typed record.
    Cpu(CpuData),
    /// Memory category typed record.
    Memory(MemoryData),
    /// Disk category typed record.
    Disk(DiskData),
    /// Network category typed record.
    Network(NetworkData),
    /// Process category typed record.
    Process(ProcessData),
    /// Container category typed record.
    Container(ContainerData),
    /// System category typed record.
    System(SystemData),
    /// Parsed histograms (tool-backed HISTOGRAM/HISTOGRAM_PER_DISK output).
    Histograms(Vec<Histogram>),
    /// Parsed tabular events (tool-backed TABULAR output).
    Events(Vec<Event>),
    /// Parsed folded stacks (tool-backed FOLDED output).
    Stacks(Vec<StackTrace>),
}

/// Normalized output of a single collector run.
#[derive(Debug, Clone, Serialize)]
pub struct CollectResult {
    /// The collector's stable name.
    pub collector: String,
    /// Category this result belongs to.
    pub category: String,
    /// Tier the producing collector runs at.
    #[serde(skip)]
    pub tier: Tier,
    /// Wall-clock start of the collection call.
    #[serde(skip)]
    pub started_at: Option<SystemTime>,
    /// Wall-clock end of the collection call.
    #[serde(skip)]
    pub ended_at: Option<SystemTime>,
    /// The collected payload, when the collector succeeded.
    pub payload: Option<Payload>,
    /// Non-fatal errors encountered while producing this result (I8).
    pub errors: Vec<String>,
    /// Whether the collector hit `max_events_per_collector` or a similar cap.
    pub truncated: bool,
}

impl CollectResult {
    /// Start a result for the given collector/category/tier with no
    /// payload yet, ready to be filled in or to carry only errors.
    pub fn new(collector: impl Into<String>, category: impl Into<String>, tier: Tier) -> Self {
        Self {
            collector: collector.into(),
            category: category.into(),
            tier,
            started_at: None,
            ended_at: None,
            payload: None,
            errors: Vec::new(),
            truncated: false,
        }
    }

    /// Attach a payload, returning `self` for chaining.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Record a non-fatal error without failing the result (I8).
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Run metadata stamped once at report assembly.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportMetadata {
    /// Profile the run was collected under (`"quick"`, `"standard"`, `"deep"`).
    pub profile: String,
    /// Wall-clock start of the whole run.
    #[serde(skip)]
    pub started_at: Option<SystemTime>,
    /// Wall-clock end of the whole run.
    #[serde(skip)]
    pub ended_at: Option<SystemTime>,
    /// Whether Phase 2 (external tool tracing) was requested.
    pub phase2_requested: bool,
    /// Whether Phase 2 actually completed (vs. abandoned on cancellation).
    pub phase2_completed: bool,
}

/// Aggregated USE/anomaly/recommendation/health output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    /// USE metrics, keyed by category.
    pub use_metrics: HashMap<String, UseMetric>,
    /// Anomalies found during threshold evaluation.
    pub anomalies: Vec<Anomaly>,
    /// Recommendations, in ascending priority order.
    pub recommendations: Vec<Recommendation>,
    /// Overall health score in `[0, 100]`.
    pub health_score: f64,
}

/// The final assembled artifact of one collection run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Run metadata.
    pub metadata: ReportMetadata,
    /// System category result, promoted to a dedicated field for quick access.
    pub system: Option<SystemData>,
    /// Every collector's result, keyed by category.
    pub categories: HashMap<String, Vec<CollectResult>>,
    /// Analysis layer output.
    pub summary: Summary,
    /// AI-ready analysis prompt, populated by the analysis layer.
    pub ai_context: Option<String>,
}

impl Report {
    /// Append a collector's result under its category.
    pub fn push_result(&mut self, result: CollectResult) {
        self.categories.entry(result.category.clone()).or_default().push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_result_groups_by_category() {
        let mut report = Report::default();
        report.push_result(CollectResult::new("procfs-cpu", "cpu", Tier::Procfs));
        report.push_result(CollectResult::new("procfs-cpu2", "cpu", Tier::Procfs));
        report.push_result(CollectResult::new("procfs-mem", "memory", Tier::Procfs));
        assert_eq!(report.categories.get("cpu").map(Vec::len), Some(2));
        assert_eq!(report.categories.get("memory").map(Vec::len), Some(1));
    }

    #[test]
    fn errored_result_still_attaches_to_report() {
        let mut result = CollectResult::new("bpftrace-offcputime", "process", Tier::EbpfTracer);
        result.push_error("tool timed out");
        let mut report = Report::default();
        report.push_result(result);
        let entries = &report.categories["process"];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].errors.len(), 1);
        assert!(entries[0].payload.is_none());
    }
}
