//! Four deterministic, pure-function analysis stages run in order over
//! a fully assembled `Report`: USE derivation, anomaly detection,
//! recommendation synthesis, and health scoring.

pub mod ai_context;
pub mod health;
pub mod recommendations;
pub mod thresholds;
pub mod use_metrics;

use hostdiag_model::{Report, Summary};

/// Run the full analysis pipeline and return the assembled `Summary`.
pub fn analyze(report: &Report) -> Summary {
    let use_metrics = use_metrics::derive(report);
    let anomalies = thresholds::evaluate(report);
    let recommendations = recommendations::synthesize(report);
    let health_score = health::score(&use_metrics, &anomalies);

    Summary { use_metrics, anomalies, recommendations, health_score }
}

/// Build the AI-ready prompt string for an already-scored report.
pub fn build_ai_context(report: &Report) -> String {
    ai_context::build(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdiag_model::{CollectResult, MemoryData, Payload, Tier};

    #[test]
    fn analyze_assembles_all_four_stages() {
        let mut report = Report::default();
        let mut result = CollectResult::new("procfs-memory", "memory", Tier::Procfs);
        result.payload = Some(Payload::Memory(MemoryData { swap_total_bytes: 100, swap_used_bytes: 80, ..Default::default() }));
        report.push_result(result);

        let summary = analyze(&report);
        assert!(summary.use_metrics.contains_key("memory"));
        assert!(summary.anomalies.iter().any(|a| a.metric_id == "memory_swap_pressure"));
        assert!(summary.health_score < 100.0);
    }

    #[test]
    fn ai_context_reflects_the_scored_report() {
        let mut report = Report::default();
        report.summary = analyze(&report);
        let prompt = build_ai_context(&report);
        assert!(prompt.contains("Health score"));
    }
}
