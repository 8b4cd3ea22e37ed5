//! AI-prompt synthesis: flatten a scored report into a single string an
//! LLM can reason over without re-deriving the USE/anomaly pipeline.

use hostdiag_model::Report;

const ANTI_PATTERNS: &[&str] = &[
    "Swapping under memory pressure instead of reclaiming page cache",
    "CFS run-queue saturation masked by low aggregate CPU utilization",
    "Unbounded TCP TIME_WAIT accumulation exhausting ephemeral ports",
    "Rotational-disk schedulers left at CFQ/deadline defaults under high queue depth",
    "Cgroup CPU throttling hidden by host-level utilization averages",
    "Transparent Huge Pages left at 'always', causing compaction stalls",
];

/// Build the AI-ready prompt string for a scored report.
pub fn build(report: &Report) -> String {
    let mut out = String::new();

    out.push_str("# Host diagnostic summary\n\n");
    if let Some(system) = &report.system {
        out.push_str(&format!("Host: {} ({})\n", system.os_name, system.kernel));
        out.push_str(&format!("Uptime: {}s\n", system.uptime_secs));
    } else {
        out.push_str("Host: unknown (system category not collected)\n");
    }
    out.push_str(&format!("Profile: {}\n", report.metadata.profile));
    out.push_str(&format!(
        "Phase 2 (event tracing): requested={}, completed={}\n\n",
        report.metadata.phase2_requested, report.metadata.phase2_completed
    ));

    out.push_str(&format!("## Health score: {:.1}/100\n\n", report.summary.health_score));

    out.push_str("## USE metrics\n");
    if report.summary.use_metrics.is_empty() {
        out.push_str("(none collected)\n");
    } else {
        let mut categories: Vec<&String> = report.summary.use_metrics.keys().collect();
        categories.sort();
        for category in categories {
            let metric = &report.summary.use_metrics[category];
            out.push_str(&format!(
                "- {category}: utilization={:.1}, saturation={:.1}, errors={:.1}\n",
                metric.utilization, metric.saturation, metric.errors
            ));
        }
    }
    out.push('\n');

    out.push_str("## Anomalies\n");
    if report.summary.anomalies.is_empty() {
        out.push_str("(none)\n");
    } else {
        for anomaly in &report.summary.anomalies {
            out.push_str(&format!("- [{:?}] {}: {}\n", anomaly.severity, anomaly.category, anomaly.message));
        }
    }
    out.push('\n');

    out.push_str("## Known anti-patterns to consider\n");
    for pattern in ANTI_PATTERNS {
        out.push_str(&format!("- {pattern}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_system_data_still_produces_a_prompt() {
        let report = Report::default();
        let prompt = build(&report);
        assert!(prompt.contains("Host: unknown"));
        assert!(prompt.contains("Known anti-patterns"));
    }

    #[test]
    fn use_metrics_render_sorted_by_category_name() {
        use hostdiag_model::UseMetric;

        let mut report = Report::default();
        report.summary.use_metrics.insert("network".to_string(), UseMetric::default());
        report.summary.use_metrics.insert("cpu".to_string(), UseMetric::default());

        let prompt = build(&report);
        let cpu_pos = prompt.find("- cpu:").unwrap();
        let network_pos = prompt.find("- network:").unwrap();
        assert!(cpu_pos < network_pos);
    }
}
