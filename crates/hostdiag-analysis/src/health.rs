//! Health scoring: start at 100, deduct per USE metric (weighted by
//! resource importance) and per anomaly, clamp to `[0, 100]`.

use std::collections::HashMap;

use hostdiag_model::{Anomaly, Severity, UseMetric};

const CRITICAL_DEDUCTION: f64 = 10.0;
const WARNING_DEDUCTION: f64 = 5.0;

fn resource_weight(category: &str) -> f64 {
    match category {
        "cpu" | "memory" => 1.5,
        "container" => 1.2,
        "disk" | "network" => 1.0,
        _ => 0.5,
    }
}

/// Tiered badness for one USE metric, 0 (fine) to 45 (maxed out on all
/// three axes) before the resource weight is applied.
fn metric_deduction(metric: &UseMetric) -> f64 {
    let mut deduction = 0.0;
    deduction += if metric.utilization > 90.0 {
        15.0
    } else if metric.utilization > 70.0 {
        8.0
    } else if metric.utilization > 50.0 {
        3.0
    } else {
        0.0
    };
    deduction += if metric.saturation > 50.0 {
        15.0
    } else if metric.saturation > 20.0 {
        8.0
    } else if metric.saturation > 5.0 {
        3.0
    } else {
        0.0
    };
    if metric.errors > 0.0 {
        deduction += (metric.errors.min(1000.0) / 1000.0) * 15.0;
    }
    deduction
}

/// Score a report's USE metrics and anomalies down from 100.
pub fn score(use_metrics: &HashMap<String, UseMetric>, anomalies: &[Anomaly]) -> f64 {
    let mut total = 100.0;

    for (category, metric) in use_metrics {
        total -= metric_deduction(metric) * resource_weight(category);
    }

    for anomaly in anomalies {
        total -= match anomaly.severity {
            Severity::Critical => CRITICAL_DEDUCTION,
            Severity::Warning => WARNING_DEDUCTION,
        };
    }

    total.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extreme_metric() -> UseMetric {
        UseMetric { utilization: 100.0, saturation: 100.0, errors: 10000.0 }
    }

    fn idle_metric() -> UseMetric {
        UseMetric { utilization: 20.0, saturation: 0.0, errors: 0.0 }
    }

    #[test]
    fn extreme_use_and_critical_anomalies_floor_at_zero() {
        let mut metrics = HashMap::new();
        for category in ["cpu", "memory", "disk", "network"] {
            metrics.insert(category.to_string(), extreme_metric());
        }
        let anomalies: Vec<Anomaly> = (0..20)
            .map(|i| Anomaly {
                severity: Severity::Critical,
                category: "cpu".to_string(),
                metric_id: format!("synthetic_{i}"),
                message: String::new(),
                value: String::new(),
                thresholds: String::new(),
            })
            .collect();

        assert_eq!(score(&metrics, &anomalies), 0.0);
    }

    #[test]
    fn low_utilization_and_no_anomalies_scores_perfect() {
        let mut metrics = HashMap::new();
        for category in ["cpu", "memory", "disk", "network"] {
            metrics.insert(category.to_string(), idle_metric());
        }
        assert_eq!(score(&metrics, &[]), 100.0);
    }

    #[test]
    fn single_warning_deducts_five() {
        let metrics = HashMap::new();
        let anomalies = vec![Anomaly {
            severity: Severity::Warning,
            category: "cpu".to_string(),
            metric_id: "cpu_saturation".to_string(),
            message: String::new(),
            value: String::new(),
            thresholds: String::new(),
        }];
        assert_eq!(score(&metrics, &anomalies), 95.0);
    }
}
