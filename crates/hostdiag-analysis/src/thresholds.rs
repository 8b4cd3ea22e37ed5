//! Anomaly detection: a fixed table of named thresholds, each scoped to
//! exactly one category (a regression guard against evaluators reading
//! data out of their lane).

use hostdiag_model::{Anomaly, Payload, Report, Severity};

struct Threshold {
    metric_id: &'static str,
    category: &'static str,
    warning: f64,
    critical: f64,
    evaluator: fn(&Report) -> Option<f64>,
    message: fn(f64) -> String,
}

fn cpu_saturation(report: &Report) -> Option<f64> {
    let Some(Payload::Cpu(data)) = report.categories.get("cpu")?.iter().find_map(|r| r.payload.as_ref()) else {
        return None;
    };
    let num_cpus = data.per_cpu.len().max(1) as f64;
    Some(((data.load_avg[0] / num_cpus) - 1.0).max(0.0) * 100.0)
}

fn memory_swap_usage(report: &Report) -> Option<f64> {
    let Some(Payload::Memory(data)) = report.categories.get("memory")?.iter().find_map(|r| r.payload.as_ref()) else {
        return None;
    };
    if data.swap_total_bytes == 0 {
        return Some(0.0);
    }
    Some(data.swap_used_bytes as f64 / data.swap_total_bytes as f64 * 100.0)
}

fn memory_psi_some(report: &Report) -> Option<f64> {
    let Some(Payload::Memory(data)) = report.categories.get("memory")?.iter().find_map(|r| r.payload.as_ref()) else {
        return None;
    };
    Some(data.psi_some_avg10)
}

fn disk_io_time(report: &Report) -> Option<f64> {
    let Some(Payload::Disk(data)) = report.categories.get("disk")?.iter().find_map(|r| r.payload.as_ref()) else {
        return None;
    };
    Some(data.devices.iter().map(|d| d.io_time_ms).max().unwrap_or(0) as f64)
}

fn network_time_wait(report: &Report) -> Option<f64> {
    let Some(Payload::Network(data)) = report.categories.get("network")?.iter().find_map(|r| r.payload.as_ref()) else {
        return None;
    };
    Some(data.time_wait as f64)
}

fn container_cpu_throttling(report: &Report) -> Option<f64> {
    let Some(Payload::Container(data)) = report.categories.get("container")?.iter().find_map(|r| r.payload.as_ref())
    else {
        return None;
    };
    Some(data.throttled_periods as f64)
}

const THRESHOLDS: &[Threshold] = &[
    Threshold {
        metric_id: "cpu_saturation",
        category: "cpu",
        warning: 20.0,
        critical: 50.0,
        evaluator: cpu_saturation,
        message: |v| format!("CPU run-queue saturation at {v:.1}% above one load-per-core"),
    },
    Threshold {
        metric_id: "memory_swap_pressure",
        category: "memory",
        warning: 10.0,
        critical: 50.0,
        evaluator: memory_swap_usage,
        message: |v| format!("swap {v:.1}% used"),
    },
    Threshold {
        metric_id: "memory_psi_some",
        category: "memory",
        warning: 10.0,
        critical: 40.0,
        evaluator: memory_psi_some,
        message: |v| format!("memory pressure avg10 at {v:.1}"),
    },
    Threshold {
        metric_id: "disk_io_time",
        category: "disk",
        warning: 500.0,
        critical: 900.0,
        evaluator: disk_io_time,
        message: |v| format!("busiest device spent {v:.0}ms/s doing I/O"),
    },
    Threshold {
        metric_id: "network_time_wait",
        category: "network",
        warning: 1000.0,
        critical: 5000.0,
        evaluator: network_time_wait,
        message: |v| format!("{v:.0} connections in TIME_WAIT"),
    },
    Threshold {
        metric_id: "container_cpu_throttling",
        category: "container",
        warning: 1.0,
        critical: 50.0,
        evaluator: container_cpu_throttling,
        message: |v| format!("cgroup throttled for {v:.0} periods"),
    },
];

/// SSD vs HDD block-I/O-latency thresholds, milliseconds.
const SSD_LATENCY_WARNING_MS: f64 = 1.0;
const SSD_LATENCY_CRITICAL_MS: f64 = 5.0;
const HDD_LATENCY_WARNING_MS: f64 = 10.0;
const HDD_LATENCY_CRITICAL_MS: f64 = 30.0;

fn rotational_by_device(report: &Report) -> std::collections::HashMap<String, bool> {
    let mut out = std::collections::HashMap::new();
    if let Some(results) = report.categories.get("disk") {
        for result in results {
            if let Some(Payload::Disk(data)) = &result.payload {
                for device in &data.devices {
                    out.insert(device.device.clone(), device.rotational);
                }
            }
        }
    }
    out
}

/// Walk histograms named `block_io_latency[-_]<dev>`, normalize units to
/// milliseconds, and pick the SSD or HDD threshold via the disk
/// collector's `rotational` flag for that device.
fn evaluate_disk_histograms(report: &Report) -> Vec<Anomaly> {
    let rotational = rotational_by_device(report);
    let Some(results) = report.categories.get("disk") else { return Vec::new() };

    let mut out = Vec::new();
    for result in results {
        let Some(Payload::Histograms(histograms)) = &result.payload else { continue };
        for histogram in histograms {
            let Some(device) = histogram
                .name
                .strip_prefix("block_io_latency")
                .and_then(|rest| rest.strip_prefix('-').or_else(|| rest.strip_prefix('_')))
            else {
                continue;
            };
            let p99_ms = if histogram.unit == "us" { histogram.p99 / 1000.0 } else { histogram.p99 };
            let is_rotational = rotational.get(device).copied().unwrap_or(false);
            let (warning, critical) = if is_rotational {
                (HDD_LATENCY_WARNING_MS, HDD_LATENCY_CRITICAL_MS)
            } else {
                (SSD_LATENCY_WARNING_MS, SSD_LATENCY_CRITICAL_MS)
            };
            let severity = if p99_ms >= critical {
                Severity::Critical
            } else if p99_ms >= warning {
                Severity::Warning
            } else {
                continue;
            };
            out.push(Anomaly {
                severity,
                category: "disk".to_string(),
                metric_id: "block_io_latency_p99".to_string(),
                message: format!("{device} p99 block I/O latency {p99_ms:.2}ms"),
                value: format!("{p99_ms:.2}"),
                thresholds: format!("warning={warning}, critical={critical}"),
            });
        }
    }
    out
}

/// Walk the fixed threshold table, dropping anything below warning, plus
/// the dynamic per-device histogram-latency evaluator.
pub fn evaluate(report: &Report) -> Vec<Anomaly> {
    let mut anomalies: Vec<Anomaly> = THRESHOLDS
        .iter()
        .filter_map(|t| {
            let value = (t.evaluator)(report)?;
            let severity = if value >= t.critical {
                Severity::Critical
            } else if value >= t.warning {
                Severity::Warning
            } else {
                return None;
            };
            Some(Anomaly {
                severity,
                category: t.category.to_string(),
                metric_id: t.metric_id.to_string(),
                message: (t.message)(value),
                value: format!("{value:.2}"),
                thresholds: format!("warning={}, critical={}", t.warning, t.critical),
            })
        })
        .collect();
    anomalies.extend(evaluate_disk_histograms(report));
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdiag_model::{CollectResult, MemoryData, Tier};

    #[test]
    fn evaluator_only_reads_its_own_category() {
        let mut report = Report::default();
        let mut result = CollectResult::new("procfs-memory", "memory", Tier::Procfs);
        result.payload = Some(Payload::Memory(MemoryData { swap_total_bytes: 100, swap_used_bytes: 60, ..Default::default() }));
        report.push_result(result);

        let anomalies = evaluate(&report);
        assert!(anomalies.iter().all(|a| a.category == "memory"));
        assert!(anomalies.iter().any(|a| a.metric_id == "memory_swap_pressure"));
    }

    #[test]
    fn below_warning_emits_nothing() {
        let mut report = Report::default();
        let mut result = CollectResult::new("procfs-memory", "memory", Tier::Procfs);
        result.payload = Some(Payload::Memory(MemoryData { swap_total_bytes: 100, swap_used_bytes: 1, ..Default::default() }));
        report.push_result(result);

        let anomalies = evaluate(&report);
        assert!(!anomalies.iter().any(|a| a.metric_id == "memory_swap_pressure"));
    }

    #[test]
    fn disk_histogram_picks_ssd_threshold_for_non_rotational_device() {
        use hostdiag_model::{DiskData, DiskDevice, Histogram};

        let mut report = Report::default();
        let mut disk_result = CollectResult::new("procfs-disk", "disk", Tier::Procfs);
        disk_result.payload = Some(Payload::Disk(DiskData {
            devices: vec![DiskDevice { device: "nvme0n1".to_string(), rotational: false, ..Default::default() }],
            ..Default::default()
        }));
        report.push_result(disk_result);

        let mut hist_result = CollectResult::new("block_io_latency", "disk", Tier::ExternalTool);
        hist_result.payload = Some(Payload::Histograms(vec![Histogram {
            name: "block_io_latency-nvme0n1".to_string(),
            unit: "us".to_string(),
            p99: 8000.0,
            ..Default::default()
        }]));
        report.push_result(hist_result);

        let anomalies = evaluate_disk_histograms(&report);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].severity, Severity::Critical);
    }
}
