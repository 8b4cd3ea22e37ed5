//! USE (Utilization/Saturation/Errors) derivation, one formula per
//! resource category, run over a fully assembled `Report`.

use std::collections::HashMap;

use hostdiag_model::{Payload, Report, UseMetric};

fn first_payload<'a>(report: &'a Report, category: &str) -> Option<&'a Payload> {
    report.categories.get(category)?.iter().find_map(|r| r.payload.as_ref())
}

fn cpu_metric(report: &Report) -> Option<UseMetric> {
    let Some(Payload::Cpu(data)) = first_payload(report, "cpu") else { return None };
    let num_cpus = data.per_cpu.len().max(1) as f64;
    let saturation = ((data.load_avg[0] / num_cpus) - 1.0).max(0.0) * 100.0;
    Some(UseMetric { utilization: 100.0 - data.idle_pct, saturation, errors: 0.0 })
}

fn memory_metric(report: &Report) -> Option<UseMetric> {
    let Some(Payload::Memory(data)) = first_payload(report, "memory") else { return None };
    let utilization = if data.total_bytes > 0 {
        (data.total_bytes - data.available_bytes.min(data.total_bytes)) as f64 / data.total_bytes as f64 * 100.0
    } else {
        0.0
    };
    let saturation =
        if data.swap_total_bytes > 0 { data.swap_used_bytes as f64 / data.swap_total_bytes as f64 * 100.0 } else { 0.0 };
    Some(UseMetric { utilization, saturation, errors: (data.major_faults as f64) })
}

fn disk_metric(report: &Report) -> Option<UseMetric> {
    let Some(Payload::Disk(data)) = first_payload(report, "disk") else { return None };
    let max_io_time = data.devices.iter().map(|d| d.io_time_ms).max().unwrap_or(0) as f64;
    let max_in_flight = data.devices.iter().map(|d| d.in_flight).max().unwrap_or(0) as f64;
    Some(UseMetric { utilization: max_io_time / 10.0, saturation: max_in_flight, errors: 0.0 })
}

fn network_metric(report: &Report) -> Option<UseMetric> {
    let Some(Payload::Network(data)) = first_payload(report, "network") else { return None };
    let errors =
        data.interfaces.iter().map(|i| i.errors_per_sec).sum::<f64>() + data.tcp_in_errs as f64 + data.retrans_rate;
    let utilization = data.interfaces.iter().map(|i| i.rx_bytes + i.tx_bytes).sum::<u64>() as f64;
    Some(UseMetric { utilization, saturation: (data.time_wait + data.close_wait) as f64, errors })
}

fn container_metric(report: &Report) -> Option<UseMetric> {
    let Some(Payload::Container(data)) = first_payload(report, "container") else { return None };
    let cpu_utilization = match (data.cpu_quota_us, data.cpu_period_us) {
        (Some(quota), Some(period)) if period > 0 => {
            let allowed_ratio = quota as f64 / period as f64;
            if allowed_ratio > 0.0 {
                (data.throttled_time_us as f64 / 1_000_000.0) / allowed_ratio
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    let memory_utilization = match data.memory_limit_bytes {
        Some(limit) if limit > 0 => data.memory_usage_bytes as f64 / limit as f64 * 100.0,
        _ => 0.0,
    };
    Some(UseMetric { utilization: cpu_utilization.max(memory_utilization), saturation: data.throttled_periods as f64, errors: 0.0 })
}

/// Derive the USE triple for every category present in the report.
pub fn derive(report: &Report) -> HashMap<String, UseMetric> {
    let mut out = HashMap::new();
    if let Some(m) = cpu_metric(report) {
        out.insert("cpu".to_string(), m);
    }
    if let Some(m) = memory_metric(report) {
        out.insert("memory".to_string(), m);
    }
    if let Some(m) = disk_metric(report) {
        out.insert("disk".to_string(), m);
    }
    if let Some(m) = network_metric(report) {
        out.insert("network".to_string(), m);
    }
    if let Some(m) = container_metric(report) {
        out.insert("container".to_string(), m);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdiag_model::{CollectResult, CpuData, Tier};

    #[test]
    fn cpu_saturation_is_zero_below_one_load_per_core() {
        let mut report = Report::default();
        let mut data = CpuData { idle_pct: 90.0, load_avg: [1.0, 1.0, 1.0], ..Default::default() };
        data.per_cpu.push(Default::default());
        data.per_cpu.push(Default::default());
        let mut result = CollectResult::new("procfs-cpu", "cpu", Tier::Procfs);
        result.payload = Some(Payload::Cpu(data));
        report.push_result(result);

        let metrics = derive(&report);
        let cpu = metrics.get("cpu").unwrap();
        assert_eq!(cpu.utilization, 10.0);
        assert_eq!(cpu.saturation, 0.0);
    }

    #[test]
    fn missing_category_yields_no_entry() {
        let report = Report::default();
        assert!(derive(&report).get("cpu").is_none());
    }
}
