//! Recommendation synthesis: a pipeline of independent rules, each
//! producing zero or one `Recommendation` with a priority stamped at
//! emission time.

use hostdiag_model::{Payload, Recommendation, Report};

type Rule = fn(&Report) -> Option<Recommendation>;

fn find_payload<'a>(report: &'a Report, category: &str) -> Option<&'a Payload> {
    report.categories.get(category)?.iter().find_map(|r| r.payload.as_ref())
}

fn rec(category: &str, title: &str, one_shot: &[&str], persist: &[&str], impact: &str, evidence: String, citation: &str) -> Recommendation {
    Recommendation {
        priority: 0,
        category: category.to_string(),
        title: title.to_string(),
        one_shot_commands: one_shot.iter().map(|s| s.to_string()).collect(),
        persistence_commands: persist.iter().map(|s| s.to_string()).collect(),
        expected_impact: impact.to_string(),
        evidence,
        citation: citation.to_string(),
    }
}

fn cpu_saturation_investigation(report: &Report) -> Option<Recommendation> {
    let Payload::Cpu(data) = find_payload(report, "cpu")? else { return None };
    let num_cpus = data.per_cpu.len().max(1) as f64;
    if data.load_avg[0] / num_cpus <= 1.0 {
        return None;
    }
    Some(rec(
        "cpu",
        "Investigate CPU run-queue saturation",
        &["pidstat -u 1 5"],
        &[],
        "Identify the processes driving run-queue length above core count",
        format!("load1={:.2}, cpus={}", data.load_avg[0], data.per_cpu.len()),
        "man 1 pidstat",
    ))
}

fn cfs_scheduler_latency_retune(report: &Report) -> Option<Recommendation> {
    let Payload::Cpu(data) = find_payload(report, "cpu")? else { return None };
    let latency_ns = *data.cfs_sysctls.get("sched_latency_ns")?;
    if latency_ns == 0 || data.psi_avg10 < 10.0 {
        return None;
    }
    Some(rec(
        "cpu",
        "Reduce CFS scheduler latency target",
        &[&format!("sysctl -w kernel.sched_latency_ns={}", latency_ns / 2)],
        &["echo 'kernel.sched_latency_ns=<value>' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Shorter scheduling latency reduces tail wake-up delay under contention",
        format!("sched_latency_ns={latency_ns}, psi_avg10={:.1}", data.psi_avg10),
        "kernel/sched/fair.c sysctl documentation",
    ))
}

fn swappiness_reduction(report: &Report) -> Option<Recommendation> {
    let Payload::Memory(data) = find_payload(report, "memory")? else { return None };
    let swappiness = *data.vm_sysctls.get("swappiness")?;
    if swappiness <= 10 || data.swap_used_bytes == 0 {
        return None;
    }
    Some(rec(
        "memory",
        "Lower vm.swappiness",
        &["sysctl -w vm.swappiness=10"],
        &["echo 'vm.swappiness=10' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Keeps anonymous memory resident longer before reclaiming to swap",
        format!("swappiness={swappiness}, swap_used_bytes={}", data.swap_used_bytes),
        "Documentation/admin-guide/sysctl/vm.rst",
    ))
}

fn dirty_ratio_reduction(report: &Report) -> Option<Recommendation> {
    let Payload::Memory(data) = find_payload(report, "memory")? else { return None };
    let dirty_ratio = *data.vm_sysctls.get("dirty_ratio")?;
    if dirty_ratio <= 20 {
        return None;
    }
    Some(rec(
        "memory",
        "Lower vm.dirty_ratio",
        &["sysctl -w vm.dirty_ratio=10"],
        &["echo 'vm.dirty_ratio=10' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Smaller write-back batches reduce stall-inducing flush bursts",
        format!("dirty_ratio={dirty_ratio}"),
        "Documentation/admin-guide/sysctl/vm.rst",
    ))
}

fn overcommit_tightening(report: &Report) -> Option<Recommendation> {
    let Payload::Memory(data) = find_payload(report, "memory")? else { return None };
    let overcommit = *data.vm_sysctls.get("overcommit_memory")?;
    if overcommit != 1 {
        return None;
    }
    Some(rec(
        "memory",
        "Tighten vm.overcommit_memory",
        &["sysctl -w vm.overcommit_memory=2"],
        &["echo 'vm.overcommit_memory=2' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Strict accounting surfaces allocation failures instead of triggering the OOM killer later",
        format!("overcommit_memory={overcommit}"),
        "Documentation/admin-guide/sysctl/vm.rst",
    ))
}

fn bbr_enablement(report: &Report) -> Option<Recommendation> {
    let Payload::Network(data) = find_payload(report, "network")? else { return None };
    if data.congestion_control == "bbr" || data.congestion_control.is_empty() {
        return None;
    }
    Some(rec(
        "network",
        "Switch TCP congestion control to BBR",
        &["sysctl -w net.ipv4.tcp_congestion_control=bbr"],
        &["echo 'net.ipv4.tcp_congestion_control=bbr' >> /etc/sysctl.d/99-hostdiag.conf"],
        "BBR typically improves throughput on lossy or high-latency paths",
        format!("congestion_control={}", data.congestion_control),
        "RFC: BBR Congestion Control (IETF draft)",
    ))
}

fn tcp_buffer_enlargement(report: &Report) -> Option<Recommendation> {
    let Payload::Network(data) = find_payload(report, "network")? else { return None };
    const FOUR_MIB: u64 = 4 * 1024 * 1024;
    let max_of = |key: &str| -> u64 {
        data.tcp_sysctls.get(key).and_then(|v| v.split_whitespace().last()).and_then(|v| v.parse().ok()).unwrap_or(0)
    };
    if max_of("tcp_rmem") >= FOUR_MIB && max_of("tcp_wmem") >= FOUR_MIB {
        return None;
    }
    Some(rec(
        "network",
        "Enlarge TCP send/receive buffers",
        &["sysctl -w net.ipv4.tcp_rmem='4096 87380 4194304'", "sysctl -w net.ipv4.tcp_wmem='4096 65536 4194304'"],
        &["echo 'net.ipv4.tcp_rmem=4096 87380 4194304' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Larger buffers let throughput scale on high-bandwidth-delay-product links",
        format!("tcp_rmem={:?}, tcp_wmem={:?}", data.tcp_sysctls.get("tcp_rmem"), data.tcp_sysctls.get("tcp_wmem")),
        "Documentation/networking/ip-sysctl.rst",
    ))
}

fn tcp_time_wait_reuse(report: &Report) -> Option<Recommendation> {
    let Payload::Network(data) = find_payload(report, "network")? else { return None };
    if data.time_wait <= 1000 {
        return None;
    }
    Some(rec(
        "network",
        "Reduce TCP TIME_WAIT socket accumulation",
        &["sysctl -w net.ipv4.tcp_fin_timeout=15"],
        &["echo 'net.ipv4.tcp_fin_timeout=15' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Fewer lingering TIME_WAIT sockets frees ephemeral ports sooner",
        format!("time_wait={}", data.time_wait),
        "Documentation/networking/ip-sysctl.rst",
    ))
}

fn syn_backlog_enlargement(report: &Report) -> Option<Recommendation> {
    let Payload::Network(data) = find_payload(report, "network")? else { return None };
    let backlog: u64 = data.tcp_sysctls.get("tcp_max_syn_backlog").and_then(|v| v.parse().ok()).unwrap_or(0);
    if backlog == 0 || backlog >= 4096 {
        return None;
    }
    Some(rec(
        "network",
        "Enlarge the SYN backlog",
        &["sysctl -w net.ipv4.tcp_max_syn_backlog=4096"],
        &["echo 'net.ipv4.tcp_max_syn_backlog=4096' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Reduces dropped SYNs under connection-rate bursts",
        format!("tcp_max_syn_backlog={backlog}"),
        "Documentation/networking/ip-sysctl.rst",
    ))
}

fn disk_scheduler_recommendations(report: &Report) -> Vec<Recommendation> {
    let Some(Payload::Disk(data)) = find_payload(report, "disk") else { return Vec::new() };
    data.devices
        .iter()
        .filter_map(|device| {
            let (wanted, reason) = if device.rotational {
                ("bfq", "rotational disks benefit from BFQ's fairness-oriented scheduling")
            } else {
                ("mq-deadline", "non-rotational disks benefit from a low-overhead scheduler")
            };
            if device.scheduler == wanted || device.scheduler.is_empty() {
                return None;
            }
            Some(rec(
                "disk",
                &format!("Switch {} to the {wanted} I/O scheduler", device.device),
                &[&format!("echo {wanted} > /sys/block/{}/queue/scheduler", device.device)],
                &[&format!("echo 'ACTION==\"add\", KERNEL==\"{}\", ATTR{{queue/scheduler}}=\"{wanted}\"' >> /etc/udev/rules.d/60-hostdiag-scheduler.rules", device.device)],
                reason,
                format!("device={}, current_scheduler={}, rotational={}", device.device, device.scheduler, device.rotational),
                "Documentation/block/switching-sched.rst",
            ))
        })
        .collect()
}

fn thp_madvise(report: &Report) -> Option<Recommendation> {
    let Payload::Memory(data) = find_payload(report, "memory")? else { return None };
    if data.thp_mode.is_empty() || data.thp_mode == "madvise" || data.thp_mode == "never" {
        return None;
    }
    Some(rec(
        "memory",
        "Set transparent hugepages to madvise",
        &["echo madvise > /sys/kernel/mm/transparent_hugepage/enabled"],
        &["echo 'echo madvise > /sys/kernel/mm/transparent_hugepage/enabled' >> /etc/rc.local"],
        "Avoids THP compaction stalls for workloads that don't explicitly request hugepages",
        format!("thp_mode={}", data.thp_mode),
        "Documentation/admin-guide/mm/transhuge.rst",
    ))
}

fn min_free_kbytes_enlargement(report: &Report) -> Option<Recommendation> {
    let Payload::Memory(data) = find_payload(report, "memory")? else { return None };
    const SIXTEEN_GIB: u64 = 16 * 1024 * 1024 * 1024;
    if data.total_bytes <= SIXTEEN_GIB {
        return None;
    }
    let min_free_kbytes = *data.vm_sysctls.get("min_free_kbytes")?;
    if min_free_kbytes >= 262144 {
        return None;
    }
    Some(rec(
        "memory",
        "Enlarge vm.min_free_kbytes",
        &["sysctl -w vm.min_free_kbytes=262144"],
        &["echo 'vm.min_free_kbytes=262144' >> /etc/sysctl.d/99-hostdiag.conf"],
        "Larger systems need a bigger free-memory floor to avoid reclaim stalls",
        format!("total_bytes={}, min_free_kbytes={min_free_kbytes}", data.total_bytes),
        "Documentation/admin-guide/sysctl/vm.rst",
    ))
}

const SINGLE_RULES: &[Rule] = &[
    cpu_saturation_investigation,
    cfs_scheduler_latency_retune,
    swappiness_reduction,
    dirty_ratio_reduction,
    overcommit_tightening,
    bbr_enablement,
    tcp_buffer_enlargement,
    tcp_time_wait_reuse,
    syn_backlog_enlargement,
    thp_madvise,
    min_free_kbytes_enlargement,
];

/// Run every rule, stamping a monotonically increasing priority on
/// whatever fires, in pipeline order.
pub fn synthesize(report: &Report) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = SINGLE_RULES.iter().filter_map(|rule| rule(report)).collect();
    out.extend(disk_scheduler_recommendations(report));
    for (i, recommendation) in out.iter_mut().enumerate() {
        recommendation.priority = (i + 1) as u32;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdiag_model::{CollectResult, NetworkData, Tier};

    #[test]
    fn bbr_rule_fires_only_when_not_already_bbr() {
        let mut report = Report::default();
        let mut result = CollectResult::new("procfs-network", "network", Tier::Procfs);
        result.payload = Some(Payload::Network(NetworkData { congestion_control: "cubic".to_string(), ..Default::default() }));
        report.push_result(result);

        let recs = synthesize(&report);
        assert!(recs.iter().any(|r| r.title.contains("BBR")));
    }

    #[test]
    fn priorities_are_monotonically_increasing() {
        let mut report = Report::default();
        let mut result = CollectResult::new("procfs-network", "network", Tier::Procfs);
        result.payload = Some(Payload::Network(NetworkData { congestion_control: "cubic".to_string(), time_wait: 2000, ..Default::default() }));
        report.push_result(result);

        let recs = synthesize(&report);
        let priorities: Vec<u32> = recs.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable();
        assert_eq!(priorities, sorted);
        assert_eq!(priorities.first().copied(), Some(1));
    }
}
