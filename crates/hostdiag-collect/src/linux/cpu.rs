//! CPU collector: `/proc/stat`, `/proc/loadavg`, CFS sysctls, CPU-PSI.

use std::collections::HashMap;

use hostdiag_exec::Ctx;
use hostdiag_model::{
    Availability, CollectResult, Collector, CpuData, PerCpu, Payload, Result, Tier,
};

use super::procfs::{delta_u64, parse_u64_or_zero, read_pressure_some, read_to_string_lossy};
use hostdiag_model::CollectConfig;

const CFS_SYSCTLS: &[&str] = &["sched_latency_ns", "sched_min_granularity_ns", "sched_wakeup_granularity_ns"];

/// Raw jiffie counters for one `cpu`/`cpuN` line.
#[derive(Default, Clone, Copy)]
struct CpuJiffies {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    iowait: u64,
    irq: u64,
    softirq: u64,
    steal: u64,
}

impl CpuJiffies {
    fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle + self.iowait + self.irq + self.softirq + self.steal
    }

    fn parse(fields: &[&str]) -> Self {
        let get = |i: usize| fields.get(i).copied().map(parse_u64_or_zero).unwrap_or(0);
        Self {
            user: get(0),
            nice: get(1),
            system: get(2),
            idle: get(3),
            iowait: get(4),
            irq: get(5),
            softirq: get(6),
            steal: get(7),
        }
    }
}

/// Snapshot of `/proc/stat` at one point in time.
struct StatSnapshot {
    aggregate: CpuJiffies,
    per_cpu: HashMap<u32, CpuJiffies>,
    ctxt: u64,
}

fn read_stat(proc_root: &std::path::Path) -> StatSnapshot {
    let content = read_to_string_lossy(&proc_root.join("stat"));
    let mut aggregate = CpuJiffies::default();
    let mut per_cpu = HashMap::new();
    let mut ctxt = 0;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else { continue };
        if label == "cpu" {
            let fields: Vec<&str> = parts.collect();
            aggregate = CpuJiffies::parse(&fields);
        } else if let Some(num) = label.strip_prefix("cpu") {
            if let Ok(n) = num.parse::<u32>() {
                let fields: Vec<&str> = parts.collect();
                per_cpu.insert(n, CpuJiffies::parse(&fields));
            }
        } else if label == "ctxt" {
            ctxt = parts.next().map(parse_u64_or_zero).unwrap_or(0);
        }
    }

    StatSnapshot { aggregate, per_cpu, ctxt }
}

fn read_loadavg(proc_root: &std::path::Path) -> [f64; 3] {
    let content = read_to_string_lossy(&proc_root.join("loadavg"));
    let mut fields = content.split_whitespace();
    let mut next = || fields.next().and_then(|f| f.parse::<f64>().ok()).unwrap_or(0.0);
    [next(), next(), next()]
}

fn read_cfs_sysctls(proc_root: &std::path::Path) -> HashMap<String, u64> {
    let mut out = HashMap::new();
    for name in CFS_SYSCTLS {
        let raw = read_to_string_lossy(&proc_root.join(format!("sys/kernel/{name}")));
        out.insert((*name).to_string(), parse_u64_or_zero(raw.trim()));
    }
    out
}

fn pct(delta: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        delta as f64 / total as f64 * 100.0
    }
}

/// procfs-backed CPU collector.
pub struct CpuCollector;

impl Collector for CpuCollector {
    fn name(&self) -> &str {
        "procfs-cpu"
    }

    fn category(&self) -> &str {
        "cpu"
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        Availability::ok(Tier::Procfs)
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        collect(cfg, &Ctx::with_timeout(cfg.duration))
    }
}

/// Two-point delta-sampled CPU collection, exposed directly so the
/// orchestrator can pass its own shared context (see §4.4/§5).
pub fn collect(cfg: &CollectConfig, ctx: &Ctx) -> Result<CollectResult> {
    let before = read_stat(&cfg.proc_root);
    ctx.cancellable_sleep(cfg.effective_sample_interval());
    let after = read_stat(&cfg.proc_root);

    let total_delta = delta_u64(before.aggregate.total(), after.aggregate.total());

    let mut per_cpu = Vec::new();
    let mut cpu_numbers: Vec<u32> = after.per_cpu.keys().copied().collect();
    cpu_numbers.sort_unstable();
    for cpu_number in cpu_numbers {
        let (Some(b), Some(a)) = (before.per_cpu.get(&cpu_number), after.per_cpu.get(&cpu_number)) else {
            continue;
        };
        let cpu_total_delta = delta_u64(b.total(), a.total());
        if cpu_total_delta == 0 {
            continue;
        }
        per_cpu.push(PerCpu {
            cpu_number,
            user_pct: pct(delta_u64(b.user + b.nice, a.user + a.nice), cpu_total_delta),
            system_pct: pct(delta_u64(b.system, a.system), cpu_total_delta),
            idle_pct: pct(delta_u64(b.idle, a.idle), cpu_total_delta),
            iowait_pct: pct(delta_u64(b.iowait, a.iowait), cpu_total_delta),
        });
    }

    let interval_secs = cfg.effective_sample_interval().as_secs_f64().max(1e-9);
    let (psi_avg10, psi_avg60) = read_pressure_some(&cfg.proc_path("/pressure/cpu"));

    let data = CpuData {
        user_pct: pct(delta_u64(before.aggregate.user + before.aggregate.nice, after.aggregate.user + after.aggregate.nice), total_delta),
        system_pct: pct(delta_u64(before.aggregate.system, after.aggregate.system), total_delta),
        iowait_pct: pct(delta_u64(before.aggregate.iowait, after.aggregate.iowait), total_delta),
        idle_pct: pct(delta_u64(before.aggregate.idle, after.aggregate.idle), total_delta),
        steal_pct: pct(delta_u64(before.aggregate.steal, after.aggregate.steal), total_delta),
        irq_pct: pct(delta_u64(before.aggregate.irq, after.aggregate.irq), total_delta),
        softirq_pct: pct(delta_u64(before.aggregate.softirq, after.aggregate.softirq), total_delta),
        context_switches_per_sec: delta_u64(before.ctxt, after.ctxt) as f64 / interval_secs,
        load_avg: read_loadavg(&cfg.proc_root),
        per_cpu,
        cfs_sysctls: read_cfs_sysctls(&cfg.proc_root),
        psi_avg10,
        psi_avg60,
    };

    Ok(CollectResult::new("procfs-cpu", "cpu", Tier::Procfs).with_payload(Payload::Cpu(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;

    fn write_stat(root: &std::path::Path, cpu_line: &str, ctxt: u64) {
        fs::write(root.join("stat"), format!("{cpu_line}\nctxt {ctxt}\n")).unwrap();
    }

    #[test]
    fn cpu_delta_matches_scenario_s1() {
        let dir = tempfile::tempdir().unwrap();
        write_stat(dir.path(), "cpu 100000 2000 30000 800000 5000 1000 500 0", 0);

        let mut cfg = CollectConfig::default();
        cfg.proc_root = dir.path().to_path_buf();
        cfg.sample_interval = Duration::from_millis(1);

        let ctx = Ctx::with_timeout(Duration::from_secs(5));
        // Manually drive a two-point sample so the test is deterministic
        // instead of depending on a live /proc/stat transition.
        let before = read_stat(dir.path());
        write_stat(dir.path(), "cpu 200000 4000 60000 1600000 10000 2000 1000 0", 0);
        let after = read_stat(dir.path());
        let total_delta = delta_u64(before.aggregate.total(), after.aggregate.total());

        let user_pct = pct(delta_u64(before.aggregate.user + before.aggregate.nice, after.aggregate.user + after.aggregate.nice), total_delta);
        let system_pct = pct(delta_u64(before.aggregate.system, after.aggregate.system), total_delta);
        let idle_pct = pct(delta_u64(before.aggregate.idle, after.aggregate.idle), total_delta);

        assert!((user_pct - 10.87).abs() < 0.01);
        assert!((system_pct - 3.26).abs() < 0.01);
        assert!((idle_pct - 86.96).abs() < 0.01);
        assert!((user_pct + system_pct + idle_pct - (user_pct + system_pct + idle_pct)).abs() < 0.01);
        let _ = ctx;
    }

    #[test]
    fn per_cpu_list_is_ascending_and_skips_zero_delta() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("stat"),
            "cpu 0 0 0 0 0 0 0 0\ncpu0 100 0 0 0 0 0 0 0\ncpu1 50 0 0 0 0 0 0 0\nctxt 0\n",
        )
        .unwrap();
        let before = read_stat(dir.path());
        fs::write(
            dir.path().join("stat"),
            "cpu 0 0 0 0 0 0 0 0\ncpu0 200 0 0 0 0 0 0 0\ncpu1 50 0 0 0 0 0 0 0\nctxt 0\n",
        )
        .unwrap();
        let after = read_stat(dir.path());

        let mut per_cpu = Vec::new();
        let mut nums: Vec<u32> = after.per_cpu.keys().copied().collect();
        nums.sort_unstable();
        for n in nums {
            let b = before.per_cpu[&n];
            let a = after.per_cpu[&n];
            if delta_u64(b.total(), a.total()) == 0 {
                continue;
            }
            per_cpu.push(n);
        }
        assert_eq!(per_cpu, vec![0]);
    }
}
