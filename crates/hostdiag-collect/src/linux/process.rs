//! Process collector: enumerates `/proc/[0-9]+`, careful `comm`
//! parsing, fd counts, Top-by-CPU/Top-by-memory (I2, I6).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use hostdiag_exec::Ctx;
use hostdiag_model::{
    Availability, CollectConfig, CollectResult, Collector, PidTracker, Payload, ProcessData, ProcessEntry,
    ProcessState, Result, Tier,
};

use super::procfs::{delta_u64, parse_u64_or_zero};

const TOP_N: usize = 20;
/// `/proc/PID/stat` field index (1-based, after the `(comm)` group) of
/// utime, then stime two fields later.
const UTIME_OFFSET_AFTER_STATE: usize = 11;
const STIME_OFFSET_AFTER_STATE: usize = 12;
const RSS_OFFSET_AFTER_STATE: usize = 21;

struct RawProcStat {
    pid: i32,
    comm: String,
    state: char,
    utime: u64,
    stime: u64,
    rss_pages: u64,
}

/// Parse `/proc/PID/stat`, taking care with `comm`: it is delimited by
/// the first `(` and the *last* `)` since the command name itself can
/// contain spaces and parentheses.
fn parse_stat_line(pid: i32, content: &str) -> Option<RawProcStat> {
    let open = content.find('(')?;
    let close = content.rfind(')')?;
    if close <= open {
        return None;
    }
    let comm = content[open + 1..close].to_string();
    let rest = content[close + 1..].trim_start();
    let fields: Vec<&str> = rest.split_whitespace().collect();

    let state = fields.first().and_then(|f| f.chars().next()).unwrap_or('?');
    let get = |offset: usize| fields.get(offset).copied().map(parse_u64_or_zero).unwrap_or(0);

    Some(RawProcStat {
        pid,
        comm,
        state,
        utime: get(UTIME_OFFSET_AFTER_STATE),
        stime: get(STIME_OFFSET_AFTER_STATE),
        rss_pages: get(RSS_OFFSET_AFTER_STATE),
    })
}

fn count_fds(proc_root: &Path, pid: i32) -> u64 {
    fs::read_dir(proc_root.join(pid.to_string()).join("fd")).map(|entries| entries.count() as u64).unwrap_or(0)
}

fn read_cgroup(proc_root: &Path, pid: i32) -> Option<String> {
    let content = fs::read_to_string(proc_root.join(pid.to_string()).join("cgroup")).ok()?;
    content.lines().next().map(|l| l.rsplit(':').next().unwrap_or("").to_string())
}

fn list_pids(proc_root: &Path) -> Vec<i32> {
    let Ok(entries) = fs::read_dir(proc_root) else { return Vec::new() };
    entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_string_lossy().parse::<i32>().ok())
        .collect()
}

fn page_size_bytes() -> u64 {
    #[cfg(unix)]
    {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            return size as u64;
        }
    }
    4096
}

/// procfs-backed process collector.
pub struct ProcessCollector;

impl Collector for ProcessCollector {
    fn name(&self) -> &str {
        "procfs-process"
    }

    fn category(&self) -> &str {
        "process"
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        Availability::ok(Tier::Procfs)
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        let tracker = cfg.pid_tracker.clone().unwrap_or_default();
        collect(cfg, &Ctx::with_timeout(cfg.duration), &tracker)
    }
}

/// Two-point delta-sampled process collection. CPU percent is derived
/// from `(Δutime+Δstime) / (interval_secs * clk_tck)`.
pub fn collect(cfg: &CollectConfig, ctx: &Ctx, tracker: &PidTracker) -> Result<CollectResult> {
    let clk_tck = 100.0_f64; // USER_HZ on virtually every Linux distro hostdiag targets.
    let want_cgroup = !cfg.target_cgroups.is_empty();

    let before: HashMap<i32, RawProcStat> = list_pids(&cfg.proc_root)
        .into_iter()
        .filter_map(|pid| {
            let content = fs::read_to_string(cfg.proc_root.join(pid.to_string()).join("stat")).ok()?;
            parse_stat_line(pid, &content)
        })
        .map(|s| (s.pid, s))
        .collect();

    ctx.cancellable_sleep(cfg.effective_sample_interval());
    let interval_secs = cfg.effective_sample_interval().as_secs_f64().max(1e-9);

    let mut by_state: HashMap<String, u64> = HashMap::new();
    let mut total = 0u64;
    let mut entries = Vec::new();

    for pid in list_pids(&cfg.proc_root) {
        let Ok(content) = fs::read_to_string(cfg.proc_root.join(pid.to_string()).join("stat")) else { continue };
        let Some(after) = parse_stat_line(pid, &content) else { continue };
        total += 1;

        let state = ProcessState::from_code(after.state);
        *by_state.entry(format!("{state:?}").to_lowercase()).or_insert(0) += 1;

        let cpu_pct = match before.get(&pid) {
            Some(b) => {
                let delta_ticks = delta_u64(b.utime + b.stime, after.utime + after.stime);
                delta_ticks as f64 / clk_tck / interval_secs * 100.0
            }
            None => 0.0,
        };

        let cgroup = if want_cgroup { read_cgroup(&cfg.proc_root, pid) } else { None };
        let passes_pid_filter = cfg.target_pids.is_empty() || cfg.target_pids.contains(&pid);
        let passes_cgroup_filter = cfg.target_cgroups.is_empty()
            || cgroup.as_deref().map(|c| cfg.target_cgroups.iter().any(|t| c.contains(t.as_str()))).unwrap_or(false);
        let is_own = tracker.is_own_pid(pid);

        if passes_pid_filter && passes_cgroup_filter && !is_own {
            entries.push(ProcessEntry {
                pid,
                comm: after.comm.clone(),
                state,
                cpu_pct,
                rss_bytes: after.rss_pages * page_size_bytes(),
                fd_count: count_fds(&cfg.proc_root, pid),
                cgroup,
            });
        }
    }

    let mut top_by_cpu = entries.clone();
    top_by_cpu.sort_by(|a, b| b.cpu_pct.partial_cmp(&a.cpu_pct).unwrap_or(std::cmp::Ordering::Equal));
    top_by_cpu.truncate(TOP_N);

    let mut top_by_memory = entries;
    top_by_memory.sort_by(|a, b| b.rss_bytes.cmp(&a.rss_bytes));
    top_by_memory.truncate(TOP_N);

    let data = ProcessData { total, by_state, top_by_cpu, top_by_memory };
    Ok(CollectResult::new("procfs-process", "process", Tier::Procfs).with_payload(Payload::Process(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comm_parsing_handles_spaces_and_parens() {
        let stat = "1234 (my (weird) proc) S 1 1234 1234 0 -1 4194304 100 0 0 0 10 5 0 0 20 0 1 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0";
        let parsed = parse_stat_line(1234, stat).unwrap();
        assert_eq!(parsed.comm, "my (weird) proc");
        assert_eq!(parsed.state, 'S');
    }

    #[test]
    fn top_lists_are_independent_containers() {
        let entries = vec![
            ProcessEntry { pid: 1, comm: "a".into(), state: ProcessState::Running, cpu_pct: 10.0, rss_bytes: 100, fd_count: 0, cgroup: None },
            ProcessEntry { pid: 2, comm: "b".into(), state: ProcessState::Running, cpu_pct: 50.0, rss_bytes: 10, fd_count: 0, cgroup: None },
        ];
        let mut top_by_cpu = entries.clone();
        top_by_cpu.sort_by(|a, b| b.cpu_pct.partial_cmp(&a.cpu_pct).unwrap());
        let mut top_by_memory = entries;
        top_by_memory.sort_by(|a, b| b.rss_bytes.cmp(&a.rss_bytes));

        assert_eq!(top_by_cpu[0].pid, 2);
        assert_eq!(top_by_memory[0].pid, 1);
    }
}
