//! Memory collector: `/proc/meminfo`, `/proc/vmstat`, `vm.*` sysctls,
//! THP mode, memory-PSI, NUMA/buddy info.

use std::collections::HashMap;
use std::path::Path;

use hostdiag_model::{Availability, CollectConfig, CollectResult, Collector, MemoryData, NumaNode, Payload, Result, Tier};

use super::procfs::{
    parse_bracketed_choice, parse_colon_table, parse_u64_or_zero, read_pressure_full, read_pressure_some,
    read_to_string_lossy,
};

const VM_SYSCTLS: &[&str] = &["swappiness", "dirty_ratio", "dirty_background_ratio", "overcommit_memory", "min_free_kbytes"];

/// Counters reported in kB by `/proc/meminfo` (scaled to bytes), except
/// the HugePages counters which are dimensionless page counts.
const KB_SCALE: u64 = 1024;

fn meminfo_bytes(table: &HashMap<String, u64>, key: &str) -> u64 {
    table.get(key).copied().unwrap_or(0).saturating_mul(KB_SCALE)
}

fn read_vmstat(proc_root: &Path) -> (u64, u64) {
    let content = read_to_string_lossy(&proc_root.join("vmstat"));
    let mut major = 0;
    let mut minor = 0;
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("pgmajfault") => major = parts.next().map(parse_u64_or_zero).unwrap_or(0),
            Some("pgfault") => minor = parts.next().map(parse_u64_or_zero).unwrap_or(0),
            _ => {}
        }
    }
    (major, minor)
}

fn read_vm_sysctls(proc_root: &Path) -> HashMap<String, u64> {
    let mut out = HashMap::new();
    for name in VM_SYSCTLS {
        let raw = read_to_string_lossy(&proc_root.join(format!("sys/vm/{name}")));
        out.insert((*name).to_string(), parse_u64_or_zero(raw.trim()));
    }
    out
}

fn read_thp_mode(sys_root: &Path) -> String {
    let content = read_to_string_lossy(&sys_root.join("kernel/mm/transparent_hugepage/enabled"));
    if content.is_empty() {
        return String::new();
    }
    parse_bracketed_choice(&content)
}

fn read_buddyinfo(proc_root: &Path) -> HashMap<String, Vec<u64>> {
    let content = read_to_string_lossy(&proc_root.join("buddyinfo"));
    let mut out = HashMap::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        // "Node 0, zone   Normal  1  2  3 ..."
        if fields.len() < 5 {
            continue;
        }
        let zone = fields[3].to_string();
        let counts: Vec<u64> = fields[4..].iter().map(|f| parse_u64_or_zero(f)).collect();
        out.insert(zone, counts);
    }
    out
}

fn read_numa_nodes(sys_root: &Path) -> HashMap<u32, NumaNode> {
    let mut out = HashMap::new();
    let nodes_dir = sys_root.join("devices/system/node");
    let Ok(entries) = std::fs::read_dir(&nodes_dir) else { return out };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let Some(id_str) = name.strip_prefix("node") else { continue };
        let Ok(id) = id_str.parse::<u32>() else { continue };

        let meminfo = read_to_string_lossy(&entry.path().join("meminfo"));
        let mut total_bytes = 0;
        let mut free_bytes = 0;
        for line in meminfo.lines() {
            if let Some(rest) = line.split("MemTotal:").nth(1) {
                total_bytes = parse_u64_or_zero(rest.split_whitespace().next().unwrap_or("0")) * KB_SCALE;
            } else if let Some(rest) = line.split("MemFree:").nth(1) {
                free_bytes = parse_u64_or_zero(rest.split_whitespace().next().unwrap_or("0")) * KB_SCALE;
            }
        }

        let numastat = read_to_string_lossy(&entry.path().join("numastat"));
        let mut numa_hit = 0;
        let mut numa_miss = 0;
        for line in numastat.lines() {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("numa_hit") => numa_hit = parts.next().map(parse_u64_or_zero).unwrap_or(0),
                Some("numa_miss") => numa_miss = parts.next().map(parse_u64_or_zero).unwrap_or(0),
                _ => {}
            }
        }

        out.insert(id, NumaNode { total_bytes, free_bytes, numa_hit, numa_miss });
    }
    out
}

/// procfs-backed memory collector.
pub struct MemoryCollector;

impl Collector for MemoryCollector {
    fn name(&self) -> &str {
        "procfs-memory"
    }

    fn category(&self) -> &str {
        "memory"
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        Availability::ok(Tier::Procfs)
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        collect(cfg)
    }
}

/// Single-point memory collection (no delta sampling needed - every
/// field is an instantaneous gauge, not a counter).
pub fn collect(cfg: &CollectConfig) -> Result<CollectResult> {
    let meminfo = parse_colon_table(&read_to_string_lossy(&cfg.proc_root.join("meminfo")));
    let (major_faults, minor_faults) = read_vmstat(&cfg.proc_root);
    let (psi_some_avg10, psi_some_avg60) = read_pressure_some(&cfg.proc_path("/pressure/memory"));
    let (psi_full_avg10, psi_full_avg60) = read_pressure_full(&cfg.proc_path("/pressure/memory"));

    let data = MemoryData {
        total_bytes: meminfo_bytes(&meminfo, "MemTotal"),
        free_bytes: meminfo_bytes(&meminfo, "MemFree"),
        available_bytes: meminfo_bytes(&meminfo, "MemAvailable"),
        cached_bytes: meminfo_bytes(&meminfo, "Cached"),
        buffers_bytes: meminfo_bytes(&meminfo, "Buffers"),
        swap_total_bytes: meminfo_bytes(&meminfo, "SwapTotal"),
        swap_used_bytes: meminfo_bytes(&meminfo, "SwapTotal").saturating_sub(meminfo_bytes(&meminfo, "SwapFree")),
        major_faults,
        minor_faults,
        vm_sysctls: read_vm_sysctls(&cfg.proc_root),
        thp_mode: read_thp_mode(&cfg.sys_root),
        psi_some_avg10,
        psi_some_avg60,
        psi_full_avg10,
        psi_full_avg60,
        buddy_info: read_buddyinfo(&cfg.proc_root),
        numa_nodes: read_numa_nodes(&cfg.sys_root),
    };

    Ok(CollectResult::new("procfs-memory", "memory", Tier::Procfs).with_payload(Payload::Memory(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn meminfo_kb_fields_scale_to_bytes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("meminfo"), "MemTotal:       16384 kB\nMemFree:         1024 kB\n").unwrap();
        fs::write(dir.path().join("vmstat"), "").unwrap();

        let mut cfg = CollectConfig::default();
        cfg.proc_root = dir.path().to_path_buf();
        cfg.sys_root = dir.path().to_path_buf();

        let result = collect(&cfg).unwrap();
        let Some(Payload::Memory(data)) = result.payload else { panic!("expected memory payload") };
        assert_eq!(data.total_bytes, 16384 * 1024);
        assert_eq!(data.free_bytes, 1024 * 1024);
    }

    #[test]
    fn missing_meminfo_yields_zeroed_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = CollectConfig::default();
        cfg.proc_root = dir.path().to_path_buf();
        cfg.sys_root = dir.path().to_path_buf();

        let result = collect(&cfg).unwrap();
        let Some(Payload::Memory(data)) = result.payload else { panic!("expected memory payload") };
        assert_eq!(data.total_bytes, 0);
    }

    #[test]
    fn thp_mode_extracts_bracketed_token() {
        let dir = tempfile::tempdir().unwrap();
        let thp_dir = dir.path().join("kernel/mm/transparent_hugepage");
        fs::create_dir_all(&thp_dir).unwrap();
        fs::write(thp_dir.join("enabled"), "always [madvise] never\n").unwrap();
        assert_eq!(read_thp_mode(dir.path()), "madvise");
    }
}
