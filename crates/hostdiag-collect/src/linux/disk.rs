//! Disk collector: `/proc/diskstats` with partition/virtual-device
//! filtering (Q2), sysfs scheduler/queue-depth/rotational enrichment,
//! I/O-PSI.

use std::collections::HashMap;
use std::path::Path;

use hostdiag_exec::Ctx;
use hostdiag_model::{Availability, CollectConfig, CollectResult, Collector, DiskData, DiskDevice, Payload, Result, Tier};

use super::procfs::{delta_u64, parse_active_scheduler, parse_u64_or_zero, read_pressure_some, read_to_string_lossy};

const SECTOR_BYTES: u64 = 512;

#[derive(Default, Clone, Copy)]
struct DiskRaw {
    read_ops: u64,
    read_sectors: u64,
    write_ops: u64,
    write_sectors: u64,
    in_flight: u64,
    io_time_ms: u64,
    weighted_io_time_ms: u64,
}

fn is_loop_ram_or_dm(name: &str) -> bool {
    name.starts_with("loop") || name.starts_with("ram") || name.starts_with("dm-")
}

/// `^(sd[a-z]+|hd[a-z]+|vd[a-z]+)\d+$`: a letter-prefixed disk name
/// followed by a trailing digit run, i.e. a partition of that disk.
fn matches_lettered_partition(name: &str) -> bool {
    for prefix in ["sd", "hd", "vd"] {
        let Some(rest) = name.strip_prefix(prefix) else { continue };
        let Some(split_at) = rest.find(|c: char| c.is_ascii_digit()) else { continue };
        let (letters, digits) = rest.split_at(split_at);
        if split_at > 0 && letters.chars().all(|c| c.is_ascii_lowercase()) && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return true;
        }
    }
    false
}

/// `^nvme\d+n\d+p\d+$`.
fn matches_nvme_partition(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("nvme") else { return false };
    let Some(n_pos) = rest.find('n') else { return false };
    let (digits1, after_n) = rest.split_at(n_pos);
    if digits1.is_empty() || !digits1.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let after_n = &after_n[1..];
    let Some(p_pos) = after_n.find('p') else { return false };
    let (digits2, after_p) = after_n.split_at(p_pos);
    let after_p = &after_p[1..];
    !digits2.is_empty() && digits2.chars().all(|c| c.is_ascii_digit()) && !after_p.is_empty() && after_p.chars().all(|c| c.is_ascii_digit())
}

/// `^mmcblk\d+p\d+$`.
fn matches_mmcblk_partition(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("mmcblk") else { return false };
    let Some(p_pos) = rest.find('p') else { return false };
    let (digits1, after_p) = rest.split_at(p_pos);
    let after_p = &after_p[1..];
    !digits1.is_empty() && digits1.chars().all(|c| c.is_ascii_digit()) && !after_p.is_empty() && after_p.chars().all(|c| c.is_ascii_digit())
}

fn is_partition(name: &str) -> bool {
    matches_lettered_partition(name) || matches_nvme_partition(name) || matches_mmcblk_partition(name)
}

fn should_keep_device(name: &str) -> bool {
    !is_loop_ram_or_dm(name) && !is_partition(name)
}

fn read_diskstats(proc_root: &Path) -> HashMap<String, DiskRaw> {
    let content = read_to_string_lossy(&proc_root.join("diskstats"));
    let mut out = HashMap::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 14 {
            continue;
        }
        let name = fields[2].to_string();
        if !should_keep_device(&name) {
            continue;
        }
        out.insert(
            name,
            DiskRaw {
                read_ops: parse_u64_or_zero(fields[3]),
                read_sectors: parse_u64_or_zero(fields[5]),
                write_ops: parse_u64_or_zero(fields[7]),
                write_sectors: parse_u64_or_zero(fields[9]),
                in_flight: parse_u64_or_zero(fields[11]),
                io_time_ms: parse_u64_or_zero(fields[12]),
                weighted_io_time_ms: parse_u64_or_zero(fields[13]),
            },
        );
    }
    out
}

fn sysfs_enrich(sys_root: &Path, device: &str) -> (String, u64, bool, u64) {
    let base = sys_root.join("block").join(device).join("queue");
    let scheduler = parse_active_scheduler(&read_to_string_lossy(&base.join("scheduler")));
    let nr_requests = parse_u64_or_zero(read_to_string_lossy(&base.join("nr_requests")).trim());
    let rotational = parse_u64_or_zero(read_to_string_lossy(&base.join("rotational")).trim()) != 0;
    let read_ahead_kb = parse_u64_or_zero(read_to_string_lossy(&base.join("read_ahead_kb")).trim());
    (scheduler, nr_requests, rotational, read_ahead_kb)
}

/// procfs-backed disk collector.
pub struct DiskCollector;

impl Collector for DiskCollector {
    fn name(&self) -> &str {
        "procfs-disk"
    }

    fn category(&self) -> &str {
        "disk"
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        Availability::ok(Tier::Procfs)
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        collect(cfg, &Ctx::with_timeout(cfg.duration))
    }
}

/// Two-point delta-sampled disk collection.
pub fn collect(cfg: &CollectConfig, ctx: &Ctx) -> Result<CollectResult> {
    let before = read_diskstats(&cfg.proc_root);
    ctx.cancellable_sleep(cfg.effective_sample_interval());
    let after = read_diskstats(&cfg.proc_root);

    let mut devices: Vec<DiskDevice> = after
        .iter()
        .map(|(name, a)| {
            let b = before.get(name).copied().unwrap_or_default();
            let read_ops = delta_u64(b.read_ops, a.read_ops);
            let write_ops = delta_u64(b.write_ops, a.write_ops);
            let io_time_ms = delta_u64(b.io_time_ms, a.io_time_ms);
            let weighted_io_time_ms = delta_u64(b.weighted_io_time_ms, a.weighted_io_time_ms);
            let denom = read_ops + write_ops;
            let avg_latency_ms = if denom > 0 { weighted_io_time_ms as f64 / denom as f64 } else { 0.0 };
            let (scheduler, queue_depth, rotational, read_ahead_kb) = sysfs_enrich(&cfg.sys_root, name);

            DiskDevice {
                device: name.clone(),
                read_ops,
                write_ops,
                read_bytes: delta_u64(b.read_sectors, a.read_sectors) * SECTOR_BYTES,
                write_bytes: delta_u64(b.write_sectors, a.write_sectors) * SECTOR_BYTES,
                in_flight: a.in_flight,
                io_time_ms,
                weighted_io_time_ms,
                avg_latency_ms,
                scheduler,
                queue_depth,
                rotational,
                read_ahead_kb,
            }
        })
        .collect();
    devices.sort_by(|a, b| a.device.cmp(&b.device));

    let (psi_some_avg10, psi_some_avg60) = read_pressure_some(&cfg.proc_path("/pressure/io"));

    let data = DiskData { devices, psi_some_avg10, psi_some_avg60 };
    Ok(CollectResult::new("procfs-disk", "disk", Tier::Procfs).with_payload(Payload::Disk(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s2_filters_to_whole_disks() {
        let names = ["sda", "sda1", "nvme0n1", "nvme0n1p1", "loop0", "dm-0"];
        let kept: Vec<&str> = names.iter().copied().filter(|n| should_keep_device(n)).collect();
        assert_eq!(kept, vec!["sda", "nvme0n1"]);
    }

    #[test]
    fn bytes_are_sectors_times_512() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("diskstats"),
            "8 0 sda 10 0 2000 0 5 0 1000 0 0 0 0\n",
        )
        .unwrap();
        let before = read_diskstats(dir.path());
        std::fs::write(
            dir.path().join("diskstats"),
            "8 0 sda 20 0 4000 0 10 0 2000 0 0 0 0\n",
        )
        .unwrap();
        let after = read_diskstats(dir.path());
        let b = before["sda"];
        let a = after["sda"];
        assert_eq!(delta_u64(b.read_sectors, a.read_sectors) * SECTOR_BYTES, 2000 * 512);
    }

    #[test]
    fn avg_latency_is_zero_when_no_ops() {
        let device = DiskDevice {
            device: "sda".into(),
            read_ops: 0,
            write_ops: 0,
            read_bytes: 0,
            write_bytes: 0,
            in_flight: 0,
            io_time_ms: 0,
            weighted_io_time_ms: 500,
            avg_latency_ms: 0.0,
            scheduler: String::new(),
            queue_depth: 0,
            rotational: false,
            read_ahead_kb: 0,
        };
        assert_eq!(device.avg_latency_ms, 0.0);
    }
}
