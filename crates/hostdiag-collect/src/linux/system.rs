//! System collector: OS/kernel identity, mounted filesystems, block
//! device classification, and recent warn/err kernel log lines.

use std::time::Duration;

use hostdiag_exec::CancelToken;
use hostdiag_model::{
    Availability, BlockDeviceSummary, CollectConfig, CollectResult, Collector, FilesystemSummary, KernelLogLine,
    LogSeverity, Payload, Result, SystemData, Tier,
};

use super::procfs::{parse_f64_or_zero, parse_u64_or_zero, read_to_string_lossy};

const DMESG_LINE_CAP: usize = 50;
const ERROR_KEYWORDS: &[&str] = &["error", "fail", "oom", "panic", "segfault", "i/o error", "corrupt"];

fn read_os_name() -> String {
    let content = read_to_string_lossy(&std::path::PathBuf::from("/etc/os-release"));
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("PRETTY_NAME=") {
            return rest.trim_matches('"').to_string();
        }
    }
    std::env::consts::OS.to_string()
}

fn read_kernel_release(proc_root: &std::path::Path) -> String {
    read_to_string_lossy(&proc_root.join("sys/kernel/osrelease")).trim().to_string()
}

fn read_boot_params(proc_root: &std::path::Path) -> String {
    read_to_string_lossy(&proc_root.join("cmdline")).trim().to_string()
}

fn read_uptime(proc_root: &std::path::Path) -> u64 {
    let content = read_to_string_lossy(&proc_root.join("uptime"));
    content.split_whitespace().next().map(|s| parse_f64_or_zero(s) as u64).unwrap_or(0)
}

fn run_capture(tool: &str, args: &[&str]) -> String {
    let cancel = CancelToken::new();
    let owned: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    hostdiag_exec::run(tool, &owned, Duration::from_secs(5), &cancel, false, None)
        .map(|out| out.stdout)
        .unwrap_or_default()
}

/// `df -P -T` output: device, fs type, 1K-blocks, used, available, use%,
/// mounted-on - 7 whitespace-separated columns, mount point is column 7.
fn parse_df(output: &str) -> Vec<FilesystemSummary> {
    let mut out = Vec::new();
    for line in output.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 7 {
            continue;
        }
        let total_kb = parse_u64_or_zero(fields[2]);
        let used_kb = parse_u64_or_zero(fields[3]);
        out.push(FilesystemSummary {
            mount_point: fields[6].to_string(),
            fs_type: fields[1].to_string(),
            total_bytes: total_kb * 1024,
            used_bytes: used_kb * 1024,
        });
    }
    out
}

fn classify_block_devices(sys_root: &std::path::Path) -> Vec<BlockDeviceSummary> {
    let Ok(entries) = std::fs::read_dir(sys_root.join("block")) else { return Vec::new() };
    let mut out = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let rotational = parse_u64_or_zero(read_to_string_lossy(&entry.path().join("queue/rotational")).trim()) != 0;
        let model = read_to_string_lossy(&entry.path().join("device/model")).trim().to_string();
        out.push(BlockDeviceSummary { name, class: if rotational { "hdd" } else { "ssd" }.to_string(), model });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

fn classify_severity(line: &str) -> LogSeverity {
    let lower = line.to_lowercase();
    if ERROR_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        LogSeverity::Err
    } else {
        LogSeverity::Warn
    }
}

fn parse_dmesg(output: &str) -> Vec<KernelLogLine> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(DMESG_LINE_CAP)
        .map(|line| KernelLogLine { severity: classify_severity(line), message: line.to_string() })
        .collect()
}

/// system-identity and log collector.
pub struct SystemCollector;

impl Collector for SystemCollector {
    fn name(&self) -> &str {
        "procfs-system"
    }

    fn category(&self) -> &str {
        "system"
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        Availability::ok(Tier::ExternalTool)
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        collect(cfg)
    }
}

/// Single-point system collection. `df`/`dmesg` are run through the
/// sandboxed executor like any other external tool.
pub fn collect(cfg: &CollectConfig) -> Result<CollectResult> {
    let df_output = run_capture("df", &["-P", "-T"]);
    let dmesg_output = run_capture("dmesg", &["--level=err,warn", "-T", "--nopager"]);

    let data = SystemData {
        os_name: read_os_name(),
        kernel: read_kernel_release(&cfg.proc_root),
        uptime_secs: read_uptime(&cfg.proc_root),
        boot_params: read_boot_params(&cfg.proc_root),
        filesystems: parse_df(&df_output),
        block_devices: classify_block_devices(&cfg.sys_root),
        dmesg: parse_dmesg(&dmesg_output),
    };

    Ok(CollectResult::new("procfs-system", "system", Tier::ExternalTool).with_payload(Payload::System(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn df_parsing_picks_seventh_column_as_mount_point() {
        let output = "Filesystem     Type  1024-blocks    Used Available Capacity Mounted on\n\
                       /dev/sda1      ext4     10240000 2048000   7680000      21% /\n";
        let filesystems = parse_df(output);
        assert_eq!(filesystems.len(), 1);
        assert_eq!(filesystems[0].mount_point, "/");
        assert_eq!(filesystems[0].fs_type, "ext4");
        assert_eq!(filesystems[0].total_bytes, 10240000 * 1024);
    }

    #[test]
    fn dmesg_lines_capped_at_fifty() {
        let output = (0..100).map(|i| format!("line {i}\n")).collect::<String>();
        let lines = parse_dmesg(&output);
        assert_eq!(lines.len(), DMESG_LINE_CAP);
    }

    #[test]
    fn error_keyword_lines_classify_as_err() {
        assert_eq!(classify_severity("kernel: I/O error on device sda"), LogSeverity::Err);
        assert_eq!(classify_severity("kernel: clocksource jitter detected"), LogSeverity::Warn);
    }

    #[test]
    fn rotational_flag_drives_class_label() {
        let dir = tempfile::tempdir().unwrap();
        let sda_queue = dir.path().join("block/sda/queue");
        std::fs::create_dir_all(&sda_queue).unwrap();
        std::fs::write(sda_queue.join("rotational"), "0\n").unwrap();
        let devices = classify_block_devices(dir.path());
        assert_eq!(devices[0].class, "ssd");
    }
}
