//! Typed per-category data records.
//!
//! Field-for-field shaped after the flat, plain-data structs
//! in `probe-metrics` (`SystemCPU`, `SystemMemory`, `DiskUsage`,
//! `NetInterface`, `ProcessMetrics`, ...): no methods beyond small
//! derived getters, everything `pub`, `serde`-derivable so an external
//! sink can serialize a `Report` without a translation layer.

use serde::Serialize;

/// Per-CPU jiffie-derived utilization, ordered ascending by `cpu_number` (I3).
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerCpu {
    /// Zero-based CPU index.
    pub cpu_number: u32,
    /// Percent of the interval spent in user mode (includes nice).
    pub user_pct: f64,
    /// Percent of the interval spent in kernel mode.
    pub system_pct: f64,
    /// Percent of the interval spent idle.
    pub idle_pct: f64,
    /// Percent of the interval spent waiting on I/O.
    pub iowait_pct: f64,
}

/// Aggregate CPU data record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuData {
    /// Percent of the interval spent in user mode (includes nice).
    pub user_pct: f64,
    /// Percent of the interval spent in kernel mode.
    pub system_pct: f64,
    /// Percent of the interval spent waiting on I/O.
    pub iowait_pct: f64,
    /// Percent of the interval spent idle.
    pub idle_pct: f64,
    /// Percent of the interval stolen by the hypervisor.
    pub steal_pct: f64,
    /// Percent of the interval spent servicing hardware interrupts.
    pub irq_pct: f64,
    /// Percent of the interval spent servicing software interrupts.
    pub softirq_pct: f64,
    /// Context switches per second over the sample interval.
    pub context_switches_per_sec: f64,
    /// 1/5/15 minute load averages.
    pub load_avg: [f64; 3],
    /// Per-CPU breakdown, ascending by `cpu_number` (I3).
    pub per_cpu: Vec<PerCpu>,
    /// `kernel.sched_*` CFS scheduler sysctls, by short name.
    pub cfs_sysctls: std::collections::HashMap<String, u64>,
    /// CPU pressure `avg10`.
    pub psi_avg10: f64,
    /// CPU pressure `avg60`.
    pub psi_avg60: f64,
}

/// Memory data record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryData {
    /// Total physical memory, bytes.
    pub total_bytes: u64,
    /// Free memory, bytes.
    pub free_bytes: u64,
    /// Estimate of memory available for new allocations, bytes.
    pub available_bytes: u64,
    /// Page cache, bytes.
    pub cached_bytes: u64,
    /// Buffer cache, bytes.
    pub buffers_bytes: u64,
    /// Total swap, bytes.
    pub swap_total_bytes: u64,
    /// Used swap, bytes.
    pub swap_used_bytes: u64,
    /// Cumulative major page faults.
    pub major_faults: u64,
    /// Cumulative minor page faults.
    pub minor_faults: u64,
    /// `vm.*` sysctls, by short name.
    pub vm_sysctls: std::collections::HashMap<String, u64>,
    /// Transparent Huge Pages active mode (e.g. `"madvise"`).
    pub thp_mode: String,
    /// Memory pressure `some.avg10`.
    pub psi_some_avg10: f64,
    /// Memory pressure `some.avg60`.
    pub psi_some_avg60: f64,
    /// Memory pressure `full.avg10`.
    pub psi_full_avg10: f64,
    /// Memory pressure `full.avg60`.
    pub psi_full_avg60: f64,
    /// Free pages per NUMA zone/order from `/proc/buddyinfo`.
    pub buddy_info: std::collections::HashMap<String, Vec<u64>>,
    /// Per-NUMA-node memory/numastat summaries, keyed by node id.
    pub numa_nodes: std::collections::HashMap<u32, NumaNode>,
}

/// One NUMA node's memory summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NumaNode {
    /// Total memory on this node, bytes.
    pub total_bytes: u64,
    /// Free memory on this node, bytes.
    pub free_bytes: u64,
    /// Local node allocation hits.
    pub numa_hit: u64,
    /// Allocations that missed the preferred node.
    pub numa_miss: u64,
}

/// One block device's delta-sampled I/O stats.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiskDevice {
    /// Device name, e.g. `"sda"`.
    pub device: String,
    /// Completed read operations over the interval.
    pub read_ops: u64,
    /// Completed write operations over the interval.
    pub write_ops: u64,
    /// Bytes read over the interval.
    pub read_bytes: u64,
    /// Bytes written over the interval.
    pub write_bytes: u64,
    /// I/Os currently in flight (instantaneous, not a delta).
    pub in_flight: u64,
    /// Milliseconds spent doing I/O over the interval.
    pub io_time_ms: u64,
    /// Weighted milliseconds spent doing I/O over the interval.
    pub weighted_io_time_ms: u64,
    /// `weighted_io_time_ms / (read_ops + write_ops)`, 0 if no ops.
    pub avg_latency_ms: f64,
    /// I/O scheduler in effect, extracted from the `[active]` marker.
    pub scheduler: String,
    /// Configured queue depth (`nr_requests`).
    pub queue_depth: u64,
    /// Whether the device reports itself as rotational (HDD).
    pub rotational: bool,
    /// Configured read-ahead, KiB.
    pub read_ahead_kb: u64,
}

/// Disk data record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiskData {
    /// Per-device stats, in collector encounter order.
    pub devices: Vec<DiskDevice>,
    /// I/O pressure `some.avg10`.
    pub psi_some_avg10: f64,
    /// I/O pressure `some.avg60`.
    pub psi_some_avg60: f64,
}

/// One network interface's delta-sampled counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetInterface {
    /// Interface name, e.g. `"eth0"`.
    pub name: String,
    /// Bytes received over the interval.
    pub rx_bytes: u64,
    /// Bytes transmitted over the interval.
    pub tx_bytes: u64,
    /// Packets received over the interval.
    pub rx_packets: u64,
    /// Packets transmitted over the interval.
    pub tx_packets: u64,
    /// `Δ(rx_err+tx_err+rx_drop+tx_drop) / interval`.
    pub errors_per_sec: f64,
}

/// Network data record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkData {
    /// Per-interface counters.
    pub interfaces: Vec<NetInterface>,
    /// `Δretrans_segs / interval`, clamped non-negative (I1).
    pub retrans_rate: f64,
    /// Connections in `TIME_WAIT`.
    pub time_wait: u64,
    /// Connections in `CLOSE_WAIT`.
    pub close_wait: u64,
    /// `net.ipv4.tcp_rmem`/`tcp_wmem`/etc sysctls, by short name.
    pub tcp_sysctls: std::collections::HashMap<String, String>,
    /// Active congestion-control algorithm name.
    pub congestion_control: String,
    /// Cumulative TCP `InErrs` from `/proc/net/snmp`.
    pub tcp_in_errs: u64,
}

/// Process scheduling state, mirroring the single-letter procfs code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ProcessState {
    /// `R` - running or runnable.
    Running,
    /// `S` - interruptible sleep.
    Sleeping,
    /// `D` - uninterruptible sleep (usually I/O).
    DiskSleep,
    /// `Z` - zombie, awaiting reap.
    Zombie,
    /// `T` - stopped by a signal.
    Stopped,
    /// Any code procfs reports that isn't one of the above.
    Unknown,
}

impl ProcessState {
    /// Parse the single-character code from `/proc/PID/stat`.
    pub fn from_code(code: char) -> Self {
        match code {
            'R' => Self::Running,
            'S' => Self::Sleeping,
            'D' => Self::DiskSleep,
            'Z' => Self::Zombie,
            'T' | 't' => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

/// One process's snapshot, as it appears in the Top-by-CPU/Top-by-memory lists.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessEntry {
    /// Process id.
    pub pid: i32,
    /// Command name, parsed out of the parenthesized `comm` field.
    pub comm: String,
    /// Scheduling state.
    pub state: ProcessState,
    /// CPU percent over the sample interval.
    pub cpu_pct: f64,
    /// Resident set size, bytes.
    pub rss_bytes: u64,
    /// Open file descriptor count.
    pub fd_count: u64,
    /// Cgroup path, populated only when a cgroup filter is active.
    pub cgroup: Option<String>,
}

/// Process data record. Top-by-CPU and Top-by-memory are independent
/// containers (I2): sorting or truncating one never affects the other.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessData {
    /// Total processes scanned, regardless of PID/cgroup filters.
    pub total: u64,
    /// Process counts by scheduling state, across every process scanned.
    pub by_state: std::collections::HashMap<String, u64>,
    /// Top 20 processes by descending `cpu_pct`.
    pub top_by_cpu: Vec<ProcessEntry>,
    /// Top 20 processes by descending `rss_bytes`, sorted independently.
    pub top_by_memory: Vec<ProcessEntry>,
}

/// Container runtime identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[repr(u8)]
pub enum ContainerRuntime {
    /// Not running inside any detected container/sandbox.
    #[default]
    None,
    /// Docker.
    Docker,
    /// Podman.
    Podman,
    /// containerd (direct, not via Docker).
    Containerd,
    /// CRI-O.
    CriO,
    /// Detected as containerized but the specific runtime is unknown.
    Unknown,
}

impl ContainerRuntime {
    /// Lower-case name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Docker => "docker",
            Self::Podman => "podman",
            Self::Containerd => "containerd",
            Self::CriO => "cri-o",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cgroup hierarchy version in effect for the detected container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CgroupVersion {
    /// Unified hierarchy (`cgroup.controllers` present).
    V2,
    /// Legacy hierarchy (`cgroup/cpu` controller directory present).
    V1,
}

/// Container data record.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerData {
    /// Detected runtime, or [`ContainerRuntime::None`] on bare metal/VM.
    pub runtime: ContainerRuntime,
    /// Cgroup hierarchy version, when a container was detected.
    pub cgroup_version: Option<CgroupVersion>,
    /// Cgroup path for the detected container or the target cgroup.
    pub cgroup_path: Option<String>,
    /// Container id, 64-hex (or its `docker-<id>.scope` prefix stripped).
    pub container_id: Option<String>,
    /// Pod name, from Kubernetes Downward API metadata.
    pub pod_name: Option<String>,
    /// Namespace, from Kubernetes Downward API metadata.
    pub namespace: Option<String>,
    /// CPU quota, microseconds per period. `None` means unlimited.
    pub cpu_quota_us: Option<u64>,
    /// CPU accounting period, microseconds.
    pub cpu_period_us: Option<u64>,
    /// Cumulative number of periods the group was throttled.
    pub throttled_periods: u64,
    /// Cumulative throttled time, microseconds.
    pub throttled_time_us: u64,
    /// Memory limit, bytes. `None` means unlimited.
    pub memory_limit_bytes: Option<u64>,
    /// Current memory usage, bytes.
    pub memory_usage_bytes: u64,
}

impl Default for ContainerData {
    fn default() -> Self {
        Self {
            runtime: ContainerRuntime::None,
            cgroup_version: None,
            cgroup_path: None,
            container_id: None,
            pod_name: None,
            namespace: None,
            cpu_quota_us: None,
            cpu_period_us: None,
            throttled_periods: 0,
            throttled_time_us: 0,
            memory_limit_bytes: None,
            memory_usage_bytes: 0,
        }
    }
}

/// One block device summary for the system category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlockDeviceSummary {
    /// Device name, e.g. `"sda"`.
    pub name: String,
    /// `"ssd"` or `"hdd"`, derived from the rotational flag.
    pub class: String,
    /// Device model string, when exposed by sysfs.
    pub model: String,
}

/// One mounted filesystem summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilesystemSummary {
    /// Mount point.
    pub mount_point: String,
    /// Filesystem type, e.g. `"ext4"`.
    pub fs_type: String,
    /// Total capacity, bytes.
    pub total_bytes: u64,
    /// Used capacity, bytes.
    pub used_bytes: u64,
}

/// Severity of a parsed `dmesg` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogSeverity {
    /// Matched an error keyword, or reported at `err` level.
    Err,
    /// Everything else surfaced by `dmesg --level=err,warn`.
    Warn,
}

/// One recent kernel log line of warning or error severity.
#[derive(Debug, Clone, Serialize)]
pub struct KernelLogLine {
    /// Severity classification.
    pub severity: LogSeverity,
    /// Raw message text.
    pub message: String,
}

/// System data record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemData {
    /// `PRETTY_NAME` from `/etc/os-release`, or a platform fallback.
    pub os_name: String,
    /// Kernel release string (`uname -r` equivalent).
    pub kernel: String,
    /// Seconds since boot.
    pub uptime_secs: u64,
    /// Kernel command-line boot parameters.
    pub boot_params: String,
    /// Mounted filesystems.
    pub filesystems: Vec<FilesystemSummary>,
    /// Block devices enumerated from `/sys/block`.
    pub block_devices: Vec<BlockDeviceSummary>,
    /// Recent kernel log lines at warn/err severity, capped at 50.
    pub dmesg: Vec<KernelLogLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_state_parses_known_codes() {
        assert_eq!(ProcessState::from_code('R'), ProcessState::Running);
        assert_eq!(ProcessState::from_code('D'), ProcessState::DiskSleep);
        assert_eq!(ProcessState::from_code('t'), ProcessState::Stopped);
    }

    #[test]
    fn process_state_unknown_code_falls_back() {
        assert_eq!(ProcessState::from_code('X'), ProcessState::Unknown);
    }

    #[test]
    fn container_runtime_display_matches_as_str() {
        assert_eq!(ContainerRuntime::Docker.to_string(), "docker");
        assert_eq!(ContainerRuntime::default(), ContainerRuntime::None);
    }
}
