//! Container collector: runtime detection, cgroup version detection,
//! container id extraction, CPU/memory quota and usage.

use std::path::{Path, PathBuf};

use hostdiag_model::{
    Availability, CgroupVersion, CollectConfig, CollectResult, Collector, ContainerData, ContainerRuntime, Payload,
    Result, Tier,
};

use super::procfs::{parse_u64_or_zero, read_to_string_lossy};

fn detect_runtime(proc_root: &Path) -> ContainerRuntime {
    if proc_root.join("../.dockerenv").exists() || Path::new("/.dockerenv").exists() {
        return ContainerRuntime::Docker;
    }
    if std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
        || Path::new("/var/run/secrets/kubernetes.io/serviceaccount/token").exists()
    {
        return ContainerRuntime::Unknown;
    }

    let cgroup = read_to_string_lossy(&proc_root.join("1/cgroup"));
    if cgroup.contains("docker") {
        ContainerRuntime::Docker
    } else if cgroup.contains("podman") || cgroup.contains("libpod") {
        ContainerRuntime::Podman
    } else if cgroup.contains("crio") {
        ContainerRuntime::CriO
    } else if cgroup.contains("containerd") {
        ContainerRuntime::Containerd
    } else {
        ContainerRuntime::None
    }
}

/// Extract a 64-hex container id, including from a `docker-<id>.scope`
/// systemd-cgroup-driver path component.
fn extract_container_id(cgroup_content: &str) -> Option<String> {
    for line in cgroup_content.lines() {
        for segment in line.split('/') {
            let candidate = segment.strip_prefix("docker-").unwrap_or(segment);
            let candidate = candidate.strip_suffix(".scope").unwrap_or(candidate);
            if candidate.len() == 64 && candidate.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

fn detect_cgroup_version(sys_root: &Path) -> Option<CgroupVersion> {
    if sys_root.join("fs/cgroup/cgroup.controllers").exists() {
        Some(CgroupVersion::V2)
    } else if sys_root.join("fs/cgroup/cpu").exists() {
        Some(CgroupVersion::V1)
    } else {
        None
    }
}

/// `"max"` means unlimited; anything else parses as an integer.
fn parse_cgroup_value(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed == "max" || trimmed.is_empty() {
        None
    } else {
        trimmed.parse().ok()
    }
}

fn read_cgroup_v2(cgroup_path: &Path, data: &mut ContainerData) {
    let cpu_max = read_to_string_lossy(&cgroup_path.join("cpu.max"));
    let mut parts = cpu_max.split_whitespace();
    data.cpu_quota_us = parts.next().and_then(parse_cgroup_value);
    data.cpu_period_us = parts.next().map(parse_u64_or_zero);

    let cpu_stat = read_to_string_lossy(&cgroup_path.join("cpu.stat"));
    for line in cpu_stat.lines() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("nr_throttled") => data.throttled_periods = fields.next().map(parse_u64_or_zero).unwrap_or(0),
            Some("throttled_usec") => data.throttled_time_us = fields.next().map(parse_u64_or_zero).unwrap_or(0),
            _ => {}
        }
    }

    data.memory_limit_bytes = parse_cgroup_value(&read_to_string_lossy(&cgroup_path.join("memory.max")));
    data.memory_usage_bytes = parse_u64_or_zero(read_to_string_lossy(&cgroup_path.join("memory.current")).trim());
}

fn read_cgroup_v1(cgroup_path_cpu: &Path, cgroup_path_memory: &Path, data: &mut ContainerData) {
    let quota = parse_u64_or_zero(read_to_string_lossy(&cgroup_path_cpu.join("cpu.cfs_quota_us")).trim());
    data.cpu_quota_us = if quota == 0 { None } else { Some(quota) };
    data.cpu_period_us = Some(parse_u64_or_zero(read_to_string_lossy(&cgroup_path_cpu.join("cpu.cfs_period_us")).trim()));

    let cpu_stat = read_to_string_lossy(&cgroup_path_cpu.join("cpu.stat"));
    for line in cpu_stat.lines() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("nr_throttled") => data.throttled_periods = fields.next().map(parse_u64_or_zero).unwrap_or(0),
            // v1 reports nanoseconds; convert to microseconds.
            Some("throttled_time") => data.throttled_time_us = fields.next().map(parse_u64_or_zero).unwrap_or(0) / 1000,
            _ => {}
        }
    }

    let limit = parse_u64_or_zero(read_to_string_lossy(&cgroup_path_memory.join("memory.limit_in_bytes")).trim());
    // cgroup v1 reports u64::MAX-adjacent sentinels for "unlimited".
    data.memory_limit_bytes = if limit == 0 || limit > (1_u64 << 62) { None } else { Some(limit) };
    data.memory_usage_bytes = parse_u64_or_zero(read_to_string_lossy(&cgroup_path_memory.join("memory.usage_in_bytes")).trim());
}

fn cgroup_subtree(sys_root: &Path, target: Option<&str>, controller: &str, version: CgroupVersion) -> PathBuf {
    let base = match version {
        CgroupVersion::V2 => sys_root.join("fs/cgroup"),
        CgroupVersion::V1 => sys_root.join("fs/cgroup").join(controller),
    };
    match target {
        Some(path) => base.join(path.trim_start_matches('/')),
        None => base,
    }
}

/// cgroup/container-runtime collector.
pub struct ContainerCollector;

impl Collector for ContainerCollector {
    fn name(&self) -> &str {
        "procfs-container"
    }

    fn category(&self) -> &str {
        "container"
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        Availability::ok(Tier::Cgroup)
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        collect(cfg)
    }
}

/// Single-point container/cgroup collection.
pub fn collect(cfg: &CollectConfig) -> Result<CollectResult> {
    let runtime = detect_runtime(&cfg.proc_root);
    let cgroup_content = read_to_string_lossy(&cfg.proc_root.join("1/cgroup"));
    let container_id = extract_container_id(&cgroup_content);
    let cgroup_version = detect_cgroup_version(&cfg.sys_root);

    let target = cfg.target_cgroups.iter().next().map(String::as_str);
    let mut data = ContainerData {
        runtime,
        cgroup_version,
        cgroup_path: target.map(str::to_string),
        container_id,
        pod_name: std::env::var("POD_NAME").ok(),
        namespace: std::env::var("POD_NAMESPACE").ok(),
        ..Default::default()
    };

    match cgroup_version {
        Some(CgroupVersion::V2) => {
            let path = cgroup_subtree(&cfg.sys_root, target, "", CgroupVersion::V2);
            read_cgroup_v2(&path, &mut data);
        }
        Some(CgroupVersion::V1) => {
            let cpu_path = cgroup_subtree(&cfg.sys_root, target, "cpu", CgroupVersion::V1);
            let mem_path = cgroup_subtree(&cfg.sys_root, target, "memory", CgroupVersion::V1);
            read_cgroup_v1(&cpu_path, &mem_path, &mut data);
        }
        None => {}
    }

    Ok(CollectResult::new("procfs-container", "container", Tier::Cgroup).with_payload(Payload::Container(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_docker_scope_container_id() {
        let line = "0::/system.slice/docker-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa.scope\n";
        let id = extract_container_id(line).unwrap();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cgroup_value_max_means_unlimited() {
        assert_eq!(parse_cgroup_value("max"), None);
        assert_eq!(parse_cgroup_value("100000"), Some(100000));
    }

    #[test]
    fn no_container_markers_yields_none_runtime() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("1")).unwrap();
        std::fs::write(dir.path().join("1/cgroup"), "0::/\n").unwrap();
        assert_eq!(detect_runtime(dir.path()), ContainerRuntime::None);
    }
}
