//! Linux collector composition: procfs/sysfs/cgroup collectors plus
//! the tool-backed collectors built from the eBPF tool registry.

pub mod container;
pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;
pub mod process;
pub mod procfs;
pub mod system;

use std::sync::Arc;

use hostdiag_model::{Collector, PidTracker};

use crate::toolspec::registry;
use crate::tool_collector::ToolBackedCollector;

/// The seven procfs/sysfs/cgroup collectors, composed in the order
/// they appear in the report's category table.
pub fn procfs_collectors() -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(cpu::CpuCollector),
        Box::new(memory::MemoryCollector),
        Box::new(disk::DiskCollector),
        Box::new(network::NetworkCollector),
        Box::new(process::ProcessCollector),
        Box::new(container::ContainerCollector),
        Box::new(system::SystemCollector),
    ]
}

/// One tool-backed collector per entry in the eBPF tool registry.
pub fn tool_collectors(tracker: Arc<PidTracker>) -> Vec<Box<dyn Collector>> {
    registry().iter().map(|spec| Box::new(ToolBackedCollector::new(spec, tracker.clone())) as Box<dyn Collector>).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procfs_collectors_cover_every_procfs_category() {
        let collectors = procfs_collectors();
        let names: Vec<&str> = collectors.iter().map(|c| c.category()).collect();
        for category in ["cpu", "memory", "disk", "network", "process", "container", "system"] {
            assert!(names.contains(&category), "missing {category}");
        }
    }

    #[test]
    fn tool_collectors_match_registry_length() {
        let tracker = Arc::new(PidTracker::new());
        assert_eq!(tool_collectors(tracker).len(), registry().len());
    }
}
