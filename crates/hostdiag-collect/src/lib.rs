//! Collector framework: procfs/sysfs/cgroup collectors that do
//! two-point delta sampling, and a tool-backed collector family that
//! wraps the sandboxed executor and parser library for registered eBPF
//! tools.

pub mod linux;
pub mod parse;
pub mod tool_collector;
pub mod toolspec;

pub use linux::{procfs_collectors, tool_collectors};
pub use tool_collector::ToolBackedCollector;
pub use toolspec::{registry, lookup, OutputType, ToolSpec};
