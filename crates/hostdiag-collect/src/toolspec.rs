//! Tool registry: the single point of extension for eBPF-tool-backed
//! collectors. A `ToolSpec` names a binary, its output shape, and how
//! to build its arguments; the registry is a process-wide immutable
//! table built once and never mutated after startup.

use std::sync::OnceLock;
use std::time::Duration;

use hostdiag_model::StackKind;

use crate::parse::ParsedPayload;

/// Selects which parser a tool-backed collector applies to captured
/// stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Histogram,
    HistogramPerDisk,
    Tabular,
    Folded,
}

/// Static description of one registered eBPF tool.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub binary: &'static str,
    pub category: &'static str,
    pub needs_root: bool,
    pub output_type: OutputType,
    pub unit: &'static str,
    pub stack_kind: Option<StackKind>,
    /// Minimum sampling duration this tool can usefully run for.
    pub min_duration: Duration,
    pub build_args: fn(Duration) -> Vec<String>,
}

impl ToolSpec {
    /// Clamp a requested duration to this tool's sampling minimum.
    pub fn effective_duration(&self, requested: Duration) -> Duration {
        requested.max(self.min_duration)
    }

    pub fn parse(&self, raw: &str) -> ParsedPayload {
        match self.output_type {
            OutputType::Histogram => hostdiag_parser::parse_histogram(self.name, self.unit, raw)
                .map(ParsedPayload::Histogram)
                .unwrap_or(ParsedPayload::Empty),
            OutputType::HistogramPerDisk => hostdiag_parser::parse_histogram_per_disk(self.name, self.unit, raw)
                .map(ParsedPayload::Histograms)
                .unwrap_or(ParsedPayload::Empty),
            OutputType::Tabular => {
                ParsedPayload::Events(hostdiag_parser::parse_tabular_events(raw, usize::MAX))
            }
            OutputType::Folded => {
                let kind = self.stack_kind.unwrap_or(StackKind::Kernel);
                ParsedPayload::Stacks(hostdiag_parser::parse_folded_stacks(raw, kind))
            }
        }
    }
}

fn secs_args(duration: Duration) -> Vec<String> {
    vec![duration.as_secs().max(1).to_string()]
}

fn registry_table() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            // Histogram name feeds anomaly detection's rotational
            // SSD/HDD threshold cross-reference, which matches on the
            // `block_io_latency_<dev>` naming grammar.
            name: "block_io_latency",
            binary: "biolatency",
            category: "disk",
            needs_root: true,
            output_type: OutputType::HistogramPerDisk,
            unit: "us",
            stack_kind: None,
            min_duration: Duration::from_secs(1),
            build_args: |d| {
                let mut args = vec!["-D".to_string()];
                args.extend(secs_args(d));
                args
            },
        },
        ToolSpec {
            name: "runqlat",
            binary: "runqlat",
            category: "cpu",
            needs_root: true,
            output_type: OutputType::Histogram,
            unit: "us",
            stack_kind: None,
            min_duration: Duration::from_secs(1),
            build_args: secs_args,
        },
        ToolSpec {
            name: "tcplife",
            binary: "tcplife",
            category: "network",
            needs_root: true,
            output_type: OutputType::Tabular,
            unit: "ms",
            stack_kind: None,
            min_duration: Duration::from_secs(1),
            build_args: secs_args,
        },
        ToolSpec {
            name: "execsnoop",
            binary: "execsnoop",
            category: "process",
            needs_root: true,
            output_type: OutputType::Tabular,
            unit: "",
            stack_kind: None,
            min_duration: Duration::from_secs(1),
            build_args: secs_args,
        },
        ToolSpec {
            name: "offcputime",
            binary: "offcputime",
            category: "process",
            needs_root: true,
            output_type: OutputType::Folded,
            unit: "us",
            stack_kind: Some(StackKind::OffCpu),
            // sampling profilers need a longer minimum window to collect
            // a usable number of stacks.
            min_duration: Duration::from_secs(5),
            build_args: |d| vec!["-f".to_string(), d.as_secs().max(5).to_string()],
        },
        ToolSpec {
            name: "profile",
            binary: "profile",
            category: "cpu",
            needs_root: true,
            output_type: OutputType::Folded,
            unit: "samples",
            stack_kind: Some(StackKind::OnCpu),
            min_duration: Duration::from_secs(5),
            build_args: |d| vec!["-f".to_string(), d.as_secs().max(5).to_string()],
        },
    ]
}

static REGISTRY: OnceLock<Vec<ToolSpec>> = OnceLock::new();

/// The process-wide tool registry, built once on first access.
pub fn registry() -> &'static [ToolSpec] {
    REGISTRY.get_or_init(registry_table)
}

/// Look up a single tool spec by name.
pub fn lookup(name: &str) -> Option<&'static ToolSpec> {
    registry().iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_no_duplicate_names() {
        let mut names: Vec<&str> = registry().iter().map(|s| s.name).collect();
        names.sort_unstable();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
    }

    #[test]
    fn lookup_finds_registered_tool() {
        assert!(lookup("block_io_latency").is_some());
        assert!(lookup("not-a-real-tool").is_none());
    }

    #[test]
    fn sampling_profilers_clamp_to_longer_minimum() {
        let spec = lookup("profile").unwrap();
        assert_eq!(spec.effective_duration(Duration::from_secs(1)), Duration::from_secs(5));
    }
}
