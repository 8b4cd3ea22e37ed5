//! The `Collector` trait and its availability/tiering types.
//!
//! Grounded on the per-category collector traits in
//! `probe-metrics` (`CPUCollector`, `MemoryCollector`, ... each a small
//! `collect(&self) -> Result<T>` seam) collapsed into one object-safe
//! trait keyed by category, plus the tiered detection shape from
//! `probe-runtime`'s `InsideDetector`/`AvailableDetector` pair (a cheap
//! `available()` probe separate from the real collection call).

use crate::config::CollectConfig;
use crate::error::Result;
use crate::report::CollectResult;

/// Confidence/cost tier a collector's source falls into, from cheapest
/// and most reliable (tier 0) to heaviest and least certain (tier 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tier {
    /// procfs/sysfs reads: always available on Linux, near-zero cost.
    Procfs = 0,
    /// cgroup/container runtime introspection: available, slightly heavier.
    Cgroup = 1,
    /// External CLI tool already installed (e.g. `ss`, `iostat`).
    ExternalTool = 2,
    /// eBPF-backed tracer requiring elevated privilege and a kernel probe.
    EbpfTracer = 3,
}

/// Result of a collector's availability probe.
#[derive(Debug, Clone)]
pub struct Availability {
    /// Tier this collector belongs to.
    pub tier: Tier,
    /// Whether the collector can run in the current environment.
    pub available: bool,
    /// Human-readable reason, populated when `available` is false.
    pub reason: Option<String>,
}

impl Availability {
    /// Build an "available" result for the given tier.
    pub fn ok(tier: Tier) -> Self {
        Self { tier, available: true, reason: None }
    }

    /// Build an "unavailable" result with an explanatory reason.
    pub fn unavailable(tier: Tier, reason: impl Into<String>) -> Self {
        Self { tier, available: false, reason: Some(reason.into()) }
    }
}

/// A single data-gathering unit of the pipeline.
///
/// Implementors own exactly one category (`"cpu"`, `"network"`, ...) and
/// are responsible for degrading gracefully: a failed `available()`
/// check should exclude the collector from the run rather than let
/// `collect()` fail the whole report (I4, I6).
pub trait Collector: Send + Sync {
    /// Stable identifier, e.g. `"procfs-cpu"` or `"bpftrace-offcputime"`.
    fn name(&self) -> &str;

    /// Category this collector contributes to (see [`crate::config::CATEGORIES`]).
    fn category(&self) -> &str;

    /// Cheap probe for whether this collector can run right now.
    fn available(&self, cfg: &CollectConfig) -> Availability;

    /// Perform the collection. Only called after `available()` returned
    /// `available: true`.
    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult>;
}
