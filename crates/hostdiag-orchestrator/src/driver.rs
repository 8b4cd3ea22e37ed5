//! Two-phase collection driver: `new(collectors, cfg)`, `run(ctx) ->
//! Report`.
//!
//! Grounded on `probe-runtime::detector`'s priority-
//! ordered fan-out-then-coordinate shape (a cascade of independent
//! detectors run and merged into one verdict), generalized here to a
//! two-phase concurrent fan-out of collectors merged into one `Report`.

use std::sync::Arc;
use std::thread;
use std::time::SystemTime;

use hostdiag_exec::Ctx;
use hostdiag_model::{CollectConfig, Collector, PidTracker, Report, ReportMetadata};
use log::{info, warn};

use crate::profile::resolve;

/// Caps how many Phase 2 (tool-backed) collectors run concurrently, so
/// eBPF tracers don't pile up mutual interference on the traced system.
const PHASE2_CONCURRENCY: usize = 2;

/// Two-phase collection driver.
pub struct Orchestrator {
    procfs: Vec<Box<dyn Collector>>,
    tools: Vec<Box<dyn Collector>>,
    cfg: CollectConfig,
}

impl Orchestrator {
    pub fn new(procfs: Vec<Box<dyn Collector>>, tools: Vec<Box<dyn Collector>>, cfg: CollectConfig) -> Self {
        Self { procfs, tools, cfg }
    }

    /// Build an orchestrator using the standard Linux collector set,
    /// deriving `duration`/phase-2 inclusion from `cfg.profile`.
    pub fn for_profile(mut cfg: CollectConfig) -> Self {
        let plan = resolve(cfg.profile);
        cfg.duration = plan.duration;
        let tracker = cfg.pid_tracker.clone().unwrap_or_else(|| Arc::new(PidTracker::new()));
        cfg.pid_tracker = Some(tracker.clone());

        let procfs = hostdiag_collect::procfs_collectors();
        let tools = if plan.run_phase2 { hostdiag_collect::tool_collectors(tracker) } else { Vec::new() };
        Self::new(procfs, tools, cfg)
    }

    /// Run both phases and assemble a report. `ctx`'s deadline/cancel
    /// token gates Phase 2: a collector already in flight always runs
    /// to its own internal completion (bounded by `cfg.duration`), but
    /// no further Phase 2 collector is launched once `ctx` is done.
    pub fn run(&self, ctx: &Ctx) -> Report {
        let started_at = SystemTime::now();
        let mut report = Report::default();
        report.metadata.profile = self.cfg.profile.as_str().to_string();
        report.metadata.phase2_requested = !self.tools.is_empty();
        report.metadata.started_at = Some(started_at);

        for result in self.run_phase1() {
            if self.cfg.wants_category(&result.category) {
                if result.category == "system" {
                    if let Some(hostdiag_model::Payload::System(data)) = &result.payload {
                        report.system = Some(data.clone());
                    }
                }
                report.push_result(result);
            }
        }

        let mut phase2_completed = true;
        if !ctx.is_done() {
            for result in self.run_phase2(ctx) {
                if self.cfg.wants_category(&result.category) {
                    report.push_result(result);
                }
            }
        } else {
            phase2_completed = false;
        }
        if ctx.is_done() && report.metadata.phase2_requested {
            phase2_completed = false;
        }
        report.metadata.phase2_completed = phase2_completed && report.metadata.phase2_requested;

        report.metadata.ended_at = Some(SystemTime::now());
        report.summary = hostdiag_analysis::analyze(&report);
        report.ai_context = Some(hostdiag_analysis::build_ai_context(&report));
        report
    }

    /// Phase 1: every procfs/cgroup collector runs concurrently on its
    /// own thread, bounded by its own internally-derived timeout.
    fn run_phase1(&self) -> Vec<hostdiag_model::CollectResult> {
        let cfg = &self.cfg;
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .procfs
                .iter()
                .filter(|c| cfg.wants_category(c.category()))
                .map(|collector| {
                    scope.spawn(move || {
                        let availability = collector.available(cfg);
                        if !availability.available {
                            return None;
                        }
                        match collector.collect(cfg) {
                            Ok(result) => Some(result),
                            Err(e) => {
                                warn!("collector {} failed: {e}", collector.name());
                                None
                            }
                        }
                    })
                })
                .collect();
            handles.into_iter().filter_map(|h| h.join().ok().flatten()).collect()
        })
    }

    /// Phase 2: tool-backed collectors run with bounded concurrency.
    /// Cancellation between chunks abandons any collectors not yet
    /// started; collectors already running finish naturally.
    fn run_phase2(&self, ctx: &Ctx) -> Vec<hostdiag_model::CollectResult> {
        let cfg = &self.cfg;
        let wanted: Vec<&Box<dyn Collector>> = self.tools.iter().filter(|c| cfg.wants_category(c.category())).collect();
        let mut results = Vec::new();

        for chunk in wanted.chunks(PHASE2_CONCURRENCY) {
            if ctx.is_done() {
                info!("phase 2 cancelled, abandoning {} remaining collectors", chunk.len());
                break;
            }
            let chunk_results: Vec<_> = thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|collector| {
                        scope.spawn(move || {
                            let availability = collector.available(cfg);
                            if !availability.available {
                                return None;
                            }
                            match collector.collect(cfg) {
                                Ok(result) => Some(result),
                                Err(e) => {
                                    warn!("collector {} failed: {e}", collector.name());
                                    None
                                }
                            }
                        })
                    })
                    .collect();
                handles.into_iter().filter_map(|h| h.join().ok().flatten()).collect()
            });
            results.extend(chunk_results);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdiag_model::{Availability, CollectResult, Profile, Result, Tier};

    struct StubCollector {
        category: &'static str,
    }

    impl Collector for StubCollector {
        fn name(&self) -> &str {
            "stub"
        }
        fn category(&self) -> &str {
            self.category
        }
        fn available(&self, _cfg: &CollectConfig) -> Availability {
            Availability::ok(Tier::Procfs)
        }
        fn collect(&self, _cfg: &CollectConfig) -> Result<CollectResult> {
            Ok(CollectResult::new("stub", self.category, Tier::Procfs))
        }
    }

    #[test]
    fn focus_filter_drops_unwanted_categories() {
        let mut cfg = CollectConfig::default();
        cfg.profile = Profile::Quick;
        cfg.focus.insert("cpu".to_string());
        let orchestrator = Orchestrator::new(
            vec![Box::new(StubCollector { category: "cpu" }), Box::new(StubCollector { category: "memory" })],
            Vec::new(),
            cfg,
        );
        let report = orchestrator.run(&Ctx::with_timeout(std::time::Duration::from_secs(1)));
        assert!(report.categories.contains_key("cpu"));
        assert!(!report.categories.contains_key("memory"));
    }

    #[test]
    fn already_cancelled_context_skips_phase2_entirely() {
        let cfg = CollectConfig::default();
        let orchestrator =
            Orchestrator::new(Vec::new(), vec![Box::new(StubCollector { category: "disk" })], cfg);
        let ctx = Ctx::with_timeout(std::time::Duration::from_secs(0));
        let report = orchestrator.run(&ctx);
        assert!(!report.metadata.phase2_completed);
    }
}
