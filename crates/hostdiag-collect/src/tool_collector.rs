//! Tool-backed collector: wraps the sandboxed executor and the parser
//! library around one registered `ToolSpec`, with PID-tracker
//! bookkeeping for observer-effect mitigation.

use std::time::Duration;

use hostdiag_exec::{CancelToken, Ctx};
use hostdiag_model::{Availability, CollectConfig, CollectResult, Collector, Payload, PidTracker, Result, Tier};

use crate::parse::ParsedPayload;
use crate::toolspec::ToolSpec;

/// Extra time given to the executor timeout beyond the sampling
/// duration, so the tool has room for its own startup/teardown.
const GRACE: Duration = Duration::from_secs(2);

/// Collector wrapping one `ToolSpec`.
pub struct ToolBackedCollector {
    spec: &'static ToolSpec,
    tracker: std::sync::Arc<PidTracker>,
}

impl ToolBackedCollector {
    pub fn new(spec: &'static ToolSpec, tracker: std::sync::Arc<PidTracker>) -> Self {
        Self { spec, tracker }
    }
}

impl Collector for ToolBackedCollector {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn category(&self) -> &str {
        self.spec.category
    }

    fn available(&self, _cfg: &CollectConfig) -> Availability {
        match hostdiag_security::resolve_binary(self.spec.binary) {
            Ok(_) => Availability::ok(Tier::ExternalTool),
            Err(e) => Availability::unavailable(Tier::ExternalTool, e.to_string()),
        }
    }

    fn collect(&self, cfg: &CollectConfig) -> Result<CollectResult> {
        let duration = self.spec.effective_duration(cfg.duration);
        let args = (self.spec.build_args)(duration);
        let cancel = CancelToken::new();
        let ctx = Ctx::with_timeout(duration + GRACE);

        let mut result = CollectResult::new(self.spec.name, self.spec.category, Tier::ExternalTool);

        let run_outcome =
            hostdiag_exec::run(self.spec.binary, &args, duration + GRACE, &cancel, !cfg.quiet, Some(&self.tracker));
        let output = match run_outcome {
            Ok(out) => out,
            Err(e) => {
                result.push_error(e.to_string());
                return Ok(result);
            }
        };

        let parsed_raw = output.stdout;
        result.truncated = output.truncated;
        if ctx.is_done() {
            result.push_error("deadline exceeded before tool completed".to_string());
        }

        let mut parsed = self.spec.parse(&parsed_raw);
        if let Some(events) = parsed.events_mut() {
            events.retain(|event| event.pid.map(|pid| !self.tracker.is_own_pid(pid)).unwrap_or(true));
            if events.len() > cfg.max_events_per_collector {
                events.truncate(cfg.max_events_per_collector);
                result.truncated = true;
            }
        }

        result.payload = Some(match parsed {
            ParsedPayload::Histogram(h) => Payload::Histograms(vec![h]),
            ParsedPayload::Histograms(hs) => Payload::Histograms(hs),
            ParsedPayload::Events(tabular) => {
                result.truncated = result.truncated || tabular.truncated;
                Payload::Events(tabular.events)
            }
            ParsedPayload::Stacks(stacks) => Payload::Stacks(stacks),
            ParsedPayload::Empty => return Ok(result),
        });

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolspec::lookup;

    #[test]
    fn unresolvable_tool_reports_tier2_unavailable() {
        let spec = lookup("block_io_latency").unwrap();
        let collector = ToolBackedCollector::new(spec, std::sync::Arc::new(PidTracker::default()));
        let cfg = CollectConfig::default();
        let availability = collector.available(&cfg);
        // biolatency will not resolve in a test sandbox without the
        // bcc tools package installed.
        if !availability.available {
            assert_eq!(availability.tier, Tier::ExternalTool);
        }
    }
}
