//! Bridges a tool's raw captured stdout to the normalized payload
//! shapes the parser library produces.

use hostdiag_model::{Event, Histogram, StackTrace};

/// Normalized output of one parser invocation, before PID filtering
/// and capping are applied by the tool-backed collector.
pub enum ParsedPayload {
    Histogram(Histogram),
    Histograms(Vec<Histogram>),
    Events(hostdiag_parser::TabularResult),
    Stacks(Vec<StackTrace>),
    Empty,
}

impl ParsedPayload {
    /// Events carry a PID that can be cross-referenced against the PID
    /// tracker (I6); other payload shapes have nothing to filter.
    pub fn events_mut(&mut self) -> Option<&mut Vec<Event>> {
        match self {
            ParsedPayload::Events(result) => Some(&mut result.events),
            _ => None,
        }
    }
}
