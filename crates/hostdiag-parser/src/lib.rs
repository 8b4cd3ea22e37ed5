//! Pure parsers for the three canonical eBPF-tool output shapes: BCC
//! histograms, tabular event streams, and semicolon-folded stack
//! traces, plus the inline-stack extractor for interleaved tool output.
//! No I/O, no time - callers own reading the raw text.

pub mod ansi;
pub mod error;
pub mod folded;
pub mod histogram;
pub mod inline_stack;
pub mod tabular;

pub use ansi::strip_ansi;
pub use error::{ParseError, Result};
pub use folded::parse_folded_stacks;
pub use histogram::{parse_histogram, parse_histogram_per_disk};
pub use inline_stack::extract_inline_stacks;
pub use tabular::{parse_tabular_events, TabularResult};
