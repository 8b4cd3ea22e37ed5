//! Two-phase collection driver: runs procfs collectors to a quiet
//! baseline, then tool-backed collectors under bounded concurrency,
//! and hands the assembled report to the analysis layer.

pub mod driver;
pub mod profile;

pub use driver::Orchestrator;
pub use profile::{resolve, ProfilePlan};
