//! Shared data model, error taxonomy, and collector trait for the
//! hostdiag pipeline. No I/O, no time - every other hostdiag crate
//! depends on this one and nothing here depends on them.

pub mod analysis;
pub mod category;
pub mod collector;
pub mod config;
pub mod error;
pub mod event;
pub mod histogram;
pub mod pidtracker;
pub mod report;
pub mod stack;

pub use analysis::{Anomaly, Recommendation, Severity, UseMetric};
pub use category::{
    BlockDeviceSummary, CgroupVersion, ContainerData, ContainerRuntime, CpuData, DiskData,
    DiskDevice, FilesystemSummary, KernelLogLine, LogSeverity, MemoryData, NetInterface,
    NetworkData, NumaNode, PerCpu, ProcessData, ProcessEntry, ProcessState, SystemData,
};
pub use collector::{Availability, Collector, Tier};
pub use config::{CollectConfig, Profile, CATEGORIES};
pub use error::{Error, Result};
pub use event::{Event, Scalar};
pub use histogram::{Bucket, Histogram};
pub use pidtracker::{PidScope, PidTracker};
pub use report::{CollectResult, Payload, Report, ReportMetadata, Summary};
pub use stack::{sort_by_count_desc, StackKind, StackTrace};
