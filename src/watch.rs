//! High CPU process detection.
//!
//! Processes above the add-threshold go on the watch list. A second sighting
//! while watched promotes them to the warn list, which is what gets reported.

pub mod entry;
pub mod format;
pub mod report;
pub mod source;
pub mod thresholds;
pub mod watcher;

pub use entry::{WarnEntry, WatchEntry};
pub use report::ReportOutcome;
pub use source::{
    AlertSink, LogSink, ProcessSample, ProcessSource, ProcessStats, StatsLookup, SysinfoLookup,
    SysinfoSource, WriterSink,
};
pub use thresholds::Thresholds;
pub use watcher::{CycleSummary, Watcher};
