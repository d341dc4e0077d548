//! The watcher's collaborators: where processes come from, where per-process
//! stats come from, and where alerts go.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
    time::{Duration, Instant, SystemTime},
};

use async_trait::async_trait;
use color_eyre::{
    Result,
    eyre::{OptionExt, eyre},
};
use log::*;
use sysinfo::{MINIMUM_CPU_UPDATE_INTERVAL, Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::{task, time};

use crate::config::ReportingConfig;

/// One process in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu: f64,
    /// Sample time, when the source records one.
    pub timestamp: Option<SystemTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessStats {
    /// Resident memory in bytes.
    pub memory: u64,
    pub elapsed: Duration,
}

impl ProcessStats {
    pub(crate) fn new(info: &sysinfo::Process) -> Self {
        Self {
            memory: info.memory(),
            elapsed: Duration::from_secs(info.run_time()),
        }
    }
}

#[async_trait]
pub trait ProcessSource: Send {
    async fn snapshot(&mut self) -> Result<Vec<ProcessSample>>;
}

#[async_trait]
pub trait StatsLookup: Send + Sync {
    async fn stats(&self, pid: u32) -> Result<ProcessStats>;
}

pub trait AlertSink: Send {
    fn send(&mut self, alert: &str) -> Result<()>;
}

/// Snapshots every visible process. CPU is a percentage of one core.
///
/// CPU usage is a delta between two refreshes, so the process table is
/// primed on construction and the first snapshot waits out the rest of
/// [`MINIMUM_CPU_UPDATE_INTERVAL`].
pub struct SysinfoSource {
    sys: System,
    primed_at: Option<Instant>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        let mut sys = System::new();
        refresh_cpu(&mut sys);
        Self {
            sys,
            primed_at: Some(Instant::now()),
        }
    }
}

fn refresh_cpu(sys: &mut System) {
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cpu(),
    );
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessSource for SysinfoSource {
    async fn snapshot(&mut self) -> Result<Vec<ProcessSample>> {
        if let Some(primed_at) = self.primed_at.take() {
            let remaining = MINIMUM_CPU_UPDATE_INTERVAL.saturating_sub(primed_at.elapsed());
            if !remaining.is_zero() {
                time::sleep(remaining).await;
            }
        }
        refresh_cpu(&mut self.sys);
        let processes = self.sys.processes();
        if processes.is_empty() {
            return Err(eyre!("No processes visible"));
        }
        debug!(target: "Source", "Sampled {} processes", processes.len());
        Ok(processes
            .iter()
            .map(|(pid, info)| ProcessSample {
                pid: pid.as_u32(),
                name: info.name().to_string_lossy().into_owned(),
                cpu: info.cpu_usage() as f64,
                timestamp: None,
            })
            .collect())
    }
}

/// Memory and run time for a single pid. Refreshes run on the blocking pool.
pub struct SysinfoLookup {
    sys: Arc<Mutex<System>>,
}

impl SysinfoLookup {
    pub fn new() -> Self {
        Self {
            sys: Arc::new(Mutex::new(System::new())),
        }
    }
}

impl Default for SysinfoLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsLookup for SysinfoLookup {
    async fn stats(&self, pid: u32) -> Result<ProcessStats> {
        let sys = Arc::clone(&self.sys);
        task::spawn_blocking(move || -> Result<ProcessStats> {
            let pid = Pid::from_u32(pid);
            let mut sys = sys
                .lock()
                .map_err(|_| eyre!("Process table lock poisoned"))?;
            sys.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::nothing().with_memory(),
            );
            let info = sys.process(pid).ok_or_eyre("Process has exited")?;
            Ok(ProcessStats::new(info))
        })
        .await?
    }
}

/// Sends alerts into the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn send(&mut self, alert: &str) -> Result<()> {
        warn!(target: "Alert", "{}", alert);
        Ok(())
    }
}

/// Writes each alert as one line.
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl WriterSink<File> {
    pub fn append(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!(target: "Alert", "Appending alerts to {:?}", path);
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> AlertSink for WriterSink<W> {
    fn send(&mut self, alert: &str) -> Result<()> {
        let line = alert.split('\n').map(str::trim).collect::<Vec<_>>().join(" ");
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// The configured alert file, or `fallback` when there isn't one.
pub fn configured_sink(
    reporting: &ReportingConfig,
    fallback: Box<dyn AlertSink>,
) -> Result<Box<dyn AlertSink>> {
    match &reporting.alert_file {
        Some(path) => Ok(Box::new(WriterSink::append(path)?)),
        None => Ok(fallback),
    }
}
