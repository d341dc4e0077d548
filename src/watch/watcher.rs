use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::SystemTime,
};

use color_eyre::Result;
use log::*;
use tokio::task::{JoinError, JoinSet};

use crate::{
    config::{DetectionConfig, ReportingConfig, WatchConfig},
    watch::{
        entry::{WarnEntry, WatchEntry, is_at_least},
        source::{AlertSink, ProcessSample, ProcessSource, ProcessStats, StatsLookup},
        thresholds::Thresholds,
    },
};

pub(crate) struct Collaborators {
    pub(crate) source: Box<dyn ProcessSource>,
    pub(crate) lookup: Arc<dyn StatsLookup>,
    pub(crate) sink: Box<dyn AlertSink>,
}

/// What one detection cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub sampled: usize,
    /// Top candidates at or above the add-threshold.
    pub hot: usize,
    /// Samples routed to the warn list.
    pub escalated: usize,
    pub evicted: usize,
}

/// Owns the watch and warn lists.
///
/// Callers serialize access: one cycle or report pass at a time. Stats
/// lookups run as tasks and land back on the warn list through
/// [`Watcher::apply_enrichments`].
pub struct Watcher {
    pub(crate) detection: DetectionConfig,
    pub(crate) reporting: ReportingConfig,
    pub(crate) thresholds: Thresholds,
    pub(crate) watch: Vec<WatchEntry>,
    pub(crate) warn: Vec<WarnEntry>,
    pub(crate) collaborators: Option<Collaborators>,
    enrichments: JoinSet<Option<(u32, ProcessStats)>>,
}

impl Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("thresholds", &self.thresholds)
            .field("initialized", &self.collaborators.is_some())
            .field("pending_lookups", &self.enrichments.len())
            .field("watch", &self.watch)
            .field("warn", &self.warn)
            .finish()
    }
}

impl Watcher {
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            detection: config.detection.clone(),
            reporting: config.reporting.clone(),
            thresholds: Thresholds::new(config.detection.add_level, config.detection.remove_level),
            watch: Vec::new(),
            warn: Vec::new(),
            collaborators: None,
            enrichments: JoinSet::new(),
        }
    }

    pub fn init(
        &mut self,
        source: Box<dyn ProcessSource>,
        lookup: Arc<dyn StatsLookup>,
        sink: Box<dyn AlertSink>,
    ) {
        info!(target: "Watch", "Watcher initialized");
        self.collaborators = Some(Collaborators {
            source,
            lookup,
            sink,
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.collaborators.is_some()
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Current watch list, `None` when nothing is being watched.
    pub fn watch_list(&self) -> Option<&[WatchEntry]> {
        if self.watch.is_empty() {
            None
        } else {
            Some(&self.watch)
        }
    }

    pub fn warn_list(&self) -> &[WarnEntry] {
        &self.warn
    }

    /// Run one detection cycle.
    ///
    /// Returns `Ok(None)` without doing anything if [`Watcher::init`] has not
    /// been called. A failing process source aborts the cycle before any list
    /// is touched.
    pub async fn check_processes(&mut self, now: Option<SystemTime>) -> Result<Option<CycleSummary>> {
        let Some(collaborators) = self.collaborators.as_mut() else {
            warn!(target: "Watch", "Detection requested before init, skipping cycle");
            return Ok(None);
        };
        let snapshot = collaborators.source.snapshot().await?;
        self.apply_enrichments();

        let mut now = now.unwrap_or_else(SystemTime::now);
        let mut summary = CycleSummary {
            sampled: snapshot.len(),
            ..Default::default()
        };

        let mut ranked: Vec<&ProcessSample> = snapshot.iter().collect();
        ranked.sort_by(|a, b| b.cpu.total_cmp(&a.cpu));
        ranked.truncate(self.detection.candidates);

        if let Some(first) = ranked.first() {
            self.thresholds.calibrate(first.cpu);
        }

        for sample in ranked {
            if let Some(sampled_at) = sample.timestamp {
                now = sampled_at;
            }
            if sample.cpu < self.thresholds.add_level {
                continue;
            }
            summary.hot += 1;
            match self.watch.iter_mut().find(|e| e.pid == sample.pid) {
                Some(watched) => {
                    watched.cpu = sample.cpu;
                    watched.last_detect = now;
                    self.record_warn(sample, now);
                    summary.escalated += 1;
                }
                None => {
                    debug!(target: "Watch", "Watching {} ({}) at {}", sample.name, sample.pid, sample.cpu);
                    self.watch.push(WatchEntry::new(sample, now));
                }
            }
        }

        summary.evicted = self.clean_lists(&snapshot, now);
        debug!(target: "Watch", "Cycle done {:?}", summary);
        Ok(Some(summary))
    }

    /// Put a repeat offender on the warn list, or refresh it if already there.
    fn record_warn(&mut self, sample: &ProcessSample, now: SystemTime) {
        self.spawn_lookup(sample.pid);
        let grace = self.detection.grace_period();
        match self.warn.iter_mut().find(|e| e.pid == sample.pid) {
            Some(entry) => {
                entry.name = sample.name.clone();
                entry.cpu = sample.cpu;
                entry.last_detect = now;
                entry.report = entry.report_time.is_none() && is_at_least(entry.first_detect, now, grace);
            }
            None => {
                info!(target: "Watch", "{} ({}) is a repeat offender at {}", sample.name, sample.pid, sample.cpu);
                self.warn.push(WarnEntry::new(sample, now));
            }
        }
    }

    fn spawn_lookup(&mut self, pid: u32) {
        let Some(collaborators) = self.collaborators.as_ref() else {
            return;
        };
        let lookup = Arc::clone(&collaborators.lookup);
        self.enrichments.spawn(async move {
            match lookup.stats(pid).await {
                Ok(stats) => Some((pid, stats)),
                Err(err) => {
                    debug!(target: "Watch", "Stats lookup for {} failed: {}", pid, err);
                    None
                }
            }
        });
    }

    /// Copy finished stats lookups onto their warn entries.
    pub fn apply_enrichments(&mut self) {
        while let Some(joined) = self.enrichments.try_join_next() {
            self.store_lookup(joined);
        }
    }

    /// Wait for every outstanding stats lookup, then apply them.
    pub async fn settle_enrichments(&mut self) {
        while let Some(joined) = self.enrichments.join_next().await {
            self.store_lookup(joined);
        }
    }

    fn store_lookup(&mut self, joined: Result<Option<(u32, ProcessStats)>, JoinError>) {
        match joined {
            Ok(Some((pid, stats))) => {
                // Entries evicted since the lookup started stay gone.
                if let Some(entry) = self.warn.iter_mut().find(|e| e.pid == pid) {
                    entry.memory = Some(stats.memory);
                    entry.elapsed = Some(stats.elapsed);
                }
            }
            Ok(None) => {}
            Err(err) => error!(target: "Watch", "Stats lookup task failed: {}", err),
        }
    }

    /// Drop entries that are stale, have cooled down, or have exited.
    fn clean_lists(&mut self, snapshot: &[ProcessSample], now: SystemTime) -> usize {
        let mut current: HashMap<u32, f64> = HashMap::with_capacity(snapshot.len());
        for sample in snapshot {
            current.entry(sample.pid).or_insert(sample.cpu);
        }
        let delete_interval = self.detection.delete_interval();
        let remove_level = self.thresholds.remove_level;
        let keep = |pid: u32, last_detect: SystemTime| {
            if is_at_least(last_detect, now, delete_interval) {
                return false;
            }
            current.get(&pid).is_some_and(|cpu| *cpu > remove_level)
        };

        let before = self.watch.len() + self.warn.len();
        self.watch.retain(|e| keep(e.pid, e.last_detect));
        self.warn.retain(|e| {
            let kept = keep(e.pid, e.last_detect);
            if !kept {
                info!(target: "Watch", "No longer warning about {} ({})", e.name, e.pid);
            }
            kept
        });
        before - (self.watch.len() + self.warn.len())
    }
}
