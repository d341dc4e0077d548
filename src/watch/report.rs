use std::{collections::HashSet, fmt::Display, time::SystemTime};

use log::*;

use crate::watch::{
    entry::is_at_least,
    format::{alert_message, frame_alert},
    watcher::Watcher,
};

pub const NO_ISSUES: &str = "no issues";
pub const ISSUES_EXIST: &str = "issues exist";

/// Result of one report pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The warn list is empty.
    NoIssues,
    /// Offenders exist but none were due.
    IssuesExist,
    /// Messages sent this pass, in order.
    Alerted(Vec<String>),
}

impl ReportOutcome {
    pub fn alerts(&self) -> &[String] {
        match self {
            ReportOutcome::Alerted(messages) => messages,
            _ => &[],
        }
    }

    /// One line summary for logs and the status bar.
    pub fn headline(&self) -> String {
        match self {
            ReportOutcome::Alerted(_) => {
                format!("{}, {} alert(s) sent", ISSUES_EXIST, self.alerts().len())
            }
            other => other.to_string(),
        }
    }
}

impl Display for ReportOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportOutcome::NoIssues => f.write_str(NO_ISSUES),
            ReportOutcome::IssuesExist => f.write_str(ISSUES_EXIST),
            ReportOutcome::Alerted(messages) => {
                f.write_str(ISSUES_EXIST)?;
                for message in messages {
                    f.write_str(message)?;
                }
                Ok(())
            }
        }
    }
}

impl Watcher {
    /// Alert on warn entries that are due.
    ///
    /// An entry is due when its `report` flag is set, or when its last alert
    /// is at least one report interval old. Entries that were never alerted
    /// only become due through the flag, so a new offender waits out the
    /// grace period first.
    ///
    /// Only the busiest `report_cap` entries are kept; the rest are dropped
    /// from the warn list. A failed send is logged and the entry is still
    /// marked as reported.
    pub fn report(&mut self, now: Option<SystemTime>) -> ReportOutcome {
        if self.collaborators.is_none() {
            warn!(target: "Report", "Report requested before init, nothing to do");
            return ReportOutcome::NoIssues;
        }
        self.apply_enrichments();
        let now = now.unwrap_or_else(SystemTime::now);

        let mut seen = HashSet::new();
        self.warn.retain(|e| seen.insert(e.pid));
        if self.warn.is_empty() {
            return ReportOutcome::NoIssues;
        }

        self.warn.sort_by(|a, b| b.cpu.total_cmp(&a.cpu));
        if self.warn.len() > self.reporting.report_cap {
            debug!(
                target: "Report",
                "Dropping {} warn entries over the cap",
                self.warn.len() - self.reporting.report_cap
            );
            self.warn.truncate(self.reporting.report_cap);
        }

        let report_interval = self.reporting.report_interval();
        let mut sent = Vec::new();
        for entry in self.warn.iter_mut() {
            let rewarn = entry
                .report_time
                .is_some_and(|t| is_at_least(t, now, report_interval));
            if !(rewarn || entry.report) {
                continue;
            }
            let message = alert_message(entry, now);
            if let Some(collaborators) = self.collaborators.as_mut()
                && let Err(err) = collaborators.sink.send(&frame_alert(&message))
            {
                error!(target: "Report", "Failed to send alert for {}: {}", entry.pid, err);
            }
            entry.report = false;
            entry.report_time = Some(now);
            sent.push(message);
        }

        if sent.is_empty() {
            ReportOutcome::IssuesExist
        } else {
            info!(target: "Report", "Sent {} alert(s)", sent.len());
            ReportOutcome::Alerted(sent)
        }
    }
}
