//! Startup configuration, read once from an optional TOML file and the environment.
//!

use color_eyre::{Result, eyre::eyre};
use config;
use log::*;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

pub const DEFAULT_FILE: &str = "procwatch.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// CPU level at or above which a process becomes a candidate.
    pub add_level: f64,
    /// CPU level at or below which a tracked process is dropped.
    pub remove_level: f64,
    pub delete_interval_secs: u64,
    pub grace_period_secs: u64,
    /// How many of the busiest processes are looked at per cycle.
    pub candidates: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            add_level: 50.0,
            remove_level: 25.0,
            delete_interval_secs: 3 * 60 * 60,
            grace_period_secs: 15 * 60,
            candidates: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    pub report_interval_secs: u64,
    pub report_cap: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_file: Option<PathBuf>,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 90 * 60,
            report_cap: 20,
            alert_file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub sample_interval_secs: u64,
    pub report_every_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 60,
            report_every_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub detection: DetectionConfig,
    pub reporting: ReportingConfig,
    pub schedule: ScheduleConfig,
}

impl DetectionConfig {
    pub fn delete_interval(&self) -> Duration {
        Duration::from_secs(self.delete_interval_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

impl ReportingConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}

impl ScheduleConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    pub fn report_every(&self) -> Duration {
        Duration::from_secs(self.report_every_secs)
    }
}

impl WatchConfig {
    /// Load from the given file (if it exists) with `PROCWATCH_` environment overrides.
    pub fn load(file_path: PathBuf) -> Result<WatchConfig> {
        info!(target: "Config", "Loading {:?}", file_path);
        let raw = config::Config::builder()
            .add_source(config::File::from(file_path).required(false))
            .add_source(
                config::Environment::with_prefix("PROCWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let loaded: WatchConfig = raw.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if d.remove_level <= 0.0 || d.add_level <= 0.0 {
            return Err(eyre!("detection.add_level and detection.remove_level must be positive"));
        }
        if d.remove_level > d.add_level {
            return Err(eyre!(
                "detection.remove_level ({}) must not exceed detection.add_level ({})",
                d.remove_level,
                d.add_level
            ));
        }
        if d.candidates == 0 {
            return Err(eyre!("detection.candidates must be at least 1"));
        }
        if d.delete_interval_secs == 0 {
            return Err(eyre!("detection.delete_interval_secs must be non-zero"));
        }
        if self.reporting.report_cap == 0 {
            return Err(eyre!("reporting.report_cap must be at least 1"));
        }
        if self.reporting.report_interval_secs == 0 {
            return Err(eyre!("reporting.report_interval_secs must be non-zero"));
        }
        if self.schedule.sample_interval_secs == 0 || self.schedule.report_every_secs == 0 {
            return Err(eyre!("schedule intervals must be non-zero"));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = WatchConfig::default();
        assert_eq!(c.detection.add_level, 50.0);
        assert_eq!(c.detection.remove_level, 25.0);
        assert_eq!(c.detection.delete_interval(), Duration::from_secs(3 * 3600));
        assert_eq!(c.detection.grace_period(), Duration::from_secs(15 * 60));
        assert_eq!(c.detection.candidates, 5);
        assert_eq!(c.reporting.report_interval(), Duration::from_secs(90 * 60));
        assert_eq!(c.reporting.report_cap, 20);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let c = WatchConfig::load(PathBuf::from("/nonexistent/procwatch-test.toml")).unwrap();
        assert_eq!(c, WatchConfig::default());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let text = "[detection]\nadd_level = 80.0\n\n[reporting]\nreport_cap = 3\n";
        let c: WatchConfig = toml::from_str(text).unwrap();
        assert_eq!(c.detection.add_level, 80.0);
        assert_eq!(c.detection.remove_level, 25.0);
        assert_eq!(c.reporting.report_cap, 3);
        assert_eq!(c.schedule, ScheduleConfig::default());
    }

    #[test]
    fn defaults_survive_toml_output() {
        let text = WatchConfig::default().to_toml().unwrap();
        let back: WatchConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, WatchConfig::default());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut c = WatchConfig::default();
        c.detection.remove_level = 60.0;
        let err = c.validate().unwrap_err().to_string();
        assert!(err.contains("remove_level"), "{}", err);
    }

    #[test]
    fn rejects_zero_candidates() {
        let mut c = WatchConfig::default();
        c.detection.candidates = 0;
        assert!(c.validate().is_err());
    }
}
