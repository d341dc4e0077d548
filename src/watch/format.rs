//! Human readable alert text.

use std::time::{Duration, SystemTime};

use crate::watch::entry::{WarnEntry, distance};

/// Prefix that marks an alert payload on the transport.
pub const ALERT_MARKER: &str = "__alert:";

pub const ALERT_HEADLINE: &str = "This process may be problematic";

const BYTE_UNITS: [&str; 9] = ["Bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// At most two decimals, trailing zeros dropped.
fn trim_decimals(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", trim_decimals(value), BYTE_UNITS[unit])
}

/// `minutes.seconds`, seconds rounded and zero padded.
pub fn to_minutes(d: Duration) -> String {
    let millis = d.as_millis();
    let mut minutes = millis / 60_000;
    let mut seconds = ((millis % 60_000) + 500) / 1000;
    if seconds == 60 {
        minutes += 1;
        seconds = 0;
    }
    format!("{}.{:02}", minutes, seconds)
}

/// CPU as a percentage, whatever unit the source used.
pub fn display_cpu(cpu: f64) -> String {
    if cpu <= 1.0 {
        trim_decimals(cpu * 100.0)
    } else {
        trim_decimals(cpu)
    }
}

pub fn alert_message(entry: &WarnEntry, now: SystemTime) -> String {
    let memory = entry
        .memory
        .map(format_bytes)
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "\n{} \n{} CPU usage {}, memory usage {}, last detected {} min ago, pid {}, first logged {} ago.",
        ALERT_HEADLINE,
        entry.name.replace(':', ";"),
        display_cpu(entry.cpu),
        memory,
        to_minutes(distance(now, entry.last_detect)),
        entry.pid,
        to_minutes(distance(now, entry.first_detect)),
    )
}

pub fn frame_alert(message: &str) -> String {
    format!("{}{}", ALERT_MARKER, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! format_bytes_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (bytes, expected) = $value;
                    assert_eq!(format_bytes(bytes), expected);
                }
            )*
        }
    }

    format_bytes_tests! {
        zero_bytes: (0, "0 Bytes"),
        plain_bytes: (512, "512 Bytes"),
        exact_kilobyte: (1024, "1 KB"),
        fractional_kilobytes: (1_000_000, "976.56 KB"),
        exact_megabyte: (1_048_576, "1 MB"),
        one_decimal_megabytes: (44_444_444, "42.39 MB"),
        gigabytes: (3 * 1024 * 1024 * 1024 / 2, "1.5 GB"),
    }

    #[test]
    fn minutes_are_padded() {
        assert_eq!(to_minutes(Duration::from_secs(0)), "0.00");
        assert_eq!(to_minutes(Duration::from_secs(65)), "1.05");
        assert_eq!(to_minutes(Duration::from_secs(20 * 60)), "20.00");
    }

    #[test]
    fn minutes_round_seconds() {
        assert_eq!(to_minutes(Duration::from_millis(61_400)), "1.01");
        assert_eq!(to_minutes(Duration::from_millis(61_600)), "1.02");
        assert_eq!(to_minutes(Duration::from_millis(119_700)), "2.00");
    }

    #[test]
    fn cpu_shown_as_percentage() {
        assert_eq!(display_cpu(100.0), "100");
        assert_eq!(display_cpu(0.88), "88");
        assert_eq!(display_cpu(1.0), "100");
        assert_eq!(display_cpu(62.5), "62.5");
    }

    #[test]
    fn message_has_no_delimiter() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);
        let entry = WarnEntry {
            pid: 42,
            name: "worker:7".to_string(),
            cpu: 0.9,
            memory: Some(1_048_576),
            elapsed: None,
            first_detect: now - Duration::from_secs(20 * 60),
            last_detect: now - Duration::from_secs(65),
            report_time: None,
            report: true,
        };
        let message = alert_message(&entry, now);
        assert!(!message.contains(':'), "{}", message);
        assert_eq!(
            message,
            "\nThis process may be problematic \nworker;7 CPU usage 90, memory usage 1 MB, \
             last detected 1.05 min ago, pid 42, first logged 20.00 ago."
        );
        assert_eq!(frame_alert(&message), format!("__alert:{}", message));
    }

    #[test]
    fn missing_memory_is_unknown() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(10_000);
        let entry = WarnEntry {
            pid: 1,
            name: "busy".to_string(),
            cpu: 75.0,
            memory: None,
            elapsed: None,
            first_detect: now,
            last_detect: now,
            report_time: None,
            report: false,
        };
        assert!(alert_message(&entry, now).contains("memory usage unknown"));
    }
}
