// Copyright (c) James Kassemi, SC, US. All rights reserved.
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Wall clock in the zone the log files are dated in.
#[derive(Debug, Clone, Copy)]
pub struct LogClock {
    tz: Tz,
}

impl LogClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.at(Utc::now())
    }

    pub fn at(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// `2024-01-15 12:30:45.123 PST`
    pub fn timestamp(&self, local: &DateTime<Tz>) -> String {
        local.format("%Y-%m-%d %H:%M:%S%.3f %Z").to_string()
    }

    /// `2024-01-15`, used in file names.
    pub fn date_stamp(&self, local: &DateTime<Tz>) -> String {
        local.format("%Y-%m-%d").to_string()
    }
}

impl Default for LogClock {
    fn default() -> Self {
        Self::new(chrono_tz::America::Los_Angeles)
    }
}

pub fn format_line(
    timestamp: &str,
    level: &str,
    source: &str,
    message: &str,
    data: Option<&Value>,
) -> String {
    let mut line = format!("[{timestamp}] [{level}] [{source}] {message}");
    if let Some(data) = data.filter(|data| !data.is_null()) {
        line.push_str(" | Data: ");
        line.push_str(&data.to_string());
    }
    line
}
