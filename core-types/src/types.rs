// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Intensity level of a single blast.
///
/// Declaration order is significant: it is the order the sampler walks when
/// accumulating weights and the order counters are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
    Extreme,
}

impl Intensity {
    pub const COUNT: usize = 4;
    pub const ALL: [Intensity; Intensity::COUNT] = [
        Intensity::Low,
        Intensity::Medium,
        Intensity::High,
        Intensity::Extreme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
            Intensity::Extreme => "extreme",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown intensity '{value}' (expected low, medium, high or extreme)")]
pub struct ParseIntensityError {
    pub value: String,
}

impl FromStr for Intensity {
    type Err = ParseIntensityError;

    /// Wire names are case-sensitive; `"Low"` is rejected.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Intensity::ALL
            .into_iter()
            .find(|intensity| intensity.as_str() == value)
            .ok_or_else(|| ParseIntensityError {
                value: value.to_string(),
            })
    }
}

/// Point-in-time copy of the per-intensity counters.
///
/// Serializes as `{"low":..,"medium":..,"high":..,"extreme":..}`, the shape
/// the frontend reads from `/api/scores`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub extreme: u64,
}

impl ScoreSnapshot {
    pub fn from_counts(counts: [u64; Intensity::COUNT]) -> Self {
        let [low, medium, high, extreme] = counts;
        Self {
            low,
            medium,
            high,
            extreme,
        }
    }

    pub fn get(&self, intensity: Intensity) -> u64 {
        match intensity {
            Intensity::Low => self.low,
            Intensity::Medium => self.medium,
            Intensity::High => self.high,
            Intensity::Extreme => self.extreme,
        }
    }

    pub fn total(&self) -> u64 {
        self.iter().map(|(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Intensity, u64)> + '_ {
        Intensity::ALL
            .into_iter()
            .map(move |intensity| (intensity, self.get(intensity)))
    }
}

impl fmt::Display for ScoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "low={} medium={} high={} extreme={} (total={})",
            self.low,
            self.medium,
            self.high,
            self.extreme,
            self.total()
        )
    }
}

/// Body of `POST /api/blast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRequest {
    pub intensity: Intensity,
}

/// Successful reply of `POST /api/blast`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastResponse {
    pub success: bool,
    pub scores: ScoreSnapshot,
    pub message: String,
}

impl BlastResponse {
    pub fn recorded(intensity: Intensity, scores: ScoreSnapshot) -> Self {
        Self {
            success: true,
            scores,
            message: format!("Blast recorded at {intensity} intensity"),
        }
    }
}

/// Error reply shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub timestamp: String,
}

/// Console method a frontend log line originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Debug,
    Info,
    Warn,
    Error,
}

impl ConsoleLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        }
    }

    /// Level sent to `/api/log`; plain `log` calls are recorded as INFO.
    pub fn wire_level(self) -> &'static str {
        match self {
            ConsoleLevel::Log | ConsoleLevel::Info => "INFO",
            ConsoleLevel::Debug => "DEBUG",
            ConsoleLevel::Warn => "WARN",
            ConsoleLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/log`.
///
/// `level` and `message` are optional on the wire so the server can answer a
/// missing field with a 400 instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendLogEntry {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl FrontendLogEntry {
    pub fn new(level: ConsoleLevel, message: impl Into<String>) -> Self {
        Self {
            level: Some(level.wire_level().to_string()),
            message: Some(message.into()),
            stack: None,
            data: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Reads a `/api/log` body field by field.
    ///
    /// Non-string `level`, `message` or `stack` values are kept as their JSON
    /// text; `null` counts as absent. Anything that is not an object yields
    /// an entry without fields.
    pub fn from_value(body: &serde_json::Value) -> Self {
        let text = |key: &str| match body.get(key) {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };
        Self {
            level: text("level"),
            message: text("message"),
            stack: text("stack"),
            data: body.get("data").filter(|data| !data.is_null()).cloned(),
        }
    }

    /// Level and message when both are present and non-empty.
    pub fn required_fields(&self) -> Option<(&str, &str)> {
        let level = self.level.as_deref().filter(|level| !level.is_empty())?;
        let message = self.message.as_deref().filter(|message| !message.is_empty())?;
        Some((level, message))
    }
}
