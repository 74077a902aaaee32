// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{LevelFilter, Log, Metadata, Record};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::{
    files::{LogFiles, LogStream},
    format::{format_line, LogClock},
};

pub const FRONTEND_SOURCE: &str = "FRONTEND";
const HTTP_SOURCE: &str = "HTTP";

#[derive(Debug, Error)]
pub enum LogbookError {
    #[error("log io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown timezone '{name}'")]
    Timezone { name: String },
    #[error("a global logger is already installed")]
    AlreadyInstalled,
}

/// Completed HTTP exchange, logged once the response is ready.
#[derive(Debug, Clone)]
pub struct RequestLog {
    pub method: String,
    pub path: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub status: u16,
    pub elapsed: Duration,
}

pub struct Logbook {
    files: LogFiles,
    clock: LogClock,
    console: bool,
    production: bool,
}

impl Logbook {
    /// Opens the sink, creating `dir` when missing.
    pub fn open(dir: impl Into<PathBuf>, timezone: &str) -> Result<Self, LogbookError> {
        let tz: Tz = timezone.parse().map_err(|_| LogbookError::Timezone {
            name: timezone.to_string(),
        })?;
        let files = LogFiles::new(dir);
        files.ensure_dir()?;
        Ok(Self {
            files,
            clock: LogClock::new(tz),
            console: true,
            production: false,
        })
    }

    /// Echo lines to stdout/stderr in addition to the files.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Production suppresses DEBUG lines on the console; files keep them.
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn files(&self) -> &LogFiles {
        &self.files
    }

    pub fn clock(&self) -> &LogClock {
        &self.clock
    }

    pub fn timestamp(&self) -> String {
        self.clock.timestamp(&self.clock.now())
    }

    /// Formats and writes one line, returning the write error to the caller.
    pub fn append(
        &self,
        level: &str,
        source: &str,
        message: &str,
        data: Option<&Value>,
    ) -> Result<(), LogbookError> {
        self.append_at(Utc::now(), level, source, message, data)
    }

    pub(crate) fn append_at(
        &self,
        instant: DateTime<Utc>,
        level: &str,
        source: &str,
        message: &str,
        data: Option<&Value>,
    ) -> Result<(), LogbookError> {
        let local = self.clock.at(instant);
        let line = format_line(&self.clock.timestamp(&local), level, source, message, data);
        let stream = if source == FRONTEND_SOURCE {
            LogStream::Frontend
        } else {
            LogStream::Backend
        };
        let written = self
            .files
            .append(stream, &self.clock.date_stamp(&local), &line);
        self.echo(level, &line);
        written.map_err(LogbookError::from)
    }

    /// Best-effort variant: a failed write is reported on stderr with the line.
    pub fn log(&self, level: &str, source: &str, message: &str, data: Option<&Value>) {
        if let Err(err) = self.append(level, source, message, data) {
            eprintln!("Failed to write to log file: {err}");
            eprintln!(
                "Original log: {}",
                format_line(&self.timestamp(), level, source, message, data)
            );
        }
    }

    pub fn info(&self, source: &str, message: &str, data: Option<&Value>) {
        self.log("INFO", source, message, data);
    }

    pub fn warn(&self, source: &str, message: &str, data: Option<&Value>) {
        self.log("WARN", source, message, data);
    }

    pub fn error(&self, source: &str, message: &str, data: Option<&Value>) {
        self.log("ERROR", source, message, data);
    }

    pub fn debug(&self, source: &str, message: &str, data: Option<&Value>) {
        self.log("DEBUG", source, message, data);
    }

    /// Writes a mirrored frontend console call to the frontend file.
    ///
    /// The line's data is `{message, stack}` merged with the caller's object
    /// data; non-object data is kept under `data`.
    pub fn frontend_console(
        &self,
        level: &str,
        message: &str,
        stack: Option<&str>,
        data: Option<&Value>,
    ) -> Result<(), LogbookError> {
        let merged = frontend_data(message, stack, data);
        self.append(&level.to_uppercase(), FRONTEND_SOURCE, message, Some(&merged))
    }

    pub fn request(&self, entry: &RequestLog) {
        let data = json!({
            "method": entry.method,
            "path": entry.path,
            "ip": entry.ip,
            "userAgent": entry.user_agent,
            "statusCode": entry.status,
            "responseTime": format!("{}ms", entry.elapsed.as_millis()),
        });
        let message = format!("{} {} - {}", entry.method, entry.path, entry.status);
        self.info(HTTP_SOURCE, &message, Some(&data));
    }

    /// Routes the `log` facade into this logbook. Only the first call per
    /// process succeeds.
    pub fn install(self: &Arc<Self>) -> Result<(), LogbookError> {
        log::set_boxed_logger(Box::new(LogBridge(Arc::clone(self))))
            .map_err(|_| LogbookError::AlreadyInstalled)?;
        log::set_max_level(LevelFilter::Debug);
        Ok(())
    }

    fn echo(&self, level: &str, line: &str) {
        if !self.console {
            return;
        }
        match level {
            "ERROR" | "WARN" => eprintln!("{line}"),
            "DEBUG" if self.production => {}
            _ => println!("{line}"),
        }
    }
}

fn frontend_data(message: &str, stack: Option<&str>, data: Option<&Value>) -> Value {
    let mut merged = Map::new();
    merged.insert("message".into(), Value::from(message));
    merged.insert("stack".into(), stack.map_or(Value::Null, Value::from));
    match data {
        Some(Value::Object(extra)) => {
            for (key, value) in extra {
                merged.insert(key.clone(), value.clone());
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => {
            merged.insert("data".into(), other.clone());
        }
    }
    Value::Object(merged)
}

/// `SERVER` stays `SERVER`; a module path like `blast_server::routes` becomes `BLAST_SERVER`.
fn source_from_target(target: &str) -> String {
    match target.split_once("::") {
        Some((krate, _)) => krate.to_uppercase(),
        None => target.to_uppercase(),
    }
}

struct LogBridge(Arc<Logbook>);

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level().to_string();
        let source = source_from_target(record.target());
        let message = record.args().to_string();
        self.0.log(&level, &source, &message, None);
    }

    fn flush(&self) {}
}
