// Copyright (c) James Kassemi, SC, US. All rights reserved.
//! Console log mirroring.
//!
//! A [`RemoteLogSink`] echoes each call locally and appends it to a bounded
//! queue that a background worker posts to `/api/log`. The oldest entries are
//! dropped when the queue is full. While the server is unreachable the queue
//! is retried on an interval and once more at shutdown.

use std::{
    backtrace::{Backtrace, BacktraceStatus},
    collections::VecDeque,
    future::Future,
    sync::Arc,
    time::Duration,
};

use core_types::{ConsoleLevel, FrontendLogEntry, RetryPolicy};
use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::client::{BlastClient, ClientError};

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_BACKLOG: usize = 1_000;

/// Destination for console-style log calls.
pub trait LogSink: Send + Sync {
    fn log(&self, level: ConsoleLevel, message: &str, data: Option<Value>);

    fn info(&self, message: &str) {
        self.log(ConsoleLevel::Info, message, None);
    }

    fn warn(&self, message: &str) {
        self.log(ConsoleLevel::Warn, message, None);
    }

    fn error(&self, message: &str) {
        self.log(ConsoleLevel::Error, message, None);
    }

    fn debug(&self, message: &str) {
        self.log(ConsoleLevel::Debug, message, None);
    }
}

/// Writes to stdout, or stderr for warnings and errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn log(&self, level: ConsoleLevel, message: &str, data: Option<Value>) {
        let line = match data {
            Some(data) => format!("{message} {data}"),
            None => message.to_string(),
        };
        match level {
            ConsoleLevel::Warn | ConsoleLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }
}

/// Delivers one mirrored entry.
pub trait LogTransport: Send + Sync + 'static {
    fn deliver(
        &self,
        entry: &FrontendLogEntry,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl LogTransport for BlastClient {
    fn deliver(
        &self,
        entry: &FrontendLogEntry,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        self.send_log(entry)
    }
}

#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Also write each call to the local console.
    pub echo: bool,
    /// Attach a stack trace to error-level entries.
    pub capture_stack: bool,
    pub flush_interval: Duration,
    pub max_backlog: usize,
    pub retry: RetryPolicy,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            echo: true,
            capture_stack: true,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_backlog: DEFAULT_MAX_BACKLOG,
            retry: RetryPolicy::log_mirror(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteLogSink {
    queue: Arc<MirrorQueue>,
    echo: bool,
    capture_stack: bool,
}

impl LogSink for RemoteLogSink {
    fn log(&self, level: ConsoleLevel, message: &str, data: Option<Value>) {
        if self.echo {
            ConsoleSink.log(level, message, data.clone());
        }
        let mut entry = FrontendLogEntry::new(level, message);
        if level == ConsoleLevel::Error && self.capture_stack {
            let trace = Backtrace::force_capture();
            if trace.status() == BacktraceStatus::Captured {
                entry = entry.with_stack(trace.to_string());
            }
        }
        if let Some(data) = data {
            entry = entry.with_data(data);
        }
        self.queue.push(entry);
    }
}

/// Entries waiting to be sent, oldest first. Holds at most `capacity`.
#[derive(Debug)]
struct MirrorQueue {
    entries: Mutex<VecDeque<FrontendLogEntry>>,
    wake: Notify,
    capacity: usize,
}

impl MirrorQueue {
    fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            wake: Notify::new(),
            capacity: capacity.max(1),
        }
    }

    fn push(&self, entry: FrontendLogEntry) {
        {
            let mut entries = self.entries.lock();
            if entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
        self.wake.notify_one();
    }

    fn pop(&self) -> Option<FrontendLogEntry> {
        self.entries.lock().pop_front()
    }

    /// Returns a failed entry to the front. When newer entries have filled
    /// the queue meanwhile, the failed one is the oldest and is dropped.
    fn requeue(&self, entry: FrontendLogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() < self.capacity {
            entries.push_front(entry);
        }
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

pub struct MirrorHandle {
    cancel: CancellationToken,
    queue: Arc<MirrorQueue>,
    task: JoinHandle<usize>,
}

impl MirrorHandle {
    /// Entries not yet delivered, including those waiting for redelivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Stops the worker after a final flush and returns how many entries
    /// were never delivered.
    pub async fn shutdown(self) -> usize {
        self.cancel.cancel();
        match self.task.await {
            Ok(undelivered) => undelivered,
            Err(err) => {
                warn!(target: "MIRROR", "log mirror worker failed: {err}");
                self.queue.len()
            }
        }
    }
}

/// Starts the mirror worker on the current tokio runtime.
pub fn spawn<T: LogTransport>(transport: T, options: MirrorOptions) -> (RemoteLogSink, MirrorHandle) {
    let cancel = CancellationToken::new();
    let queue = Arc::new(MirrorQueue::new(options.max_backlog));
    let worker = MirrorWorker {
        transport,
        queue: Arc::clone(&queue),
        retry: options.retry.clone(),
    };
    let task = tokio::spawn(worker.run(cancel.clone(), options.flush_interval));
    let sink = RemoteLogSink {
        queue: Arc::clone(&queue),
        echo: options.echo,
        capture_stack: options.capture_stack,
    };
    (
        sink,
        MirrorHandle {
            cancel,
            queue,
            task,
        },
    )
}

struct MirrorWorker<T> {
    transport: T,
    queue: Arc<MirrorQueue>,
    retry: RetryPolicy,
}

impl<T: LogTransport> MirrorWorker<T> {
    /// Sends entries as they arrive. After a transient failure new entries
    /// only accumulate until the next flush tick.
    async fn run(self, cancel: CancellationToken, flush_interval: Duration) -> usize {
        let flush_interval = flush_interval.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(time::Instant::now() + flush_interval, flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut stalled = false;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.queue.wake.notified(), if !stalled => stalled = !self.drain().await,
                _ = ticker.tick() => stalled = !self.drain().await,
            }
        }
        self.drain().await;
        self.queue.len()
    }

    async fn send(&self, entry: &FrontendLogEntry) -> Result<(), ClientError> {
        self.retry
            .retry_async_if(|_| self.transport.deliver(entry), ClientError::is_transient)
            .await
    }

    /// Sends queued entries in order. Returns false when a transient failure
    /// left entries behind.
    async fn drain(&self) -> bool {
        while let Some(entry) = self.queue.pop() {
            match self.send(&entry).await {
                Ok(()) => {}
                Err(err) if err.is_transient() => {
                    debug!(target: "MIRROR", "server unavailable, holding log entries: {err}");
                    self.queue.requeue(entry);
                    return false;
                }
                Err(err) => {
                    warn!(target: "MIRROR", "dropping log entry rejected by server: {err}");
                }
            }
        }
        true
    }
}
