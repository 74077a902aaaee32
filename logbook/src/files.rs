// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogStream {
    Backend,
    Frontend,
}

impl LogStream {
    pub fn prefix(self) -> &'static str {
        match self {
            LogStream::Backend => "backend",
            LogStream::Frontend => "frontend",
        }
    }
}

/// Append-only, date-stamped log files under one directory.
pub struct LogFiles {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LogFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    pub fn path_for(&self, stream: LogStream, date_stamp: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{}.log", stream.prefix(), date_stamp))
    }

    pub fn append(&self, stream: LogStream, date_stamp: &str, line: &str) -> io::Result<()> {
        let path = self.path_for(stream, date_stamp);
        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }
}
