// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{path::PathBuf, sync::Arc};

use ledger::ScoreLedger;
use logbook::Logbook;

use crate::{error::ServerError, metrics::ServerMetrics};

/// Everything a request handler touches, shared behind one `Arc`.
pub struct AppState {
    pub ledger: ScoreLedger,
    pub logbook: Arc<Logbook>,
    pub metrics: ServerMetrics,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        ledger: ScoreLedger,
        logbook: Arc<Logbook>,
        static_dir: impl Into<PathBuf>,
    ) -> Result<Self, ServerError> {
        Ok(Self {
            ledger,
            logbook,
            metrics: ServerMetrics::new()?,
            static_dir: static_dir.into(),
        })
    }
}
