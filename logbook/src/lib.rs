// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Log sink shared by the backend and the frontend mirror.
//!
//! Every line is `[timestamp] [LEVEL] [SOURCE] message | Data: {json}` and is
//! appended to `backend-<date>.log`, or `frontend-<date>.log` for lines whose
//! source is `FRONTEND`. [`Logbook::install`] routes the `log` macros into the
//! same files, using the macro `target` as the source.

mod files;
mod format;
mod logbook;

pub use files::{LogFiles, LogStream};
pub use format::{format_line, LogClock};
pub use logbook::{Logbook, LogbookError, RequestLog, FRONTEND_SOURCE};
