// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Score ledger for blast events.
//!
//! The crate exposes:
//! - [`IntensityDistribution`]: the fixed weighted draw over the four intensity levels.
//! - [`ScoreLedger`]: per-intensity counters guarded by a single lock, with
//!   snapshot and record operations.

pub mod error;
pub mod ledger;
pub mod sampler;

pub use core_types::{Intensity, ScoreSnapshot};
pub use error::{DistributionError, LedgerError, Result};
pub use ledger::ScoreLedger;
pub use sampler::{IntensityDistribution, DEFAULT_WEIGHTS, WEIGHT_SUM_TOLERANCE};
