// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::{Intensity, ParseIntensityError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("invalid category: {0}")]
    InvalidCategory(#[from] ParseIntensityError),
    #[error("counter for {intensity} would overflow")]
    CounterOverflow { intensity: Intensity },
}

impl LedgerError {
    /// Errors caused by caller input rather than ledger state.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LedgerError::InvalidCategory(_))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
    #[error("weight for {intensity} must be finite and non-negative, got {weight}")]
    InvalidWeight { intensity: Intensity, weight: f64 },
    #[error("weights must sum to 1.0, got {sum}")]
    WeightSum { sum: f64 },
}
