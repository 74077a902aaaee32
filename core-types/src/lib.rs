// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared wire schemas, configuration and retry policy for the pika-blast services.

pub mod config;
pub mod retry;
pub mod types;

pub use config::{AppConfig, ConfigError};
pub use retry::RetryPolicy;
pub use types::{
    BlastRequest, BlastResponse, ConsoleLevel, ErrorBody, FrontendLogEntry, HealthBody,
    Intensity, ParseIntensityError, ScoreSnapshot,
};
