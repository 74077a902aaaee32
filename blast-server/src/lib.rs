// Copyright (c) James Kassemi, SC, US. All rights reserved.
//! Blast API server on hyper v1.
//!
//! Routes: `GET /api/scores`, `POST /api/blast`, `POST /api/log`, `GET /health`,
//! `GET /metrics`, and static files for everything else under `GET`/`HEAD`.

pub mod error;
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;
pub mod static_files;

pub use error::{ApiError, ServerError};
pub use metrics::ServerMetrics;
pub use routes::handle;
pub use server::BlastServer;
pub use state::AppState;
