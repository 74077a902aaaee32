// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::ErrorBody;
use http_body_util::Full;
use hyper::{body::Bytes, Response, StatusCode};
use logbook::LogbookError;
use thiserror::Error;

use crate::routes::json_response;

/// Request-level failure; each variant maps to one status and JSON error body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid intensity level")]
    InvalidIntensity,
    #[error("Level and message are required")]
    MissingLogFields,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Not found")]
    NotFound,
    #[error("Failed to process log")]
    LogSink(#[source] LogbookError),
    #[error("Internal server error")]
    Internal { detail: String },
}

impl ApiError {
    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::Internal {
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidIntensity | ApiError::MissingLogFields => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::LogSink(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        json_response(self.status(), &ErrorBody::new(self.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}
