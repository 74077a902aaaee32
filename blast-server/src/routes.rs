// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{net::SocketAddr, sync::Arc, time::Instant};

use core_types::{BlastResponse, FrontendLogEntry, HealthBody};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::{
    body::{Body, Bytes},
    header::{
        HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, CONTENT_LENGTH,
        CONTENT_TYPE, USER_AGENT, VARY,
    },
    Method, Request, Response, StatusCode,
};
use logbook::RequestLog;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{error::ApiError, state::AppState, static_files};

/// Largest accepted JSON body.
pub const MAX_BODY_BYTES: usize = 100 * 1024;
const CORS_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Marks responses served from the static directory; they skip the access log.
#[derive(Debug, Clone, Copy)]
struct StaticAsset;

/// Serves one request end to end: routing, error mapping, CORS headers,
/// request metrics and the access log line (API traffic and errors only).
pub async fn handle<B>(
    state: Arc<AppState>,
    req: Request<B>,
    remote: Option<SocketAddr>,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut response = match route(&state, req).await {
        Ok(response) => response,
        Err(err) => {
            report(&state, &err, &method, &path);
            err.into_response()
        }
    };
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    let status = response.status().as_u16();
    state.metrics.observe_request(method.as_str(), status);
    if response.extensions().get::<StaticAsset>().is_some() {
        return response;
    }
    state.logbook.request(&RequestLog {
        method: method.to_string(),
        path,
        ip: remote.map(|addr| addr.ip().to_string()),
        user_agent,
        status,
        elapsed: started.elapsed(),
    });
    response
}

async fn route<B>(state: &AppState, req: Request<B>) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let (parts, body) = req.into_parts();
    match (&parts.method, parts.uri.path()) {
        (&Method::OPTIONS, _) => Ok(preflight(&parts.headers)),
        (&Method::GET, "/api/scores") => Ok(json_response(StatusCode::OK, &state.ledger.snapshot())),
        (&Method::POST, "/api/blast") => {
            let body = read_json(body).await?;
            blast(state, body.as_ref())
        }
        (&Method::POST, "/api/log") => {
            let body = read_json(body).await?;
            frontend_log(state, body)
        }
        (&Method::GET, "/health") => Ok(json_response(
            StatusCode::OK,
            &HealthBody {
                status: "ok".to_string(),
                timestamp: state.logbook.timestamp(),
            },
        )),
        (&Method::GET, "/metrics") => metrics(state),
        (&Method::GET, path) => static_file(state, path, false).await,
        (&Method::HEAD, path) => static_file(state, path, true).await,
        _ => Err(ApiError::NotFound),
    }
}

fn blast(state: &AppState, body: Option<&Value>) -> Result<Response<Full<Bytes>>, ApiError> {
    let supplied = body
        .and_then(|body| body.get("intensity"))
        .cloned()
        .unwrap_or(Value::Null);
    let Some(name) = supplied.as_str() else {
        reject_intensity(state, &supplied);
        return Err(ApiError::InvalidIntensity);
    };
    match state.ledger.record_named(name) {
        Ok((intensity, scores)) => {
            let response = BlastResponse::recorded(intensity, scores);
            state.logbook.info(
                "API",
                &response.message,
                Some(&json!({ "intensity": intensity, "scores": scores })),
            );
            Ok(json_response(StatusCode::OK, &response))
        }
        Err(err) if err.is_client_error() => {
            reject_intensity(state, &supplied);
            Err(ApiError::InvalidIntensity)
        }
        Err(err) => Err(ApiError::internal(err.to_string())),
    }
}

fn reject_intensity(state: &AppState, supplied: &Value) {
    state.logbook.warn(
        "API",
        "Invalid blast intensity",
        Some(&json!({ "intensity": supplied })),
    );
}

fn frontend_log(state: &AppState, body: Option<Value>) -> Result<Response<Full<Bytes>>, ApiError> {
    let entry = body
        .as_ref()
        .map(FrontendLogEntry::from_value)
        .unwrap_or_default();
    let (level, message) = entry.required_fields().ok_or(ApiError::MissingLogFields)?;
    state
        .logbook
        .frontend_console(level, message, entry.stack.as_deref(), entry.data.as_ref())
        .map_err(ApiError::LogSink)?;
    Ok(json_response(StatusCode::OK, &json!({ "success": true })))
}

fn metrics(state: &AppState) -> Result<Response<Full<Bytes>>, ApiError> {
    let body = state
        .metrics
        .render(&state.ledger.snapshot())
        .map_err(|err| ApiError::internal(err.to_string()))?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"metrics_unavailable")))))
}

async fn static_file(
    state: &AppState,
    path: &str,
    head: bool,
) -> Result<Response<Full<Bytes>>, ApiError> {
    let (bytes, mime) = static_files::load(&state.static_dir, path)
        .await
        .ok_or(ApiError::NotFound)?;
    let len = bytes.len();
    let body = if head { Bytes::new() } else { Bytes::from(bytes) };
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime)
        .header(CONTENT_LENGTH, len)
        .extension(StaticAsset)
        .body(Full::new(body))
        .unwrap_or_else(|_| ApiError::internal("static response").into_response()))
}

fn preflight(headers: &HeaderMap) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ACCESS_CONTROL_ALLOW_METHODS, CORS_METHODS)
        .header(VARY, "Access-Control-Request-Headers")
        .header(CONTENT_LENGTH, "0");
    if let Some(requested) = headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
        builder = builder.header(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
    }
    builder
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Collects a JSON body. Empty or malformed bodies read as `None`.
async fn read_json<B>(body: B) -> Result<Option<Value>, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ApiError::PayloadTooLarge)
        }
        Err(err) => return Err(ApiError::internal(format!("failed to read body: {err}"))),
    };
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_slice(&bytes).ok())
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let Ok(encoded) = serde_json::to_vec(body) else {
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(Full::new(Bytes::from_static(b"Internal server error")))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"bad response"))));
    };
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Full::new(Bytes::from(encoded)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"bad response"))))
}

fn report(state: &AppState, err: &ApiError, method: &Method, path: &str) {
    match err {
        ApiError::NotFound => state.logbook.warn(
            "HTTP",
            "404 Not Found",
            Some(&json!({ "path": path, "method": method.as_str() })),
        ),
        ApiError::PayloadTooLarge => state.logbook.warn(
            "HTTP",
            "Request body too large",
            Some(&json!({ "path": path, "method": method.as_str(), "limit": MAX_BODY_BYTES })),
        ),
        ApiError::LogSink(source) => state.logbook.error(
            "API",
            "Error processing frontend log",
            Some(&json!({ "error": source.to_string() })),
        ),
        ApiError::Internal { detail } => state.logbook.error(
            "SERVER",
            "Unhandled error",
            Some(&json!({ "error": detail, "path": path, "method": method.as_str() })),
        ),
        // Logged where the intensity is known, or not logged at all.
        ApiError::InvalidIntensity | ApiError::MissingLogFields => {}
    }
}
