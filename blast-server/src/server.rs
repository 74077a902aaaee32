// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use hyper::{body::Incoming, server::conn::http1, service::service_fn, Request};
use hyper_util::rt::TokioIo;
use log::{debug, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{error::ServerError, routes, state::AppState};

pub struct BlastServer {
    state: Arc<AppState>,
}

impl BlastServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })
    }

    /// Accepts connections until `shutdown` fires, then lets in-flight
    /// connections finish their current exchange before returning.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        let tracker = TaskTracker::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, remote)) => {
                            let state = Arc::clone(&self.state);
                            let shutdown = shutdown.clone();
                            tracker.spawn(async move {
                                if let Err(err) = serve_connection(stream, remote, state, shutdown).await {
                                    debug!(target: "SERVER", "connection {remote} closed with error: {err}");
                                }
                            });
                        }
                        Err(err) => {
                            warn!(target: "SERVER", "accept error: {err}");
                        }
                    }
                }
            }
        }
        tracker.close();
        tracker.wait().await;
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote: SocketAddr,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Infallible>(routes::handle(state, req, Some(remote)).await) }
    });
    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);
    tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}
