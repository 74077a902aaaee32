// Copyright (c) James Kassemi, SC, US. All rights reserved.
mod command;

use std::{env, process, sync::Arc};

use blast_client::{spawn_mirror, BlastClient, ClientError, LogSink, MirrorOptions};
use blast_server::{AppState, BlastServer, ServerError};
use command::{Command, CommandError};
use core_types::{AppConfig, ConfigError, ConsoleLevel};
use ledger::{DistributionError, IntensityDistribution, ScoreLedger};
use log::info;
use logbook::{Logbook, LogbookError};
use serde_json::json;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

fn main() {
    if let Err(err) = run() {
        eprintln!("pika-blast failed: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let command = Command::parse(env::args().skip(1))?;
    let config = AppConfig::load()?;
    let runtime = Runtime::new().map_err(AppError::Runtime)?;
    runtime.block_on(async move {
        match command {
            Command::Serve => serve(config).await,
            Command::Blast { count } => blast(config, count).await,
            Command::Scores => scores(config).await,
        }
    })
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logbook(#[from] LogbookError),
    #[error("invalid intensity weights: {0}")]
    Distribution(#[from] DistributionError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to start tokio runtime: {0}")]
    Runtime(std::io::Error),
    #[error("failed to install signal handler: {0}")]
    Signal(std::io::Error),
    #[error("{failed} of {count} blasts failed")]
    Blasts { failed: usize, count: usize },
}

async fn serve(config: AppConfig) -> Result<(), AppError> {
    let logbook = Arc::new(
        Logbook::open(config.logging.dir.clone(), &config.logging.timezone)?
            .with_production(config.is_production()),
    );
    logbook.install()?;

    let distribution = IntensityDistribution::from_config(&config.intensity)?;
    let state = AppState::new(
        ScoreLedger::new(distribution),
        Arc::clone(&logbook),
        config.static_dir.clone(),
    )?;
    let server = BlastServer::new(state);
    let listener = BlastServer::bind(&config.bind_addr()).await?;
    info!(target: "SERVER", "Pika-Blast server running on port {}", config.port);
    info!(target: "SERVER", "Environment: {}", config.node_env);

    let shutdown = CancellationToken::new();
    let serving = server.serve(listener, shutdown.clone());
    tokio::pin!(serving);
    tokio::select! {
        result = &mut serving => result?,
        signal = wait_for_shutdown_signal() => {
            let signal = signal.map_err(AppError::Signal)?;
            info!(target: "SERVER", "{signal} received, shutting down gracefully");
            shutdown.cancel();
            serving.await?;
        }
    }
    info!(target: "SERVER", "Server closed");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "SIGINT")
}

/// Posts `count` locally drawn blasts, mirroring progress to the server log.
async fn blast(config: AppConfig, count: usize) -> Result<(), AppError> {
    let client = BlastClient::from_config(&config.client)?;
    let distribution = IntensityDistribution::from_config(&config.intensity)?;
    let (console, mirror) = spawn_mirror(client.clone(), MirrorOptions::default());

    let mut rng = rand::thread_rng();
    let mut failed = 0;
    let mut last = None;
    for _ in 0..count {
        match client.blast_random(&distribution, &mut rng).await {
            Ok(response) => {
                console.info(&format!("{}: {}", response.message, response.scores));
                last = Some(response.scores);
            }
            Err(err) => {
                failed += 1;
                console.log(
                    ConsoleLevel::Error,
                    "Error recording blast",
                    Some(json!({ "error": err.to_string() })),
                );
            }
        }
    }

    let undelivered = mirror.shutdown().await;
    if undelivered > 0 {
        eprintln!("{undelivered} log line(s) could not be mirrored to the server");
    }
    if let Some(scores) = last {
        println!("{}", serde_json::to_string(&scores).unwrap_or_else(|_| scores.to_string()));
    }
    if failed > 0 {
        return Err(AppError::Blasts { failed, count });
    }
    Ok(())
}

async fn scores(config: AppConfig) -> Result<(), AppError> {
    let client = BlastClient::from_config(&config.client)?;
    let scores = client.scores().await?;
    println!("{}", serde_json::to_string(&scores).unwrap_or_else(|_| scores.to_string()));
    Ok(())
}
