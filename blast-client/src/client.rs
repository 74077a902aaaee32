// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{future::Future, time::Duration};

use core_types::{
    config::ClientConfig, BlastRequest, BlastResponse, ErrorBody, FrontendLogEntry, HealthBody,
    Intensity, ScoreSnapshot,
};
use ledger::IntensityDistribution;
use rand::Rng;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("request rejected ({status}): {error}")]
    Rejected { status: u16, error: String },
    #[error("unexpected http status {status}: {error}")]
    UnexpectedStatus { status: u16, error: String },
}

impl ClientError {
    /// Worth retrying: the server was unreachable or failed on its side.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Request(err) => err.is_connect() || err.is_timeout() || err.is_request(),
            ClientError::UnexpectedStatus { status, .. } => *status >= 500,
            ClientError::Rejected { .. } | ClientError::Url(_) => false,
        }
    }
}

/// Typed access to the pika-blast HTTP API.
#[derive(Debug, Clone)]
pub struct BlastClient {
    client: Client,
    base: Url,
}

impl BlastClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .user_agent(concat!("pika-blast/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, base })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.server_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    pub async fn scores(&self) -> Result<ScoreSnapshot, ClientError> {
        let response = self.client.get(self.endpoint("api/scores")?).send().await?;
        decode(response).await
    }

    pub async fn blast(&self, intensity: Intensity) -> Result<BlastResponse, ClientError> {
        let response = self
            .client
            .post(self.endpoint("api/blast")?)
            .json(&BlastRequest { intensity })
            .send()
            .await?;
        decode(response).await
    }

    /// Draws an intensity locally and posts it.
    pub fn blast_random<R: Rng + ?Sized>(
        &self,
        distribution: &IntensityDistribution,
        rng: &mut R,
    ) -> impl Future<Output = Result<BlastResponse, ClientError>> + '_ {
        let intensity = distribution.sample(rng);
        self.blast(intensity)
    }

    pub async fn send_log(&self, entry: &FrontendLogEntry) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.endpoint("api/log")?)
            .json(entry)
            .send()
            .await?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }

    pub async fn health(&self) -> Result<HealthBody, ClientError> {
        let response = self.client.get(self.endpoint("health")?).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let error = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    let status = status.as_u16();
    if (400..500).contains(&status) {
        Err(ClientError::Rejected { status, error })
    } else {
        Err(ClientError::UnexpectedStatus { status, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_resolve_below_base_path() {
        let client = BlastClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.endpoint("api/scores").unwrap().as_str(),
            "http://localhost:3000/api/scores"
        );

        let proxied = BlastClient::new("http://example.test/pika").unwrap();
        assert_eq!(proxied.base_url().as_str(), "http://example.test/pika/");
        assert_eq!(
            proxied.endpoint("api/blast").unwrap().as_str(),
            "http://example.test/pika/api/blast"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = BlastClient::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::Url(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn status_errors_classify_by_side() {
        let rejected = ClientError::Rejected {
            status: 400,
            error: "Invalid intensity level".into(),
        };
        assert!(!rejected.is_transient());
        let failed = ClientError::UnexpectedStatus {
            status: 503,
            error: "Service Unavailable".into(),
        };
        assert!(failed.is_transient());
    }

    #[tokio::test]
    async fn unreachable_server_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = BlastClient::new(&format!("http://{addr}")).unwrap();
        let err = client.scores().await.unwrap_err();
        assert!(matches!(err, ClientError::Request(_)));
        assert!(err.is_transient());
    }
}
