// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::ScoreSnapshot;
use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

/// Prometheus exporter scoped to one server instance.
pub struct ServerMetrics {
    registry: Registry,
    scores: IntGaugeVec,
    requests: IntCounterVec,
}

impl ServerMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let scores = IntGaugeVec::new(
            Opts::new("blast_scores", "Recorded blasts per intensity level"),
            &["intensity"],
        )?;
        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests served by method and status"),
            &["method", "status"],
        )?;
        registry.register(Box::new(scores.clone()))?;
        registry.register(Box::new(requests.clone()))?;
        Ok(Self {
            registry,
            scores,
            requests,
        })
    }

    pub fn observe_request(&self, method: &str, status: u16) {
        self.requests
            .with_label_values(&[method, &status.to_string()])
            .inc();
    }

    /// Text exposition with the score gauges set from `snapshot`.
    pub fn render(&self, snapshot: &ScoreSnapshot) -> Result<Vec<u8>, prometheus::Error> {
        for (intensity, count) in snapshot.iter() {
            self.scores
                .with_label_values(&[intensity.as_str()])
                .set(i64::try_from(count).unwrap_or(i64::MAX));
        }
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}
