use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, SelectorError};
use crate::node::Node;

/// Liveness verdict source for nodes.
///
/// `Err` means the probe failed; the engine folds it into the node's
/// failure count and keeps running. Probe failures are ordinary operation,
/// never propagated out of the monitoring loop.
///
/// Implementations must resolve within a bounded time; a probe that could
/// hang forever should wrap itself in a timeout and report failure on
/// expiry, the way [`HttpProbe`] does.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, node: &Node) -> Result<()>;
}

/// Coin-flip probe for demos and tests.
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    success_rate: f64,
}

impl SimulatedProbe {
    /// `success_rate` is clamped to 0.0..=1.0.
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl Default for SimulatedProbe {
    /// 95% success rate.
    fn default() -> Self {
        Self::new(0.95)
    }
}

#[async_trait]
impl HealthProbe for SimulatedProbe {
    async fn probe(&self, node: &Node) -> Result<()> {
        if rand::random::<f64>() < self.success_rate {
            Ok(())
        } else {
            Err(SelectorError::Probe(format!(
                "simulated probe failure for {}",
                node.name
            )))
        }
    }
}

/// Probes a node's HTTP endpoint with a GET request.
///
/// Any non-2xx status, transport error, or timeout counts as a failure.
/// A node without an endpoint always fails the probe.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpProbe {
    /// 2 second timeout.
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, node: &Node) -> Result<()> {
        use http_body_util::Empty;
        use hyper::body::Bytes;
        use hyper_util::client::legacy::Client;
        use hyper_util::rt::TokioExecutor;

        let endpoint = node.endpoint.as_deref().ok_or_else(|| {
            SelectorError::Probe(format!("node {} has no endpoint", node.name))
        })?;

        let request = hyper::Request::builder()
            .method("GET")
            .uri(endpoint)
            .body(Empty::<Bytes>::new())
            .map_err(|e| SelectorError::Probe(format!("failed to build request: {}", e)))?;

        let client = Client::builder(TokioExecutor::new()).build_http();

        let response = tokio::time::timeout(self.timeout, client.request(request))
            .await
            .map_err(|_| {
                SelectorError::Probe(format!(
                    "probe timeout after {}ms",
                    self.timeout.as_millis()
                ))
            })?
            .map_err(|e| SelectorError::Probe(format!("probe request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SelectorError::Probe(format!(
                "probe returned HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}
