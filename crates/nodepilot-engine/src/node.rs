use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Whether a node is eligible for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
}

impl Default for NodeStatus {
    fn default() -> Self {
        NodeStatus::Online
    }
}

/// A candidate upstream node with its measured metrics and health state.
///
/// Metrics (`latency_ms`, `reliability`, `load`) are refreshed by whatever
/// measures them (see [`crate::SmartSelector::update_node_metrics`]); the
/// failure count and status are owned by the health-check loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub name: String,
    pub region: String,
    /// Round-trip latency in milliseconds.
    #[serde(default)]
    pub latency_ms: f64,
    /// Success percentage over the measurement window (0-100).
    #[serde(default)]
    pub reliability: f64,
    /// Utilization percentage (0-100).
    #[serde(default)]
    pub load: f64,
    /// Consecutive health-check failures. Never underflows 0.
    #[serde(default)]
    pub failure_count: u32,
    #[serde(default)]
    pub status: NodeStatus,
    /// Address probed by [`crate::probe::HttpProbe`]; simulated probes ignore it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// When the node was last probed.
    #[serde(skip)]
    pub last_check: Option<Instant>,
}

impl Node {
    pub fn new(id: u32, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            region: region.into(),
            latency_ms: 0.0,
            reliability: 0.0,
            load: 0.0,
            failure_count: 0,
            status: NodeStatus::Online,
            endpoint: None,
            last_check: None,
        }
    }

    /// Sets the measured metrics (builder style).
    pub fn with_metrics(mut self, latency_ms: f64, reliability: f64, load: f64) -> Self {
        self.latency_ms = latency_ms;
        self.reliability = reliability;
        self.load = load;
        self
    }

    /// Sets the address probed by [`crate::probe::HttpProbe`] (builder style).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn is_online(&self) -> bool {
        self.status == NodeStatus::Online
    }

    /// Records a failed health check and returns the new failure count.
    pub fn record_failure(&mut self) -> u32 {
        self.failure_count += 1;
        self.last_check = Some(Instant::now());
        self.failure_count
    }

    /// Records a successful health check. The failure count decays by one,
    /// floored at 0.
    pub fn record_success(&mut self) {
        self.failure_count = self.failure_count.saturating_sub(1);
        self.last_check = Some(Instant::now());
    }
}
