use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, SelectorError};
use crate::history::{FailoverEvent, FailoverHistory};
use crate::monitor::HealthMonitor;
use crate::node::{Node, NodeStatus};
use crate::notify::{LogNotifier, Notifier, Severity};
use crate::probe::{HealthProbe, SimulatedProbe};
use crate::scorer;
use crate::settings::{MemoryStore, SelectorSettings, SettingsStore};
use crate::strategy::{Criterion, Strategy, Weights};

/// How many top-ranked candidates a selection reports.
const CANDIDATE_LIMIT: usize = 5;

/// Mutable engine state. Everything the health tick and the operator
/// operations touch lives behind one lock so a tick is a single atomic pass.
pub(crate) struct SelectorState {
    pub(crate) nodes: Vec<Node>,
    /// Id of the active node, if selection has run.
    pub(crate) current: Option<u32>,
    pub(crate) settings: SelectorSettings,
    pub(crate) history: FailoverHistory,
}

/// A ranked candidate, as reported by [`SmartSelector::select_best_node`].
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub name: String,
    pub region: String,
    pub latency_ms: f64,
    pub score: f64,
}

/// Outcome of a manual "select best node" run.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    /// Name of the node that became current.
    pub name: String,
    pub score: f64,
    /// Up to five top-ranked candidates, best first.
    pub candidates: Vec<Candidate>,
}

/// Result of evaluating a failover for the active node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailoverOutcome {
    /// The active node was switched and the old one marked offline.
    Switched { from: String, to: String },
    /// The failing node is still the best candidate; nothing changed.
    /// Expected operation, not an error: the caller surfaces it as a warning.
    NoAlternative,
}

/// Smart node selection and auto-failover engine.
///
/// Scores candidate nodes under operator-configurable weights, keeps the
/// top-ranked one active, and — when periodic health probes push the active
/// node past the failure threshold — switches to the best alternative,
/// recording the transition.
///
/// Collaborators are injected: a [`HealthProbe`] produces liveness
/// verdicts, a [`Notifier`] receives operator-facing messages, and a
/// [`SettingsStore`] persists settings across restarts. State lives behind
/// a single `RwLock`; the health monitor is a cancellable background task,
/// at most one per instance.
///
/// # Example
///
/// ```no_run
/// # use nodepilot_engine::{Node, SmartSelector};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let nodes = vec![
///     Node::new(0, "US-West-1", "US-West").with_metrics(42.0, 97.0, 31.0),
///     Node::new(1, "EU-West-1", "EU-West").with_metrics(120.0, 99.0, 12.0),
/// ];
/// let selector = SmartSelector::new(nodes);
/// let selection = selector.select_best_node().await?;
/// println!("active node: {} (score {:.1})", selection.name, selection.score);
/// selector.start_monitoring().await;
/// # Ok(())
/// # }
/// ```
pub struct SmartSelector {
    state: Arc<RwLock<SelectorState>>,
    probe: Arc<dyn HealthProbe>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn SettingsStore>,
    monitor_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl SmartSelector {
    /// Creates a selector with default settings and collaborators: a
    /// simulated probe, tracing-backed notifications, and in-memory
    /// settings persistence. Monitoring is not started.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self::with_settings(nodes, SelectorSettings::default())
    }

    /// Creates a selector with explicit settings and default collaborators.
    pub fn with_settings(nodes: Vec<Node>, settings: SelectorSettings) -> Self {
        Self::with_collaborators(
            nodes,
            settings,
            Arc::new(SimulatedProbe::default()),
            Arc::new(LogNotifier),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Creates a selector with explicit settings and collaborators. This is
    /// the most flexible constructor; embedders supply their own probe,
    /// notification sink, and settings store.
    pub fn with_collaborators(
        nodes: Vec<Node>,
        settings: SelectorSettings,
        probe: Arc<dyn HealthProbe>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        let state = SelectorState {
            nodes,
            current: None,
            settings: settings.sanitized(),
            history: FailoverHistory::new(),
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            probe,
            notifier,
            store,
            monitor_handle: parking_lot::Mutex::new(None),
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Applies persisted settings from the store. Missing or malformed
    /// persisted settings leave the current settings untouched; this never
    /// fails hard.
    pub async fn load_settings(&self) {
        match self.store.load() {
            Ok(Some(settings)) => {
                let mut guard = self.state.write().await;
                guard.settings = settings.sanitized();
                info!("loaded persisted selector settings");
            }
            Ok(None) => {}
            Err(e) => {
                warn!("failed to load persisted settings, keeping defaults: {}", e);
            }
        }
    }

    /// Persists the current settings through the store.
    pub async fn save_settings(&self) -> Result<()> {
        let settings = self.state.read().await.settings.clone();
        self.store.save(&settings)
    }

    pub async fn settings(&self) -> SelectorSettings {
        self.state.read().await.settings.clone()
    }

    /// Applies a strategy preset: overwrites the active weights with the
    /// preset table and persists the change.
    pub async fn set_strategy(&self, strategy: Strategy) -> Result<()> {
        {
            let mut guard = self.state.write().await;
            guard.settings.strategy = strategy;
            guard.settings.weights = strategy.preset();
        }
        info!("selection strategy set to {}", strategy);
        self.notifier
            .notify(Severity::Success, &format!("Strategy: {}", strategy));
        self.save_settings().await
    }

    pub async fn strategy(&self) -> Strategy {
        self.state.read().await.settings.strategy
    }

    /// Manually overrides all four weights. The strategy label is kept;
    /// presets and manual adjustment are independent.
    pub async fn set_weights(&self, weights: Weights) -> Result<()> {
        {
            let mut guard = self.state.write().await;
            guard.settings.weights = weights;
        }
        self.save_settings().await
    }

    /// Manually adjusts a single criterion's weight.
    pub async fn set_weight(&self, criterion: Criterion, value: f64) -> Result<()> {
        {
            let mut guard = self.state.write().await;
            guard.settings.weights.set(criterion, value);
        }
        self.save_settings().await
    }

    pub async fn weights(&self) -> Weights {
        self.state.read().await.settings.weights
    }

    /// Sets the failure threshold (clamped to >= 1) and persists it.
    pub async fn set_failure_threshold(&self, threshold: u32) -> Result<()> {
        {
            let mut guard = self.state.write().await;
            guard.settings.failure_threshold = threshold.max(1);
        }
        self.save_settings().await
    }

    /// Sets the health-check interval and persists it. A running monitor is
    /// restarted so the old timer never outlives the change.
    pub async fn set_check_interval(&self, secs: u64) -> Result<()> {
        {
            let mut guard = self.state.write().await;
            guard.settings.check_interval = secs.max(1);
        }
        if self.is_monitoring() {
            self.stop_monitoring();
            self.start_monitoring().await;
        }
        self.save_settings().await
    }

    /// Enables or disables auto-failover. Enabling starts the health
    /// monitor; disabling stops it.
    pub async fn set_failover_enabled(&self, enabled: bool) -> Result<()> {
        {
            let mut guard = self.state.write().await;
            guard.settings.failover_enabled = enabled;
        }
        if enabled {
            self.start_monitoring().await;
            self.notifier.notify(Severity::Success, "Auto-failover enabled");
        } else {
            self.stop_monitoring();
            self.notifier.notify(Severity::Info, "Auto-failover disabled");
        }
        self.save_settings().await
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Ranks all online nodes under the active weights and makes the
    /// top-ranked one current.
    ///
    /// Returns [`SelectorError::NoCandidates`] when no node is online;
    /// the caller decides whether to retry or alert.
    pub async fn select_best_node(&self) -> Result<Selection> {
        let mut guard = self.state.write().await;
        let st = &mut *guard;

        let ranking = scorer::rank_nodes(&st.nodes, &st.settings.weights);
        let top = ranking.first().ok_or(SelectorError::NoCandidates)?;

        let best = &st.nodes[top.index];
        st.current = Some(best.id);

        let candidates = ranking
            .iter()
            .take(CANDIDATE_LIMIT)
            .map(|r| {
                let node = &st.nodes[r.index];
                Candidate {
                    name: node.name.clone(),
                    region: node.region.clone(),
                    latency_ms: node.latency_ms,
                    score: r.score,
                }
            })
            .collect();

        let selection = Selection {
            name: best.name.clone(),
            score: top.score,
            candidates,
        };
        drop(guard);

        info!(
            "selected node {} (score {:.1})",
            selection.name, selection.score
        );
        self.notifier.notify(
            Severity::Success,
            &format!("Selected: {} (score: {:.1})", selection.name, selection.score),
        );
        Ok(selection)
    }

    /// Manually pins a specific node as current, bypassing scoring.
    pub async fn select_node(&self, id: u32) -> Result<()> {
        let mut guard = self.state.write().await;
        let node = guard
            .nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| SelectorError::UnknownNode(id.to_string()))?;
        let name = node.name.clone();
        guard.current = Some(id);
        drop(guard);
        info!("manually selected node {}", name);
        Ok(())
    }

    /// The active node, if selection has run.
    pub async fn current_node(&self) -> Option<Node> {
        let guard = self.state.read().await;
        let id = guard.current?;
        guard.nodes.iter().find(|n| n.id == id).cloned()
    }

    // ========================================================================
    // Node membership
    // ========================================================================

    /// Adds a node. Duplicate ids are ignored (no-op).
    pub async fn add_node(&self, node: Node) {
        let mut guard = self.state.write().await;
        if guard.nodes.iter().any(|n| n.id == node.id) {
            return;
        }
        info!("added node {} ({})", node.name, node.region);
        guard.nodes.push(node);
    }

    /// Removes a node. If it was current, the selection is cleared and the
    /// caller should re-select.
    pub async fn remove_node(&self, id: u32) -> bool {
        let mut guard = self.state.write().await;
        let before = guard.nodes.len();
        guard.nodes.retain(|n| n.id != id);
        let removed = guard.nodes.len() < before;
        if removed && guard.current == Some(id) {
            guard.current = None;
            warn!("removed the current node ({}), selection cleared", id);
        }
        removed
    }

    /// Refreshes a node's measured metrics.
    pub async fn update_node_metrics(
        &self,
        id: u32,
        latency_ms: f64,
        reliability: f64,
        load: f64,
    ) -> Result<()> {
        let mut guard = self.state.write().await;
        let node = guard
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| SelectorError::UnknownNode(id.to_string()))?;
        node.latency_ms = latency_ms;
        node.reliability = reliability;
        node.load = load;
        Ok(())
    }

    pub async fn nodes(&self) -> Vec<Node> {
        self.state.read().await.nodes.clone()
    }

    pub async fn node_count(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    /// Recorded failovers, newest first.
    pub async fn history(&self) -> Vec<FailoverEvent> {
        self.state.read().await.history.entries().cloned().collect()
    }

    // ========================================================================
    // Health checking & failover
    // ========================================================================

    /// Runs one health-check tick over all nodes: probe each, update
    /// failure counts, and evaluate failover for the current node.
    ///
    /// Normally driven by the monitor; callable directly for an on-demand
    /// pass.
    pub async fn check_nodes_health(&self) -> Option<FailoverOutcome> {
        run_health_tick(&self.state, self.probe.as_ref(), self.notifier.as_ref()).await
    }

    // ========================================================================
    // Monitoring
    // ========================================================================

    /// Starts the background health monitor. No-op if one is already
    /// running; there is never more than one per instance.
    pub async fn start_monitoring(&self) {
        let interval_secs = self.state.read().await.settings.check_interval;
        let mut slot = self.monitor_handle.lock();
        if slot.is_some() {
            return;
        }
        let monitor = HealthMonitor::new(
            self.state.clone(),
            self.probe.clone(),
            self.notifier.clone(),
            Duration::from_secs(interval_secs),
        );
        *slot = Some(monitor.spawn());
        info!("health monitoring started ({}s interval)", interval_secs);
    }

    /// Stops the background health monitor, if running. The in-flight tick,
    /// if any, is cancelled with the task.
    pub fn stop_monitoring(&self) {
        if let Some(handle) = self.monitor_handle.lock().take() {
            handle.abort();
            info!("health monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor_handle.lock().is_some()
    }
}

impl Drop for SmartSelector {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor_handle.lock().take() {
            handle.abort();
        }
    }
}

/// One health-check pass: snapshot the nodes, probe them concurrently
/// without holding the state lock, then apply every result under a single
/// write lock so the pass is atomic with respect to operator calls.
pub(crate) async fn run_health_tick(
    state: &Arc<RwLock<SelectorState>>,
    probe: &dyn HealthProbe,
    notifier: &dyn Notifier,
) -> Option<FailoverOutcome> {
    let snapshot: Vec<Node> = state.read().await.nodes.clone();

    let probes = snapshot.iter().map(|node| async move {
        (node.id, probe.probe(node).await)
    });
    let results = futures::future::join_all(probes).await;

    let mut guard = state.write().await;
    let st = &mut *guard;

    let mut current_tripped = false;
    for (id, result) in results {
        // membership may have changed while probes were in flight
        let Some(node) = st.nodes.iter_mut().find(|n| n.id == id) else {
            continue;
        };
        match result {
            Ok(()) => {
                node.record_success();
                if node.status == NodeStatus::Offline && node.failure_count == 0 {
                    node.status = NodeStatus::Online;
                    let message = format!("Node {} recovered", node.name);
                    info!("{}", message);
                    notifier.notify(Severity::Info, &message);
                }
            }
            Err(e) => {
                let failures = node.record_failure();
                debug!("health probe failed for {}: {}", node.name, e);
                if st.current == Some(id) && failures >= st.settings.failure_threshold {
                    current_tripped = true;
                }
            }
        }
    }

    if current_tripped && st.settings.failover_enabled {
        Some(perform_failover(st, notifier))
    } else {
        None
    }
}

/// Re-ranks the online nodes and switches away from the failing current
/// node. The failing node is still online at this point and competes in
/// the ranking; if it remains the top choice the switch is skipped.
fn perform_failover(st: &mut SelectorState, notifier: &dyn Notifier) -> FailoverOutcome {
    let no_alternative = |notifier: &dyn Notifier| {
        notifier.notify(Severity::Error, "No healthy alternative nodes available");
        FailoverOutcome::NoAlternative
    };

    let Some(current_id) = st.current else {
        return no_alternative(notifier);
    };

    let ranking = scorer::rank_nodes(&st.nodes, &st.settings.weights);
    let Some(top) = ranking.first() else {
        return no_alternative(notifier);
    };
    if st.nodes[top.index].id == current_id {
        return no_alternative(notifier);
    }

    let Some(from_index) = st.nodes.iter().position(|n| n.id == current_id) else {
        return no_alternative(notifier);
    };

    let from = st.nodes[from_index].name.clone();
    let to = st.nodes[top.index].name.clone();
    let failures = st.nodes[from_index].failure_count;

    st.history.record(FailoverEvent {
        timestamp: SystemTime::now(),
        from: from.clone(),
        to: to.clone(),
        reason: format!("{} consecutive failures", failures),
    });

    st.nodes[from_index].status = NodeStatus::Offline;
    st.current = Some(st.nodes[top.index].id);

    warn!("failing over from {} to {}", from, to);
    if st.settings.notify_failover {
        notifier.notify(Severity::Warning, &format!("Failover: {} -> {}", from, to));
    }

    FailoverOutcome::Switched { from, to }
}
