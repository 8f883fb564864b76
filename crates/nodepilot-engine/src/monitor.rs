use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::engine::{run_health_tick, SelectorState};
use crate::notify::Notifier;
use crate::probe::HealthProbe;

/// Repeating health-check task.
///
/// One per engine instance: the engine owns the join handle and aborts it
/// to stop monitoring or to change the cadence. Ticks never overlap; the
/// loop awaits each pass before sleeping again.
pub(crate) struct HealthMonitor {
    state: Arc<RwLock<SelectorState>>,
    probe: Arc<dyn HealthProbe>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl HealthMonitor {
    pub(crate) fn new(
        state: Arc<RwLock<SelectorState>>,
        probe: Arc<dyn HealthProbe>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            state,
            probe,
            notifier,
            interval,
        }
    }

    /// Starts the monitor task.
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            interval.tick().await;
            let outcome =
                run_health_tick(&self.state, self.probe.as_ref(), self.notifier.as_ref()).await;
            if let Some(outcome) = outcome {
                debug!("health tick triggered failover evaluation: {:?}", outcome);
            }
        }
    }
}
