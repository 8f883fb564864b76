//! nodepilot Selection & Failover Engine
//!
//! Smart upstream-node selection and auto-failover for router/proxy
//! deployments. The engine scores candidate nodes under
//! operator-configurable weights, keeps the top-ranked one active, and
//! switches away automatically when periodic health probes push the active
//! node past a failure threshold.
//!
//! # Architecture
//!
//! - [`SmartSelector`]: the engine instance. Owns the node set, current
//!   selection, settings, and failover history behind a single lock.
//! - [`scorer`]: weighted multi-criterion scoring and ranking.
//! - [`Strategy`]: named weight presets (balanced, fastest, reliable,
//!   load-balance).
//! - [`HealthProbe`] / [`Notifier`] / [`SettingsStore`]: injected
//!   collaborators for liveness probing, operator notifications, and
//!   settings persistence.
//!
//! Health monitoring runs as a cancellable background task, at most one
//! per engine instance. Each tick probes every node concurrently, applies
//! the results atomically, and evaluates failover for the current node.
//!
//! # Usage Example
//!
//! ```no_run
//! use nodepilot_engine::{Node, SmartSelector, Strategy};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let nodes = vec![
//!     Node::new(0, "US-West-1", "US-West").with_metrics(42.0, 97.0, 31.0),
//!     Node::new(1, "EU-West-1", "EU-West").with_metrics(120.0, 99.0, 12.0),
//! ];
//!
//! let selector = SmartSelector::new(nodes);
//! selector.set_strategy(Strategy::Fastest).await?;
//!
//! let selection = selector.select_best_node().await?;
//! println!("active node: {} (score {:.1})", selection.name, selection.score);
//!
//! // probe nodes in the background and fail over automatically
//! selector.start_monitoring().await;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod history;
mod monitor;
pub mod node;
pub mod notify;
pub mod probe;
pub mod scorer;
pub mod settings;
pub mod strategy;

pub use engine::{Candidate, FailoverOutcome, Selection, SmartSelector};
pub use error::{Result, SelectorError};
pub use history::{FailoverEvent, FailoverHistory, HISTORY_CAPACITY};
pub use node::{Node, NodeStatus};
pub use notify::{LogNotifier, Notifier, NoopNotifier, Severity};
pub use probe::{HealthProbe, HttpProbe, SimulatedProbe};
pub use settings::{JsonFileStore, MemoryStore, SelectorSettings, SettingsStore};
pub use strategy::{Criterion, Strategy, Weights};
