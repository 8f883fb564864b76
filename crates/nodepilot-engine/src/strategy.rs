use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SelectorError;

/// Named selection strategy. Each strategy maps to a fixed weight preset;
/// applying one overwrites the active weights, which remain individually
/// adjustable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Balanced,
    Fastest,
    Reliable,
    LoadBalance,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Balanced,
        Strategy::Fastest,
        Strategy::Reliable,
        Strategy::LoadBalance,
    ];

    /// The weight preset this strategy stands for.
    pub fn preset(&self) -> Weights {
        match self {
            Strategy::Balanced => Weights {
                latency: 40.0,
                reliability: 30.0,
                load: 20.0,
                geo: 10.0,
            },
            Strategy::Fastest => Weights {
                latency: 70.0,
                reliability: 20.0,
                load: 5.0,
                geo: 5.0,
            },
            Strategy::Reliable => Weights {
                latency: 20.0,
                reliability: 60.0,
                load: 10.0,
                geo: 10.0,
            },
            Strategy::LoadBalance => Weights {
                latency: 25.0,
                reliability: 25.0,
                load: 40.0,
                geo: 10.0,
            },
        }
    }

    /// One-line operator-facing description.
    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Balanced => {
                "Balances latency, reliability, and load for optimal performance"
            }
            Strategy::Fastest => "Prioritizes lowest latency nodes for maximum speed",
            Strategy::Reliable => "Selects nodes with highest uptime and stability",
            Strategy::LoadBalance => "Distributes traffic evenly across available nodes",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Balanced
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Balanced => "balanced",
            Strategy::Fastest => "fastest",
            Strategy::Reliable => "reliable",
            Strategy::LoadBalance => "load-balance",
        };
        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanced" => Ok(Strategy::Balanced),
            "fastest" => Ok(Strategy::Fastest),
            "reliable" => Ok(Strategy::Reliable),
            "load-balance" => Ok(Strategy::LoadBalance),
            other => Err(SelectorError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Scoring weights, expressed as percentages. They need not sum to 100;
/// the scorer normalizes each by /100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub latency: f64,
    pub reliability: f64,
    pub load: f64,
    pub geo: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Strategy::Balanced.preset()
    }
}

/// A single scoring criterion, for manual weight adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Latency,
    Reliability,
    Load,
    Geo,
}

impl Weights {
    /// Sets one criterion's weight, leaving the others untouched.
    pub fn set(&mut self, criterion: Criterion, value: f64) {
        let value = value.max(0.0);
        match criterion {
            Criterion::Latency => self.latency = value,
            Criterion::Reliability => self.reliability = value,
            Criterion::Load => self.load = value,
            Criterion::Geo => self.geo = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_preset() {
        let w = Strategy::Balanced.preset();
        assert_eq!(w.latency, 40.0);
        assert_eq!(w.reliability, 30.0);
        assert_eq!(w.load, 20.0);
        assert_eq!(w.geo, 10.0);
    }

    #[test]
    fn test_fastest_preset() {
        let w = Strategy::Fastest.preset();
        assert_eq!(w.latency, 70.0);
        assert_eq!(w.reliability, 20.0);
        assert_eq!(w.load, 5.0);
        assert_eq!(w.geo, 5.0);
    }

    #[test]
    fn test_reliable_preset() {
        let w = Strategy::Reliable.preset();
        assert_eq!(w.latency, 20.0);
        assert_eq!(w.reliability, 60.0);
        assert_eq!(w.load, 10.0);
        assert_eq!(w.geo, 10.0);
    }

    #[test]
    fn test_load_balance_preset() {
        let w = Strategy::LoadBalance.preset();
        assert_eq!(w.latency, 25.0);
        assert_eq!(w.reliability, 25.0);
        assert_eq!(w.load, 40.0);
        assert_eq!(w.geo, 10.0);
    }

    #[test]
    fn test_default_weights_are_balanced() {
        assert_eq!(Weights::default(), Strategy::Balanced.preset());
    }

    #[test]
    fn test_strategy_round_trips_through_str() {
        for strategy in Strategy::ALL {
            let parsed: Strategy = strategy.to_string().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!("round-robin".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Strategy::LoadBalance).unwrap(),
            "\"load-balance\""
        );
        let parsed: Strategy = serde_json::from_str("\"reliable\"").unwrap();
        assert_eq!(parsed, Strategy::Reliable);
    }

    #[test]
    fn test_set_single_weight() {
        let mut w = Weights::default();
        w.set(Criterion::Latency, 55.0);
        assert_eq!(w.latency, 55.0);
        assert_eq!(w.reliability, 30.0);
        // negative values clamp to zero
        w.set(Criterion::Geo, -5.0);
        assert_eq!(w.geo, 0.0);
    }
}
