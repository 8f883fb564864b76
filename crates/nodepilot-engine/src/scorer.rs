//! Converts raw node metrics into comparable composite scores.
//!
//! All component scores are normalized to 0-100 with higher meaning better,
//! then combined as a weighted sum. Only online nodes are scored; offline
//! nodes never appear in a ranking.

use std::cmp::Ordering;

use crate::node::Node;
use crate::strategy::Weights;

/// Geographic preference is not yet measured; every node gets the same
/// placeholder component.
const GEO_SCORE: f64 = 50.0;

/// A node's position in a scoring pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Index into the node slice that was scored.
    pub index: usize,
    pub score: f64,
}

/// Composite score for a single node under the given weights.
///
/// Latency decays linearly and bottoms out at 300ms; load is inverted so
/// lightly loaded nodes score higher. Weights are percentages and are
/// normalized by /100 here.
pub fn score_node(node: &Node, weights: &Weights) -> f64 {
    let latency_score = (100.0 - node.latency_ms / 3.0).max(0.0);
    let reliability_score = node.reliability;
    let load_score = (100.0 - node.load).max(0.0);

    latency_score * weights.latency / 100.0
        + reliability_score * weights.reliability / 100.0
        + load_score * weights.load / 100.0
        + GEO_SCORE * weights.geo / 100.0
}

/// Ranks all online nodes by descending composite score.
///
/// The sort is stable: nodes with equal scores keep their input order.
pub fn rank_nodes(nodes: &[Node], weights: &Weights) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.is_online())
        .map(|(index, node)| Ranked {
            index,
            score: score_node(node, weights),
        })
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeStatus;
    use crate::strategy::Strategy;

    fn node(id: u32, latency: f64, reliability: f64, load: f64) -> Node {
        Node::new(id, format!("node{}", id), "test").with_metrics(latency, reliability, load)
    }

    #[test]
    fn test_worked_scenario_balanced() {
        // A(20ms, 90%, 10%) vs B(200ms, 95%, 5%) under balanced weights.
        let a = node(0, 20.0, 90.0, 10.0);
        let b = node(1, 200.0, 95.0, 5.0);
        let weights = Strategy::Balanced.preset();

        let score_a = score_node(&a, &weights);
        let score_b = score_node(&b, &weights);

        assert!((score_a - 87.3333).abs() < 0.01, "score_a = {}", score_a);
        assert!((score_b - 65.8333).abs() < 0.01, "score_b = {}", score_b);

        let ranking = rank_nodes(&[a, b], &weights);
        assert_eq!(ranking[0].index, 0);
        assert_eq!(ranking[1].index, 1);
    }

    #[test]
    fn test_latency_component_bottoms_out_at_300ms() {
        let weights = Weights {
            latency: 100.0,
            reliability: 0.0,
            load: 0.0,
            geo: 0.0,
        };
        let at_limit = node(0, 300.0, 0.0, 0.0);
        let beyond = node(1, 900.0, 0.0, 0.0);
        assert_eq!(score_node(&at_limit, &weights), 0.0);
        assert_eq!(score_node(&beyond, &weights), 0.0);
    }

    #[test]
    fn test_load_component_inverted() {
        let weights = Weights {
            latency: 0.0,
            reliability: 0.0,
            load: 100.0,
            geo: 0.0,
        };
        let idle = node(0, 0.0, 0.0, 0.0);
        let saturated = node(1, 0.0, 0.0, 100.0);
        assert_eq!(score_node(&idle, &weights), 100.0);
        assert_eq!(score_node(&saturated, &weights), 0.0);
    }

    #[test]
    fn test_geo_component_is_constant() {
        let weights = Weights {
            latency: 0.0,
            reliability: 0.0,
            load: 0.0,
            geo: 100.0,
        };
        let a = node(0, 10.0, 99.0, 1.0);
        let b = node(1, 290.0, 1.0, 99.0);
        assert_eq!(score_node(&a, &weights), GEO_SCORE);
        assert_eq!(score_node(&b, &weights), GEO_SCORE);
    }

    #[test]
    fn test_offline_nodes_excluded_from_ranking() {
        let mut offline = node(0, 10.0, 99.0, 1.0);
        offline.status = NodeStatus::Offline;
        let online = node(1, 250.0, 10.0, 90.0);

        let ranking = rank_nodes(&[offline, online], &Weights::default());
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].index, 1);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let nodes: Vec<Node> = (0..10)
            .map(|i| node(i, (i as f64) * 17.0 % 280.0, 50.0 + (i as f64) * 3.0, (i as f64) * 9.0))
            .collect();
        let weights = Strategy::Fastest.preset();

        let first = rank_nodes(&nodes, &weights);
        let second = rank_nodes(&nodes, &weights);
        assert_eq!(first, second);

        // descending total order
        for pair in first.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        // identical metrics, identical scores
        let a = node(0, 50.0, 80.0, 30.0);
        let b = node(1, 50.0, 80.0, 30.0);
        let c = node(2, 50.0, 80.0, 30.0);

        let ranking = rank_nodes(&[a, b, c], &Weights::default());
        let order: Vec<usize> = ranking.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_input_yields_empty_ranking() {
        assert!(rank_nodes(&[], &Weights::default()).is_empty());
    }
}
