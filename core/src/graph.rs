//! Threshold-Filtered Transition Graphs
//!
//! Turns a scale into the node/edge set the drawing layer renders. Nodes are
//! always every state of the scale, so isolated states stay visible; an edge
//! survives iff its probability reaches the threshold. Self-transitions are
//! kept under the same rule and tagged as loops so they can be drawn as such.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::model::{Scale, State, StateNo};

/// Directed, probability-weighted edge within one scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: StateNo,
    pub to: StateNo,
    pub probability: f64,
    /// Self-transition, drawn as a loop rather than a link
    #[serde(rename = "loop")]
    pub is_loop: bool,
}

/// Arrowhead for one link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub from: StateNo,
    pub to: StateNo,
}

/// Render-ready graph of one scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub scale_index: usize,
    pub nodes: Vec<State>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    /// Graph with nothing to draw
    pub fn empty(scale_index: usize) -> Self {
        Self {
            scale_index,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Edges between distinct states
    pub fn links(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|edge| !edge.is_loop)
    }

    /// Self-transitions
    pub fn loops(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|edge| edge.is_loop)
    }

    /// One arrowhead per link
    pub fn markers(&self) -> impl Iterator<Item = Marker> + '_ {
        self.links().map(move |edge| Marker {
            id: format!("marker-{}-{}-{}", self.scale_index, edge.from, edge.to),
            from: edge.from,
            to: edge.to,
        })
    }

    /// Edges leaving or entering a state, for selection highlighting
    pub fn incident_edges(&self, state_no: StateNo) -> impl Iterator<Item = &GraphEdge> {
        self.edges
            .iter()
            .filter(move |edge| edge.from == state_no || edge.to == state_no)
    }

    pub fn node(&self, state_no: StateNo) -> Option<&State> {
        self.nodes.iter().find(|node| node.state_no == state_no)
    }
}

/// Reject a threshold outside `[0, 1]`
pub fn check_threshold(threshold: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ModelError::InvalidThreshold(threshold))
    }
}

/// Filtered graph for a single scale
pub fn create_scale_graph(scale_index: usize, scale: &Scale, threshold: f64) -> Result<GraphData> {
    let threshold = check_threshold(threshold)?;

    let edges: Vec<GraphEdge> = scale
        .states
        .iter()
        .flat_map(|state| {
            state
                .transitions
                .iter()
                .filter(move |&(_, &probability)| probability >= threshold)
                .map(move |(&to, &probability)| GraphEdge {
                    from: state.state_no,
                    to,
                    probability,
                    is_loop: state.state_no == to,
                })
        })
        .collect();

    log::debug!(
        "Scale {}: {} states, {} edges at p >= {}",
        scale_index,
        scale.len(),
        edges.len(),
        threshold
    );

    Ok(GraphData {
        scale_index,
        nodes: scale.states.clone(),
        edges,
    })
}

/// Filtered graph for every scale, indexed by scale
pub fn create_graph_data(scales: &[Scale], threshold: f64) -> Result<Vec<GraphData>> {
    check_threshold(threshold)?;

    scales
        .par_iter()
        .enumerate()
        .map(|(scale_index, scale)| create_scale_graph(scale_index, scale, threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::model::fixtures::three_scale_model;

    fn edge_set(graph: &GraphData) -> HashSet<(StateNo, StateNo)> {
        graph.edges.iter().map(|e| (e.from, e.to)).collect()
    }

    #[test]
    fn test_one_graph_per_scale_with_all_nodes() {
        let model = three_scale_model();
        let graphs = create_graph_data(&model.scales, 0.95).unwrap();

        assert_eq!(graphs.len(), 3);
        for (index, graph) in graphs.iter().enumerate() {
            assert_eq!(graph.scale_index, index);
            assert_eq!(graph.nodes.len(), model.scales[index].len());
        }
        assert_eq!(edge_set(&graphs[0]), HashSet::from([(2, 3)]));
        assert!(graphs[1].edges.is_empty());
    }

    #[test]
    fn test_threshold_boundaries() {
        let model = three_scale_model();

        let all = create_graph_data(&model.scales, 0.0).unwrap();
        let declared: usize = model.scales[0].states.iter().map(|s| s.transitions.len()).sum();
        assert_eq!(all[0].edges.len(), declared);

        let certain = create_graph_data(&model.scales, 1.0).unwrap();
        assert!(certain
            .iter()
            .flat_map(|g| g.edges.iter())
            .all(|e| e.probability == 1.0));
        assert_eq!(edge_set(&certain[0]), HashSet::from([(2, 3)]));
        assert_eq!(edge_set(&certain[2]), HashSet::from([(20, 20)]));
    }

    #[test]
    fn test_threshold_monotonicity() {
        let model = three_scale_model();
        let thresholds: Vec<f64> = (0..=20).map(|i| i as f64 / 20.0).collect();

        for pair in thresholds.windows(2) {
            let low = create_graph_data(&model.scales, pair[0]).unwrap();
            let high = create_graph_data(&model.scales, pair[1]).unwrap();
            for (low, high) in low.iter().zip(&high) {
                assert!(edge_set(high).is_subset(&edge_set(low)), "{pair:?}");
            }
        }
    }

    #[test]
    fn test_edges_keep_transition_order_and_loop_flag() {
        let model = three_scale_model();
        let graph = create_scale_graph(0, &model.scales[0], 0.0).unwrap();

        let order: Vec<(StateNo, StateNo)> = graph.edges.iter().take(3).map(|e| (e.from, e.to)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (0, 2)]);

        let loops: Vec<StateNo> = graph.loops().map(|e| e.from).collect();
        assert_eq!(loops, vec![0, 1]);
        assert!(graph.links().all(|e| e.from != e.to));
        assert_eq!(graph.markers().count(), graph.links().count());
        assert_eq!(graph.markers().next().unwrap().id, "marker-0-0-1");
    }

    #[test]
    fn test_incident_edges() {
        let model = three_scale_model();
        let graph = create_scale_graph(0, &model.scales[0], 0.0).unwrap();
        let incident: HashSet<(StateNo, StateNo)> =
            graph.incident_edges(3).map(|e| (e.from, e.to)).collect();
        assert_eq!(incident, HashSet::from([(1, 3), (2, 3), (3, 0), (3, 2)]));
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let model = three_scale_model();
        assert!(matches!(
            create_graph_data(&model.scales, 1.2),
            Err(ModelError::InvalidThreshold(_))
        ));
        assert!(create_graph_data(&model.scales, -0.01).is_err());
        assert!(create_scale_graph(0, &model.scales[0], f64::NAN).is_err());
    }

    #[test]
    fn test_edge_serializes_loop_flag() {
        let edge = GraphEdge {
            from: 1,
            to: 1,
            probability: 0.5,
            is_loop: true,
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["loop"], serde_json::json!(true));
    }
}
