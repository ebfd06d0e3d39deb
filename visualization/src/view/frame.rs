//! Render Frames
//!
//! A serializable snapshot of everything the three views draw for the current
//! interaction state. Hosts that render out of process consume it as JSON.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use scalechain_core::timeline::occupancy;
use scalechain_core::{Boundary, GraphData, GraphEdge, Marker, StateNo, TimelineSegment};

use crate::interaction::{InteractionState, LinkedViewController};

/// Frame encoding errors
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("cannot encode render frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub version: &'static str,
    pub scale_count: usize,
    /// Coordinate extents for the graph view's scales
    pub boundary: Boundary,
    pub interaction: InteractionState,
    pub graph: GraphData,
    pub markers: Vec<Marker>,
    /// Edges touching the selected state
    pub highlighted_edges: Vec<GraphEdge>,
    /// Overview rows, one per scale
    pub timelines: Vec<Vec<TimelineSegment>>,
    /// Detail rows overlapping the current window, one per scale
    pub visible_timelines: Vec<Vec<TimelineSegment>>,
    /// Dwell time per state of the selected scale, in order of first occupancy
    pub occupancy: IndexMap<StateNo, f64>,
    /// One message per scale disabled at ingestion
    pub diagnostics: Vec<String>,
}

impl RenderFrame {
    pub fn capture(controller: &LinkedViewController) -> Self {
        let prepared = controller.prepared();
        let graph = controller.graph().clone();

        Self {
            version: scalechain_core::VERSION,
            scale_count: prepared.scale_count(),
            boundary: *prepared.boundary(),
            interaction: controller.state().clone(),
            markers: graph.markers().collect(),
            highlighted_edges: controller.highlighted_edges().into_iter().cloned().collect(),
            graph,
            timelines: prepared.timelines().to_vec(),
            visible_timelines: (0..prepared.scale_count())
                .map(|index| controller.visible_segments(index).to_vec())
                .collect(),
            occupancy: occupancy(prepared.timeline(controller.state().selected_scale_index())),
            diagnostics: prepared.diagnostics().map(ToString::to_string).collect(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, FrameError> {
        let encoded = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(encoded)
    }
}
