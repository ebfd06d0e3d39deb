//! Linked-View Controller
//!
//! Owns the [`InteractionState`] and turns user events into the minimal set of
//! recomputations: a threshold change rebuilds the current scale's graph only,
//! a scale change clears the selection and rebuilds, a state click updates the
//! selection, and brush/zoom events move the shared time window through the
//! synchronization guard. Colors, layout, boundary and timelines come cached
//! from the [`PreparedModel`] and are never recomputed here.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use std::sync::Arc;

use scalechain_core::timeline::{segments_for_state, segments_in_range};
use scalechain_core::{
    GraphData, GraphEdge, PreparedModel, State, StateNo, TimelineSegment, VisualizationConfig,
};

use super::{InteractionState, TimeRange};
use crate::perspective::synchronization::{
    synchronize, DetachedView, LinkedView, SyncOrigin, SyncOutcome, ViewEvent, ViewTarget,
    ZoomTransform,
};
use crate::view::frame::RenderFrame;

/// Host hook invoked whenever the selection changes; `None` means cleared
pub type StateSelectedCallback = Box<dyn FnMut(Option<&State>)>;

/// Coordinates the graph view, the overview and the detail view
pub struct LinkedViewController {
    prepared: Arc<PreparedModel>,
    state: InteractionState,
    graph: GraphData,
    extent: TimeRange,
    origin: SyncOrigin,
    overview: Box<dyn LinkedView>,
    detail: Box<dyn LinkedView>,
    on_state_selected: Option<StateSelectedCallback>,
    graph_builds: usize,
}

impl std::fmt::Debug for LinkedViewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedViewController")
            .field("state", &self.state)
            .field("extent", &self.extent)
            .field("origin", &self.origin)
            .field("graph_builds", &self.graph_builds)
            .finish_non_exhaustive()
    }
}

impl LinkedViewController {
    /// Open a session on a prepared model.
    ///
    /// The initial threshold and scale come from `config`, clamped to what the
    /// model offers. The time window starts at the full history.
    pub fn new(prepared: Arc<PreparedModel>, config: &VisualizationConfig) -> Self {
        let extent = prepared
            .history_extent()
            .map(|(start, end)| TimeRange::new(start, end))
            .unwrap_or_default();
        let state = InteractionState {
            probability_threshold: clamp_threshold(config.initial_threshold).unwrap_or(0.0),
            selected_scale_index: config
                .initial_scale
                .min(prepared.scale_count().saturating_sub(1)),
            selected_state: None,
            view_domain: extent,
        };

        let mut controller = Self {
            graph: GraphData::empty(state.selected_scale_index),
            prepared,
            state,
            extent,
            origin: SyncOrigin::Idle,
            overview: Box::new(DetachedView),
            detail: Box::new(DetachedView),
            on_state_selected: None,
            graph_builds: 0,
        };
        controller.rebuild_graph();
        controller
    }

    /// Attach the overview and detail views and bring both to the current window
    pub fn with_views(mut self, overview: Box<dyn LinkedView>, detail: Box<dyn LinkedView>) -> Self {
        self.overview = overview;
        self.detail = detail;
        let domain = self.state.view_domain;
        for target in [ViewTarget::Overview, ViewTarget::Detail] {
            self.origin = match target {
                ViewTarget::Overview => SyncOrigin::Overview,
                ViewTarget::Detail => SyncOrigin::Detail,
            };
            let echo = match target {
                ViewTarget::Overview => self.overview.apply_domain(domain),
                ViewTarget::Detail => self.detail.apply_domain(domain),
            };
            if let Some(echo) = echo {
                self.dispatch(echo);
            }
        }
        self.origin = SyncOrigin::Idle;
        self
    }

    pub fn set_state_selected_callback(&mut self, callback: StateSelectedCallback) {
        self.on_state_selected = Some(callback);
    }

    pub fn prepared(&self) -> &PreparedModel {
        &self.prepared
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Graph of the selected scale at the current threshold
    pub fn graph(&self) -> &GraphData {
        &self.graph
    }

    /// Full history window the views are clamped to
    pub fn extent(&self) -> TimeRange {
        self.extent
    }

    /// Number of graph rebuilds so far, including the initial one
    pub fn graph_builds(&self) -> usize {
        self.graph_builds
    }

    /// Move the threshold slider.
    ///
    /// The value is clamped to [0, 1]; NaN is dropped. Returns whether the
    /// graph was rebuilt.
    pub fn on_threshold_changed(&mut self, threshold: f64) -> bool {
        let Some(threshold) = clamp_threshold(threshold) else {
            log::warn!("Ignoring non-numeric probability threshold");
            return false;
        };
        if threshold == self.state.probability_threshold {
            return false;
        }

        self.state.probability_threshold = threshold;
        self.rebuild_graph();
        if let Some(selected) = self.state.selected_state.as_ref() {
            if self.graph.node(selected.state_no).is_none() {
                log::debug!("Selected state {} left the graph", selected.state_no);
            }
        }
        true
    }

    /// Move the scale slider.
    ///
    /// The position is floored and clamped to the available scales. The
    /// selection is always cleared because state ids are scale-local. Returns
    /// whether the scale changed.
    pub fn on_scale_changed(&mut self, position: f64) -> bool {
        if position.is_nan() {
            log::warn!("Ignoring non-numeric scale position");
            return false;
        }
        let last = self.prepared.scale_count().saturating_sub(1);
        let index = if position <= 0.0 {
            0
        } else {
            (position.floor() as usize).min(last)
        };

        self.clear_selection();
        if index == self.state.selected_scale_index {
            return false;
        }

        self.state.selected_scale_index = index;
        self.rebuild_graph();
        log::debug!("Selected scale {}", index);
        true
    }

    /// Click on a node.
    ///
    /// Resolves the id against the nodes of the current scale; an unknown id
    /// clears the selection.
    pub fn on_state_selected(&mut self, state_no: StateNo) -> Option<&State> {
        match self.graph.node(state_no).cloned() {
            Some(state) => {
                self.state.selected_state = Some(state);
                self.notify_selection();
                self.state.selected_state.as_ref()
            }
            None => {
                log::debug!(
                    "State {} is not on scale {}",
                    state_no,
                    self.state.selected_scale_index
                );
                self.clear_selection();
                None
            }
        }
    }

    /// Click on empty canvas
    pub fn on_state_cleared(&mut self) {
        self.clear_selection();
    }

    /// Brush moved in the overview
    pub fn on_overview_brushed(&mut self, range: TimeRange) -> SyncOutcome {
        self.dispatch(ViewEvent::OverviewBrushed(range))
    }

    /// Zoom or pan in the detail view, as a time window
    pub fn on_detail_zoomed(&mut self, range: TimeRange) -> SyncOutcome {
        self.dispatch(ViewEvent::DetailZoomed(range))
    }

    /// Zoom or pan in the detail view, as a transform over `width` pixels
    pub fn on_detail_transformed(&mut self, transform: ZoomTransform, width: f64) -> SyncOutcome {
        if !(width > 0.0) {
            return SyncOutcome::Ignored;
        }
        let range = transform.rescale(self.extent, width);
        self.dispatch(ViewEvent::DetailZoomed(range))
    }

    /// Transform that shows the current window in a detail view `width` pixels wide
    pub fn detail_transform(&self, width: f64) -> ZoomTransform {
        ZoomTransform::for_domain(self.state.view_domain, self.extent, width)
    }

    /// Segments of one scale inside the current window
    pub fn visible_segments(&self, scale_index: usize) -> &[TimelineSegment] {
        let domain = self.state.view_domain;
        segments_in_range(self.prepared.timeline(scale_index), domain.start, domain.end)
    }

    /// Edges touching the selected state
    pub fn highlighted_edges(&self) -> Vec<&GraphEdge> {
        match &self.state.selected_state {
            Some(selected) => self.graph.incident_edges(selected.state_no).collect(),
            None => Vec::new(),
        }
    }

    /// Timeline segments spent in the selected state
    pub fn highlighted_segments(&self) -> Vec<&TimelineSegment> {
        match &self.state.selected_state {
            Some(selected) => segments_for_state(
                self.prepared.timeline(self.state.selected_scale_index),
                selected.state_no,
            )
            .collect(),
            None => Vec::new(),
        }
    }

    /// Snapshot of everything a renderer needs
    pub fn frame(&self) -> RenderFrame {
        RenderFrame::capture(self)
    }

    fn dispatch(&mut self, event: ViewEvent) -> SyncOutcome {
        let step = synchronize(self.origin, self.state.view_domain, self.extent, event);
        if step.outcome == SyncOutcome::Suppressed {
            log::trace!("Suppressed {:?} during {:?} update", event.source(), self.origin);
            return step.outcome;
        }

        self.origin = step.origin;
        self.state.view_domain = step.domain;
        if let Some((target, domain)) = step.propagate {
            let echo = match target {
                ViewTarget::Overview => self.overview.apply_domain(domain),
                ViewTarget::Detail => self.detail.apply_domain(domain),
            };
            if let Some(echo) = echo {
                self.dispatch(echo);
            }
            log::debug!("Time window {:.3}..{:.3}", domain.start, domain.end);
        }
        self.origin = SyncOrigin::Idle;
        step.outcome
    }

    fn rebuild_graph(&mut self) {
        let index = self.state.selected_scale_index;
        self.graph = match self.prepared.graph(index, self.state.probability_threshold) {
            Ok(graph) => graph,
            Err(err) => {
                log::error!("Cannot build graph for scale {}: {}", index, err);
                GraphData::empty(index)
            }
        };
        self.graph_builds += 1;
    }

    fn clear_selection(&mut self) {
        self.state.selected_state = None;
        self.notify_selection();
    }

    fn notify_selection(&mut self) {
        if let Some(callback) = self.on_state_selected.as_mut() {
            callback(self.state.selected_state.as_ref());
        }
    }
}

fn clamp_threshold(threshold: f64) -> Option<f64> {
    (!threshold.is_nan()).then(|| threshold.clamp(0.0, 1.0))
}
