//! Model Ingestion Pipeline
//!
//! Runs the once-per-model stages in order: structural validation, per-scale
//! validation, color assignment, layout, boundary reduction and timeline
//! compression. The result is immutable for the rest of the session; only the
//! threshold-dependent graphs are rebuilt on interaction.
//!
//! Scale-local defects are reported once here and leave that scale with
//! nothing to render, while the remaining scales stay usable.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use rayon::prelude::*;

use crate::boundary::{find_min_max_values, Boundary};
use crate::config::VisualizationConfig;
use crate::error::{ModelError, Result};
use crate::graph::{create_scale_graph, GraphData};
use crate::identity::{assign_colors, verify_color_consistency};
use crate::layout::assign_coordinates;
use crate::model::{Model, Scale, Timestamp};
use crate::timeline::{compress_scale, TimelineSegment};

/// Health of one scale after ingestion
#[derive(Debug)]
pub enum ScaleStatus {
    Ready,
    Malformed(ModelError),
}

impl ScaleStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// A validated model with its cached, interaction-independent derivations
#[derive(Debug)]
pub struct PreparedModel {
    model: Model,
    statuses: Vec<ScaleStatus>,
    boundary: Boundary,
    timelines: Vec<Vec<TimelineSegment>>,
}

impl PreparedModel {
    /// Ingest a model.
    ///
    /// Fails on an invalid config and on defects that leave nothing renderable.
    pub fn new(mut model: Model, config: &VisualizationConfig) -> Result<Self> {
        config.validate()?;
        model.validate_structure()?;

        let mut statuses: Vec<ScaleStatus> = (0..model.scale_count())
            .into_par_iter()
            .map(|index| match model.validate_scale(index) {
                Ok(()) => ScaleStatus::Ready,
                Err(err) => ScaleStatus::Malformed(err),
            })
            .collect();

        assign_colors(&mut model.scales, &config.palette);
        for (scale, state) in verify_color_consistency(&model.scales) {
            log::warn!("State {} at scale {} matches none of its members' colors", state, scale);
        }
        assign_coordinates(&mut model.scales, &config.layout);
        let boundary = find_min_max_values(&model.scales)?;

        let compressed: Vec<Option<Result<Vec<TimelineSegment>>>> = model
            .scales
            .par_iter()
            .zip(statuses.par_iter())
            .enumerate()
            .map(|(index, (scale, status))| {
                status.is_ready().then(|| {
                    compress_scale(
                        index,
                        scale,
                        &model.state_history_initial_states,
                        &model.state_history_times,
                    )
                })
            })
            .collect();

        let mut timelines = Vec::with_capacity(compressed.len());
        for (index, outcome) in compressed.into_iter().enumerate() {
            match outcome {
                Some(Ok(segments)) => timelines.push(segments),
                Some(Err(err)) => {
                    statuses[index] = ScaleStatus::Malformed(err);
                    timelines.push(Vec::new());
                }
                None => timelines.push(Vec::new()),
            }
        }

        for status in &statuses {
            if let ScaleStatus::Malformed(err) = status {
                log::warn!("Scale disabled: {}", err);
            }
        }

        log::info!(
            "Prepared model: {} scales ({} ready), {} history samples",
            model.scale_count(),
            statuses.iter().filter(|s| s.is_ready()).count(),
            model.history_len()
        );

        Ok(Self {
            model,
            statuses,
            boundary,
            timelines,
        })
    }

    /// Parse a model document and ingest it
    pub fn from_json_str(document: &str, config: &VisualizationConfig) -> Result<Self> {
        Self::new(Model::from_json_str(document)?, config)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn scales(&self) -> &[Scale] {
        &self.model.scales
    }

    pub fn scale(&self, index: usize) -> Option<&Scale> {
        self.model.scales.get(index)
    }

    pub fn scale_count(&self) -> usize {
        self.model.scale_count()
    }

    pub fn status(&self, index: usize) -> Option<&ScaleStatus> {
        self.statuses.get(index)
    }

    pub fn is_ready(&self, index: usize) -> bool {
        self.status(index).is_some_and(ScaleStatus::is_ready)
    }

    /// Errors reported at ingestion, one per disabled scale
    pub fn diagnostics(&self) -> impl Iterator<Item = &ModelError> {
        self.statuses.iter().filter_map(|status| match status {
            ScaleStatus::Malformed(err) => Some(err),
            ScaleStatus::Ready => None,
        })
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Compressed timelines, outer index = scale
    pub fn timelines(&self) -> &[Vec<TimelineSegment>] {
        &self.timelines
    }

    /// Segments of one scale, empty for a disabled or unknown scale
    pub fn timeline(&self, index: usize) -> &[TimelineSegment] {
        self.timelines.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn history_extent(&self) -> Option<(Timestamp, Timestamp)> {
        self.model.history_extent()
    }

    /// Filtered graph of one scale; a disabled scale yields an empty graph
    pub fn graph(&self, index: usize, threshold: f64) -> Result<GraphData> {
        let scale = self.scale(index).ok_or(ModelError::ScaleOutOfRange {
            index,
            count: self.scale_count(),
        })?;
        if !self.is_ready(index) {
            return Ok(GraphData::empty(index));
        }
        create_scale_graph(index, scale, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::model::fixtures::three_scale_model;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_prepares_every_derivation() {
        init_logging();
        let prepared = PreparedModel::new(three_scale_model(), &VisualizationConfig::default()).unwrap();

        assert_eq!(prepared.scale_count(), 3);
        assert!((0..3).all(|i| prepared.is_ready(i)));
        assert_eq!(prepared.diagnostics().count(), 0);
        assert!(prepared
            .scales()
            .iter()
            .flat_map(|s| s.states.iter())
            .all(|s| s.color.is_some() && s.has_coordinates()));
        assert_eq!(prepared.timeline(0).len(), 6);
        assert_eq!(prepared.timeline(2).len(), 1);
        assert_eq!(prepared.history_extent(), Some((100.0, 160.0)));
        assert!(prepared.boundary().r.max <= 130.0);
    }

    #[test]
    fn test_malformed_scale_is_isolated() {
        init_logging();
        let mut model = three_scale_model();
        model.scales[1].states[1].initial_states.push(0);

        let prepared = PreparedModel::new(model, &VisualizationConfig::default()).unwrap();
        assert!(prepared.is_ready(0));
        assert!(!prepared.is_ready(1));
        assert!(prepared.is_ready(2));

        let diagnostics: Vec<_> = prepared.diagnostics().collect();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], ModelError::PartitionConflict { scale: 1, .. }));

        assert!(prepared.timeline(1).is_empty());
        let graph = prepared.graph(1, 0.0).unwrap();
        assert!(graph.nodes.is_empty() && graph.edges.is_empty());
        assert!(!prepared.graph(2, 0.0).unwrap().nodes.is_empty());
    }

    #[test]
    fn test_structural_defects_reject_model() {
        let mut model = three_scale_model();
        model.state_history_times.pop();
        assert!(matches!(
            PreparedModel::new(model, &VisualizationConfig::default()),
            Err(ModelError::HistoryLengthMismatch { .. })
        ));

        assert!(matches!(
            PreparedModel::new(Model::default(), &VisualizationConfig::default()),
            Err(ModelError::NoScales)
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut inverted = VisualizationConfig::default();
        inverted.layout.min_radius_fraction = 2.0;
        let mut negative = VisualizationConfig::default();
        negative.layout.max_radius = -5.0;
        let mut undefined = VisualizationConfig::default();
        undefined.layout.min_radius_fraction = f64::NAN;

        for config in [inverted, negative, undefined] {
            assert!(matches!(
                PreparedModel::new(three_scale_model(), &config),
                Err(ModelError::Config(ConfigError::Invalid(_)))
            ));
        }
    }

    #[test]
    fn test_scale_without_states_has_no_boundary() {
        let model = Model {
            scales: vec![Scale::default()],
            ..Model::default()
        };
        assert!(matches!(
            PreparedModel::new(model, &VisualizationConfig::default()),
            Err(ModelError::EmptyBoundary)
        ));
    }

    #[test]
    fn test_graph_lookup_errors() {
        let prepared = PreparedModel::new(three_scale_model(), &VisualizationConfig::default()).unwrap();
        assert!(matches!(
            prepared.graph(7, 0.5),
            Err(ModelError::ScaleOutOfRange { index: 7, count: 3 })
        ));
        assert!(matches!(prepared.graph(0, 3.0), Err(ModelError::InvalidThreshold(_))));
    }

    #[test]
    fn test_from_json_document() {
        let document = serde_json::json!({
            "scales": [
                { "states": [
                    { "stateNo": 0, "transitions": { "1": 0.4, "0": 0.6 } },
                    { "stateNo": 1, "transitions": { "0": 1.0 } }
                ] },
                { "states": [
                    { "stateNo": 5, "initialStates": [0, 1], "transitions": { "5": 1.0 } }
                ] }
            ],
            "stateHistoryInitialStates": [0, 0, 1],
            "stateHistoryTimes": [10, 20, 30, 40]
        });

        let prepared =
            PreparedModel::from_json_str(&document.to_string(), &VisualizationConfig::default()).unwrap();
        assert_eq!(prepared.timeline(0).len(), 3);
        assert_eq!(prepared.timeline(1).len(), 1);
        assert_eq!(prepared.timeline(1)[0].end_time, 40.0);
    }
}
