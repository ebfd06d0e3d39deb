//! Model Error Taxonomy
//!
//! Every failure a model can exhibit at ingestion time, plus the input
//! validation failures of the pure transforms. Out-of-range interaction
//! parameters never reach this type: the linked-view controller clamps them.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use thiserror::Error;

use crate::config::ConfigError;
use crate::model::{StateNo, Timestamp};

/// Malformed-model and input-validation errors with diagnostic context
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model document has no scales")]
    NoScales,

    #[error("state history has {states} samples but {times} timestamps")]
    HistoryLengthMismatch { states: usize, times: usize },

    #[error("state history timestamp {index} ({time}) does not strictly follow its predecessor")]
    NonIncreasingTimes { index: usize, time: Timestamp },

    #[error("history sample {index} refers to state {state}, which is absent at scale 0")]
    UnknownHistoryState { index: usize, state: StateNo },

    #[error("scale {scale} declares state {state} more than once")]
    DuplicateStateNo { scale: usize, state: StateNo },

    #[error("scale {scale}: transition {from} -> {to} targets a state outside the scale")]
    DanglingTransition { scale: usize, from: StateNo, to: StateNo },

    #[error("scale {scale}: transition {from} -> {to} has probability {probability} outside [0, 1]")]
    InvalidProbability {
        scale: usize,
        from: StateNo,
        to: StateNo,
        probability: f64,
    },

    #[error("scale {scale}: initial state {initial_state} is aggregated by both {first} and {second}")]
    PartitionConflict {
        scale: usize,
        initial_state: StateNo,
        first: StateNo,
        second: StateNo,
    },

    #[error("scale {scale}: initial state {initial_state} is not aggregated by any state")]
    PartitionGap { scale: usize, initial_state: StateNo },

    #[error("scale {scale}: state {state} aggregates {initial_state}, which is absent at scale 0")]
    UnknownInitialState {
        scale: usize,
        state: StateNo,
        initial_state: StateNo,
    },

    #[error("scale index {index} is out of range ({count} scales)")]
    ScaleOutOfRange { index: usize, count: usize },

    #[error("probability threshold {0} outside [0, 1]")]
    InvalidThreshold(f64),

    #[error("no state carries assigned coordinates")]
    EmptyBoundary,

    #[error("failed to parse model document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("rejected visualization configuration: {0}")]
    Config(#[from] ConfigError),
}

impl ModelError {
    /// Scale the error is confined to, if any.
    ///
    /// Scale-local errors disable only that scale; everything else rejects
    /// the whole model.
    pub fn scale(&self) -> Option<usize> {
        match self {
            Self::DuplicateStateNo { scale, .. }
            | Self::DanglingTransition { scale, .. }
            | Self::InvalidProbability { scale, .. }
            | Self::PartitionConflict { scale, .. }
            | Self::PartitionGap { scale, .. }
            | Self::UnknownInitialState { scale, .. } => Some(*scale),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_local_errors() {
        let err = ModelError::PartitionGap { scale: 2, initial_state: 7 };
        assert_eq!(err.scale(), Some(2));
        assert_eq!(
            err.to_string(),
            "scale 2: initial state 7 is not aggregated by any state"
        );

        assert_eq!(ModelError::NoScales.scale(), None);
        assert_eq!(ModelError::EmptyBoundary.scale(), None);
    }

    #[test]
    fn test_history_mismatch_message() {
        let err = ModelError::HistoryLengthMismatch { states: 4, times: 4 };
        assert_eq!(
            err.to_string(),
            "state history has 4 samples but 4 timestamps"
        );
    }
}
