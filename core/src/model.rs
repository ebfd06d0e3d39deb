//! Multi-Scale Markov Chain Data Model
//!
//! This module defines the model document consumed from the host application:
//! an ordered sequence of scales (index 0 is the finest granularity), each a set
//! of states with intra-scale transition probabilities, plus the occupancy
//! history sampled at the finest granularity.
//!
//! ## Structural invariants
//!
//! 1. `stateHistoryTimes` is strictly increasing and has exactly one more entry
//!    than `stateHistoryInitialStates`.
//! 2. Within a scale, `stateNo` is unique.
//! 3. Above scale 0, the `initialStates` sets partition the scale-0 states: every
//!    finest-grain identifier belongs to exactly one coarse state.
//!
//! Violations of (1) reject the model. Violations of (2) and (3) are confined to
//! the offending scale, which then renders nothing.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ModelError, Result};
use crate::identity::Color;

/// Identifier of a state within its scale
pub type StateNo = u32;

/// Unix timestamp in seconds
pub type Timestamp = f64;

/// A node of the chain at one scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// Identifier, unique within the owning scale
    pub state_no: StateNo,

    /// Finest-grain states aggregated into this one (empty at scale 0)
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub initial_states: Vec<StateNo>,

    /// Target `stateNo` to transition probability, in document order
    #[serde(default)]
    pub transitions: IndexMap<StateNo, f64>,

    /// Stationary weight of the state, when the model provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stationary_probability: Option<f64>,

    /// Free-text label for the drawing layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Assigned by the identity assigner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,

    /// Assigned by the layout assigner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl State {
    pub fn new(state_no: StateNo) -> Self {
        Self {
            state_no,
            initial_states: Vec::new(),
            transitions: IndexMap::new(),
            stationary_probability: None,
            label: None,
            color: None,
            x: None,
            y: None,
            radius: None,
        }
    }

    /// Builder helper: set aggregated finest-grain states
    pub fn aggregating(mut self, initial_states: impl IntoIterator<Item = StateNo>) -> Self {
        self.initial_states = initial_states.into_iter().collect();
        self
    }

    /// Builder helper: append a transition
    pub fn with_transition(mut self, to: StateNo, probability: f64) -> Self {
        self.transitions.insert(to, probability);
        self
    }

    /// Whether the layout assigner has placed this state
    pub fn has_coordinates(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.radius.is_some()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<StateNo>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<StateNo>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One granularity level of the chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    #[serde(default)]
    pub states: Vec<State>,
}

impl Scale {
    pub fn new(states: Vec<State>) -> Self {
        Self { states }
    }

    /// Look up a state by its identifier
    pub fn state(&self, state_no: StateNo) -> Option<&State> {
        self.states.iter().find(|state| state.state_no == state_no)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// The multi-scale model document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Scales ordered from finest (0) to coarsest
    #[serde(default)]
    pub scales: Vec<Scale>,

    /// Finest-grain state occupied during each sample interval
    #[serde(default)]
    pub state_history_initial_states: Vec<StateNo>,

    /// Sample interval bounds, one more than the number of samples
    #[serde(default)]
    pub state_history_times: Vec<Timestamp>,
}

/// Model record as stored by the host API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub public: bool,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub model: Option<Model>,
}

impl Model {
    /// Parse either a bare model document or a host record wrapping one.
    ///
    /// A record without an embedded model yields an empty model, which then
    /// fails validation with [`ModelError::NoScales`].
    pub fn from_json_str(document: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(document)?;
        let is_record = value.get("scales").is_none() && value.get("model").is_some();

        if is_record {
            let record: ModelRecord = serde_json::from_value(value)?;
            log::debug!(
                "Unwrapping model record {:?} ({:?})",
                record.uuid,
                record.name
            );
            Ok(record.model.unwrap_or_default())
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    pub fn scale_count(&self) -> usize {
        self.scales.len()
    }

    /// Number of sampled instants in the occupancy history
    pub fn history_len(&self) -> usize {
        self.state_history_initial_states.len()
    }

    /// First and last timestamps of the history, if any
    pub fn history_extent(&self) -> Option<(Timestamp, Timestamp)> {
        let first = *self.state_history_times.first()?;
        let last = *self.state_history_times.last()?;
        Some((first, last))
    }

    /// Check the invariants that span the whole model.
    ///
    /// Any failure here leaves nothing renderable.
    pub fn validate_structure(&self) -> Result<()> {
        if self.scales.is_empty() {
            return Err(ModelError::NoScales);
        }

        validate_history(&self.state_history_initial_states, &self.state_history_times)?;

        let finest: HashSet<StateNo> = self.scales[0].states.iter().map(|s| s.state_no).collect();
        for (index, state) in self.state_history_initial_states.iter().enumerate() {
            if !finest.contains(state) {
                return Err(ModelError::UnknownHistoryState { index, state: *state });
            }
        }

        Ok(())
    }

    /// Check the invariants confined to one scale
    pub fn validate_scale(&self, scale_index: usize) -> Result<()> {
        let scale = self.scales.get(scale_index).ok_or(ModelError::ScaleOutOfRange {
            index: scale_index,
            count: self.scales.len(),
        })?;

        let mut seen = HashSet::with_capacity(scale.len());
        for state in &scale.states {
            if !seen.insert(state.state_no) {
                return Err(ModelError::DuplicateStateNo {
                    scale: scale_index,
                    state: state.state_no,
                });
            }
        }

        for state in &scale.states {
            for (&to, &probability) in &state.transitions {
                if !seen.contains(&to) {
                    return Err(ModelError::DanglingTransition {
                        scale: scale_index,
                        from: state.state_no,
                        to,
                    });
                }
                if !(0.0..=1.0).contains(&probability) {
                    return Err(ModelError::InvalidProbability {
                        scale: scale_index,
                        from: state.state_no,
                        to,
                        probability,
                    });
                }
            }
        }

        if scale_index > 0 {
            self.validate_partition(scale_index, scale)?;
        }

        Ok(())
    }

    fn validate_partition(&self, scale_index: usize, scale: &Scale) -> Result<()> {
        let finest: HashSet<StateNo> = self.scales[0].states.iter().map(|s| s.state_no).collect();
        let mut owner: HashMap<StateNo, StateNo> = HashMap::with_capacity(finest.len());

        for state in &scale.states {
            for &initial_state in &state.initial_states {
                if !finest.contains(&initial_state) {
                    return Err(ModelError::UnknownInitialState {
                        scale: scale_index,
                        state: state.state_no,
                        initial_state,
                    });
                }
                if let Some(&first) = owner.get(&initial_state) {
                    if first != state.state_no {
                        return Err(ModelError::PartitionConflict {
                            scale: scale_index,
                            initial_state,
                            first,
                            second: state.state_no,
                        });
                    }
                }
                owner.insert(initial_state, state.state_no);
            }
        }

        let mut uncovered: Vec<StateNo> = finest
            .iter()
            .filter(|initial_state| !owner.contains_key(*initial_state))
            .copied()
            .collect();
        uncovered.sort_unstable();
        match uncovered.first() {
            Some(&initial_state) => Err(ModelError::PartitionGap {
                scale: scale_index,
                initial_state,
            }),
            None => Ok(()),
        }
    }
}

/// Check that a history is aligned with its timestamps.
///
/// An empty history is valid with zero or one timestamp. Otherwise there must be
/// exactly one more timestamp than samples, all finite and strictly increasing,
/// so `times[0]` opens the first sample interval.
pub fn validate_history(initial_states: &[StateNo], times: &[Timestamp]) -> Result<()> {
    let aligned = if initial_states.is_empty() {
        times.len() <= 1
    } else {
        times.len() == initial_states.len() + 1
    };
    if !aligned {
        return Err(ModelError::HistoryLengthMismatch {
            states: initial_states.len(),
            times: times.len(),
        });
    }

    for (index, &time) in times.iter().enumerate() {
        let follows = index == 0 || time > times[index - 1];
        if !time.is_finite() || !follows {
            return Err(ModelError::NonIncreasingTimes { index, time });
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Four finest states, a two-way and a one-way aggregation above them.
    pub fn three_scale_model() -> Model {
        let finest = Scale::new(vec![
            State::new(0).with_transition(0, 0.5).with_transition(1, 0.3).with_transition(2, 0.2),
            State::new(1).with_transition(0, 0.05).with_transition(1, 0.9).with_transition(3, 0.05),
            State::new(2).with_transition(3, 1.0),
            State::new(3).with_transition(0, 0.6).with_transition(2, 0.4),
        ]);
        let middle = Scale::new(vec![
            State::new(10).aggregating([0, 1]).with_transition(10, 0.7).with_transition(11, 0.3),
            State::new(11).aggregating([2, 3]).with_transition(10, 0.45).with_transition(11, 0.55),
        ]);
        let coarse = Scale::new(vec![
            State::new(20).aggregating([0, 1, 2, 3]).with_transition(20, 1.0),
        ]);

        Model {
            scales: vec![finest, middle, coarse],
            state_history_initial_states: vec![0, 1, 1, 2, 3, 0],
            state_history_times: vec![100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0],
        }
    }
}
