//! Occupancy Timeline Compression
//!
//! Converts the finest-grain occupancy history into per-scale runs of constant
//! state. At scale 0 every sample is its own segment. Above it, the history is
//! mapped through the scale's partition (finest id to coarse `stateNo`) and
//! consecutive samples that land in the same coarse state are merged.
//!
//! ## Invariants
//!
//! For every scale the segments are sorted by start time, contiguous
//! (`segments[i].end_time == segments[i + 1].start_time`) and exactly span
//! `[times[0], times[last]]`. A coarser partition can only merge runs, so the
//! segment count never grows with the scale index.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::identity::{resolved_color, Color};
use crate::model::{validate_history, Scale, State, StateNo, Timestamp};

/// Maximal interval during which the occupied state at one scale was constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSegment {
    pub scale_index: usize,
    pub state: StateNo,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub color: Color,
}

impl TimelineSegment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether the half-open segment overlaps `[start, end)`
    pub fn intersects(&self, start: Timestamp, end: Timestamp) -> bool {
        self.start_time < end && start < self.end_time
    }
}

/// Finest-grain id to coarse `stateNo` for one scale
#[derive(Debug, Clone)]
pub struct InitialStateLookup {
    scale_index: usize,
    coarse: HashMap<StateNo, StateNo>,
}

impl InitialStateLookup {
    /// Invert the `initialStates` sets of a scale.
    ///
    /// A finest id claimed by two coarse states is a partition conflict.
    pub fn build(scale_index: usize, scale: &Scale) -> Result<Self> {
        let mut coarse = HashMap::new();
        for state in &scale.states {
            for &initial_state in &state.initial_states {
                if let Some(first) = coarse.insert(initial_state, state.state_no) {
                    if first != state.state_no {
                        return Err(ModelError::PartitionConflict {
                            scale: scale_index,
                            initial_state,
                            first,
                            second: state.state_no,
                        });
                    }
                }
            }
        }
        Ok(Self {
            scale_index,
            coarse,
        })
    }

    pub fn coarse_state(&self, initial_state: StateNo) -> Option<StateNo> {
        self.coarse.get(&initial_state).copied()
    }

    fn resolve(&self, initial_state: StateNo) -> Result<StateNo> {
        self.coarse_state(initial_state).ok_or(ModelError::PartitionGap {
            scale: self.scale_index,
            initial_state,
        })
    }

    pub fn len(&self) -> usize {
        self.coarse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coarse.is_empty()
    }
}

fn states_by_no(scale: &Scale) -> HashMap<StateNo, &State> {
    scale.states.iter().map(|state| (state.state_no, state)).collect()
}

/// Compress the history for every scale, outer index = scale
pub fn compress_history(
    scales: &[Scale],
    initial_states: &[StateNo],
    times: &[Timestamp],
) -> Result<Vec<Vec<TimelineSegment>>> {
    validate_history(initial_states, times)?;

    scales
        .par_iter()
        .enumerate()
        .map(|(scale_index, scale)| compress_aligned(scale_index, scale, initial_states, times))
        .collect()
}

/// Compress the history for a single scale
pub fn compress_scale(
    scale_index: usize,
    scale: &Scale,
    initial_states: &[StateNo],
    times: &[Timestamp],
) -> Result<Vec<TimelineSegment>> {
    validate_history(initial_states, times)?;
    compress_aligned(scale_index, scale, initial_states, times)
}

fn compress_aligned(
    scale_index: usize,
    scale: &Scale,
    initial_states: &[StateNo],
    times: &[Timestamp],
) -> Result<Vec<TimelineSegment>> {
    let segments = if scale_index == 0 {
        expand_finest(scale, initial_states, times)?
    } else {
        merge_runs(scale_index, scale, initial_states, times)?
    };

    log::debug!(
        "Scale {}: {} samples compressed to {} segments",
        scale_index,
        initial_states.len(),
        segments.len()
    );
    Ok(segments)
}

/// One segment per sample, no merging
fn expand_finest(
    scale: &Scale,
    initial_states: &[StateNo],
    times: &[Timestamp],
) -> Result<Vec<TimelineSegment>> {
    let states = states_by_no(scale);

    initial_states
        .iter()
        .enumerate()
        .map(|(index, &state_no)| -> Result<TimelineSegment> {
            let state = states
                .get(&state_no)
                .ok_or(ModelError::UnknownHistoryState {
                    index,
                    state: state_no,
                })?;
            Ok(TimelineSegment {
                scale_index: 0,
                state: state_no,
                start_time: times[index],
                end_time: times[index + 1],
                color: resolved_color(0, state),
            })
        })
        .collect()
}

/// Runs of constant coarse state
fn merge_runs(
    scale_index: usize,
    scale: &Scale,
    initial_states: &[StateNo],
    times: &[Timestamp],
) -> Result<Vec<TimelineSegment>> {
    let Some(&first) = initial_states.first() else {
        return Ok(Vec::new());
    };

    let lookup = InitialStateLookup::build(scale_index, scale)?;
    let states = states_by_no(scale);
    let segment = |state: StateNo, start: usize, close: usize| TimelineSegment {
        scale_index,
        state,
        start_time: times[start],
        end_time: times[close],
        color: states
            .get(&state)
            .map(|s| resolved_color(scale_index, s))
            .unwrap_or_else(|| resolved_color(scale_index, &State::new(state))),
    };

    let mut segments = Vec::new();
    let mut run_start = 0;
    let mut run_state = lookup.resolve(first)?;

    for (index, &initial_state) in initial_states.iter().enumerate().skip(1) {
        let current = lookup.resolve(initial_state)?;
        if current != run_state {
            segments.push(segment(run_state, run_start, index));
            run_start = index;
            run_state = current;
        }
    }
    segments.push(segment(run_state, run_start, initial_states.len()));

    Ok(segments)
}

/// Segments overlapping `[start, end)`, for culling the detail pane.
///
/// Relies on the segments being sorted and contiguous.
pub fn segments_in_range(
    segments: &[TimelineSegment],
    start: Timestamp,
    end: Timestamp,
) -> &[TimelineSegment] {
    let first = segments.partition_point(|s| s.end_time <= start);
    let last = segments.partition_point(|s| s.start_time < end);
    if first >= last {
        return &[];
    }
    &segments[first..last]
}

/// Every segment spent in one state
pub fn segments_for_state(
    segments: &[TimelineSegment],
    state: StateNo,
) -> impl Iterator<Item = &TimelineSegment> {
    segments.iter().filter(move |segment| segment.state == state)
}

/// Total dwell time per state, in order of first occupancy
pub fn occupancy(segments: &[TimelineSegment]) -> IndexMap<StateNo, f64> {
    let mut totals = IndexMap::new();
    for segment in segments {
        *totals.entry(segment.state).or_insert(0.0) += segment.duration();
    }
    totals
}
