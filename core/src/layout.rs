//! Deterministic State Layout
//!
//! Places every state of every scale without any iterative simulation.
//! Finest-grain states sit on a circle, ordered by `stateNo`. A coarse state sits
//! at the weight-averaged centroid of the finest states it aggregates, so moving
//! up a scale visibly merges neighbouring nodes instead of reshuffling them.
//!
//! Radius encodes importance: `max_radius * sqrt(weight)`, where the weight of a
//! finest state is its normalized stationary probability (or `1/n` when the model
//! carries none) and the weight of a coarse state is the sum over its members.
//! The square root keeps node *area* proportional to weight.
//!
//! Positions depend only on the model, never on the probability threshold.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::model::{Scale, State, StateNo};

/// Layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Upper bound on any state's radius
    pub max_radius: f64,

    /// Lower bound on a radius, as a fraction of `max_radius`
    pub min_radius_fraction: f64,

    /// Distance of finest-grain states from the origin
    pub orbit_radius: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_radius: 130.0,
            min_radius_fraction: 0.1,
            orbit_radius: 500.0,
        }
    }
}

impl LayoutConfig {
    fn min_radius(&self) -> f64 {
        self.max_radius * self.min_radius_fraction
    }

    /// Radius for a weight in `[0, 1]`.
    ///
    /// Bounds are ordered before use, so an unvalidated config cannot panic.
    pub fn radius_for(&self, weight: f64) -> f64 {
        let (low, high) = {
            let (a, b) = (self.min_radius(), self.max_radius);
            (a.min(b), a.max(b))
        };
        (self.max_radius * weight.max(0.0).sqrt()).max(low).min(high)
    }
}

/// Position and size of one state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy)]
struct Anchor {
    x: f64,
    y: f64,
    weight: f64,
}

/// Finest-grain anchors every coarser placement derives from
#[derive(Debug, Clone)]
pub struct FineLayout {
    anchors: HashMap<StateNo, Anchor>,
}

impl FineLayout {
    pub fn new(finest: &Scale, config: &LayoutConfig) -> Self {
        let mut ids: Vec<StateNo> = finest.states.iter().map(|s| s.state_no).collect();
        ids.sort_unstable();
        ids.dedup();

        let weights = finest_weights(finest, ids.len());
        let count = ids.len().max(1) as f64;

        let anchors = ids
            .iter()
            .enumerate()
            .map(|(rank, &state_no)| {
                let angle = -FRAC_PI_2 + TAU * rank as f64 / count;
                let anchor = Anchor {
                    x: config.orbit_radius * angle.cos(),
                    y: config.orbit_radius * angle.sin(),
                    weight: weights.get(&state_no).copied().unwrap_or(0.0),
                };
                (state_no, anchor)
            })
            .collect();

        Self { anchors }
    }

    /// Placement of a state at any scale
    pub fn place(&self, scale_index: usize, state: &State, config: &LayoutConfig) -> Placement {
        if scale_index == 0 {
            return match self.anchors.get(&state.state_no) {
                Some(anchor) => Placement {
                    x: anchor.x,
                    y: anchor.y,
                    radius: config.radius_for(anchor.weight),
                },
                None => Placement {
                    x: 0.0,
                    y: 0.0,
                    radius: config.min_radius(),
                },
            };
        }

        let members: Vec<&Anchor> = state
            .initial_states
            .iter()
            .filter_map(|id| self.anchors.get(id))
            .collect();
        if members.is_empty() {
            return Placement {
                x: 0.0,
                y: 0.0,
                radius: config.min_radius(),
            };
        }

        let weight: f64 = members.iter().map(|a| a.weight).sum();
        let (x, y) = if weight > 0.0 {
            let x = members.iter().map(|a| a.x * a.weight).sum::<f64>() / weight;
            let y = members.iter().map(|a| a.y * a.weight).sum::<f64>() / weight;
            (x, y)
        } else {
            let n = members.len() as f64;
            (
                members.iter().map(|a| a.x).sum::<f64>() / n,
                members.iter().map(|a| a.y).sum::<f64>() / n,
            )
        };

        Placement {
            x,
            y,
            radius: config.radius_for(weight),
        }
    }
}

/// Normalized stationary weights, or uniform when any state lacks one
fn finest_weights(finest: &Scale, count: usize) -> HashMap<StateNo, f64> {
    let stationary: Option<Vec<(StateNo, f64)>> = finest
        .states
        .iter()
        .map(|state| {
            state
                .stationary_probability
                .filter(|p| p.is_finite() && *p >= 0.0)
                .map(|p| (state.state_no, p))
        })
        .collect();

    if let Some(stationary) = stationary {
        let total: f64 = stationary.iter().map(|(_, p)| p).sum();
        if total > 0.0 {
            return stationary.into_iter().map(|(id, p)| (id, p / total)).collect();
        }
    }

    let uniform = 1.0 / count.max(1) as f64;
    finest.states.iter().map(|s| (s.state_no, uniform)).collect()
}

/// Write `x`, `y` and `radius` on every state of every scale
pub fn assign_coordinates(scales: &mut [Scale], config: &LayoutConfig) {
    debug_assert!(config.max_radius > 0.0 && config.max_radius.is_finite());

    let Some(finest) = scales.first() else {
        return;
    };
    let layout = FineLayout::new(finest, config);

    for (scale_index, scale) in scales.iter_mut().enumerate() {
        for state in &mut scale.states {
            let placement = layout.place(scale_index, state, config);
            state.x = Some(placement.x);
            state.y = Some(placement.y);
            state.radius = Some(placement.radius);
        }
        log::trace!("Placed {} states at scale {}", scale.len(), scale_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::three_scale_model;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_radius_bounds() {
        let config = LayoutConfig::default();
        assert!((config.radius_for(1.0) - 130.0).abs() < EPS);
        assert!((config.radius_for(4.0) - 130.0).abs() < EPS);
        assert!((config.radius_for(0.0) - 13.0).abs() < EPS);
        assert!((config.radius_for(0.25) - 65.0).abs() < EPS);
    }

    #[test]
    fn test_inverted_radius_bounds_do_not_panic() {
        let config = LayoutConfig {
            min_radius_fraction: 2.0,
            ..LayoutConfig::default()
        };
        assert!((config.radius_for(0.0) - 130.0).abs() < EPS);
        assert!((config.radius_for(1.0) - 130.0).abs() < EPS);

        let broken = LayoutConfig {
            max_radius: f64::NAN,
            min_radius_fraction: f64::NAN,
            ..LayoutConfig::default()
        };
        let _ = broken.radius_for(0.5);
    }

    #[test]
    fn test_finest_states_on_orbit() {
        let mut model = three_scale_model();
        let config = LayoutConfig::default();
        assign_coordinates(&mut model.scales, &config);

        for state in &model.scales[0].states {
            let distance = state.x.unwrap().hypot(state.y.unwrap());
            assert!((distance - config.orbit_radius).abs() < 1e-6);
            assert!((state.radius.unwrap() - 65.0).abs() < 1e-6);
        }

        let first = model.scales[0].state(0).unwrap();
        assert!(first.x.unwrap().abs() < 1e-6);
        assert!((first.y.unwrap() + config.orbit_radius).abs() < 1e-6);
    }

    #[test]
    fn test_coarse_state_at_member_centroid() {
        let mut model = three_scale_model();
        let config = LayoutConfig::default();
        assign_coordinates(&mut model.scales, &config);

        let a = model.scales[0].state(0).unwrap().clone();
        let b = model.scales[0].state(1).unwrap().clone();
        let merged = &model.scales[1].states[0];
        assert!((merged.x.unwrap() - (a.x.unwrap() + b.x.unwrap()) / 2.0).abs() < 1e-6);
        assert!((merged.y.unwrap() - (a.y.unwrap() + b.y.unwrap()) / 2.0).abs() < 1e-6);

        let top = &model.scales[2].states[0];
        assert!(top.x.unwrap().abs() < 1e-6);
        assert!(top.y.unwrap().abs() < 1e-6);
        assert!((top.radius.unwrap() - config.max_radius).abs() < 1e-6);
    }

    #[test]
    fn test_stationary_weights_drive_radius() {
        let mut model = three_scale_model();
        for (state, p) in model.scales[0].states.iter_mut().zip([0.64, 0.16, 0.16, 0.04]) {
            state.stationary_probability = Some(p);
        }
        let config = LayoutConfig::default();
        assign_coordinates(&mut model.scales, &config);

        let radius = |no: StateNo| model.scales[0].state(no).unwrap().radius.unwrap();
        assert!((radius(0) - 130.0 * 0.8).abs() < 1e-6);
        assert!((radius(1) - 130.0 * 0.4).abs() < 1e-6);
        assert!((radius(3) - 130.0 * 0.2).abs() < 1e-6);

        let merged = model.scales[1].states[0].radius.unwrap();
        assert!((merged - 130.0 * 0.8f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_partial_stationary_weights_fall_back_to_uniform() {
        let mut model = three_scale_model();
        model.scales[0].states[0].stationary_probability = Some(0.9);
        let config = LayoutConfig::default();
        assign_coordinates(&mut model.scales, &config);

        for state in &model.scales[0].states {
            assert!((state.radius.unwrap() - 65.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_assignment_is_idempotent() {
        let mut model = three_scale_model();
        let config = LayoutConfig::default();
        assign_coordinates(&mut model.scales, &config);
        let first = model.clone();
        assign_coordinates(&mut model.scales, &config);
        assert_eq!(first, model);
    }

    #[test]
    fn test_empty_aggregate_placed_at_origin() {
        let config = LayoutConfig::default();
        let layout = FineLayout::new(&three_scale_model().scales[0], &config);
        let placement = layout.place(1, &State::new(99), &config);
        assert_eq!(placement.x, 0.0);
        assert_eq!(placement.y, 0.0);
        assert!((placement.radius - 13.0).abs() < EPS);
    }
}
