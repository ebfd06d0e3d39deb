//! Cross-Scale Boundary Calculation
//!
//! The drawing layer maps abstract coordinates onto its canvas with one set of
//! axes for every scale. Extents are therefore reduced over all scales, not
//! only the selected one, and switching scales never rescales the axes.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::model::Scale;

/// Closed interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Linear position of `value` within the extent, 0.5 for a degenerate extent
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.span();
        if span > 0.0 {
            (value - self.min) / span
        } else {
            0.5
        }
    }
}

/// Extents of assigned coordinates across all scales
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub x: Extent,
    pub y: Extent,
    pub r: Extent,
}

/// Reduce all assigned coordinates to their extents.
///
/// States without coordinates are skipped; an error is returned when none has
/// any, rather than a degenerate boundary.
pub fn find_min_max_values(scales: &[Scale]) -> Result<Boundary> {
    let mut boundary: Option<Boundary> = None;

    let placed = scales
        .iter()
        .flat_map(|scale| scale.states.iter())
        .filter_map(|state| Some((state.x?, state.y?, state.radius?)));

    for (x, y, r) in placed {
        match boundary.as_mut() {
            Some(b) => {
                b.x.include(x);
                b.y.include(y);
                b.r.include(r);
            }
            None => {
                boundary = Some(Boundary {
                    x: Extent::point(x),
                    y: Extent::point(y),
                    r: Extent::point(r),
                })
            }
        }
    }

    boundary.ok_or(ModelError::EmptyBoundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{assign_coordinates, LayoutConfig};
    use crate::model::fixtures::three_scale_model;
    use crate::model::State;

    fn placed(state_no: u32, x: f64, y: f64, radius: f64) -> State {
        let mut state = State::new(state_no);
        state.x = Some(x);
        state.y = Some(y);
        state.radius = Some(radius);
        state
    }

    #[test]
    fn test_reduces_across_all_scales() {
        let scales = vec![
            Scale::new(vec![placed(0, -4.0, 2.0, 1.0), placed(1, 3.0, -1.0, 2.0)]),
            Scale::new(vec![placed(5, 0.0, 9.0, 7.5)]),
        ];

        let boundary = find_min_max_values(&scales).unwrap();
        assert_eq!(boundary.x, Extent { min: -4.0, max: 3.0 });
        assert_eq!(boundary.y, Extent { min: -1.0, max: 9.0 });
        assert_eq!(boundary.r, Extent { min: 1.0, max: 7.5 });
    }

    #[test]
    fn test_unplaced_states_are_skipped() {
        let scales = vec![Scale::new(vec![State::new(0), placed(1, 1.0, 1.0, 1.0)])];
        let boundary = find_min_max_values(&scales).unwrap();
        assert_eq!(boundary.x.span(), 0.0);
        assert_eq!(boundary.x.normalize(1.0), 0.5);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(find_min_max_values(&[]), Err(ModelError::EmptyBoundary)));

        let unplaced = vec![Scale::new(vec![State::new(0)])];
        assert!(matches!(
            find_min_max_values(&unplaced),
            Err(ModelError::EmptyBoundary)
        ));
    }

    #[test]
    fn test_layout_boundary_covers_orbit() {
        let mut model = three_scale_model();
        let config = LayoutConfig::default();
        assign_coordinates(&mut model.scales, &config);

        let boundary = find_min_max_values(&model.scales).unwrap();
        assert!((boundary.y.min + config.orbit_radius).abs() < 1e-6);
        assert!((boundary.r.max - config.max_radius).abs() < 1e-6);
        assert!((boundary.x.normalize(boundary.x.max) - 1.0).abs() < 1e-9);
    }
}
