//! Interaction State
//!
//! The parameters user input can change (probability threshold, selected scale,
//! selected state, visible time window) and the controller that owns them.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

pub mod controller;

use serde::{Deserialize, Serialize};

use scalechain_core::{State, Timestamp};

pub use controller::{LinkedViewController, StateSelectedCallback};

/// Closed time window in Unix seconds, always `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Window between two instants, in either order
    pub fn new(a: Timestamp, b: Timestamp) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    /// Zero-width windows select nothing
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        self.start <= time && time <= self.end
    }

    /// Shift the window inside `extent`, keeping its width when it fits.
    ///
    /// A window wider than the extent collapses to the extent.
    pub fn fit_within(&self, extent: &TimeRange) -> TimeRange {
        if self.width() >= extent.width() {
            return *extent;
        }
        if self.start < extent.start {
            TimeRange {
                start: extent.start,
                end: extent.start + self.width(),
            }
        } else if self.end > extent.end {
            TimeRange {
                start: extent.end - self.width(),
                end: extent.end,
            }
        } else {
            *self
        }
    }
}

/// Parameters driven by user input.
///
/// Only [`LinkedViewController`] handlers mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    probability_threshold: f64,
    selected_scale_index: usize,
    selected_state: Option<State>,
    view_domain: TimeRange,
}

impl InteractionState {
    pub fn probability_threshold(&self) -> f64 {
        self.probability_threshold
    }

    pub fn selected_scale_index(&self) -> usize {
        self.selected_scale_index
    }

    pub fn selected_state(&self) -> Option<&State> {
        self.selected_state.as_ref()
    }

    pub fn view_domain(&self) -> TimeRange {
        self.view_domain
    }
}
