//! Cross-View Time Domain Synchronization
//!
//! The overview pane (brush over the full history) and the detail pane
//! (zoomable window) must always show the same time window. Moving one view
//! programmatically makes it fire its own brush/zoom event, which would feed
//! straight back into the other view. [`SyncOrigin`] records which view started
//! the current update; any event arriving while it is not `Idle` is an echo and
//! is suppressed, so every user action settles after exactly one propagation.
//!
//! [`synchronize`] is the pure transition function. The controller owns the
//! views and applies its result.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use serde::{Deserialize, Serialize};

use crate::interaction::TimeRange;

/// View that started the in-flight domain update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOrigin {
    #[default]
    Idle,
    Overview,
    Detail,
}

/// One of the two time views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewTarget {
    Overview,
    Detail,
}

impl ViewTarget {
    pub fn opposite(self) -> Self {
        match self {
            Self::Overview => Self::Detail,
            Self::Detail => Self::Overview,
        }
    }
}

/// Domain change reported by a view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// Brush selection moved in the overview
    OverviewBrushed(TimeRange),
    /// Zoom or pan in the detail view, already converted to a time window
    DetailZoomed(TimeRange),
}

impl ViewEvent {
    pub fn source(&self) -> ViewTarget {
        match self {
            Self::OverviewBrushed(_) => ViewTarget::Overview,
            Self::DetailZoomed(_) => ViewTarget::Detail,
        }
    }

    pub fn range(&self) -> TimeRange {
        match self {
            Self::OverviewBrushed(range) | Self::DetailZoomed(range) => *range,
        }
    }

    fn origin(&self) -> SyncOrigin {
        match self.source() {
            ViewTarget::Overview => SyncOrigin::Overview,
            ViewTarget::Detail => SyncOrigin::Detail,
        }
    }
}

/// What one event did to the shared domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// Domain moved and was pushed to the other view
    Applied(TimeRange),
    /// Domain already matched; nothing pushed
    Unchanged,
    /// Echo of an update in flight
    Suppressed,
    /// Empty or non-finite range, or no history to clamp against
    Ignored,
}

/// Result of [`synchronize`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncStep {
    pub origin: SyncOrigin,
    pub domain: TimeRange,
    /// View to move and the window to move it to
    pub propagate: Option<(ViewTarget, TimeRange)>,
    pub outcome: SyncOutcome,
}

impl SyncStep {
    fn unchanged(origin: SyncOrigin, domain: TimeRange, outcome: SyncOutcome) -> Self {
        Self {
            origin,
            domain,
            propagate: None,
            outcome,
        }
    }
}

/// Advance the synchronization state by one view event.
///
/// A non-`Idle` origin suppresses the event. Otherwise the range is fitted into
/// `extent`, becomes the new domain and is propagated to the other view, with
/// the origin set until the caller releases it.
pub fn synchronize(
    origin: SyncOrigin,
    domain: TimeRange,
    extent: TimeRange,
    event: ViewEvent,
) -> SyncStep {
    if origin != SyncOrigin::Idle {
        return SyncStep::unchanged(origin, domain, SyncOutcome::Suppressed);
    }

    let range = event.range();
    if !range.is_finite() || range.is_empty() || extent.is_empty() {
        return SyncStep::unchanged(origin, domain, SyncOutcome::Ignored);
    }

    let fitted = range.fit_within(&extent);
    if fitted == domain {
        return SyncStep::unchanged(origin, domain, SyncOutcome::Unchanged);
    }

    SyncStep {
        origin: event.origin(),
        domain: fitted,
        propagate: Some((event.source().opposite(), fitted)),
        outcome: SyncOutcome::Applied(fitted),
    }
}

/// A view whose time domain the controller keeps in step.
pub trait LinkedView {
    /// Move the view to `domain`.
    ///
    /// Returns the event the view's own listeners fire in response, if any;
    /// the controller feeds it back through the guard.
    fn apply_domain(&mut self, domain: TimeRange) -> Option<ViewEvent>;
}

/// View with nothing attached, for headless sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedView;

impl LinkedView for DetachedView {
    fn apply_domain(&mut self, _domain: TimeRange) -> Option<ViewEvent> {
        None
    }
}

/// Pan/zoom transform of the detail axis, `screen = k * base + x`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self { k: 1.0, x: 0.0 };

    /// Time window visible through this transform when `extent` spans `width`
    /// pixels at identity. Zoom is clamped to `k >= 1`.
    pub fn rescale(&self, extent: TimeRange, width: f64) -> TimeRange {
        let k = self.k.max(1.0);
        let invert = |pixel: f64| extent.start + (pixel - self.x) / k / width * extent.width();
        TimeRange::new(invert(0.0), invert(width))
    }

    /// Transform that shows `domain` when `extent` spans `width` pixels.
    ///
    /// Used to move the detail view after a brush; inverse of [`rescale`](Self::rescale).
    pub fn for_domain(domain: TimeRange, extent: TimeRange, width: f64) -> Self {
        if domain.is_empty() || extent.is_empty() {
            return Self::IDENTITY;
        }
        let k = (extent.width() / domain.width()).max(1.0);
        let x = -k * (domain.start - extent.start) / extent.width() * width;
        Self { k, x }
    }
}
