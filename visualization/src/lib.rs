//! scalechain visualization: linked views over a prepared model
//!
//! Three views share one interaction state: the graph view of the selected
//! scale, the overview timeline with a brush, and the zoomable detail
//! timeline.
//!
//! - [`interaction`]: the interaction state and the controller mutating it
//! - [`perspective`]: time window synchronization between the two timelines
//! - [`view`]: serializable render frames
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

pub mod interaction;
pub mod perspective;
pub mod view;

pub use interaction::{InteractionState, LinkedViewController, StateSelectedCallback, TimeRange};
pub use perspective::{
    synchronize, DetachedView, LinkedView, SyncOrigin, SyncOutcome, ViewEvent, ViewTarget,
    ZoomTransform,
};
pub use view::{FrameError, RenderFrame};
