//! Linked time perspectives
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

pub mod synchronization;

pub use synchronization::{
    synchronize, DetachedView, LinkedView, SyncOrigin, SyncOutcome, SyncStep, ViewEvent,
    ViewTarget, ZoomTransform,
};
