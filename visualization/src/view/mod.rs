//! Renderer-facing output
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

pub mod frame;

pub use frame::{FrameError, RenderFrame};
