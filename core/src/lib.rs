//! scalechain core: multi-scale Markov chain transforms
//!
//! Turns a hierarchical Markov chain model into render-ready structures:
//!
//! - [`identity`]: deterministic, scale-consistent state colors
//! - [`layout`]: deterministic positions and importance-scaled radii
//! - [`boundary`]: coordinate extents shared by every scale
//! - [`graph`]: probability-threshold-filtered node/edge sets per scale
//! - [`timeline`]: occupancy history compressed into per-scale segments
//! - [`prepared`]: the once-per-model pipeline tying the stages together
//!
//! Rendering and interaction live in the visualization crate; nothing here
//! assumes any pixel space beyond the abstract `x`, `y`, `radius`.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

pub mod boundary;
pub mod config;
pub mod error;
pub mod graph;
pub mod identity;
pub mod layout;
pub mod model;
pub mod prepared;
pub mod timeline;

pub use boundary::{find_min_max_values, Boundary, Extent};
pub use config::{ConfigError, VisualizationConfig};
pub use error::{ModelError, Result};
pub use graph::{create_graph_data, create_scale_graph, GraphData, GraphEdge, Marker};
pub use identity::{assign_colors, Color, Palette};
pub use layout::{assign_coordinates, LayoutConfig, Placement};
pub use model::{Model, ModelRecord, Scale, State, StateNo, Timestamp};
pub use prepared::{PreparedModel, ScaleStatus};
pub use timeline::{compress_history, compress_scale, TimelineSegment};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
