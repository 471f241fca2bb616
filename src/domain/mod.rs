//! Pure domain types with minimal dependencies
//!
//! This module contains the zone model, media-space geometry and live count
//! snapshots. Types here must not depend on the engine client, the renderer
//! or the console.

pub mod counts;
pub mod geometry;
pub mod zone;

pub use counts::*;
pub use geometry::*;
pub use zone::*;
