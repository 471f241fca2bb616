//! Zone drawing and the zone list
//!
//! This module provides:
//! - The point-collection state machine for line and polygon tools
//! - The ordered store of committed zones
//! - Message handlers for DrawMsg

pub mod drawing;
pub mod handlers;
pub mod store;
