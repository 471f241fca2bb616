//! Overlay rendering module
//!
//! This module contains:
//! - Geometry constants and marker math for the overlay
//! - Image rendering using tiny-skia

pub mod geometry;
pub mod image;
