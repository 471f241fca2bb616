//! Media capture
//!
//! Loads the reference frame that zones are drawn on.

pub mod frame;

pub use frame::{ReferenceFrame, load_reference_frame};
