//! Annotation session management module
//!
//! This module contains:
//! - Session state (reference frame, zones, drawing machine, counts)
//! - Message types and console command parsing
//! - The analysis controller that talks to the engine

pub mod commands;
pub mod controller;
pub mod messages;
pub mod state;
