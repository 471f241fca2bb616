//! Core application module
//!
//! This module contains the console event loop that ties the session,
//! the analysis controller and the renderer together.

pub mod app;
