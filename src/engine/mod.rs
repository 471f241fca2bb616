//! Counting engine integration

pub mod client;

pub use client::{Engine, EngineClient};
