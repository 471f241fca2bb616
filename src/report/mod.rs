//! Count reports
//!
//! - `pivot`: per-zone aggregates and their long/wide projections
//! - `dashboard`: live text view
//! - `export`: spreadsheet, CSV and PDF writers

pub mod dashboard;
pub mod export;
pub mod pivot;

pub use pivot::CountReport;
