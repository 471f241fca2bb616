//! Plain-text live dashboard

use std::fmt::Write;

use chrono::{DateTime, Local};

use super::pivot::CountReport;

/// Shown when no zone has been drawn yet
pub const EMPTY_MESSAGE: &str = "Sin carriles definidos.";

/// Render one card per zone with the count of every monitored class
pub fn render_dashboard(report: &CountReport, updated_at: Option<DateTime<Local>>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Dashboard en vivo ==");

    if report.is_empty() {
        let _ = writeln!(out, "{}", EMPTY_MESSAGE);
        return out;
    }

    for (index, tally) in report.tallies.iter().enumerate() {
        let _ = writeln!(out, "[{}] {} ({})", index + 1, tally.name, tally.label);
        for (class, count) in &tally.counts {
            let _ = writeln!(out, "    {:<10} {:>6}", class.as_str(), count);
        }
    }

    match updated_at {
        Some(at) => {
            let _ = writeln!(out, "Actualizado {}", at.format("%H:%M:%S"));
        }
        None => {
            let _ = writeln!(out, "Sin datos del motor");
        }
    }
    out
}
