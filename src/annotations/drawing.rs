//! Point collection for the line and polygon tools
//!
//! The machine moves `Idle -> Collecting -> AwaitingName -> Idle`. Naming is
//! an explicit state rather than a blocking prompt: while a name is pending,
//! new points are ignored but everything else keeps working.

use super::store::ZoneStore;
use crate::domain::{ClassSelection, Point, ToolKind, Zone};

/// Where the active shape is in its lifecycle
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DrawPhase {
    /// No points buffered
    #[default]
    Idle,
    /// Some points buffered, fewer than the tool requires
    Collecting(Vec<Point>),
    /// Shape complete, waiting for the operator to name it
    AwaitingName(Vec<Point>),
}

/// Why a completed shape was thrown away
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// No class was selected, so the zone would monitor nothing
    NoClasses,
}

/// Result of feeding a point to the machine
#[derive(Clone, Debug, PartialEq)]
pub enum PointOutcome {
    /// Input is frozen or a name is pending
    Ignored,
    Collecting { have: usize, need: usize },
    /// Shape is complete; the operator must now name it
    NameRequested,
    Discarded(DiscardReason),
}

/// Result of answering the naming step
#[derive(Clone, Debug, PartialEq)]
pub enum NameOutcome {
    /// Zone appended at this index
    Committed(usize),
    /// Name declined or blank; buffer discarded
    Declined,
    Discarded(DiscardReason),
    /// No shape was waiting for a name
    NotAwaiting,
}

/// Drawing state for the active tool
#[derive(Clone, Debug, Default)]
pub struct Drawing {
    tool: ToolKind,
    phase: DrawPhase,
}

impl Drawing {
    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn is_awaiting_name(&self) -> bool {
        matches!(self.phase, DrawPhase::AwaitingName(_))
    }

    /// Points of the unfinished shape (empty when idle)
    pub fn buffer(&self) -> &[Point] {
        match &self.phase {
            DrawPhase::Idle => &[],
            DrawPhase::Collecting(points) | DrawPhase::AwaitingName(points) => points.as_slice(),
        }
    }

    /// Switch tools; any unfinished shape is discarded
    pub fn select_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.phase = DrawPhase::Idle;
    }

    /// Drop the unfinished shape without changing tools
    pub fn discard(&mut self) {
        self.phase = DrawPhase::Idle;
    }

    /// Append a media-space point
    ///
    /// `frozen` is set while an analysis is running; points are then ignored.
    pub fn add_point(&mut self, point: Point, frozen: bool, classes: &ClassSelection) -> PointOutcome {
        if frozen || self.is_awaiting_name() {
            return PointOutcome::Ignored;
        }

        let mut points = match std::mem::take(&mut self.phase) {
            DrawPhase::Collecting(points) => points,
            _ => Vec::new(),
        };
        points.push(point);

        let need = self.tool.required_points();
        if points.len() < need {
            let have = points.len();
            self.phase = DrawPhase::Collecting(points);
            return PointOutcome::Collecting { have, need };
        }

        if classes.is_empty() {
            log::info!("Discarding {:?} shape: no classes selected", self.tool);
            return PointOutcome::Discarded(DiscardReason::NoClasses);
        }

        self.phase = DrawPhase::AwaitingName(points);
        PointOutcome::NameRequested
    }

    /// Answer the naming step
    ///
    /// A non-blank name commits the zone with a snapshot of `classes`; `None`
    /// or a blank name declines. Either way the machine returns to `Idle`.
    pub fn submit_name(
        &mut self,
        name: Option<&str>,
        classes: &ClassSelection,
        store: &mut ZoneStore,
    ) -> NameOutcome {
        let DrawPhase::AwaitingName(points) = std::mem::take(&mut self.phase) else {
            return NameOutcome::NotAwaiting;
        };

        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            log::debug!("Zone naming declined, {} points discarded", points.len());
            return NameOutcome::Declined;
        };
        if classes.is_empty() {
            return NameOutcome::Discarded(DiscardReason::NoClasses);
        }

        match Zone::new(name, self.tool, points, classes) {
            Some(zone) => {
                log::info!("Committed {:?} zone {:?}", zone.kind, zone.name);
                NameOutcome::Committed(store.append(zone))
            }
            None => NameOutcome::Declined,
        }
    }
}
