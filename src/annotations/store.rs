//! Ordered collection of committed zones

use crate::domain::Zone;

/// Committed zones in creation order
///
/// A zone's position is its identity: the engine reports counts by index and
/// the operator sees zones numbered in this order. Zones are never edited in
/// place; corrections are undo-then-redraw.
#[derive(Clone, Debug, Default)]
pub struct ZoneStore {
    zones: Vec<Zone>,
}

impl ZoneStore {
    pub fn append(&mut self, zone: Zone) -> usize {
        self.zones.push(zone);
        self.zones.len() - 1
    }

    /// Remove the most recently appended zone
    pub fn undo_last(&mut self) -> Option<Zone> {
        self.zones.pop()
    }

    pub fn clear_all(&mut self) {
        self.zones.clear();
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn as_slice(&self) -> &[Zone] {
        &self.zones
    }

    /// Name offered when the operator is asked to name the next zone
    pub fn suggested_name(&self) -> String {
        format!("Carril {}", self.zones.len() + 1)
    }
}
