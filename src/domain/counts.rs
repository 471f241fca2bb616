//! Live count snapshots reported by the detection engine

use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::Deserialize;

use super::zone::ClassId;

/// Counts as they arrive on the wire: zone index -> class name -> count
///
/// JSON object keys are strings, so zone indices arrive as `"0"`, `"1"`, ...
type WireCounts = HashMap<String, HashMap<String, u64>>;

/// Latest per-zone, per-class counts
///
/// Replaced wholesale on every applied poll. Missing entries read as 0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "WireCounts")]
pub struct LiveCounts {
    zones: HashMap<usize, HashMap<ClassId, u64>>,
}

impl LiveCounts {
    /// Count for a zone/class pair, 0 when the engine has not reported it
    pub fn get(&self, zone: usize, class: ClassId) -> u64 {
        self.zones
            .get(&zone)
            .and_then(|classes| classes.get(&class))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, zone: usize, class: ClassId, count: u64) {
        self.zones.entry(zone).or_default().insert(class, count);
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl From<WireCounts> for LiveCounts {
    fn from(raw: WireCounts) -> Self {
        let mut counts = LiveCounts::default();
        for (key, classes) in raw {
            let Ok(zone) = key.trim().parse::<usize>() else {
                log::debug!("Skipping count entry with non-index key {:?}", key);
                continue;
            };
            for (name, count) in classes {
                match name.parse::<ClassId>() {
                    Ok(class) => counts.set(zone, class, count),
                    Err(_) => log::debug!("Skipping unknown class {:?} for zone {}", name, zone),
                }
            }
        }
        counts
    }
}

/// Applied counts plus the sequencing needed to drop stale poll responses
#[derive(Clone, Debug, Default)]
pub struct CountsState {
    counts: LiveCounts,
    last_seq: Option<u64>,
    updated_at: Option<DateTime<Local>>,
}

impl CountsState {
    /// Apply a poll response tagged with the sequence number of its request
    ///
    /// Returns false (and keeps the current snapshot) when a response for the
    /// same or a newer request has already been applied.
    pub fn apply(&mut self, seq: u64, counts: LiveCounts) -> bool {
        if let Some(last) = self.last_seq
            && seq <= last
        {
            log::debug!("Dropping stale counts #{} (last applied #{})", seq, last);
            return false;
        }
        self.counts = counts;
        self.last_seq = Some(seq);
        self.updated_at = Some(Local::now());
        true
    }

    /// Forget the current snapshot; sequencing is kept so late responses
    /// from an earlier run are still rejected
    pub fn clear_counts(&mut self) {
        self.counts = LiveCounts::default();
        self.updated_at = None;
    }

    pub fn counts(&self) -> &LiveCounts {
        &self.counts
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entries_default_to_zero() {
        let counts = LiveCounts::default();
        assert_eq!(counts.get(0, ClassId::Auto), 0);
    }

    #[test]
    fn test_parse_engine_payload() {
        let json = r#"{"0": {"Auto": 5, "Moto": 2}, "1": {"Peaton": 7}}"#;
        let counts: LiveCounts = serde_json::from_str(json).unwrap();
        assert_eq!(counts.get(0, ClassId::Auto), 5);
        assert_eq!(counts.get(0, ClassId::Moto), 2);
        assert_eq!(counts.get(1, ClassId::Peaton), 7);
        assert_eq!(counts.get(1, ClassId::Auto), 0);
    }

    #[test]
    fn test_parse_skips_unknown_classes_and_keys() {
        let json = r#"{"0": {"Auto": 1, "Tractor": 9}, "zona": {"Auto": 3}}"#;
        let counts: LiveCounts = serde_json::from_str(json).unwrap();
        assert_eq!(counts.get(0, ClassId::Auto), 1);

        let mut expected = LiveCounts::default();
        expected.set(0, ClassId::Auto, 1);
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_negative_counts_are_rejected() {
        let json = r#"{"0": {"Auto": -1}}"#;
        assert!(serde_json::from_str::<LiveCounts>(json).is_err());
    }

    #[test]
    fn test_apply_discards_out_of_order_responses() {
        let mut state = CountsState::default();
        let mut fresh = LiveCounts::default();
        fresh.set(0, ClassId::Auto, 10);
        let mut stale = LiveCounts::default();
        stale.set(0, ClassId::Auto, 4);

        assert!(state.apply(2, fresh.clone()));
        assert!(!state.apply(1, stale.clone()));
        assert!(!state.apply(2, stale));
        assert_eq!(state.counts(), &fresh);
        assert!(state.updated_at().is_some());
    }

    #[test]
    fn test_clear_keeps_sequencing() {
        let mut state = CountsState::default();
        let mut counts = LiveCounts::default();
        counts.set(0, ClassId::Moto, 3);
        assert!(state.apply(5, counts.clone()));

        state.clear_counts();
        assert!(state.counts().is_empty());
        assert!(state.updated_at().is_none());
        assert!(!state.apply(4, counts.clone()));
        assert!(state.apply(6, counts));
    }
}
