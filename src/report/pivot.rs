//! Reshape live counts into report rows
//!
//! One canonical aggregate per zone ([`ZoneTally`]) is built from the zone
//! list and the latest counts. Both tabular projections derive from it:
//! - long rows, one per (zone, class), for the document table
//! - wide rows, one per zone with a column per class, for spreadsheet/CSV

use crate::domain::{ClassId, LiveCounts, Zone};

/// Per-zone aggregate: name, type label and the count of every monitored class
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneTally {
    pub name: String,
    pub label: &'static str,
    pub counts: Vec<(ClassId, u64)>,
}

impl ZoneTally {
    pub fn count(&self, class: ClassId) -> Option<u64> {
        self.counts
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, n)| *n)
    }
}

/// One (zone, class) pair of the long projection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountRow<'a> {
    pub zone: &'a str,
    pub label: &'static str,
    pub class: ClassId,
    pub count: u64,
}

/// One zone of the wide projection; `cells` aligns with [`CountReport::class_columns`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WideRow<'a> {
    pub zone: &'a str,
    pub label: &'static str,
    pub cells: Vec<Option<u64>>,
}

/// Aggregated counts for every zone, in zone order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountReport {
    pub tallies: Vec<ZoneTally>,
}

impl CountReport {
    /// Build the per-zone aggregates
    ///
    /// Counts are looked up by zone index; anything the engine has not
    /// reported yet reads as 0.
    pub fn new(zones: &[Zone], counts: &LiveCounts) -> Self {
        let tallies = zones
            .iter()
            .enumerate()
            .map(|(index, zone)| ZoneTally {
                name: zone.name.clone(),
                label: zone.kind.label(),
                counts: zone
                    .classes
                    .iter()
                    .map(|&class| (class, counts.get(index, class)))
                    .collect(),
            })
            .collect();
        Self { tallies }
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Long projection: one row per monitored class of every zone
    pub fn rows(&self) -> Vec<CountRow<'_>> {
        self.tallies
            .iter()
            .flat_map(|tally| {
                tally.counts.iter().map(move |&(class, count)| CountRow {
                    zone: &tally.name,
                    label: tally.label,
                    class,
                    count,
                })
            })
            .collect()
    }

    /// Every class monitored by any zone, in first-appearance order
    pub fn class_columns(&self) -> Vec<ClassId> {
        let mut columns = Vec::new();
        for (class, _) in self.tallies.iter().flat_map(|t| &t.counts) {
            if !columns.contains(class) {
                columns.push(*class);
            }
        }
        columns
    }

    /// Wide projection: one row per zone, `None` for classes it does not monitor
    pub fn wide_rows(&self) -> Vec<WideRow<'_>> {
        let columns = self.class_columns();
        self.tallies
            .iter()
            .map(|tally| WideRow {
                zone: &tally.name,
                label: tally.label,
                cells: columns.iter().map(|&c| tally.count(c)).collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassSelection, Point, ToolKind};

    fn zone(name: &str, kind: ToolKind, classes: &[ClassId]) -> Zone {
        let points = (0..kind.required_points())
            .map(|i| Point::new(i as f32, 0.0))
            .collect();
        Zone::new(name, kind, points, &ClassSelection::new(classes.iter().copied())).unwrap()
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let zones = [zone("Carril 1", ToolKind::Line, &[ClassId::Auto, ClassId::Moto])];
        let mut counts = LiveCounts::default();
        counts.set(0, ClassId::Auto, 5);

        let report = CountReport::new(&zones, &counts);
        assert_eq!(report.tallies[0].count(ClassId::Auto), Some(5));
        assert_eq!(report.tallies[0].count(ClassId::Moto), Some(0));

        let rows: Vec<_> = report
            .rows()
            .iter()
            .map(|r| (r.zone, r.label, r.class, r.count))
            .collect();
        assert_eq!(
            rows,
            [
                ("Carril 1", "Cruce", ClassId::Auto, 5),
                ("Carril 1", "Cruce", ClassId::Moto, 0),
            ]
        );
    }

    #[test]
    fn test_counts_are_keyed_by_zone_position() {
        let zones = [
            zone("Norte", ToolKind::Line, &[ClassId::Auto]),
            zone("Plaza", ToolKind::Polygon, &[ClassId::Auto, ClassId::Peaton]),
        ];
        let mut counts = LiveCounts::default();
        counts.set(0, ClassId::Auto, 3);
        counts.set(1, ClassId::Auto, 8);
        counts.set(1, ClassId::Peaton, 2);
        // Class the zone does not monitor is not reported
        counts.set(0, ClassId::Camion, 99);

        let report = CountReport::new(&zones, &counts);
        assert_eq!(report.tallies[0].counts, vec![(ClassId::Auto, 3)]);
        assert_eq!(report.tallies[1].label, "Área");
        assert_eq!(
            report.tallies[1].counts,
            vec![(ClassId::Auto, 8), (ClassId::Peaton, 2)]
        );
        assert_eq!(report.rows().len(), 3);
    }

    #[test]
    fn test_wide_rows_use_column_union() {
        let zones = [
            zone("A", ToolKind::Line, &[ClassId::Moto, ClassId::Auto]),
            zone("B", ToolKind::Line, &[ClassId::Auto, ClassId::Camion]),
        ];
        let mut counts = LiveCounts::default();
        counts.set(1, ClassId::Camion, 4);

        let report = CountReport::new(&zones, &counts);
        assert_eq!(
            report.class_columns(),
            vec![ClassId::Moto, ClassId::Auto, ClassId::Camion]
        );

        let wide = report.wide_rows();
        assert_eq!(wide[0].cells, vec![Some(0), Some(0), None]);
        assert_eq!(wide[1].cells, vec![None, Some(0), Some(4)]);
    }

    #[test]
    fn test_empty_zone_list() {
        let report = CountReport::new(&[], &LiveCounts::default());
        assert!(report.is_empty());
        assert!(report.rows().is_empty());
        assert!(report.class_columns().is_empty());
    }
}
