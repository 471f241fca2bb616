//! Zone types: drawing tools, monitored classes and committed zones

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geometry::Point;

/// Drawing tool, which is also the kind of zone it produces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    /// Crossing line, counted when a track crosses it
    #[default]
    Line,
    /// Closed four-point area, counted when a track enters it
    Polygon,
}

impl ToolKind {
    /// Number of points that completes a shape of this kind
    pub fn required_points(self) -> usize {
        match self {
            ToolKind::Line => 2,
            ToolKind::Polygon => 4,
        }
    }

    /// Human label used on the dashboard and in reports
    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Line => "Cruce",
            ToolKind::Polygon => "Área",
        }
    }

    /// Whether the outline is closed back to the first point
    pub fn is_closed(self) -> bool {
        matches!(self, ToolKind::Polygon)
    }
}

impl FromStr for ToolKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "line" | "linea" => Ok(ToolKind::Line),
            "polygon" | "poligono" => Ok(ToolKind::Polygon),
            other => anyhow::bail!("Unknown tool '{other}' (expected line or polygon)"),
        }
    }
}

/// Vehicle or pedestrian class reported by the detection engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassId {
    Auto,
    Moto,
    Bicicleta,
    Colectivo,
    Camion,
    Peaton,
}

impl ClassId {
    pub const ALL: [ClassId; 6] = [
        ClassId::Auto,
        ClassId::Moto,
        ClassId::Bicicleta,
        ClassId::Colectivo,
        ClassId::Camion,
        ClassId::Peaton,
    ];

    /// Wire name, as the engine spells it
    pub fn as_str(self) -> &'static str {
        match self {
            ClassId::Auto => "Auto",
            ClassId::Moto => "Moto",
            ClassId::Bicicleta => "Bicicleta",
            ClassId::Colectivo => "Colectivo",
            ClassId::Camion => "Camion",
            ClassId::Peaton => "Peaton",
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassId::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("Unknown class '{s}'"))
    }
}

/// Classes the operator has toggled on, in toggle order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSelection(Vec<ClassId>);

impl Default for ClassSelection {
    fn default() -> Self {
        Self(vec![
            ClassId::Auto,
            ClassId::Moto,
            ClassId::Colectivo,
            ClassId::Bicicleta,
        ])
    }
}

impl ClassSelection {
    pub fn new(classes: impl IntoIterator<Item = ClassId>) -> Self {
        let mut selection = Self(Vec::new());
        for class in classes {
            if !selection.contains(class) {
                selection.0.push(class);
            }
        }
        selection
    }

    /// Toggle a class; returns whether it is selected afterwards
    pub fn toggle(&mut self, class: ClassId) -> bool {
        if let Some(pos) = self.0.iter().position(|c| *c == class) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(class);
            true
        }
    }

    pub fn contains(&self, class: ClassId) -> bool {
        self.0.contains(&class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[ClassId] {
        &self.0
    }
}

/// A committed line or polygon with the classes it monitors
///
/// Zones are identified by their position in the zone list; the engine keys
/// its counts by that index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ToolKind,
    pub points: Vec<Point>,
    pub classes: Vec<ClassId>,
}

impl Zone {
    /// Build a zone from a completed shape
    ///
    /// `classes` is copied, so later selection changes never touch the zone.
    /// Returns `None` when the point count does not match the tool, the name
    /// is blank, or no class is selected.
    pub fn new(
        name: &str,
        kind: ToolKind,
        points: Vec<Point>,
        classes: &ClassSelection,
    ) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() || points.len() != kind.required_points() || classes.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            kind,
            points,
            classes: classes.as_slice().to_vec(),
        })
    }
}
