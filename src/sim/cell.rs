//! Destructible hex cells and grid addressing

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::GridGeometry;
use crate::{row_health, row_hue, row_value};

/// Offset hex coordinates (odd rows shifted half a column right).
///
/// Ordered row-major so a `BTreeMap` can be range-scanned by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn is_odd_row(&self) -> bool {
        self.row.rem_euclid(2) == 1
    }

    /// The six adjacent coordinates
    pub fn neighbors(&self) -> [GridCoord; 6] {
        const EVEN: [(i32, i32); 6] = [(0, -1), (0, 1), (-1, -1), (-1, 0), (1, -1), (1, 0)];
        const ODD: [(i32, i32); 6] = [(0, -1), (0, 1), (-1, 0), (-1, 1), (1, 0), (1, 1)];
        let table = if self.is_odd_row() { &ODD } else { &EVEN };
        table.map(|(dr, dc)| GridCoord::new(self.row + dr, self.col + dc))
    }

    /// First coordinate of `row` in map order
    pub const fn row_start(row: i32) -> Self {
        Self::new(row, i32::MIN)
    }

    /// Last coordinate of `row` in map order
    pub const fn row_end(row: i32) -> Self {
        Self::new(row, i32::MAX)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Special behaviour of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellType {
    #[default]
    Normal,
    /// Starts the damage booster when destroyed
    DamageBooster,
    /// Starts the reward booster when destroyed
    RewardBooster,
    /// Destroys its neighbours when destroyed
    Explosive,
}

/// Cell type, rolled lazily once a body gets close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Pending,
    Resolved(CellType),
}

impl CellKind {
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, CellKind::Pending)
    }

    /// Resolved type, if any
    #[inline]
    pub fn cell_type(&self) -> Option<CellType> {
        match self {
            CellKind::Pending => None,
            CellKind::Resolved(t) => Some(*t),
        }
    }
}

/// A destructible hexagonal grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct HexCell {
    pub center: DVec2,
    /// Circumradius
    pub radius: f64,
    pub coord: GridCoord,
    pub health: u32,
    pub max_health: u32,
    pub value: u64,
    /// Cosmetic hue (degrees)
    pub hue: f32,
    pub kind: CellKind,
}

impl HexCell {
    /// Fresh pending cell with the row's health and value
    pub fn new(coord: GridCoord, geometry: &GridGeometry) -> Self {
        let row = coord.row.max(0) as u32;
        let health = row_health(row);
        Self {
            center: geometry.cell_center(coord),
            radius: geometry.cell_radius,
            coord,
            health,
            max_health: health,
            value: row_value(row),
            hue: row_hue(row),
            kind: CellKind::Pending,
        }
    }

    /// Builder for a cell with a known type
    pub fn with_type(mut self, cell_type: CellType) -> Self {
        self.kind = CellKind::Resolved(cell_type);
        self
    }

    /// Boundary vertices at 30° + 60°k
    pub fn vertices(&self) -> [DVec2; 6] {
        std::array::from_fn(|k| {
            let angle = PI / 6.0 + k as f64 * PI / 3.0;
            self.center + DVec2::new(angle.cos(), angle.sin()) * self.radius
        })
    }

    /// Whether a point lies inside (or on) the hexagon
    pub fn contains_point(&self, point: DVec2) -> bool {
        let verts = self.vertices();
        (0..6).all(|i| {
            let a = verts[i];
            let b = verts[(i + 1) % 6];
            (b - a).perp_dot(point - a) >= 0.0
        })
    }

    /// Subtract damage; returns true when the cell is destroyed
    pub fn apply_damage(&mut self, damage: u32) -> bool {
        self.health = self.health.saturating_sub(damage);
        self.health == 0
    }
}

/// Live cells keyed by grid coordinate; iteration is row-major
pub type CellMap = BTreeMap<GridCoord, HexCell>;
