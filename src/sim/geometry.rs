//! Shaft and hex grid geometry derived from the viewport
//!
//! World space: x grows right, y grows downward (depth). Row 0 sits at
//! `start_y`; rows are stacked `row_height` apart with odd rows shifted half a
//! column step to the right.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::cell::GridCoord;
use crate::consts::*;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Logical size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        let sane = |v: f64| if v.is_finite() { v.max(1.0) } else { 1.0 };
        Self {
            width: sane(width),
            height: sane(height),
        }
    }
}

/// Grid constants for one viewport size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub viewport: Viewport,
    /// Left wall of the playable column
    pub shaft_left: f64,
    pub shaft_width: f64,
    /// Horizontal distance between neighbouring cells in a row
    pub col_step: f64,
    /// Hex circumradius
    pub cell_radius: f64,
    pub row_height: f64,
    /// World y of row 0
    pub start_y: f64,
}

impl GridGeometry {
    pub fn from_viewport(viewport: Viewport) -> Self {
        let shaft_width = viewport.width.clamp(MIN_SHAFT_WIDTH, MAX_SHAFT_WIDTH);
        let col_step = shaft_width / GRID_COLUMNS as f64;
        Self {
            viewport,
            shaft_left: (viewport.width - shaft_width) / 2.0,
            shaft_width,
            col_step,
            cell_radius: col_step / SQRT_3 * CELL_FILL,
            row_height: col_step * SQRT_3 / 2.0,
            start_y: viewport.height * FIRST_ROW_FRACTION,
        }
    }

    #[inline]
    pub fn shaft_right(&self) -> f64 {
        self.shaft_left + self.shaft_width
    }

    /// Whether `x` lies strictly inside the playable column
    #[inline]
    pub fn contains_x(&self, x: f64) -> bool {
        x > self.shaft_left && x < self.shaft_right()
    }

    /// World y of a row's centerline
    #[inline]
    pub fn row_y(&self, row: i32) -> f64 {
        self.start_y + row as f64 * self.row_height
    }

    /// Continuous row index of a world y
    #[inline]
    pub fn row_at(&self, y: f64) -> f64 {
        (y - self.start_y) / self.row_height
    }

    /// Center of the cell at `coord`
    pub fn cell_center(&self, coord: GridCoord) -> DVec2 {
        let shift = if coord.is_odd_row() {
            self.col_step / 2.0
        } else {
            0.0
        };
        DVec2::new(
            self.shaft_left + self.col_step * (coord.col as f64 + 0.5) + shift,
            self.row_y(coord.row),
        )
    }

    /// Radius given to bodies
    #[inline]
    pub fn body_radius(&self) -> f64 {
        self.cell_radius * BODY_RADIUS_FACTOR
    }

    /// Gravity at multiplier 1.0, per reference frame²
    #[inline]
    pub fn base_gravity(&self) -> f64 {
        self.cell_radius * BASE_GRAVITY_FACTOR
    }

    /// Speed bound per reference frame
    #[inline]
    pub fn max_step_speed(&self) -> f64 {
        self.cell_radius * MAX_STEP_SPEED_FACTOR
    }
}
