//! Viewport resize remapping
//!
//! Positions are carried over by simulated meaning: a body keeps its continuous
//! row index and its relative position across the shaft. Cells are placed from
//! their grid coordinates alone.

use glam::DVec2;

use super::body::PhysicsBody;
use super::cell::CellMap;
use super::geometry::GridGeometry;

/// Map a world y from one geometry to another via the continuous row index
#[inline]
pub fn remap_y(y: f64, old: &GridGeometry, new: &GridGeometry) -> f64 {
    new.start_y + old.row_at(y) * new.row_height
}

/// Map a world x proportionally across the shaft
#[inline]
pub fn remap_x(x: f64, old: &GridGeometry, new: &GridGeometry) -> f64 {
    new.shaft_left + (x - old.shaft_left) * (new.shaft_width / old.shaft_width)
}

/// Move one body into the new geometry.
///
/// `gravity_multiplier` re-derives the gravity from the new base value.
pub fn remap_body(
    body: &mut PhysicsBody,
    old: &GridGeometry,
    new: &GridGeometry,
    gravity_multiplier: f64,
) {
    body.pos = DVec2::new(remap_x(body.pos.x, old, new), remap_y(body.pos.y, old, new));

    let scale = new.cell_radius / old.cell_radius;
    body.vel = if scale.is_finite() && scale > 0.0 {
        body.vel * scale
    } else {
        DVec2::ZERO
    };
    body.clamp_speed(new.max_step_speed());

    body.radius = new.body_radius();
    body.gravity = new.base_gravity() * gravity_multiplier;

    // Proportional remap keeps the center inside; the radius may still poke a wall
    let min_x = new.shaft_left + body.radius;
    let max_x = new.shaft_right() - body.radius;
    if min_x <= max_x {
        body.pos.x = body.pos.x.clamp(min_x, max_x);
    }
}

/// Re-place every cell from its grid coordinates
pub fn remap_cells(cells: &mut CellMap, new: &GridGeometry) {
    for (coord, cell) in cells.iter_mut() {
        cell.center = new.cell_center(*coord);
        cell.radius = new.cell_radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::cell::{GridCoord, HexCell};
    use crate::sim::geometry::Viewport;
    use proptest::prelude::*;

    #[test]
    fn test_cells_follow_grid_coordinates() {
        let old = GridGeometry::from_viewport(Viewport::new(400.0, 700.0));
        let new = GridGeometry::from_viewport(Viewport::new(900.0, 500.0));
        let coord = GridCoord::new(13, 5);
        let mut cells = CellMap::new();
        cells.insert(coord, HexCell::new(coord, &old));
        remap_cells(&mut cells, &new);
        let cell = &cells[&coord];
        assert_eq!(cell.center, new.cell_center(coord));
        assert_eq!(cell.radius, new.cell_radius);
    }

    #[test]
    fn test_velocity_scales_with_radius() {
        let old = GridGeometry::from_viewport(Viewport::new(300.0, 700.0));
        let new = GridGeometry::from_viewport(Viewport::new(600.0, 700.0));
        let mut body =
            PhysicsBody::new(DVec2::new(150.0, 400.0), old.body_radius(), old.base_gravity(), 1);
        body.vel = DVec2::new(0.3, 0.4);
        remap_body(&mut body, &old, &new, 1.0);
        assert!((body.vel - DVec2::new(0.6, 0.8)).length() < 1e-9);
        assert!((body.radius - new.body_radius()).abs() < 1e-12);
        assert!((body.gravity - new.base_gravity()).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_reclamped_after_shrink() {
        let old = GridGeometry::from_viewport(Viewport::new(700.0, 700.0));
        let new = GridGeometry::from_viewport(Viewport::new(200.0, 700.0));
        let mut body =
            PhysicsBody::new(DVec2::new(350.0, 400.0), old.body_radius(), old.base_gravity(), 1);
        body.vel = DVec2::new(0.0, old.max_step_speed());
        remap_body(&mut body, &old, &new, 1.0);
        assert!(body.vel.length() <= new.max_step_speed() + 1e-9);
        assert!(body.vel.y > 0.0);
    }

    proptest! {
        #[test]
        fn prop_row_index_preserved(
            w0 in 120.0f64..1600.0, h0 in 200.0f64..1200.0,
            w1 in 120.0f64..1600.0, h1 in 200.0f64..1200.0,
            row in -5.0f64..5000.0, across in 0.1f64..0.9,
        ) {
            let old = GridGeometry::from_viewport(Viewport::new(w0, h0));
            let new = GridGeometry::from_viewport(Viewport::new(w1, h1));
            let pos = DVec2::new(
                old.shaft_left + old.shaft_width * across,
                old.start_y + row * old.row_height,
            );
            let mut body = PhysicsBody::new(pos, old.body_radius(), old.base_gravity(), 1);
            let before = old.row_at(body.pos.y);
            remap_body(&mut body, &old, &new, 1.0);
            let after = new.row_at(body.pos.y);
            prop_assert!((before - after).abs() < 1e-6);
            let rel_before = (pos.x - old.shaft_left) / old.shaft_width;
            let rel_after = (body.pos.x - new.shaft_left) / new.shaft_width;
            prop_assert!((rel_before - rel_after).abs() < 1e-9);
        }
    }
}
