//! Collision detection and response for hexagonal cells
//!
//! Narrow phase walks the six hexagon edges, keeps the closest boundary point,
//! and pushes the body out along the normal through that point.

use glam::DVec2;

use super::body::PhysicsBody;
use super::cell::HexCell;
use crate::consts::UPWARD_NORMAL;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the hexagon boundary
    pub point: DVec2,
    /// Unit normal pointing from the cell toward the body center
    pub normal: DVec2,
    /// Distance the body must move along `normal` to clear the cell
    pub penetration: f64,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: DVec2::ZERO,
            normal: DVec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Closest point to `p` on segment `a`-`b`
#[inline]
pub fn closest_point_on_segment(p: DVec2, a: DVec2, b: DVec2) -> DVec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point on the hexagon boundary and its squared distance to `p`
pub fn closest_boundary_point(p: DVec2, cell: &HexCell) -> (DVec2, f64) {
    let verts = cell.vertices();
    let mut best = verts[0];
    let mut best_dist_sq = f64::INFINITY;
    for i in 0..6 {
        let candidate = closest_point_on_segment(p, verts[i], verts[(i + 1) % 6]);
        let dist_sq = p.distance_squared(candidate);
        if dist_sq < best_dist_sq {
            best = candidate;
            best_dist_sq = dist_sq;
        }
    }
    (best, best_dist_sq)
}

/// Outward unit normal of edge `a`-`b` (vertices run counter-clockwise)
#[inline]
fn edge_normal(a: DVec2, b: DVec2) -> DVec2 {
    (-(b - a).perp()).normalize_or_zero()
}

/// Check collision between a circle and a hex cell
pub fn circle_hex_collision(center: DVec2, radius: f64, cell: &HexCell) -> CollisionResult {
    // Cheap rejection on the bounding circles
    let reach = cell.radius + radius;
    if center.distance_squared(cell.center) > reach * reach {
        return CollisionResult::miss();
    }

    let (point, dist_sq) = closest_boundary_point(center, cell);
    if dist_sq <= f64::EPSILON * cell.radius * cell.radius {
        // Center sits on the boundary; no usable direction
        return CollisionResult {
            hit: true,
            point,
            normal: UPWARD_NORMAL,
            penetration: radius,
        };
    }
    if cell.contains_point(center) {
        return inside_contact(center, radius, cell);
    }
    if dist_sq >= radius * radius {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    CollisionResult {
        hit: true,
        point,
        normal: (center - point) / dist,
        penetration: radius - dist,
    }
}

/// Center already inside the hexagon: leave through the nearest edge line
fn inside_contact(center: DVec2, radius: f64, cell: &HexCell) -> CollisionResult {
    let verts = cell.vertices();
    let mut best_normal = UPWARD_NORMAL;
    let mut best_depth = f64::INFINITY;
    for i in 0..6 {
        let a = verts[i];
        let normal = edge_normal(a, verts[(i + 1) % 6]);
        let depth = (a - center).dot(normal);
        if depth < best_depth {
            best_depth = depth;
            best_normal = normal;
        }
    }
    let depth = best_depth.max(0.0);
    CollisionResult {
        hit: true,
        point: center + best_normal * depth,
        normal: best_normal,
        penetration: radius + depth,
    }
}

/// Reflect velocity off a surface, scaling the normal part by `restitution`
///
/// v' = v - (1 + e)(v·n)n; `e = 1` is a perfect mirror
#[inline]
pub fn reflect_velocity(velocity: DVec2, normal: DVec2, restitution: f64) -> DVec2 {
    velocity - (1.0 + restitution) * velocity.dot(normal) * normal
}

/// Push the body out of the contact and bounce it.
///
/// `jitter` is added to the horizontal velocity on a bounce so bodies cannot
/// settle into a groove. Returns true when the velocity was reflected.
pub fn resolve_contact(body: &mut PhysicsBody, contact: &CollisionResult, jitter: f64) -> bool {
    if !contact.hit {
        return false;
    }
    body.pos += contact.normal * contact.penetration;

    if body.vel.dot(contact.normal) >= 0.0 {
        return false;
    }
    body.vel = reflect_velocity(body.vel, contact.normal, body.restitution);
    body.vel.x += jitter;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::cell::GridCoord;
    use crate::sim::geometry::{GridGeometry, Viewport};
    use proptest::prelude::*;

    fn cell() -> HexCell {
        let geom = GridGeometry::from_viewport(Viewport::new(450.0, 800.0));
        HexCell::new(GridCoord::new(3, 4), &geom)
    }

    fn boundary_distance(p: DVec2, cell: &HexCell) -> f64 {
        closest_boundary_point(p, cell).1.sqrt()
    }

    #[test]
    fn test_miss_far_away() {
        let c = cell();
        let result = circle_hex_collision(c.center + DVec2::new(0.0, c.radius * 3.0), 5.0, &c);
        assert!(!result.hit);
    }

    #[test]
    fn test_hit_on_top_vertex() {
        let c = cell();
        // Vertex at 270° is straight up (y grows downward)
        let r = 6.0;
        let center = c.center + DVec2::new(0.0, -(c.radius + r * 0.5));
        let result = circle_hex_collision(center, r, &c);
        assert!(result.hit);
        assert!((result.normal - DVec2::new(0.0, -1.0)).length() < 1e-9);
        assert!((result.penetration - r * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_flat_side_normal() {
        let c = cell();
        // The right side is a flat edge at the inscribed radius
        let inscribed = c.radius * 3f64.sqrt() / 2.0;
        let r = 4.0;
        let center = c.center + DVec2::new(inscribed + r - 1.0, 0.0);
        let result = circle_hex_collision(center, r, &c);
        assert!(result.hit);
        assert!((result.normal - DVec2::X).length() < 1e-9);
        assert!((result.penetration - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_inside_pushes_outward() {
        let c = cell();
        let r = 3.0;
        let center = c.center + DVec2::new(0.0, -c.radius * 0.5);
        let result = circle_hex_collision(center, r, &c);
        assert!(result.hit);
        assert!(result.normal.y < 0.0);
        let mut body = PhysicsBody::new(center, r, 0.0, 1);
        resolve_contact(&mut body, &result, 0.0);
        assert!(!c.contains_point(body.pos));
        assert!(boundary_distance(body.pos, &c) >= r - 1e-6);
    }

    #[test]
    fn test_degenerate_contact_uses_upward_normal() {
        let c = cell();
        let on_vertex = c.vertices()[0];
        let result = circle_hex_collision(on_vertex, 2.0, &c);
        assert!(result.hit);
        assert_eq!(result.normal, UPWARD_NORMAL);
        assert_eq!(result.penetration, 2.0);
    }

    #[test]
    fn test_bounce_only_when_approaching() {
        let c = cell();
        let r = 6.0;
        let center = c.center + DVec2::new(0.0, -(c.radius + r * 0.5));
        let contact = circle_hex_collision(center, r, &c);

        let mut falling = PhysicsBody::new(center, r, 0.0, 1);
        falling.vel = DVec2::new(0.0, 4.0);
        assert!(resolve_contact(&mut falling, &contact, 0.0));
        assert!((falling.vel.y + 4.0 * falling.restitution).abs() < 1e-9);

        let mut leaving = PhysicsBody::new(center, r, 0.0, 1);
        leaving.vel = DVec2::new(0.0, -4.0);
        assert!(!resolve_contact(&mut leaving, &contact, 0.0));
        assert_eq!(leaving.vel, DVec2::new(0.0, -4.0));
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(DVec2::new(3.0, 4.0), DVec2::new(0.0, -1.0), 1.0);
        assert!((reflected - DVec2::new(3.0, -4.0)).length() < 1e-12);
        // Tangential part kept, normal part damped
        let damped = reflect_velocity(DVec2::new(3.0, 4.0), DVec2::new(0.0, -1.0), 0.5);
        assert!((damped - DVec2::new(3.0, -2.0)).length() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_no_residual_penetration(
            angle in 0.0f64..std::f64::consts::TAU,
            dist_factor in 0.0f64..1.6,
            radius_factor in 0.1f64..0.6,
            vx in -5.0f64..5.0,
            vy in -5.0f64..5.0,
        ) {
            let c = cell();
            let r = c.radius * radius_factor;
            let center = c.center + DVec2::new(angle.cos(), angle.sin()) * c.radius * dist_factor;
            let contact = circle_hex_collision(center, r, &c);
            prop_assume!(contact.hit);
            // Degenerate boundary hits are excluded: their fixed normal is not outward
            prop_assume!(contact.normal != UPWARD_NORMAL || contact.penetration != r);

            let mut body = PhysicsBody::new(center, r, 0.0, 1);
            body.vel = DVec2::new(vx, vy);
            resolve_contact(&mut body, &contact, 0.0);

            prop_assert!(!c.contains_point(body.pos) || boundary_distance(body.pos, &c) < 1e-9);
            prop_assert!(boundary_distance(body.pos, &c) >= r - 1e-6);
            prop_assert!(body.vel.dot(contact.normal) >= -1e-9);
        }
    }
}
