//! Falling drill bodies

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::BODY_RESTITUTION;

/// A circular mass falling through the shaft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub pos: DVec2,
    /// Velocity per reference frame
    pub vel: DVec2,
    pub radius: f64,
    /// Downward acceleration per reference frame²
    pub gravity: f64,
    /// Fraction of normal speed kept on a bounce (0-1)
    pub restitution: f64,
    pub damage: u32,
}

impl PhysicsBody {
    pub fn new(pos: DVec2, radius: f64, gravity: f64, damage: u32) -> Self {
        Self {
            pos,
            vel: DVec2::ZERO,
            radius,
            gravity: gravity.max(0.0),
            restitution: BODY_RESTITUTION,
            damage: damage.max(1),
        }
    }

    /// Advance by one time step of `time_scale` reference frames
    pub fn integrate(&mut self, time_scale: f64, max_speed: f64) {
        self.vel.y += self.gravity * time_scale;
        self.clamp_speed(max_speed);
        self.pos += self.vel * time_scale;
    }

    /// Limit speed to `max_speed`, keeping direction
    pub fn clamp_speed(&mut self, max_speed: f64) {
        if !self.vel.is_finite() {
            self.vel = DVec2::ZERO;
            return;
        }
        let speed_sq = self.vel.length_squared();
        if speed_sq > max_speed * max_speed {
            self.vel *= max_speed / speed_sq.sqrt();
        }
    }

    /// Bounce off the shaft walls.
    ///
    /// Returns the impact speed when a wall was hit while moving into it.
    pub fn resolve_walls(&mut self, left: f64, right: f64) -> Option<f64> {
        if self.pos.x - self.radius < left {
            self.pos.x = left + self.radius;
            if self.vel.x < 0.0 {
                let impact = -self.vel.x;
                self.vel.x = impact * self.restitution;
                return Some(impact);
            }
        } else if self.pos.x + self.radius > right {
            self.pos.x = right - self.radius;
            if self.vel.x > 0.0 {
                let impact = self.vel.x;
                self.vel.x = -impact * self.restitution;
                return Some(impact);
            }
        }
        None
    }

    /// Continuous row index of this body
    #[inline]
    pub fn row_index(&self, start_y: f64, row_height: f64) -> f64 {
        (self.pos.y - start_y) / row_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> PhysicsBody {
        PhysicsBody::new(DVec2::new(100.0, 0.0), 5.0, 0.5, 1)
    }

    #[test]
    fn test_gravity_is_frame_rate_independent() {
        // One step of scale 2 matches two steps of scale 1 in velocity
        let mut a = body();
        let mut b = body();
        a.integrate(2.0, 100.0);
        b.integrate(1.0, 100.0);
        b.integrate(1.0, 100.0);
        assert!((a.vel.y - b.vel.y).abs() < 1e-12);
        assert!((a.vel.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_speed_clamped_keeping_direction() {
        let mut b = body();
        b.vel = DVec2::new(30.0, 40.0);
        b.clamp_speed(5.0);
        assert!((b.vel.length() - 5.0).abs() < 1e-9);
        assert!((b.vel.x / b.vel.y - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_velocity_reset() {
        let mut b = body();
        b.vel = DVec2::new(f64::NAN, 1.0);
        b.clamp_speed(5.0);
        assert_eq!(b.vel, DVec2::ZERO);
    }

    #[test]
    fn test_left_wall_bounce() {
        let mut b = body();
        b.pos.x = 2.0;
        b.vel = DVec2::new(-4.0, 1.0);
        let impact = b.resolve_walls(0.0, 200.0);
        assert_eq!(impact, Some(4.0));
        assert_eq!(b.pos.x, 5.0);
        assert!((b.vel.x - 4.0 * BODY_RESTITUTION).abs() < 1e-12);
        assert_eq!(b.vel.y, 1.0);
    }

    #[test]
    fn test_right_wall_flush_without_impact() {
        let mut b = body();
        b.pos.x = 199.0;
        b.vel = DVec2::new(-1.0, 0.0);
        assert_eq!(b.resolve_walls(0.0, 200.0), None);
        assert_eq!(b.pos.x, 195.0);
        assert_eq!(b.vel.x, -1.0);
    }
}
