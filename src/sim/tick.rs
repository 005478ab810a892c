//! Variable timestep simulation advance
//!
//! Each frame's elapsed time is normalized against the reference frame and
//! split into bounded substeps. Within a substep terrain generation always
//! completes before any body moves or collides.

use rand::Rng;

use super::cell::GridCoord;
use super::collision::{circle_hex_collision, resolve_contact};
use super::state::{Engine, EnginePhase, GameEvent};
use super::world::{cull_behind, resolve_pending};
use crate::consts::*;
use crate::time_scale;

/// Substep count and per-substep scale for one frame
pub fn substeps(dt_ms: f64) -> (u32, f64) {
    let total = time_scale(dt_ms);
    let count = (total / MAX_SUBSTEP_SCALE)
        .ceil()
        .clamp(1.0, MAX_SUBSTEPS as f64) as u32;
    let scale = (total / count as f64).min(MAX_SUBSTEP_SCALE);
    (count, scale)
}

impl Engine {
    /// Advance the simulation by `dt_ms` of real time
    pub fn advance(&mut self, dt_ms: f64) {
        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.decay_notice(dt_ms);

        // Menu and pause freeze everything
        if self.phase != EnginePhase::Playing || self.is_suspended() {
            return;
        }

        if self.settle_ms > 0.0 {
            self.settle_ms = (self.settle_ms - dt_ms).max(0.0);
            return;
        }

        self.progression.boosters.tick(dt_ms);

        self.autosave_ms += dt_ms;
        if self.autosave_ms >= AUTOSAVE_INTERVAL_MS {
            self.autosave_ms %= AUTOSAVE_INTERVAL_MS;
            self.emit(GameEvent::AutosaveDue);
        }

        let (count, scale) = substeps(dt_ms);
        for _ in 0..count {
            self.step(scale);
        }
    }

    fn step(&mut self, scale: f64) {
        self.follow_camera(scale);

        self.ensure_frontier();
        {
            let (_, mut ctx) = self.gen_parts();
            resolve_pending(&mut ctx);
        }

        self.integrate_bodies(scale);

        let destroyed = self.collide_bodies();
        for coord in destroyed {
            self.destroy_cell(coord);
        }

        cull_behind(
            &mut self.cells,
            &self.bodies,
            &self.geometry,
            CULL_ROWS_BEHIND,
        );

        let row = self.depth_row();
        if self.stats.record_depth(row) {
            // Only report the interesting ones
            if row > 0 && row % 50 == 0 {
                self.emit(GameEvent::NewDepthRecord { row });
            }
        }
    }

    fn follow_camera(&mut self, scale: f64) {
        let target = self.camera_target();
        let rate = (CAMERA_FOLLOW_RATE * scale).min(1.0);
        self.camera_y += (target - self.camera_y) * rate;
    }

    fn integrate_bodies(&mut self, scale: f64) {
        let max_speed = self.geometry.max_step_speed();
        let left = self.geometry.shaft_left;
        let right = self.geometry.shaft_right();

        for (index, body) in self.bodies.iter_mut().enumerate() {
            body.integrate(scale, max_speed);
            if let Some(speed) = body.resolve_walls(left, right) {
                if speed > WALL_IMPACT_EVENT_SPEED {
                    self.events.push(GameEvent::WallImpact { body: index, speed });
                }
            }
        }
    }

    /// Test every body against the cells in its neighbourhood.
    ///
    /// Returns cells whose health reached zero, in hit order. They stay in the
    /// map until the caller destroys them so crediting has a single path.
    fn collide_bodies(&mut self) -> Vec<GridCoord> {
        let booster = self.progression.damage_booster_multiplier(&self.tuning);
        let jitter_range = self.geometry.cell_radius * CONTACT_JITTER_FACTOR;
        let mut destroyed = Vec::new();

        for body in self.bodies.iter_mut() {
            let row = self.geometry.row_at(body.pos.y).floor() as i32;
            let damage = ((body.damage as f64 * booster).ceil() as u32).max(1);
            let range = GridCoord::row_start(row - 2)..=GridCoord::row_end(row + 2);

            for (coord, cell) in self.cells.range_mut(range) {
                if cell.health == 0 {
                    continue;
                }
                let contact = circle_hex_collision(body.pos, body.radius, cell);
                if !contact.hit {
                    continue;
                }
                let jitter = self.rng.random_range(-jitter_range..=jitter_range);
                resolve_contact(body, &contact, jitter);

                let killed = cell.apply_damage(damage);
                self.events.push(GameEvent::CellHit {
                    coord: *coord,
                    remaining: cell.health,
                });
                if killed {
                    destroyed.push(*coord);
                }
            }
        }
        destroyed
    }
}
