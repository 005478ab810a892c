//! Pointer and pause input
//!
//! Coordinates arrive in logical screen space; the camera offset turns them
//! into world space.

use glam::DVec2;

use super::cell::GridCoord;
use super::state::{Engine, EnginePhase, GameEvent};

/// Discrete input from the shell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerPress { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerRelease { x: f64, y: f64 },
    TogglePause,
}

impl Engine {
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerPress { x, y } => {
                let world = self.screen_to_world(x, y);
                self.pointer.pressed = true;
                self.track_pointer(world);
                if self.phase == EnginePhase::Playing {
                    if let Some(coord) = self.pointer.hovered {
                        self.tap_cell(coord);
                    }
                }
            }
            InputEvent::PointerMove { x, y } => {
                let world = self.screen_to_world(x, y);
                self.track_pointer(world);
            }
            InputEvent::PointerRelease { x, y } => {
                let world = self.screen_to_world(x, y);
                self.pointer.pressed = false;
                self.track_pointer(world);
            }
            InputEvent::TogglePause => self.toggle_pause(),
        }
    }

    #[inline]
    pub fn screen_to_world(&self, x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y + self.camera_y)
    }

    /// Live cell containing a world point
    pub fn cell_at(&self, point: DVec2) -> Option<GridCoord> {
        if !point.is_finite() {
            return None;
        }
        let row = self.geometry.row_at(point.y).round() as i32;
        let range = GridCoord::row_start(row - 1)..=GridCoord::row_end(row + 1);
        self.cells
            .range(range)
            .find(|(_, cell)| cell.contains_point(point))
            .map(|(coord, _)| *coord)
    }

    fn track_pointer(&mut self, world: DVec2) {
        self.pointer.position = Some(world);
        self.pointer.hovered = self.cell_at(world);
    }

    /// One hit of effective damage from a tap
    fn tap_cell(&mut self, coord: GridCoord) {
        let damage = self.progression.effective_damage(&self.tuning);
        let Some(cell) = self.cells.get_mut(&coord) else {
            return;
        };
        let killed = cell.apply_damage(damage);
        let remaining = cell.health;
        self.emit(GameEvent::CellHit { coord, remaining });
        if killed {
            self.destroy_cell(coord);
            self.pointer.hovered = None;
        }
    }
}
