//! Crediting, purchases, prestige, lifecycle and resize
//!
//! Every destroyed cell, whether hit by a body, tapped, or caught in a chain,
//! is credited through [`Engine::destroy_cell`].

use super::cell::{CellType, GridCoord, HexCell};
use super::chain::resolve_chain;
use super::geometry::{GridGeometry, Viewport};
use super::offline::{self, OfflineEstimate, OfflineModel};
use super::progression::UpgradeTrack;
use super::remap::{remap_body, remap_cells, remap_y};
use super::state::{Engine, EnginePhase, GameEvent};
use super::world::{WorldGenerator, reroll_resolved};
use crate::consts::*;
use crate::error::PurchaseError;

impl Engine {
    /// Remove a cell and credit it, running the chain reaction for explosives.
    ///
    /// Does nothing if the cell is already gone.
    pub fn destroy_cell(&mut self, coord: GridCoord) {
        let Some(cell) = self.cells.remove(&coord) else {
            return;
        };
        self.credit_destroyed(&cell);

        if cell.kind.cell_type() == Some(CellType::Explosive) {
            let outcome = resolve_chain(coord, &mut self.cells);
            self.stats.record_chain();
            self.emit(GameEvent::ChainReaction {
                origin: coord,
                destroyed: outcome.destroyed.len(),
            });
            for destroyed in &outcome.destroyed {
                self.credit_destroyed(destroyed);
            }
        }
    }

    fn credit_destroyed(&mut self, cell: &HexCell) {
        let reward = self.progression.reward_for(cell.value, &self.tuning);
        self.currency = self.currency.saturating_add(reward);
        self.stats.record_destroyed(reward);
        self.emit(GameEvent::CellDestroyed {
            coord: cell.coord,
            cell_type: cell.kind.cell_type(),
            reward,
        });

        // Boosters start after their own cell is paid out
        let (cell_type, duration_ms) = match cell.kind.cell_type() {
            Some(CellType::DamageBooster) => {
                let duration_ms = self.tuning.damage_booster_ms;
                self.progression.boosters.refresh_damage(duration_ms);
                (CellType::DamageBooster, duration_ms)
            }
            Some(CellType::RewardBooster) => {
                let duration_ms = self.tuning.reward_booster_ms;
                self.progression.boosters.refresh_reward(duration_ms);
                (CellType::RewardBooster, duration_ms)
            }
            _ => return,
        };
        self.emit(GameEvent::BoosterTriggered {
            cell_type,
            duration_ms,
        });
    }

    /// Buy the next level of `track`; returns the price paid.
    ///
    /// A rejection leaves state untouched apart from the notice.
    pub fn purchase(&mut self, track: UpgradeTrack) -> Result<u64, PurchaseError> {
        let result = self.try_purchase(track);
        if let Err(err) = &result {
            self.reject(err.clone());
        }
        result
    }

    fn try_purchase(&mut self, track: UpgradeTrack) -> Result<u64, PurchaseError> {
        let cost = self
            .progression
            .cost(track, &self.tuning)
            .ok_or(PurchaseError::MaxLevel { track })?;
        if self.currency < cost {
            return Err(PurchaseError::InsufficientFunds {
                track,
                cost,
                available: self.currency,
            });
        }

        self.currency -= cost;
        self.progression.increment(track);
        self.apply_upgrade(track);

        let level = self.progression.level(track);
        log::info!("Purchased {} level {} for {}", track, level, cost);
        self.emit(GameEvent::UpgradePurchased { track, level, cost });
        Ok(cost)
    }

    /// Make a new level felt immediately
    fn apply_upgrade(&mut self, track: UpgradeTrack) {
        match track {
            UpgradeTrack::Damage => {
                let damage = self.progression.base_damage();
                for body in &mut self.bodies {
                    body.damage = damage;
                }
            }
            UpgradeTrack::Gravity => {
                let gravity = self.geometry.base_gravity() * self.progression.gravity_multiplier();
                for body in &mut self.bodies {
                    body.gravity = gravity;
                }
            }
            UpgradeTrack::RewardEfficiency => {}
            UpgradeTrack::DamageBoosterChance
            | UpgradeTrack::RewardBoosterChance
            | UpgradeTrack::ExplosiveChance => {
                let (_, mut ctx) = self.gen_parts();
                let rerolled = reroll_resolved(&mut ctx);
                log::debug!("Re-rolled {} cells after {} upgrade", rerolled, track);
            }
        }
    }

    fn reject(&mut self, err: PurchaseError) {
        log::info!("Purchase rejected: {}", err);
        self.set_notice(err.to_string());
        self.emit(GameEvent::PurchaseRejected(err));
    }

    /// Deepest row this run must reach before the next prestige
    pub fn prestige_requirement(&self) -> u32 {
        self.tuning
            .prestige_depth_rows
            .saturating_mul(self.progression.prestige_count + 1)
    }

    /// Trade the run for one more body; returns the new prestige count
    pub fn prestige(&mut self) -> Result<u32, PurchaseError> {
        let required = self.prestige_requirement();
        let reached = self.stats.run.max_depth_row;
        if reached < required {
            let err = PurchaseError::PrestigeLocked { required, reached };
            self.reject(err.clone());
            return Err(err);
        }

        let count = self.progression.prestige();
        self.currency = 0;
        self.cells.clear();
        self.world = WorldGenerator::new();
        self.stats.reset_run();
        self.spawn_bodies();
        self.camera_y = self.camera_target();
        self.ensure_frontier();

        log::info!("Prestige {} at row {}, {} bodies", count, reached, self.bodies.len());
        self.emit(GameEvent::Prestige { count });
        Ok(count)
    }

    /// Credit the estimated reward for `elapsed_ms` of absence and run the
    /// booster timers down by the same (capped) amount
    pub fn reconcile_offline(&mut self, elapsed_ms: f64) -> OfflineEstimate {
        let model = OfflineModel {
            body_count: self.bodies.len(),
            damage: self.progression.base_damage(),
            efficiency: self.progression.reward_multiplier(),
            frontier_row: self.world.frontier_row,
        };
        let estimate = offline::estimate(elapsed_ms, &model, &self.tuning);

        self.currency = self.currency.saturating_add(estimate.reward);
        self.stats.record_offline(estimate.reward);
        self.progression.boosters.tick(estimate.elapsed_ms);

        if estimate.reward > 0 {
            log::info!(
                "Offline for {:.0}s: credited {}",
                estimate.elapsed_ms / 1000.0,
                estimate.reward
            );
            self.emit(GameEvent::OfflineReward {
                elapsed_ms: estimate.elapsed_ms,
                reward: estimate.reward,
            });
        }
        estimate
    }

    /// Leave the menu without offline credit
    pub fn start(&mut self) {
        if self.phase == EnginePhase::Menu {
            self.phase = EnginePhase::Playing;
        }
    }

    /// Leave the menu, crediting the time since the player was last seen
    pub fn continue_game(&mut self, now_ms: f64) -> Option<OfflineEstimate> {
        if self.phase != EnginePhase::Menu {
            return None;
        }
        let last_active_ms = self.last_active_ms;
        let estimate = last_active_ms.map(|last| self.reconcile_offline(now_ms - last));
        self.phase = EnginePhase::Playing;
        self.mark_active(now_ms);
        estimate
    }

    /// Playing and paused swap; the menu is unaffected
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            EnginePhase::Playing => EnginePhase::Paused,
            EnginePhase::Paused => EnginePhase::Playing,
            EnginePhase::Menu => EnginePhase::Menu,
        };
    }

    pub fn return_to_menu(&mut self) {
        self.phase = EnginePhase::Menu;
        self.camera_y = self.camera_target();
    }

    /// The app lost visibility
    pub fn suspend(&mut self, now_ms: f64) {
        if self.suspended_at_ms.is_none() {
            self.suspended_at_ms = Some(now_ms);
            self.mark_active(now_ms);
        }
    }

    /// The app is visible again; offline credit only applies while playing
    pub fn resume(&mut self, now_ms: f64) -> Option<OfflineEstimate> {
        let since = self.suspended_at_ms.take()?;
        let estimate = (self.phase == EnginePhase::Playing)
            .then(|| self.reconcile_offline(now_ms - since));
        self.mark_active(now_ms);
        estimate
    }

    pub fn mark_active(&mut self, now_ms: f64) {
        if now_ms.is_finite() {
            self.last_active_ms = Some(now_ms);
        }
    }

    /// Re-derive geometry for a new viewport and remap everything onto it
    pub fn resize(&mut self, viewport: Viewport) {
        let new = GridGeometry::from_viewport(viewport);
        if new == self.geometry {
            return;
        }
        let old = self.geometry;
        self.remap_geometry(&old, new);
        self.settle_ms = RESIZE_SETTLE_MS;

        if self.phase == EnginePhase::Menu {
            self.camera_y = self.camera_target();
            for body in &mut self.bodies {
                body.vel *= MENU_VELOCITY_DAMPING;
            }
        }
        self.ensure_frontier();

        log::info!(
            "Resized to {}x{}, cell radius {:.2} -> {:.2}",
            viewport.width,
            viewport.height,
            old.cell_radius,
            new.cell_radius
        );
        self.emit(GameEvent::Resized {
            viewport: new.viewport,
        });
    }

    /// Move bodies, cells and camera from `old` onto `new`
    pub(crate) fn remap_geometry(&mut self, old: &GridGeometry, new: GridGeometry) {
        let gravity_multiplier = self.progression.gravity_multiplier();
        for body in &mut self.bodies {
            remap_body(body, old, &new, gravity_multiplier);
        }
        remap_cells(&mut self.cells, &new);
        self.camera_y = remap_y(self.camera_y, old, &new).max(0.0);
        self.geometry = new;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::cell::HexCell;
    use crate::stats::RunStats;

    fn viewport() -> Viewport {
        Viewport::new(450.0, 800.0)
    }

    fn playing() -> Engine {
        let mut engine = Engine::new(viewport(), 11);
        engine.start();
        engine
    }

    #[test]
    fn test_explosive_credits_all_six_neighbours() {
        let mut engine = playing();
        engine.cells.clear();
        let origin = GridCoord::new(5, 3);
        let cell = HexCell::new(origin, &engine.geometry).with_type(CellType::Explosive);
        engine.cells.insert(origin, cell);
        for n in origin.neighbors() {
            let cell = HexCell::new(n, &engine.geometry).with_type(CellType::Normal);
            engine.cells.insert(n, cell);
        }

        engine.destroy_cell(origin);

        assert!(engine.cells.is_empty());
        // 12 for the explosive, 4 × 12 on rows 4-5, 2 × 13 on row 6
        assert_eq!(engine.currency, 86);
        assert_eq!(engine.stats.run.cells_destroyed, 7);
        assert_eq!(engine.stats.run.chains_triggered, 1);
    }

    #[test]
    fn test_destroy_twice_credits_once() {
        let mut engine = playing();
        let coord = GridCoord::new(0, 0);
        assert!(engine.cells.contains_key(&coord));
        engine.destroy_cell(coord);
        let after_first = engine.currency;
        engine.destroy_cell(coord);
        assert_eq!(engine.currency, after_first);
        assert!(after_first > 0);
    }

    #[test]
    fn test_booster_in_chain_refreshes_timer() {
        let mut engine = playing();
        engine.cells.clear();
        let origin = GridCoord::new(3, 3);
        engine.cells.insert(
            origin,
            HexCell::new(origin, &engine.geometry).with_type(CellType::Explosive),
        );
        let n = origin.neighbors()[0];
        engine.cells.insert(
            n,
            HexCell::new(n, &engine.geometry).with_type(CellType::RewardBooster),
        );
        engine.destroy_cell(origin);
        assert!(engine.progression.boosters.reward_active());
        assert!(!engine.progression.boosters.damage_active());
    }

    #[test]
    fn test_purchase_debits_and_applies() {
        let mut engine = playing();
        engine.currency = 1_000;
        assert_eq!(engine.purchase(UpgradeTrack::Damage), Ok(50));
        assert_eq!(engine.currency, 950);
        assert!(engine.bodies.iter().all(|b| b.damage == 2));

        let base = engine.geometry.base_gravity();
        assert_eq!(engine.purchase(UpgradeTrack::Gravity), Ok(75));
        assert!(engine.bodies.iter().all(|b| (b.gravity - base * 1.1).abs() < 1e-12));
    }

    #[test]
    fn test_purchase_rejection_sets_notice() {
        let mut engine = playing();
        engine.currency = 10;
        let err = engine.purchase(UpgradeTrack::Damage);
        assert_eq!(
            err,
            Err(PurchaseError::InsufficientFunds {
                track: UpgradeTrack::Damage,
                cost: 50,
                available: 10,
            })
        );
        assert_eq!(engine.currency, 10);
        assert_eq!(engine.progression.level(UpgradeTrack::Damage), 1);
        let notice = engine.notice.as_ref().map(|n| n.message.clone());
        assert_eq!(notice, err.err().map(|e| e.to_string()));
    }

    #[test]
    fn test_maxed_track_rejected() {
        let mut engine = playing();
        engine.progression.levels.explosive_chance = engine.tuning.max_chance_level;
        engine.currency = u64::MAX / 2;
        assert_eq!(
            engine.purchase(UpgradeTrack::ExplosiveChance),
            Err(PurchaseError::MaxLevel {
                track: UpgradeTrack::ExplosiveChance
            })
        );
    }

    #[test]
    fn test_chance_purchase_rerolls_live_cells() {
        let mut engine = playing();
        engine.tuning.chance_per_level = 1.0;
        engine.currency = 10_000;
        engine.purchase(UpgradeTrack::ExplosiveChance).unwrap();
        let g = engine.geometry;
        let rerolled = engine
            .cells
            .values()
            .filter(|c| !c.kind.is_pending() && g.contains_x(c.center.x))
            .all(|c| c.kind.cell_type() == Some(CellType::Explosive));
        assert!(rerolled);
    }

    #[test]
    fn test_prestige_locked_until_deep_enough() {
        let mut engine = playing();
        assert_eq!(
            engine.prestige(),
            Err(PurchaseError::PrestigeLocked {
                required: 150,
                reached: 0
            })
        );
        assert!(engine.notice.is_some());
        assert_eq!(engine.progression.prestige_count, 0);
    }

    #[test]
    fn test_prestige_resets_run() {
        let mut engine = playing();
        engine.currency = 5_000;
        engine.purchase(UpgradeTrack::Damage).unwrap();
        engine.purchase(UpgradeTrack::RewardEfficiency).unwrap();
        engine.stats.run.max_depth_row = 150;
        engine.world.frontier_row = 400;
        engine.progression.boosters.refresh_damage(1_000.0);
        let deep = GridCoord::new(9_000, 2);
        let sentinel = HexCell::new(deep, &engine.geometry);
        engine.cells.insert(deep, sentinel);

        assert_eq!(engine.prestige(), Ok(1));
        assert_eq!(engine.currency, 0);
        assert_eq!(engine.progression.level(UpgradeTrack::Damage), 1);
        assert!(!engine.progression.boosters.damage_active());
        assert_eq!(engine.bodies.len(), 2);
        assert_eq!(engine.stats.run, RunStats::default());
        // Old terrain is gone, fresh rows start at 0
        assert!(!engine.cells.contains_key(&deep));
        assert!(engine.cells.keys().all(|c| c.row < 9_000));
        assert!(engine.cells.contains_key(&GridCoord::new(0, 0)));
        assert!(engine.world.frontier_row < 400);
        // Next prestige needs twice the depth
        assert_eq!(engine.prestige_requirement(), 300);
    }

    #[test]
    fn test_offline_only_when_playing() {
        let mut engine = Engine::new(viewport(), 2);
        engine.suspend(1_000.0);
        assert_eq!(engine.resume(61_000.0), None);
        assert_eq!(engine.currency, 0);

        engine.start();
        engine.suspend(100_000.0);
        let estimate = engine.resume(110_000.0);
        assert!(estimate.is_some_and(|e| e.elapsed_ms == 10_000.0));
        assert!(engine.currency > 0);
        assert_eq!(engine.last_active_ms, Some(110_000.0));
    }

    #[test]
    fn test_offline_ticks_boosters() {
        let mut engine = playing();
        engine.progression.boosters.refresh_reward(10_000.0);
        engine.reconcile_offline(4_000.0);
        assert_eq!(engine.progression.boosters.reward_ms, 6_000.0);
        engine.reconcile_offline(48.0 * 3_600_000.0);
        assert!(!engine.progression.boosters.reward_active());
    }

    #[test]
    fn test_continue_credits_since_last_active() {
        let mut engine = Engine::new(viewport(), 2);
        engine.last_active_ms = Some(0.0);
        let estimate = engine.continue_game(30_000.0);
        assert_eq!(engine.phase, EnginePhase::Playing);
        assert!(estimate.is_some_and(|e| e.reward > 0));
        // Already playing: no second credit
        assert_eq!(engine.continue_game(90_000.0), None);
    }

    #[test]
    fn test_resize_preserves_row_index() {
        let mut engine = playing();
        for _ in 0..120 {
            engine.advance(REFERENCE_FRAME_MS);
        }
        let rows: Vec<f64> = engine
            .bodies
            .iter()
            .map(|b| engine.geometry.row_at(b.pos.y))
            .collect();
        let frontier = engine.world.frontier_row;

        engine.resize(Viewport::new(900.0, 600.0));

        for (body, row) in engine.bodies.iter().zip(rows) {
            assert!((engine.geometry.row_at(body.pos.y) - row).abs() < 1e-6);
        }
        assert!(engine.world.frontier_row >= frontier);
        for (coord, cell) in &engine.cells {
            assert_eq!(cell.center, engine.geometry.cell_center(*coord));
        }
        assert!(engine.is_settling());
    }

    #[test]
    fn test_settle_window_holds_physics() {
        let mut engine = playing();
        engine.resize(Viewport::new(600.0, 800.0));
        let before = engine.bodies.clone();
        engine.advance(RESIZE_SETTLE_MS / 2.0);
        assert_eq!(engine.bodies, before);
        engine.advance(RESIZE_SETTLE_MS);
        assert!(!engine.is_settling());
        engine.advance(REFERENCE_FRAME_MS);
        assert_ne!(engine.bodies, before);
    }

    #[test]
    fn test_menu_resize_damps_velocity() {
        let mut engine = Engine::new(viewport(), 4);
        engine.bodies[0].vel = glam::DVec2::new(0.0, 1.0);
        engine.resize(Viewport::new(450.0, 1000.0));
        assert!((engine.bodies[0].vel.y - 0.5).abs() < 1e-9);
        assert_eq!(engine.camera_y, engine.camera_target());
    }
}
