//! Save/load persistence
//!
//! Features:
//! - Versioned JSON snapshot
//! - Pure migrations from every earlier schema
//! - Validation after decode
//! - Corruption recovery (fresh world instead of an error)
//!
//! Where the bytes are stored is up to the shell.

pub mod migration;
pub mod snapshot;

use std::collections::HashSet;

pub use snapshot::{BodySnapshot, CellSnapshot, SNAPSHOT_VERSION, Snapshot};

use crate::error::PersistError;
use crate::sim::{Engine, Viewport};

/// Serialize a snapshot
pub fn encode(snapshot: &Snapshot) -> Result<String, PersistError> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Parse, migrate and validate a stored snapshot
pub fn decode(json: &str) -> Result<Snapshot, PersistError> {
    let mut value: serde_json::Value = serde_json::from_str(json)?;
    migration::migrate(&mut value)?;
    let snapshot: Snapshot = serde_json::from_value(value)?;
    validate(&snapshot)?;
    Ok(snapshot)
}

fn finite(name: &str, values: &[f64]) -> Result<(), PersistError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PersistError::Invalid(format!("{name} is not finite")))
    }
}

fn positive(name: &str, value: f64) -> Result<(), PersistError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PersistError::Invalid(format!("{name} must be positive, got {value}")))
    }
}

/// Reject snapshots the engine could not run from
pub fn validate(snapshot: &Snapshot) -> Result<(), PersistError> {
    finite("camera_y", &[snapshot.camera_y])?;
    // Non-positive row height falls back to the viewport's
    finite("row_height", &[snapshot.row_height])?;
    if let Some(viewport) = snapshot.viewport {
        positive("viewport width", viewport.width)?;
        positive("viewport height", viewport.height)?;
    }
    finite(
        "booster timers",
        &[snapshot.boosters.damage_ms, snapshot.boosters.reward_ms],
    )?;
    if let Some(last) = snapshot.last_active_ms {
        finite("last_active_ms", &[last])?;
    }

    for (i, body) in snapshot.bodies.iter().enumerate() {
        finite(&format!("body {i}"), &[body.pos[0], body.pos[1], body.vel[0], body.vel[1]])?;
        positive(&format!("body {i} radius"), body.radius)?;
    }

    let mut seen = HashSet::with_capacity(snapshot.cells.len());
    for cell in &snapshot.cells {
        let name = format!("cell ({}, {})", cell.row, cell.col);
        finite(&name, &[cell.pos[0], cell.pos[1]])?;
        positive(&name, cell.radius)?;
        if cell.health > cell.max_health {
            return Err(PersistError::Invalid(format!(
                "{name} health {} exceeds max {}",
                cell.health, cell.max_health
            )));
        }
        if !seen.insert((cell.row, cell.col)) {
            return Err(PersistError::Invalid(format!("{name} appears twice")));
        }
    }
    Ok(())
}

/// Restore from `json`, or start fresh when there is nothing usable.
///
/// Never fails: a broken snapshot is logged and discarded.
pub fn load_or_fresh(json: Option<&str>, viewport: Viewport, seed: u64) -> Engine {
    let Some(json) = json else {
        return Engine::new(viewport, seed);
    };
    match decode(json) {
        Ok(snapshot) => {
            log::info!(
                "Loaded snapshot: {} cells, {} bodies, frontier row {}",
                snapshot.cells.len(),
                snapshot.bodies.len(),
                snapshot.frontier_row
            );
            Engine::restore(snapshot, viewport)
        }
        Err(err) => {
            log::warn!("Discarding snapshot ({}), starting a fresh world", err);
            Engine::new(viewport, seed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{EnginePhase, GridGeometry, UpgradeLevels};
    use serde_json::json;

    fn viewport() -> Viewport {
        Viewport::new(450.0, 800.0)
    }

    fn stored() -> String {
        let mut engine = Engine::new(viewport(), 8);
        engine.currency = 4_321;
        engine.progression.prestige_count = 2;
        encode(&engine.snapshot(50_000.0)).unwrap()
    }

    #[test]
    fn test_encode_decode_keeps_economy() {
        let snapshot = decode(&stored()).unwrap();
        assert_eq!(snapshot.currency, 4_321);
        assert_eq!(snapshot.prestige_count, 2);
        assert_eq!(snapshot.last_active_ms, Some(50_000.0));
    }

    #[test]
    fn test_corrupt_json_gives_fresh_engine() {
        let engine = load_or_fresh(Some("{not json"), viewport(), 3);
        assert_eq!(engine.currency, 0);
        assert_eq!(engine.phase, EnginePhase::Menu);
        assert_eq!(engine.seed, 3);
    }

    #[test]
    fn test_nothing_stored_gives_fresh_engine() {
        let engine = load_or_fresh(None, viewport(), 3);
        assert_eq!(engine.currency, 0);
    }

    #[test]
    fn test_valid_snapshot_loads() {
        let engine = load_or_fresh(Some(&stored()), viewport(), 3);
        assert_eq!(engine.currency, 4_321);
        assert_eq!(engine.seed, 8);
    }

    #[test]
    fn test_health_over_max_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&stored()).unwrap();
        value["cells"][0]["health"] = json!(99);
        let err = decode(&value.to_string());
        assert!(matches!(err, Err(PersistError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_coordinates_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&stored()).unwrap();
        let first = value["cells"][0].clone();
        if let Some(cells) = value["cells"].as_array_mut() {
            cells.push(first);
        }
        assert!(matches!(
            decode(&value.to_string()),
            Err(PersistError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_radius_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(&stored()).unwrap();
        value["bodies"][0]["radius"] = json!(0.0);
        assert!(matches!(
            decode(&value.to_string()),
            Err(PersistError::Invalid(_))
        ));
    }

    fn without(path: &[&str]) -> String {
        let mut value: serde_json::Value = serde_json::from_str(&stored()).unwrap();
        let (last, parents) = path.split_last().unwrap();
        let mut node = &mut value;
        for key in parents {
            node = &mut node[*key];
        }
        node.as_object_mut().unwrap().remove(*last);
        value.to_string()
    }

    #[test]
    fn test_single_missing_field_keeps_currency() {
        let paths: [&[&str]; 9] = [
            &["camera_y"],
            &["levels", "gravity"],
            &["levels"],
            &["frontier_row"],
            &["row_height"],
            &["viewport"],
            &["bodies"],
            &["cells"],
            &["rng"],
        ];
        for path in paths {
            let engine = load_or_fresh(Some(&without(path)), viewport(), 3);
            assert_eq!(engine.currency, 4_321, "missing {path:?}");
            assert_eq!(engine.progression.prestige_count, 2, "missing {path:?}");
            assert_eq!(engine.seed, 8, "missing {path:?}");
        }
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let engine = load_or_fresh(Some(&without(&["levels", "gravity"])), viewport(), 3);
        assert_eq!(engine.progression.levels.gravity, UpgradeLevels::default().gravity);

        let engine = load_or_fresh(Some(&without(&["row_height"])), viewport(), 3);
        assert_eq!(engine.geometry, GridGeometry::from_viewport(viewport()));

        // Prestige 2 respawns three bodies
        let engine = load_or_fresh(Some(&without(&["bodies"])), viewport(), 3);
        assert_eq!(engine.bodies.len(), 3);
    }

    #[test]
    fn test_missing_frontier_stays_below_cells() {
        let json = without(&["frontier_row"]);
        let snapshot = decode(&json).unwrap();
        let deepest = snapshot.cells.iter().map(|c| c.row).max().unwrap();
        assert_eq!(snapshot.frontier(), deepest as u32 + 1);
    }

    #[test]
    fn test_v1_snapshot_loads_with_defaults() {
        let v1 = json!({
            "currency": 77,
            "levels": { "damage": 3, "gravity": 2, "reward_efficiency": 1 },
            "camera_y": 0.0,
            "frontier_row": 10,
            "row_height": 43.30127018922193,
            "viewport": { "width": 450.0, "height": 800.0 },
            "bodies": [ { "pos": [225.0, 300.0], "vel": [0.0, 1.0], "radius": 12.0, "damage": 3 } ],
            "cells": [
                { "pos": [27.0, 400.0], "row": 0, "col": 0, "health": 1, "max_health": 1,
                  "value": 10, "hue": 20.0, "radius": 26.6 }
            ]
        });
        let engine = load_or_fresh(Some(&v1.to_string()), viewport(), 5);
        assert_eq!(engine.currency, 77);
        assert_eq!(engine.progression.levels.damage, 3);
        assert_eq!(engine.progression.levels.explosive_chance, 0);
        assert_eq!(engine.progression.prestige_count, 0);
        assert!(engine.last_active_ms.is_none());
        assert_eq!(engine.bodies.len(), 1);
        assert_eq!(engine.bodies[0].damage, 3);
    }
}
