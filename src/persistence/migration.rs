//! Snapshot schema migrations
//!
//! Each step is a pure function from one version's JSON to the next, filling
//! in the fields that version introduced. Decoding into [`Snapshot`] only
//! happens after the value has reached the current version.
//!
//! - v1: damage, gravity and reward-efficiency levels only; plain cells
//! - v2: chance tracks, booster timers, flat `cell_type` + `type_resolved`
//! - v3: `kind` per cell, prestige count, last activity, settings, stats, seed
//!
//! [`Snapshot`]: super::Snapshot

use serde_json::{Map, Value, json};

use super::snapshot::SNAPSHOT_VERSION;
use crate::error::PersistError;

/// Bring `value` up to the current schema; returns the version it started at
pub fn migrate(value: &mut Value) -> Result<u32, PersistError> {
    let root = value.as_object_mut().ok_or(PersistError::NotAnObject)?;

    // The first release did not write a version
    let found = match root.get("version") {
        None => 1,
        Some(v) => v.as_u64().ok_or_else(|| {
            PersistError::Invalid("version must be a non-negative integer".to_string())
        })?,
    };
    if found == 0 || found > SNAPSHOT_VERSION as u64 {
        return Err(PersistError::UnsupportedVersion {
            found,
            newest: SNAPSHOT_VERSION,
        });
    }

    if found < 2 {
        v1_to_v2(root);
        log::info!("Migrated snapshot v1 -> v2");
    }
    if found < 3 {
        v2_to_v3(root);
        log::info!("Migrated snapshot v2 -> v3");
    }
    Ok(found as u32)
}

fn insert_missing(map: &mut Map<String, Value>, key: &str, value: Value) {
    if !map.contains_key(key) {
        map.insert(key.to_string(), value);
    }
}

fn cells_mut(root: &mut Map<String, Value>) -> impl Iterator<Item = &mut Map<String, Value>> {
    root.get_mut("cells")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

pub fn v1_to_v2(root: &mut Map<String, Value>) {
    if let Some(levels) = root.get_mut("levels").and_then(Value::as_object_mut) {
        for track in [
            "damage_booster_chance",
            "reward_booster_chance",
            "explosive_chance",
        ] {
            insert_missing(levels, track, json!(0));
        }
    }
    insert_missing(root, "boosters", json!({ "damage_ms": 0.0, "reward_ms": 0.0 }));

    for cell in cells_mut(root) {
        insert_missing(cell, "cell_type", json!("Normal"));
        insert_missing(cell, "type_resolved", json!(false));
    }
    root.insert("version".to_string(), json!(2));
}

pub fn v2_to_v3(root: &mut Map<String, Value>) {
    for cell in cells_mut(root) {
        let resolved = cell
            .remove("type_resolved")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let cell_type = cell.remove("cell_type").unwrap_or_else(|| json!("Normal"));
        let kind = if resolved {
            json!({ "Resolved": cell_type })
        } else {
            json!("Pending")
        };
        insert_missing(cell, "kind", kind);
    }

    insert_missing(root, "prestige_count", json!(0));
    insert_missing(root, "last_active_ms", Value::Null);
    insert_missing(root, "settings", json!({}));
    insert_missing(root, "stats", json!({}));
    insert_missing(root, "seed", json!(0));
    root.insert("version".to_string(), json!(3));
}
