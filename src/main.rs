//! Hexfall headless driver
//!
//! Runs the simulation without a renderer: loads a snapshot if one exists,
//! simulates a number of seconds at 60 Hz while buying the cheapest affordable
//! upgrade once per simulated second, and writes the snapshot back.
//!
//! Usage: `hexfall [SECONDS] [SAVE_PATH]`
//!
//! `HEXFALL_NUMBER_FORMAT` (full, compact or scientific) picks how currency
//! is logged and is stored with the save.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the only wasm artifact
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    use hexfall::consts::REFERENCE_FRAME_MS;
    use hexfall::persistence;
    use hexfall::settings::NumberFormat;
    use hexfall::sim::{Engine, GameEvent, UpgradeTrack, Viewport};

    const DEFAULT_SECONDS: u64 = 600;
    const VIEWPORT: (f64, f64) = (450.0, 800.0);

    fn now_ms() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    /// Cheapest track the engine can afford right now
    fn cheapest_affordable(engine: &Engine) -> Option<UpgradeTrack> {
        UpgradeTrack::ALL
            .into_iter()
            .filter_map(|track| {
                engine
                    .progression
                    .cost(track, &engine.tuning)
                    .map(|cost| (track, cost))
            })
            .filter(|(_, cost)| *cost <= engine.currency)
            .min_by_key(|(_, cost)| *cost)
            .map(|(track, _)| track)
    }

    fn save(engine: &Engine, path: &Path) {
        let result = persistence::encode(&engine.snapshot(now_ms()))
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        match result {
            Ok(()) => log::debug!("Saved to {}", path.display()),
            Err(err) => log::warn!("Failed to save {}: {}", path.display(), err),
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = std::env::args().skip(1);
        let seconds = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SECONDS);
        let save_path = args.next();

        let stored = save_path
            .as_deref()
            .and_then(|path| fs::read_to_string(path).ok());
        let seed = now_ms() as u64;
        let viewport = Viewport::new(VIEWPORT.0, VIEWPORT.1);
        let mut engine = persistence::load_or_fresh(stored.as_deref(), viewport, seed);
        if let Ok(name) = std::env::var("HEXFALL_NUMBER_FORMAT") {
            match NumberFormat::from_str(&name) {
                Some(format) => engine.settings.number_format = format,
                None => log::warn!(
                    "Unknown number format {:?}, keeping {:?}",
                    name,
                    engine.settings.number_format
                ),
            }
        }
        let number_format = engine.settings.number_format;

        log::info!("Hexfall (native) starting: {} simulated seconds", seconds);
        if let Some(estimate) = engine.continue_game(now_ms()) {
            log::info!(
                "Welcome back: +{} while away",
                number_format.format(estimate.reward)
            );
        }

        let frames_per_second = (1000.0 / REFERENCE_FRAME_MS).round() as u64;
        for second in 0..seconds {
            for _ in 0..frames_per_second {
                engine.advance(REFERENCE_FRAME_MS);
            }

            while let Some(track) = cheapest_affordable(&engine) {
                if engine.purchase(track).is_err() {
                    break;
                }
            }
            if engine.stats.run.max_depth_row >= engine.prestige_requirement() {
                match engine.prestige() {
                    Ok(count) => log::debug!("Prestige {} at t={}s", count, second + 1),
                    Err(err) => log::warn!("Prestige refused: {}", err),
                }
            }

            for event in engine.drain_events() {
                if event == GameEvent::AutosaveDue {
                    if let Some(path) = &save_path {
                        save(&engine, Path::new(path));
                    }
                }
            }

            if (second + 1) % 60 == 0 {
                log::info!(
                    "t={}s depth={} currency={} bodies={} destroyed={}",
                    second + 1,
                    engine.depth_row(),
                    number_format.format(engine.currency),
                    engine.bodies.len(),
                    engine.stats.run.cells_destroyed
                );
            }
        }

        if let Some(path) = &save_path {
            save(&engine, Path::new(path));
        }
        log::info!(
            "Done: deepest row {}, lifetime earned {}, prestige {}",
            engine.stats.lifetime.best_depth_row,
            number_format.format(engine.stats.lifetime.currency_earned),
            engine.progression.prestige_count
        );
    }
}
