//! Sprout Run
//!
//! Headless endless-runner session. Streams platforms and pickups through the
//! spawn engine while a simulated player scores, then logs a summary.
//!
//! Usage: `sprout_run [config.toml|config.ron]`

mod config;
mod session;

use config::GameConfig;
use session::Session;
use spawn_engine::config::Config;
use spawn_engine::entity::ItemKind;
use spawn_engine::foundation::logging::{self, LevelFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(LevelFilter::Info);

    log::info!("Starting Sprout Run");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {path}");
            GameConfig::load_from_file(&path)?
        }
        None => GameConfig::default(),
    };

    let duration = config.session.duration;
    let mut session = Session::new(config)?;
    log::info!("Session ready, simulating {duration:.0}s");

    let summary = session.run();

    log::info!("Session finished after {:.1}s", summary.elapsed);
    log::info!("  Runs: {}", summary.runs);
    log::info!("  Best score: {}", summary.best_score);
    log::info!(
        "  Final run: score {}, health {:.0}/{:.0}, stage {}{}",
        session.score(),
        session.health(),
        session.max_health(),
        session.director().stage().current_stage,
        if session.is_game_over() { ", game over" } else { "" }
    );
    log::info!("  Best stage: {}", summary.best_stage);
    log::info!(
        "  Platforms: {} spawned, {} recycled, {} stepped on",
        summary.stats.platforms_spawned,
        summary.stats.platforms_recycled,
        summary.stats.platforms_stepped
    );
    for (index, kind) in ItemKind::ALL.iter().enumerate() {
        log::info!(
            "  {kind}: {} placed, {} collected",
            summary.stats.items_placed[index],
            summary.stats.items_collected[index]
        );
    }
    if summary.stats.spawn_failures > 0 || summary.stats.fallback_layouts > 0 {
        log::warn!(
            "  {} failed spawns, {} fallback layouts",
            summary.stats.spawn_failures,
            summary.stats.fallback_layouts
        );
    }

    Ok(())
}
