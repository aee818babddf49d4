use lodestar::bot::config::{BOT_CONFIG_PATH, SIM_CONFIG_PATH, SimConfig};
use lodestar::bot::sim::{generate_map, load_map, MapData, SimWorld};
use lodestar::bot::{Bot, BotConfig, Team, UnitKind};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

fn setup_file_logging() -> String {
    // Create logs directory if it doesn't exist
    let log_dir = PathBuf::from("logs");
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create logs directory: {}", e);
    }

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("lodestar_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // One file per match
        &log_dir,
        &log_filename
    );

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false); // No ANSI colors in file

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lodestar=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    log_path_str
}

fn cleanup_old_logs(log_dir: &PathBuf, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("lodestar") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modified time (oldest first)
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

fn load_or_generate_map(config: &SimConfig) -> MapData {
    let Some(path) = config.map_path.as_deref() else {
        return generate_map(config);
    };
    match load_map(path) {
        Ok(map) => {
            info!("[SIM] Loaded map {} ({}x{})", path, map.grid.width(), map.grid.height());
            map
        }
        Err(e) => {
            error!("[SIM] Failed to load map {}: {}", path, e);
            error!("[SIM] Generating one from seed {}", config.seed);
            generate_map(config)
        }
    }
}

fn main() {
    let log_file = setup_file_logging();

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Lodestar - Logging to file                              ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    let bot_config = BotConfig::load(BOT_CONFIG_PATH);
    let sim_config = SimConfig::load(SIM_CONFIG_PATH);
    let turns = sim_config.turns;

    let map = load_or_generate_map(&sim_config);
    let mut world = SimWorld::from_map(&map, sim_config);
    let mut bot = Bot::new(&world, bot_config);

    let started = Instant::now();
    for turn in 1..=turns {
        // A panicking turn forfeits its remaining actions; the match goes on.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| bot.take_turn(&mut world)));
        match outcome {
            Ok(Ok(report)) => {
                if turn % 25 == 0 {
                    info!("[SIM] {:?}", report);
                }
            }
            Ok(Err(e)) => warn!("[SIM] Turn {} aborted: {}", turn, e),
            Err(_) => error!("[SIM] Turn {} panicked", turn),
        }
        world.end_turn();
    }

    info!("[SIM] Match finished: {} turns in {:?}", turns, started.elapsed());
    info!(
        "[SIM]   workers {}, factories {}, rangers {}, rockets {}",
        world.count(Team::Friendly, UnitKind::Worker),
        world.count(Team::Friendly, UnitKind::Factory),
        world.count(Team::Friendly, UnitKind::Ranger),
        world.count(Team::Friendly, UnitKind::Rocket)
    );
    info!(
        "[SIM]   harvested {}, launched {}, resources left {}",
        world.total_harvested(),
        world.launched_units(),
        world.remaining_resources()
    );
}
