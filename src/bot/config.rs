use serde::{Deserialize, Serialize};
use tracing::{error, info};
use crate::bot::pathfinding::{Symmetry, DEFAULT_LOOKAHEAD_STEPS};
use crate::bot::pods::Order;

/// Default location of the controller configuration file.
pub const BOT_CONFIG_PATH: &str = "assets/bot_config.ron";
pub const SIM_CONFIG_PATH: &str = "assets/sim_config.ron";

/// Tunable thresholds of the controller, loaded once per match.
///
/// Every field has a default so a RON file only needs to name the values it
/// overrides. None of these numbers is claimed to be optimal; they are the
/// values the bot has been played with.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    // Pod clustering
    /// Squared distance within which two friendly units count as neighbours.
    pub sensor_radius_sq: i64,

    // Order assignment & tasking
    /// Square radius used to score each pod's surroundings when assigning BUILD.
    pub pod_density_radius: i32,
    /// Square radius of the resource density a MINE member checks before spawning.
    pub spawn_density_radius: i32,
    /// A MINE member spawns only while `density / pod size` exceeds this.
    pub spawn_density_per_capita: u64,
    /// BUILD pods stop spawning at this many members.
    pub build_pod_cap: usize,
    /// Turns a BUILD pod may go without progress before leaving BUILD.
    pub build_idle_threshold: u32,
    /// Order a BUILD pod switches to after going idle.
    pub build_idle_successor: Order,
    /// Factories hold production while saving for a transport at or below this stockpile.
    pub rocket_reserve: u32,

    // Navigation
    /// Steps followed along the cached field to place the deviation lookahead point.
    pub lookahead_steps: u32,
    /// Consecutive blocked turns before the A* fallback may take over.
    pub stalemate_threshold: u32,
    /// Heuristic weight (≥ 1). Larger trades optimality for fewer expansions.
    pub astar_weight: f32,
    /// The A* fallback only runs while the time budget holds more than this.
    pub astar_min_budget_ms: u64,

    // Time budget
    pub initial_budget_ms: u64,
    pub budget_increment_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            sensor_radius_sq: 16,
            pod_density_radius: 5,
            spawn_density_radius: 3,
            spawn_density_per_capita: 100,
            build_pod_cap: 4,
            build_idle_threshold: 3,
            build_idle_successor: Order::Rocket,
            rocket_reserve: 100,
            lookahead_steps: DEFAULT_LOOKAHEAD_STEPS,
            stalemate_threshold: 5,
            astar_weight: 1.0,
            astar_min_budget_ms: 10_000,
            initial_budget_ms: 10_000,
            budget_increment_ms: 50,
        }
    }
}

impl BotConfig {
    /// Load from a RON file. Read or parse failures are logged and the defaults are used.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match ron::from_str::<BotConfig>(&contents) {
                Ok(config) => {
                    info!("[CONFIG] Loaded bot config from {}", path);
                    config.sanitized()
                }
                Err(e) => {
                    error!("[CONFIG] Failed to parse {}: {}", path, e);
                    error!("[CONFIG] Using default BotConfig");
                    Self::default()
                }
            },
            Err(e) => {
                error!("[CONFIG] Failed to read {}: {}", path, e);
                error!("[CONFIG] Using default BotConfig");
                Self::default()
            }
        }
    }

    /// Clamp values that would break an invariant (A* weight below 1).
    fn sanitized(mut self) -> Self {
        if !(self.astar_weight >= 1.0) {
            error!("[CONFIG] astar_weight {} is below 1, clamping", self.astar_weight);
            self.astar_weight = 1.0;
        }
        self
    }
}

/// Rules and map parameters of the headless match harness.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    // Map generation
    pub map_width: usize,
    pub map_height: usize,
    pub seed: u64,
    pub symmetry: Symmetry,
    /// Fraction of the map covered by wall blobs, roughly.
    pub obstacle_density: f32,
    pub resource_patches: usize,
    pub workers_per_side: usize,
    /// Load this map file instead of generating one.
    pub map_path: Option<String>,

    // Match
    pub turns: u32,
    pub starting_stockpile: u32,
    pub passive_income: u32,
    pub vision_radius_sq: i64,
    /// Constant value reported by `time_left_ms`.
    pub reported_time_ms: u64,

    // Economy
    pub harvest_amount: u32,
    pub replicate_cost: u32,
    pub factory_cost: u32,
    pub rocket_cost: u32,
    pub ranger_cost: u32,
    pub worker_cost: u32,

    // Structures
    pub structure_work: u32,
    pub build_per_action: u32,
    pub production_turns: u32,
    pub garrison_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_width: 30,
            map_height: 30,
            seed: 7,
            symmetry: Symmetry::Rotational,
            obstacle_density: 0.12,
            resource_patches: 10,
            workers_per_side: 3,
            map_path: None,
            turns: 400,
            starting_stockpile: 300,
            passive_income: 5,
            vision_radius_sq: 50,
            reported_time_ms: 60_000,
            harvest_amount: 3,
            replicate_cost: 30,
            factory_cost: 200,
            rocket_cost: 150,
            ranger_cost: 40,
            worker_cost: 50,
            structure_work: 100,
            build_per_action: 5,
            production_turns: 5,
            garrison_capacity: 8,
        }
    }
}

impl SimConfig {
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match ron::from_str::<SimConfig>(&contents) {
                Ok(config) => {
                    info!("[CONFIG] Loaded sim config from {}", path);
                    config
                }
                Err(e) => {
                    error!("[CONFIG] Failed to parse {}: {}", path, e);
                    error!("[CONFIG] Using default SimConfig");
                    Self::default()
                }
            },
            Err(e) => {
                error!("[CONFIG] Failed to read {}: {}", path, e);
                error!("[CONFIG] Using default SimConfig");
                Self::default()
            }
        }
    }
}
