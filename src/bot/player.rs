use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};
use crate::bot::action::{ActionError, ActionInterface};
use crate::bot::config::BotConfig;
use crate::bot::pathfinding::Navigator;
use crate::bot::pods::{PodManager, ResourceMap};
use crate::bot::rally::Rally;
use crate::bot::structures::run_structures;
use crate::bot::time_budget::TimeBudget;
use crate::profile_log;

/// Summary of one turn, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub turn: u32,
    pub mining_pods: usize,
    pub building_pods: usize,
    pub rocket_pods: usize,
    pub moves: usize,
    pub harvests: usize,
    pub builds: usize,
    pub spawned: usize,
    pub produced: usize,
    pub launched: usize,
    pub astar_fallbacks: usize,
    pub budget_ms: u64,
}

/// Per-match controller: owns every piece of state that survives between turns.
///
/// Each turn runs in three phases:
/// 1. **Pre-turn:** credit the time budget, refresh resource knowledge,
///    prune dead pod members and update the rally point
/// 2. **Turn:** pods, then structures, then combat units
/// 3. **Post-turn:** settle the time budget against the engine's report
pub struct Bot {
    config: BotConfig,
    navigator: Navigator,
    resources: ResourceMap,
    pods: PodManager,
    rally: Rally,
    budget: TimeBudget,
}

impl Bot {
    pub fn new<A>(api: &A, config: BotConfig) -> Self
    where
        A: ActionInterface + ?Sized,
    {
        let started = Instant::now();
        let grid = api.starting_map();
        let navigator = Navigator::new(grid.clone(), &config);
        let rally = Rally::new(&grid, api.enemy_starting_cells());
        let resources = ResourceMap::new(grid);
        let pods = PodManager::initialize(api, &resources, &config);
        let budget = TimeBudget::new(api.time_left_ms().min(config.initial_budget_ms), config.budget_increment_ms);

        info!(
            "[PODS] Bot ready in {:?}: {} pods, {} attack points, {} ms budget",
            started.elapsed(),
            pods.registry().len(),
            rally.attack_points().len(),
            budget.remaining_ms()
        );

        Self { config, navigator, resources, pods, rally, budget }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn pods(&self) -> &PodManager {
        &self.pods
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn resources(&self) -> &ResourceMap {
        &self.resources
    }

    pub fn rally(&self) -> &Rally {
        &self.rally
    }

    pub fn budget(&self) -> &TimeBudget {
        &self.budget
    }

    /// Play one turn. A failed commit aborts the rest of the turn and is
    /// returned to the caller unchanged.
    pub fn take_turn<A>(&mut self, api: &mut A) -> Result<TurnReport, ActionError>
    where
        A: ActionInterface + ?Sized,
    {
        let turn = api.turn();
        self.pre_turn(&*api);

        let pod_turn =
            self.pods
                .take_turn(api, &self.config, &mut self.navigator, &self.budget, &self.resources)?;
        let structures = run_structures(api, &mut self.pods, &self.config)?;
        let rangers_moved = self.rally.advance(api, &mut self.navigator, &self.budget)?;

        let spent = self.budget.turn_elapsed();
        self.budget.end_turn(spent, Some(api.time_left_ms()));

        let (mining_pods, building_pods, rocket_pods) = self.pods.registry().order_counts();
        let report = TurnReport {
            turn,
            mining_pods,
            building_pods,
            rocket_pods,
            moves: pod_turn.moves + rangers_moved,
            harvests: pod_turn.harvests,
            builds: pod_turn.builds,
            spawned: pod_turn.spawned,
            produced: structures.produced,
            launched: structures.launched,
            astar_fallbacks: self.navigator.take_fallback_count(),
            budget_ms: self.budget.remaining_ms(),
        };

        debug!("[BUDGET] Turn {} took {:?}, {} ms left", turn, spent, report.budget_ms);
        profile_log!(turn, "[PERF] Turn {}: {:?}", turn, report);
        Ok(report)
    }

    fn pre_turn<A>(&mut self, api: &A)
    where
        A: ActionInterface + ?Sized,
    {
        self.budget.begin_turn();
        let lowered = self.resources.refresh(api);
        let pruned = self.pods.prune(api);
        if pruned > 0 {
            debug!("[PODS] Pruned {} members", pruned);
        }
        self.navigator.retain_units(|unit| api.unit(unit).is_some());
        self.rally.update(api, self.pods.base());
        if lowered > 0 {
            debug!("[PODS] {} cells lower than believed", lowered);
        }
    }
}
