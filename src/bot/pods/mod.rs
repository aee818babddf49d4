mod types;
mod clustering;
mod deposits;
mod orders;

#[cfg(test)]
mod tests;

use tracing::info;
use crate::bot::action::{ActionError, ActionInterface};
use crate::bot::config::BotConfig;
use crate::bot::grid::Cell;
use crate::bot::pathfinding::Navigator;
use crate::bot::time_budget::TimeBudget;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use types::{Order, Pod, PodId, PodRegistry};
pub use clustering::cluster_workers;
pub use deposits::ResourceMap;
pub use orders::{assign_initial_orders, run_pod, Census, OrderContext, PodActivity};

/// Totals of one pod pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PodTurn {
    pub moves: usize,
    pub harvests: usize,
    pub builds: usize,
    pub loads: usize,
    pub spawned: usize,
    pub foundations: usize,
}

/// Owns the pods of one match and runs their orders each turn.
pub struct PodManager {
    registry: PodRegistry,
    base: Option<Cell>,
}

impl PodManager {
    /// Cluster the starting workers and hand out the first orders.
    pub fn initialize<A>(api: &A, resources: &ResourceMap, config: &BotConfig) -> Self
    where
        A: ActionInterface + ?Sized,
    {
        let mut registry = PodRegistry::new();
        for members in cluster_workers(api, config.sensor_radius_sq) {
            registry.insert(members, Order::Mine);
        }
        assign_initial_orders(&mut registry, api, resources, config);

        info!("[PODS] {} pods formed", registry.len());
        for pod in registry.iter() {
            info!("[PODS]   {:?} {:?} {:?}", pod.id, pod.order, pod.members);
        }

        Self { registry, base: None }
    }

    pub fn from_registry(registry: PodRegistry) -> Self {
        Self { registry, base: None }
    }

    pub fn registry(&self) -> &PodRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PodRegistry {
        &mut self.registry
    }

    /// Cell of the first factory foundation laid this match.
    pub fn base(&self) -> Option<Cell> {
        self.base
    }

    /// Remove members the engine no longer knows about.
    pub fn prune<A>(&mut self, api: &A) -> usize
    where
        A: ActionInterface + ?Sized,
    {
        self.registry.prune(|unit| api.unit(unit).is_some())
    }

    /// A rocket left: every pod waiting for one goes back to mining.
    pub fn on_launch(&mut self) {
        let changed = self.registry.reassign(Order::Rocket, Order::Mine);
        if changed > 0 {
            info!("[PODS] {} pods switched ROCKET -> MINE after launch", changed);
        }
    }

    /// Run every non-empty pod once, in ascending pod id order.
    pub fn take_turn<A>(
        &mut self,
        api: &mut A,
        config: &BotConfig,
        navigator: &mut Navigator,
        budget: &TimeBudget,
        resources: &ResourceMap,
    ) -> Result<PodTurn, ActionError>
    where
        A: ActionInterface + ?Sized,
    {
        let mut census = Census::take(&*api);
        let mut ctx = OrderContext { config, navigator, budget, resources, census: &mut census };
        let mut turn = PodTurn::default();

        for id in self.registry.ids() {
            let activity = {
                let Some(pod) = self.registry.get_mut(id) else {
                    continue;
                };
                // Empty pods stay registered and are skipped.
                if pod.is_empty() {
                    continue;
                }
                run_pod(pod, api, &mut ctx)?
            };

            for child in &activity.spawned {
                self.registry.add_member(id, *child);
            }
            if let Some(cell) = activity.factory_laid {
                self.base.get_or_insert(cell);
                turn.foundations += 1;
            }
            turn.foundations += activity.rockets_laid;
            turn.moves += activity.moves;
            turn.harvests += activity.harvests;
            turn.builds += activity.builds;
            turn.loads += activity.loads;
            turn.spawned += activity.spawned.len();
        }

        Ok(turn)
    }
}
