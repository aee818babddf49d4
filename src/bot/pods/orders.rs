use tracing::{debug, info};
use crate::bot::action::{ActionError, ActionInterface, UnitId, UnitInfo, UnitKind};
use crate::bot::config::BotConfig;
use crate::bot::grid::Cell;
use crate::bot::pathfinding::{Direction, Navigator};
use crate::bot::time_budget::TimeBudget;
use super::deposits::ResourceMap;
use super::types::{Order, Pod, PodRegistry};

/// Structure state sampled once at the start of the pod pass.
#[derive(Clone, Debug, Default)]
pub struct Census {
    pub factories: usize,
    /// True when no completed factory sits idle. Vacuously true without factories.
    pub all_factories_producing: bool,
    /// Friendly rockets, ascending id, plus any laid during the pass.
    pub rockets: Vec<UnitInfo>,
}

impl Census {
    pub fn take<A>(api: &A) -> Self
    where
        A: ActionInterface + ?Sized,
    {
        let mut census = Census { all_factories_producing: true, ..Default::default() };
        for unit in api.my_units() {
            match unit.kind {
                UnitKind::Factory => {
                    census.factories += 1;
                    if unit.complete && !unit.producing {
                        census.all_factories_producing = false;
                    }
                }
                UnitKind::Rocket => census.rockets.push(unit),
                _ => {}
            }
        }
        census
    }
}

/// Mutable state the order handlers share for one turn.
pub struct OrderContext<'a> {
    pub config: &'a BotConfig,
    pub navigator: &'a mut Navigator,
    pub budget: &'a TimeBudget,
    pub resources: &'a ResourceMap,
    pub census: &'a mut Census,
}

/// What one pod did this turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PodActivity {
    pub moves: usize,
    pub harvests: usize,
    pub builds: usize,
    pub loads: usize,
    pub spawned: Vec<UnitId>,
    /// Cell of a factory foundation laid this turn.
    pub factory_laid: Option<Cell>,
    pub rockets_laid: usize,
}

/// Give every pod its first order. A lone pod builds; otherwise the pod
/// sitting on the least resource density builds and the rest mine.
pub fn assign_initial_orders<A>(registry: &mut PodRegistry, api: &A, resources: &ResourceMap, config: &BotConfig)
where
    A: ActionInterface + ?Sized,
{
    let ids = registry.ids();
    if ids.len() == 1 {
        if let Some(pod) = registry.get_mut(ids[0]) {
            pod.order = Order::Build;
        }
        return;
    }

    let mut builder = None;
    let mut lowest = u64::MAX;
    for id in ids {
        let Some(pod) = registry.get_mut(id) else {
            continue;
        };
        pod.order = Order::Mine;
        let Some(center) = mean_position(api, pod) else {
            continue;
        };
        let value = resources.density(center, config.pod_density_radius);
        debug!("[PODS] Pod {:?} centred on {:?}, density {}", id, center, value);
        if value < lowest {
            lowest = value;
            builder = Some(id);
        }
    }

    if let Some(pod) = builder.and_then(|id| registry.get_mut(id)) {
        pod.order = Order::Build;
    }
}

/// Integer mean of the on-grid members' cells.
fn mean_position<A>(api: &A, pod: &Pod) -> Option<Cell>
where
    A: ActionInterface + ?Sized,
{
    let cells: Vec<Cell> = pod.members.iter().filter_map(|id| api.unit(*id)?.cell()).collect();
    if cells.is_empty() {
        return None;
    }
    let n = cells.len() as i32;
    let sum_x: i32 = cells.iter().map(|c| c.x).sum();
    let sum_y: i32 = cells.iter().map(|c| c.y).sum();
    Some(Cell::new(sum_x / n, sum_y / n))
}

/// First member, by ascending id, that stands on the grid.
fn sample_member<A>(api: &A, pod: &Pod) -> Option<(UnitId, Cell)>
where
    A: ActionInterface + ?Sized,
{
    pod.members
        .iter()
        .find_map(|id| api.unit(*id).and_then(|u| u.cell()).map(|cell| (*id, cell)))
}

fn first_replicate_dir<A>(api: &A, unit: UnitId) -> Option<Direction>
where
    A: ActionInterface + ?Sized,
{
    Direction::COMPASS.into_iter().find(|d| api.can_replicate(unit, *d))
}

pub fn run_pod<A>(pod: &mut Pod, api: &mut A, ctx: &mut OrderContext<'_>) -> Result<PodActivity, ActionError>
where
    A: ActionInterface + ?Sized,
{
    match pod.order {
        Order::Build => run_build(pod, api, ctx),
        Order::Mine => run_mine(pod, api, ctx),
        Order::Rocket => run_rocket(pod, api, ctx),
    }
}

fn run_build<A>(pod: &mut Pod, api: &mut A, ctx: &mut OrderContext<'_>) -> Result<PodActivity, ActionError>
where
    A: ActionInterface + ?Sized,
{
    let mut activity = PodActivity::default();
    let config = ctx.config;

    if pod.idle_turns > config.build_idle_threshold {
        info!(
            "[PODS] Pod {:?} idle for {} turns, switching BUILD -> {:?}",
            pod.id, pod.idle_turns, config.build_idle_successor
        );
        pod.order = config.build_idle_successor;
        pod.idle_turns = 0;
        return Ok(activity);
    }
    pod.idle_turns += 1;

    let needs_target = pod
        .build_target
        .map_or(true, |id| api.unit(id).map_or(true, |u| u.complete));
    if needs_target {
        // No new foundation while a finished factory sits idle.
        if !ctx.census.all_factories_producing {
            return Ok(activity);
        }
        let Some((sample, cell)) = sample_member(&*api, pod) else {
            return Ok(activity);
        };
        for dir in Direction::COMPASS {
            if api.can_blueprint(sample, UnitKind::Factory, dir) {
                let id = api.blueprint(sample, UnitKind::Factory, dir)?;
                pod.build_target = Some(id);
                pod.idle_turns = 0;
                activity.factory_laid = Some(cell.step(dir));
                info!("[PODS] Pod {:?} laid factory {} at {:?}", pod.id, id, cell.step(dir));
                break;
            }
        }
    }

    let Some(target) = pod.build_target else {
        return Ok(activity);
    };
    let Some(target_cell) = api.unit(target).and_then(|u| u.cell()) else {
        return Ok(activity);
    };

    let members: Vec<UnitId> = pod.members.iter().copied().collect();
    for unit in members {
        let Some(cell) = api.unit(unit).and_then(|u| u.cell()) else {
            continue;
        };

        if ctx.census.all_factories_producing && pod.members.len() + activity.spawned.len() < config.build_pod_cap {
            let near_target = Direction::COMPASS
                .into_iter()
                .map(|d| cell.direction_to(target_cell.step(d)))
                .find(|d| api.can_replicate(unit, *d));
            if let Some(dir) = near_target.or_else(|| first_replicate_dir(&*api, unit)) {
                let child = api.replicate(unit, dir)?;
                debug!("[PODS] Pod {:?} member {} spawned {}", pod.id, unit, child);
                activity.spawned.push(child);
            }
        }

        if api.can_build(unit, target) {
            api.build(unit, target)?;
            activity.builds += 1;
        } else if ctx.navigator.step_toward(api, ctx.budget, unit, cell, target_cell)? {
            activity.moves += 1;
        }
        // Any member working on or heading for the target counts as progress, blocked or not.
        pod.idle_turns = 0;
    }

    Ok(activity)
}

fn run_mine<A>(pod: &mut Pod, api: &mut A, ctx: &mut OrderContext<'_>) -> Result<PodActivity, ActionError>
where
    A: ActionInterface + ?Sized,
{
    let mut activity = PodActivity::default();
    let config = ctx.config;

    let depleted = pod.mining_target.map_or(true, |cell| ctx.resources.stock(cell) == 0);
    if depleted {
        let Some((_, cell)) = sample_member(&*api, pod) else {
            return Ok(activity);
        };
        pod.mining_target = ctx.resources.nearest_deposit(cell);
        debug!("[PODS] Pod {:?} mining target now {:?}", pod.id, pod.mining_target);
    }
    let Some(target) = pod.mining_target else {
        return Ok(activity);
    };

    let may_spawn = ctx.census.factories > 0 && ctx.census.all_factories_producing;
    let pod_size = pod.members.len().max(1) as u64;

    let members: Vec<UnitId> = pod.members.iter().copied().collect();
    for unit in members {
        let Some(cell) = api.unit(unit).and_then(|u| u.cell()) else {
            continue;
        };
        let toward = cell.direction_to(target);

        if may_spawn && ctx.resources.density(cell, config.spawn_density_radius) / pod_size > config.spawn_density_per_capita {
            let dir = if api.can_replicate(unit, toward) {
                Some(toward)
            } else {
                first_replicate_dir(&*api, unit)
            };
            if let Some(dir) = dir {
                let child = api.replicate(unit, dir)?;
                debug!("[PODS] Pod {:?} member {} spawned {}", pod.id, unit, child);
                activity.spawned.push(child);
            }
        }

        if api.can_harvest(unit, toward) {
            api.harvest(unit, toward)?;
            activity.harvests += 1;
        } else if ctx.navigator.step_toward(api, ctx.budget, unit, cell, target)? {
            activity.moves += 1;
        } else if let Some(dir) = Direction::WITH_CENTER.into_iter().find(|d| api.can_harvest(unit, *d)) {
            api.harvest(unit, dir)?;
            activity.harvests += 1;
        }
    }

    Ok(activity)
}

fn run_rocket<A>(pod: &mut Pod, api: &mut A, ctx: &mut OrderContext<'_>) -> Result<PodActivity, ActionError>
where
    A: ActionInterface + ?Sized,
{
    let mut activity = PodActivity::default();

    let mut ready: Option<(UnitId, Cell)> = None;
    let mut foundation: Option<(UnitId, Cell)> = None;
    for rocket in &ctx.census.rockets {
        // Earlier pods may have boarded or built since the census.
        let Some(current) = api.unit(rocket.id) else {
            continue;
        };
        let Some(cell) = current.cell() else {
            continue;
        };
        if !current.complete {
            foundation = foundation.or(Some((rocket.id, cell)));
        } else if current.has_room() {
            ready = ready.or(Some((rocket.id, cell)));
        }
    }

    let members: Vec<UnitId> = pod.members.iter().copied().collect();
    for unit in members {
        let Some(cell) = api.unit(unit).and_then(|u| u.cell()) else {
            continue;
        };

        if let Some((rocket, rocket_cell)) = ready {
            if api.can_load(rocket, unit) {
                api.load(rocket, unit)?;
                activity.loads += 1;
            } else if ctx.navigator.step_toward(api, ctx.budget, unit, cell, rocket_cell)? {
                activity.moves += 1;
            }
            continue;
        }

        if let Some((rocket, rocket_cell)) = foundation {
            if api.can_build(unit, rocket) {
                api.build(unit, rocket)?;
                activity.builds += 1;
            } else if ctx.navigator.step_toward(api, ctx.budget, unit, cell, rocket_cell)? {
                activity.moves += 1;
            }
            continue;
        }

        for dir in Direction::COMPASS {
            if api.can_blueprint(unit, UnitKind::Rocket, dir) {
                let id = api.blueprint(unit, UnitKind::Rocket, dir)?;
                info!("[PODS] Pod {:?} laid rocket {} at {:?}", pod.id, id, cell.step(dir));
                foundation = Some((id, cell.step(dir)));
                activity.rockets_laid += 1;
                if let Some(rocket) = api.unit(id) {
                    ctx.census.rockets.push(rocket);
                }
                break;
            }
        }
    }

    Ok(activity)
}
