use rustc_hash::FxHashMap;
use tracing::debug;
use crate::bot::action::{ActionError, ActionInterface, UnitId};
use crate::bot::config::BotConfig;
use crate::bot::fixed_math::FixedNum;
use crate::bot::grid::{Cell, Grid};
use crate::bot::time_budget::TimeBudget;
use super::astar;
use super::nav_map::NavMapCache;
use super::types::Direction;

/// Per-unit, per-turn step decisions on top of the navigation map cache.
///
/// 1. Follow the cached field when its step is legal.
/// 2. Otherwise deviate by ±1 then ±2 compass steps toward a lookahead point
///    a few cells further along the field.
/// 3. After too many consecutive blocked turns, and only while the time
///    budget allows it, ask A* for the step instead.
///
/// Owns the cache and the per-unit stalemate counters for one match.
pub struct Navigator {
    cache: NavMapCache,
    stalemate: FxHashMap<UnitId, u32>,
    lookahead_steps: u32,
    stalemate_threshold: u32,
    astar_weight: FixedNum,
    astar_min_budget_ms: u64,
    fallbacks: usize,
}

impl Navigator {
    pub fn new(grid: Grid, config: &BotConfig) -> Self {
        Self::with_cache(NavMapCache::new(grid), config)
    }

    pub fn with_cache(cache: NavMapCache, config: &BotConfig) -> Self {
        Self {
            cache,
            stalemate: FxHashMap::default(),
            lookahead_steps: config.lookahead_steps,
            stalemate_threshold: config.stalemate_threshold,
            astar_weight: FixedNum::from_num(config.astar_weight.max(1.0)),
            astar_min_budget_ms: config.astar_min_budget_ms,
            fallbacks: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        self.cache.grid()
    }

    pub fn cache(&self) -> &NavMapCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut NavMapCache {
        &mut self.cache
    }

    /// Consecutive turns the unit's primary step has been illegal.
    pub fn stalemate(&self, unit: UnitId) -> u32 {
        self.stalemate.get(&unit).copied().unwrap_or(0)
    }

    /// Drop counters of units that no longer exist.
    pub fn retain_units(&mut self, mut alive: impl FnMut(UnitId) -> bool) {
        self.stalemate.retain(|unit, _| alive(*unit));
    }

    /// A* invocations since the last call.
    pub fn take_fallback_count(&mut self) -> usize {
        std::mem::take(&mut self.fallbacks)
    }

    /// Local decision without the A* fallback. `Center` means no move.
    pub fn next_step<A>(&mut self, api: &A, unit: UnitId, from: Cell, target: Cell) -> Direction
    where
        A: ActionInterface + ?Sized,
    {
        self.decide(api, None, unit, from, target)
    }

    /// Decide and, if the chosen step is legal, commit it. Returns whether the unit moved.
    pub fn step_toward<A>(
        &mut self,
        api: &mut A,
        budget: &TimeBudget,
        unit: UnitId,
        from: Cell,
        target: Cell,
    ) -> Result<bool, ActionError>
    where
        A: ActionInterface + ?Sized,
    {
        let dir = self.decide(&*api, Some(budget), unit, from, target);
        if dir != Direction::Center && api.can_move(unit, dir) {
            api.move_unit(unit, dir)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn decide<A>(
        &mut self,
        api: &A,
        budget: Option<&TimeBudget>,
        unit: UnitId,
        from: Cell,
        target: Cell,
    ) -> Direction
    where
        A: ActionInterface + ?Sized,
    {
        let (primary, lookahead) = {
            let Some(map) = self.cache.ensure_map(target) else {
                return Direction::Center;
            };
            match map.direction(from) {
                Some(dir) if dir != Direction::Center => (dir, map.lookahead(from, self.lookahead_steps)),
                // Arrived, or the target is unreachable from here.
                _ => return Direction::Center,
            }
        };

        if api.can_move(unit, primary) {
            self.stalemate.insert(unit, 0);
            return primary;
        }

        let counter = self.stalemate.entry(unit).or_insert(0);
        *counter += 1;
        let stalled = *counter;

        if stalled > self.stalemate_threshold
            && budget.is_some_and(|b| b.allows(self.astar_min_budget_ms))
        {
            self.fallbacks += 1;
            debug!("[NAV] Unit {} stalled for {} turns, falling back to A*", unit, stalled);
            return astar::first_step(self.cache.grid(), from, target, self.astar_weight, |cell| {
                api.unit_at(cell).is_none()
            });
        }

        let current = from.distance_squared_to(lookahead);
        for dir in primary.deviations() {
            if !api.can_move(unit, dir) {
                continue;
            }
            if from.step(dir).distance_squared_to(lookahead) < current {
                return dir;
            }
        }
        Direction::Center
    }
}
