use tracing::info;
use crate::bot::action::{ActionError, ActionInterface, Team, UnitKind};
use crate::bot::grid::{Cell, Grid};
use crate::bot::pathfinding::Navigator;
use crate::bot::time_budget::TimeBudget;

/// Where combat units gather.
///
/// Attack points start as the enemy starting cells. Once a base exists the
/// rally point is the attack point nearest to it; a friendly unit standing
/// on an attack point clears it and a new rally point is chosen.
#[derive(Clone, Debug, Default)]
pub struct Rally {
    attack_points: Vec<Cell>,
    rally_point: Option<Cell>,
    /// Squared map diagonal: covers every cell when looking for enemies.
    map_reach_sq: i64,
}

impl Rally {
    pub fn new(grid: &Grid, attack_points: Vec<Cell>) -> Self {
        let (w, h) = (grid.width() as i64, grid.height() as i64);
        Self { attack_points, rally_point: None, map_reach_sq: w * w + h * h }
    }

    pub fn attack_points(&self) -> &[Cell] {
        &self.attack_points
    }

    pub fn rally_point(&self) -> Option<Cell> {
        self.rally_point
    }

    /// Clear reached attack points and pick the rally point for this turn.
    pub fn update<A>(&mut self, api: &A, base: Option<Cell>)
    where
        A: ActionInterface + ?Sized,
    {
        let before = self.attack_points.len();
        self.attack_points.retain(|cell| {
            !api.unit_at(*cell)
                .and_then(|id| api.unit(id))
                .is_some_and(|u| u.team == Team::Friendly)
        });
        let reached = self.attack_points.len() != before;

        if self.rally_point.is_none() || reached {
            self.select(api, base);
        }
    }

    fn select<A>(&mut self, api: &A, base: Option<Cell>)
    where
        A: ActionInterface + ?Sized,
    {
        let Some(base) = base else {
            return;
        };

        if self.attack_points.is_empty() {
            // Fall back to any enemy we can see.
            let enemies = api.nearby_units(base, self.map_reach_sq, Team::Enemy, None);
            if let Some(cell) = enemies.iter().find_map(|u| u.cell()) {
                self.attack_points.push(cell);
            }
        }

        let mut best = None;
        let mut best_dist = i64::MAX;
        for candidate in &self.attack_points {
            let dist = base.distance_squared_to(*candidate);
            if dist < best_dist {
                best_dist = dist;
                best = Some(*candidate);
            }
        }

        if best != self.rally_point {
            info!("[NAV] Rally point {:?} -> {:?}", self.rally_point, best);
        }
        self.rally_point = best;
    }

    /// Step every on-grid combat unit toward the rally point. Returns the number moved.
    pub fn advance<A>(&self, api: &mut A, navigator: &mut Navigator, budget: &TimeBudget) -> Result<usize, ActionError>
    where
        A: ActionInterface + ?Sized,
    {
        let Some(target) = self.rally_point else {
            return Ok(0);
        };

        let mut moved = 0;
        let rangers: Vec<_> = api.my_units().into_iter().filter(|u| u.kind == UnitKind::Ranger).collect();
        for ranger in rangers {
            let Some(cell) = ranger.cell() else {
                continue;
            };
            if navigator.step_toward(api, budget, ranger.id, cell, target)? {
                moved += 1;
            }
        }
        Ok(moved)
    }
}
