use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::{debug, info};
use crate::bot::action::{ActionError, ActionInterface, Placement, Team, UnitId, UnitInfo, UnitKind};
use crate::bot::config::SimConfig;
use crate::bot::grid::{Cell, Grid};
use crate::bot::pathfinding::Direction;
use super::map::MapData;
use super::spatial_hash::SpatialHash;

const SPATIAL_BUCKET: i32 = 4;

#[derive(Clone, Debug)]
pub struct SimUnit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub team: Team,
    pub placement: Placement,
    pub work_done: u32,
    pub complete: bool,
    /// Kind being produced and turns until it is ready.
    pub production: Option<(UnitKind, u32)>,
    pub garrison: Vec<UnitId>,
    pub moved: bool,
    pub acted: bool,
}

impl SimUnit {
    fn info(&self, capacity: usize) -> UnitInfo {
        UnitInfo {
            id: self.id,
            kind: self.kind,
            team: self.team,
            placement: self.placement,
            complete: self.complete,
            producing: self.production.is_some(),
            garrison: self.garrison.len(),
            capacity: if self.kind.is_structure() { capacity } else { 0 },
        }
    }

    fn cell(&self) -> Option<Cell> {
        match self.placement {
            Placement::OnGrid(cell) => Some(cell),
            _ => None,
        }
    }
}

/// Headless engine for running the bot without the real game.
///
/// Rules are a small subset of the real ones: each robot may move once and
/// act once per turn, structures are built by accumulating work, factories
/// produce into their own garrison and rockets remove everything they carry
/// when launched. Enemy units are inert obstacles.
pub struct SimWorld {
    config: SimConfig,
    grid: Grid,
    resources: Vec<u32>,
    units: BTreeMap<UnitId, SimUnit>,
    occupancy: FxHashMap<Cell, UnitId>,
    spatial: SpatialHash,
    enemy_starts: Vec<Cell>,
    next_id: UnitId,
    turn: u32,
    stockpile: u32,
    harvested: u64,
    launched: usize,
}

impl SimWorld {
    pub fn new(grid: Grid, config: SimConfig) -> Self {
        let resources = grid.resources().to_vec();
        let spatial = SpatialHash::new(grid.width(), grid.height(), SPATIAL_BUCKET);
        Self {
            stockpile: config.starting_stockpile,
            config,
            grid,
            resources,
            units: BTreeMap::new(),
            occupancy: FxHashMap::default(),
            spatial,
            enemy_starts: Vec::new(),
            next_id: 1,
            turn: 1,
            harvested: 0,
            launched: 0,
        }
    }

    /// World with one friendly worker per friendly start and one inert enemy
    /// worker per enemy start.
    pub fn from_map(map: &MapData, config: SimConfig) -> Self {
        let mut world = Self::new(map.grid.clone(), config);
        world.enemy_starts = map.enemy_starts.clone();
        for cell in &map.friendly_starts {
            world.spawn_unit(UnitKind::Worker, Team::Friendly, *cell);
        }
        for cell in &map.enemy_starts {
            world.spawn_unit(UnitKind::Worker, Team::Enemy, *cell);
        }
        info!(
            "[SIM] World ready: {} friendly, {} enemy units",
            map.friendly_starts.len(),
            map.enemy_starts.len()
        );
        world
    }

    pub fn set_enemy_starts(&mut self, cells: Vec<Cell>) {
        self.enemy_starts = cells;
    }

    /// Place a unit directly. Structures are placed complete.
    /// `None` if the cell is blocked or occupied.
    pub fn spawn_unit(&mut self, kind: UnitKind, team: Team, cell: Cell) -> Option<UnitId> {
        if !self.is_free(cell) {
            return None;
        }
        let id = self.insert_unit(kind, team, cell, kind.is_structure());
        if let Some(unit) = self.units.get_mut(&id) {
            unit.work_done = self.config.structure_work;
        }
        Some(id)
    }

    fn insert_unit(&mut self, kind: UnitKind, team: Team, cell: Cell, complete: bool) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        self.units.insert(
            id,
            SimUnit {
                id,
                kind,
                team,
                placement: Placement::OnGrid(cell),
                work_done: 0,
                complete,
                production: None,
                garrison: Vec::new(),
                moved: false,
                acted: false,
            },
        );
        self.occupancy.insert(cell, id);
        self.spatial.insert(id, cell);
        id
    }

    /// Remove a unit as if it were destroyed.
    pub fn destroy_unit(&mut self, id: UnitId) {
        let Some(unit) = self.units.remove(&id) else {
            return;
        };
        if let Some(cell) = unit.cell() {
            self.occupancy.remove(&cell);
            self.spatial.remove(id, cell);
        }
        if let Placement::Garrisoned(holder) = unit.placement {
            if let Some(structure) = self.units.get_mut(&holder) {
                structure.garrison.retain(|u| *u != id);
            }
        }
        for passenger in unit.garrison {
            self.units.remove(&passenger);
        }
    }

    pub fn set_stockpile(&mut self, amount: u32) {
        self.stockpile = amount;
    }

    pub fn set_resource(&mut self, cell: Cell, amount: u32) {
        if let Some(idx) = self.grid.index(cell) {
            self.resources[idx] = amount;
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn units(&self) -> impl Iterator<Item = &SimUnit> {
        self.units.values()
    }

    pub fn count(&self, team: Team, kind: UnitKind) -> usize {
        self.units.values().filter(|u| u.team == team && u.kind == kind).count()
    }

    pub fn total_harvested(&self) -> u64 {
        self.harvested
    }

    pub fn launched_units(&self) -> usize {
        self.launched
    }

    pub fn remaining_resources(&self) -> u64 {
        self.resources.iter().map(|r| *r as u64).sum()
    }

    /// Advance production, refresh per-turn action flags and pay income.
    pub fn end_turn(&mut self) {
        let factories: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.production.is_some())
            .map(|u| u.id)
            .collect();

        for factory_id in factories {
            let ready = {
                let Some(factory) = self.units.get_mut(&factory_id) else {
                    continue;
                };
                let Some((kind, turns)) = factory.production.as_mut() else {
                    continue;
                };
                *turns = turns.saturating_sub(1);
                if *turns == 0 && factory.garrison.len() < self.config.garrison_capacity {
                    Some(*kind)
                } else {
                    None
                }
            };
            if let Some(kind) = ready {
                let id = self.next_id;
                self.next_id += 1;
                self.units.insert(
                    id,
                    SimUnit {
                        id,
                        kind,
                        team: Team::Friendly,
                        placement: Placement::Garrisoned(factory_id),
                        work_done: 0,
                        complete: true,
                        production: None,
                        garrison: Vec::new(),
                        moved: false,
                        acted: false,
                    },
                );
                if let Some(factory) = self.units.get_mut(&factory_id) {
                    factory.garrison.push(id);
                    factory.production = None;
                }
                debug!("[SIM] Factory {} finished {:?} {}", factory_id, kind, id);
            }
        }

        for unit in self.units.values_mut() {
            unit.moved = false;
            unit.acted = false;
        }
        self.stockpile = self.stockpile.saturating_add(self.config.passive_income);
        self.turn += 1;
    }

    fn is_free(&self, cell: Cell) -> bool {
        self.grid.is_passable(cell) && !self.occupancy.contains_key(&cell)
    }

    fn friendly(&self, id: UnitId) -> Option<&SimUnit> {
        self.units.get(&id).filter(|u| u.team == Team::Friendly)
    }

    /// Friendly worker on the grid that has not acted this turn.
    fn ready_worker(&self, id: UnitId) -> Option<Cell> {
        let unit = self.friendly(id)?;
        if unit.kind != UnitKind::Worker || unit.acted {
            return None;
        }
        unit.cell()
    }

    fn completed_structure(&self, id: UnitId) -> Option<(&SimUnit, Cell)> {
        let unit = self.friendly(id)?;
        if !unit.kind.is_structure() || !unit.complete {
            return None;
        }
        Some((unit, unit.cell()?))
    }

    fn structure_cost(&self, kind: UnitKind) -> u32 {
        match kind {
            UnitKind::Factory => self.config.factory_cost,
            UnitKind::Rocket => self.config.rocket_cost,
            UnitKind::Ranger => self.config.ranger_cost,
            UnitKind::Worker => self.config.worker_cost,
        }
    }

    fn relocate(&mut self, id: UnitId, from: Cell, to: Cell) {
        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        self.spatial.relocate(id, from, to);
    }

    fn illegal(unit: UnitId, action: &'static str) -> ActionError {
        ActionError::Illegal { unit, action }
    }
}

impl ActionInterface for SimWorld {
    fn starting_map(&self) -> Grid {
        self.grid.clone()
    }

    fn enemy_starting_cells(&self) -> Vec<Cell> {
        self.enemy_starts.clone()
    }

    fn turn(&self) -> u32 {
        self.turn
    }

    fn time_left_ms(&self) -> u64 {
        self.config.reported_time_ms
    }

    fn stockpile(&self) -> u32 {
        self.stockpile
    }

    fn can_sense(&self, cell: Cell) -> bool {
        self.grid.in_bounds(cell)
            && self
                .spatial
                .query_radius(cell, self.config.vision_radius_sq)
                .iter()
                .any(|(id, _)| self.units.get(id).is_some_and(|u| u.team == Team::Friendly))
    }

    fn resource_at(&self, cell: Cell) -> u32 {
        self.grid.index(cell).map_or(0, |idx| self.resources[idx])
    }

    fn my_units(&self) -> Vec<UnitInfo> {
        self.units
            .values()
            .filter(|u| u.team == Team::Friendly)
            .map(|u| u.info(self.config.garrison_capacity))
            .collect()
    }

    fn unit(&self, id: UnitId) -> Option<UnitInfo> {
        self.units.get(&id).map(|u| u.info(self.config.garrison_capacity))
    }

    fn unit_at(&self, cell: Cell) -> Option<UnitId> {
        self.occupancy.get(&cell).copied()
    }

    fn nearby_units(&self, center: Cell, radius_sq: i64, team: Team, kind: Option<UnitKind>) -> Vec<UnitInfo> {
        self.spatial
            .query_radius(center, radius_sq)
            .into_iter()
            .filter_map(|(id, _)| self.units.get(&id))
            .filter(|u| u.team == team && kind.map_or(true, |k| u.kind == k))
            .map(|u| u.info(self.config.garrison_capacity))
            .collect()
    }

    fn can_move(&self, unit: UnitId, dir: Direction) -> bool {
        let Some(u) = self.friendly(unit) else {
            return false;
        };
        if u.kind.is_structure() || u.moved || dir == Direction::Center {
            return false;
        }
        u.cell().is_some_and(|cell| self.is_free(cell.step(dir)))
    }

    fn can_harvest(&self, worker: UnitId, dir: Direction) -> bool {
        self.ready_worker(worker)
            .is_some_and(|cell| self.resource_at(cell.step(dir)) > 0)
    }

    fn can_build(&self, worker: UnitId, structure: UnitId) -> bool {
        let Some(cell) = self.ready_worker(worker) else {
            return false;
        };
        self.friendly(structure).is_some_and(|s| {
            s.kind.is_structure() && !s.complete && s.cell().is_some_and(|c| c.is_adjacent_to(cell))
        })
    }

    fn can_blueprint(&self, worker: UnitId, kind: UnitKind, dir: Direction) -> bool {
        let Some(cell) = self.ready_worker(worker) else {
            return false;
        };
        kind.is_structure()
            && dir != Direction::Center
            && self.is_free(cell.step(dir))
            && self.stockpile >= self.structure_cost(kind)
    }

    fn can_replicate(&self, worker: UnitId, dir: Direction) -> bool {
        let Some(cell) = self.ready_worker(worker) else {
            return false;
        };
        dir != Direction::Center && self.is_free(cell.step(dir)) && self.stockpile >= self.config.replicate_cost
    }

    fn can_load(&self, structure: UnitId, unit: UnitId) -> bool {
        let Some((s, s_cell)) = self.completed_structure(structure) else {
            return false;
        };
        if s.garrison.len() >= self.config.garrison_capacity {
            return false;
        }
        self.friendly(unit).is_some_and(|u| {
            !u.kind.is_structure() && !u.moved && u.cell().is_some_and(|c| c.is_adjacent_to(s_cell))
        })
    }

    fn can_unload(&self, structure: UnitId, dir: Direction) -> bool {
        let Some((s, s_cell)) = self.completed_structure(structure) else {
            return false;
        };
        !s.garrison.is_empty() && dir != Direction::Center && self.is_free(s_cell.step(dir))
    }

    fn can_produce(&self, factory: UnitId, kind: UnitKind) -> bool {
        let Some((f, _)) = self.completed_structure(factory) else {
            return false;
        };
        f.kind == UnitKind::Factory
            && f.production.is_none()
            && !kind.is_structure()
            && self.stockpile >= self.structure_cost(kind)
    }

    fn can_launch(&self, rocket: UnitId) -> bool {
        self.completed_structure(rocket)
            .is_some_and(|(r, _)| r.kind == UnitKind::Rocket && !r.garrison.is_empty())
    }

    fn move_unit(&mut self, unit: UnitId, dir: Direction) -> Result<(), ActionError> {
        if !self.can_move(unit, dir) {
            return Err(Self::illegal(unit, "move"));
        }
        let u = self.units.get_mut(&unit).ok_or(ActionError::UnknownUnit(unit))?;
        let Placement::OnGrid(from) = u.placement else {
            return Err(Self::illegal(unit, "move"));
        };
        let to = from.step(dir);
        u.placement = Placement::OnGrid(to);
        u.moved = true;
        self.relocate(unit, from, to);
        Ok(())
    }

    fn harvest(&mut self, worker: UnitId, dir: Direction) -> Result<(), ActionError> {
        if !self.can_harvest(worker, dir) {
            return Err(Self::illegal(worker, "harvest"));
        }
        let cell = self.ready_worker(worker).ok_or(ActionError::UnknownUnit(worker))?;
        let Some(idx) = self.grid.index(cell.step(dir)) else {
            return Err(Self::illegal(worker, "harvest"));
        };
        let taken = self.resources[idx].min(self.config.harvest_amount);
        self.resources[idx] -= taken;
        self.stockpile = self.stockpile.saturating_add(taken);
        self.harvested += taken as u64;
        if let Some(u) = self.units.get_mut(&worker) {
            u.acted = true;
        }
        Ok(())
    }

    fn build(&mut self, worker: UnitId, structure: UnitId) -> Result<(), ActionError> {
        if !self.can_build(worker, structure) {
            return Err(Self::illegal(worker, "build"));
        }
        let needed = self.config.structure_work;
        let amount = self.config.build_per_action;
        let s = self.units.get_mut(&structure).ok_or(ActionError::UnknownUnit(structure))?;
        s.work_done = (s.work_done + amount).min(needed);
        if s.work_done >= needed {
            s.complete = true;
            debug!("[SIM] {:?} {} completed", s.kind, structure);
        }
        if let Some(u) = self.units.get_mut(&worker) {
            u.acted = true;
        }
        Ok(())
    }

    fn blueprint(&mut self, worker: UnitId, kind: UnitKind, dir: Direction) -> Result<UnitId, ActionError> {
        if !self.can_blueprint(worker, kind, dir) {
            return Err(Self::illegal(worker, "blueprint"));
        }
        let cell = self.ready_worker(worker).ok_or(ActionError::UnknownUnit(worker))?;
        self.stockpile -= self.structure_cost(kind);
        let id = self.insert_unit(kind, Team::Friendly, cell.step(dir), false);
        if let Some(u) = self.units.get_mut(&worker) {
            u.acted = true;
        }
        Ok(id)
    }

    fn replicate(&mut self, worker: UnitId, dir: Direction) -> Result<UnitId, ActionError> {
        if !self.can_replicate(worker, dir) {
            return Err(Self::illegal(worker, "replicate"));
        }
        let cell = self.ready_worker(worker).ok_or(ActionError::UnknownUnit(worker))?;
        self.stockpile -= self.config.replicate_cost;
        let id = self.insert_unit(UnitKind::Worker, Team::Friendly, cell.step(dir), true);
        if let Some(u) = self.units.get_mut(&worker) {
            u.acted = true;
        }
        if let Some(child) = self.units.get_mut(&id) {
            child.moved = true;
            child.acted = true;
        }
        Ok(id)
    }

    fn load(&mut self, structure: UnitId, unit: UnitId) -> Result<(), ActionError> {
        if !self.can_load(structure, unit) {
            return Err(Self::illegal(unit, "load"));
        }
        let u = self.units.get_mut(&unit).ok_or(ActionError::UnknownUnit(unit))?;
        let Placement::OnGrid(cell) = u.placement else {
            return Err(Self::illegal(unit, "load"));
        };
        u.placement = Placement::Garrisoned(structure);
        u.moved = true;
        self.occupancy.remove(&cell);
        self.spatial.remove(unit, cell);
        if let Some(s) = self.units.get_mut(&structure) {
            s.garrison.push(unit);
        }
        Ok(())
    }

    fn unload(&mut self, structure: UnitId, dir: Direction) -> Result<UnitId, ActionError> {
        if !self.can_unload(structure, dir) {
            return Err(Self::illegal(structure, "unload"));
        }
        let s = self.units.get_mut(&structure).ok_or(ActionError::UnknownUnit(structure))?;
        let Placement::OnGrid(s_cell) = s.placement else {
            return Err(Self::illegal(structure, "unload"));
        };
        let passenger = s.garrison.remove(0);
        let to = s_cell.step(dir);
        if let Some(u) = self.units.get_mut(&passenger) {
            u.placement = Placement::OnGrid(to);
            u.moved = true;
        }
        self.occupancy.insert(to, passenger);
        self.spatial.insert(passenger, to);
        Ok(passenger)
    }

    fn produce(&mut self, factory: UnitId, kind: UnitKind) -> Result<(), ActionError> {
        if !self.can_produce(factory, kind) {
            return Err(Self::illegal(factory, "produce"));
        }
        self.stockpile -= self.structure_cost(kind);
        let turns = self.config.production_turns.max(1);
        let f = self.units.get_mut(&factory).ok_or(ActionError::UnknownUnit(factory))?;
        f.production = Some((kind, turns));
        Ok(())
    }

    fn launch(&mut self, rocket: UnitId) -> Result<(), ActionError> {
        if !self.can_launch(rocket) {
            return Err(Self::illegal(rocket, "launch"));
        }
        let passengers = self.units.get(&rocket).map_or(0, |r| r.garrison.len());
        self.destroy_unit(rocket);
        self.launched += passengers;
        info!("[SIM] Rocket {} launched with {} passengers", rocket, passengers);
        Ok(())
    }
}
