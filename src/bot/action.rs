//! Boundary to the game engine.
//!
//! The controller never touches engine state directly. It reads percepts and
//! issues commands through [`ActionInterface`], always asking the matching
//! `can_*` legality check before committing. A commit that fails after its
//! check passed is a contract violation by the engine and surfaces as an
//! [`ActionError`] at the turn boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::bot::grid::{Cell, Grid};
use crate::bot::pathfinding::Direction;

pub type UnitId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Mobile unit that harvests, builds, lays foundations and spawns copies of itself.
    Worker,
    /// Production structure.
    Factory,
    /// Transport structure that can be loaded and launched.
    Rocket,
    /// Combat unit produced by factories.
    Ranger,
}

impl UnitKind {
    pub fn is_structure(self) -> bool {
        matches!(self, UnitKind::Factory | UnitKind::Rocket)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Friendly,
    Enemy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    OnGrid(Cell),
    /// Inside the structure with the given id.
    Garrisoned(UnitId),
    Removed,
}

/// Snapshot of a unit as reported by the engine this turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub id: UnitId,
    pub kind: UnitKind,
    pub team: Team,
    pub placement: Placement,
    /// Structures only: foundation finished.
    pub complete: bool,
    /// Factories only: a unit is currently being produced.
    pub producing: bool,
    /// Structures only: number of units inside.
    pub garrison: usize,
    /// Structures only: most units it can hold.
    pub capacity: usize,
}

impl UnitInfo {
    pub fn cell(&self) -> Option<Cell> {
        match self.placement {
            Placement::OnGrid(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn is_on_grid(&self) -> bool {
        matches!(self.placement, Placement::OnGrid(_))
    }

    pub fn has_room(&self) -> bool {
        self.garrison < self.capacity
    }
}

/// A committing call the engine refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionError {
    /// The command was not legal at the moment it was committed.
    Illegal { unit: UnitId, action: &'static str },
    UnknownUnit(UnitId),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Illegal { unit, action } => {
                write!(f, "engine rejected {} for unit {}", action, unit)
            }
            ActionError::UnknownUnit(id) => write!(f, "unit {} does not exist", id),
        }
    }
}

impl std::error::Error for ActionError {}

/// Query and command surface of the game engine, scoped to one faction.
pub trait ActionInterface {
    // ------------------------------------------------------------------
    // Map and global percepts
    // ------------------------------------------------------------------

    /// Terrain and initial resource stock of the battlefield.
    fn starting_map(&self) -> Grid;
    /// Cells enemy units occupied at the start of the match.
    fn enemy_starting_cells(&self) -> Vec<Cell>;
    fn turn(&self) -> u32;
    /// Compute time the engine still grants this faction, in milliseconds.
    fn time_left_ms(&self) -> u64;
    /// Faction resource stockpile.
    fn stockpile(&self) -> u32;

    fn can_sense(&self, cell: Cell) -> bool;
    /// Remaining resource at a cell. Only meaningful when `can_sense` is true.
    fn resource_at(&self, cell: Cell) -> u32;

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Every friendly unit, including garrisoned ones.
    fn my_units(&self) -> Vec<UnitInfo>;
    /// `None` once the unit has been destroyed or left the battlefield.
    fn unit(&self, id: UnitId) -> Option<UnitInfo>;
    fn unit_at(&self, cell: Cell) -> Option<UnitId>;
    /// On-grid units of `team` within `radius_sq` of `center`, optionally of one kind.
    fn nearby_units(&self, center: Cell, radius_sq: i64, team: Team, kind: Option<UnitKind>) -> Vec<UnitInfo>;

    // ------------------------------------------------------------------
    // Legality checks
    // ------------------------------------------------------------------

    fn can_move(&self, unit: UnitId, dir: Direction) -> bool;
    fn can_harvest(&self, worker: UnitId, dir: Direction) -> bool;
    fn can_build(&self, worker: UnitId, structure: UnitId) -> bool;
    fn can_blueprint(&self, worker: UnitId, kind: UnitKind, dir: Direction) -> bool;
    fn can_replicate(&self, worker: UnitId, dir: Direction) -> bool;
    fn can_load(&self, structure: UnitId, unit: UnitId) -> bool;
    fn can_unload(&self, structure: UnitId, dir: Direction) -> bool;
    fn can_produce(&self, factory: UnitId, kind: UnitKind) -> bool;
    fn can_launch(&self, rocket: UnitId) -> bool;

    // ------------------------------------------------------------------
    // Commits
    // ------------------------------------------------------------------

    fn move_unit(&mut self, unit: UnitId, dir: Direction) -> Result<(), ActionError>;
    fn harvest(&mut self, worker: UnitId, dir: Direction) -> Result<(), ActionError>;
    fn build(&mut self, worker: UnitId, structure: UnitId) -> Result<(), ActionError>;
    /// Lay a foundation; returns the new structure's id.
    fn blueprint(&mut self, worker: UnitId, kind: UnitKind, dir: Direction) -> Result<UnitId, ActionError>;
    /// Spawn a copy of `worker`; returns the new unit's id.
    fn replicate(&mut self, worker: UnitId, dir: Direction) -> Result<UnitId, ActionError>;
    fn load(&mut self, structure: UnitId, unit: UnitId) -> Result<(), ActionError>;
    /// Returns the id of the unit placed on the grid.
    fn unload(&mut self, structure: UnitId, dir: Direction) -> Result<UnitId, ActionError>;
    fn produce(&mut self, factory: UnitId, kind: UnitKind) -> Result<(), ActionError>;
    fn launch(&mut self, rocket: UnitId) -> Result<(), ActionError>;
}
