//! Turn-based unit controller: navigation, pod tasking and the engine boundary.
//!
//! A [`Bot`] is created once per match from the engine's starting map and is
//! then asked for one decision pass per turn through [`Bot::take_turn`].

pub mod action;
pub mod config;
pub mod fixed_math;
pub mod grid;
pub mod pathfinding;
pub mod player;
pub mod pods;
pub mod rally;
pub mod sim;
pub mod structures;
pub mod time_budget;

pub use action::{ActionError, ActionInterface, Placement, Team, UnitId, UnitInfo, UnitKind};
pub use config::BotConfig;
pub use grid::{Cell, Grid};
pub use player::{Bot, TurnReport};
pub use time_budget::TimeBudget;
