mod types;
mod symmetry;
mod nav_map;
mod navigator;
pub mod astar;


// ============================================================================
// PUBLIC API
// ============================================================================

pub use types::{Direction, Symmetry, DEFAULT_LOOKAHEAD_STEPS, UNREACHABLE};
pub use symmetry::SymmetryFlags;
pub use nav_map::{NavMap, NavMapCache};
pub use navigator::Navigator;
