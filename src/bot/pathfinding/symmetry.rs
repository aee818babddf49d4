use serde::{Deserialize, Serialize};
use tracing::info;
use crate::bot::grid::Grid;
use super::types::Symmetry;

/// Which symmetry classes the passability grid satisfies.
///
/// A grid may satisfy several at once (a plain open field satisfies all
/// three). Computed once per match and never changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetryFlags {
    pub vertical: bool,
    pub horizontal: bool,
    pub rotational: bool,
}

impl SymmetryFlags {
    /// Compare every cell to its image under each class. O(width × height).
    pub fn detect(grid: &Grid) -> Self {
        let mut flags = SymmetryFlags { vertical: true, horizontal: true, rotational: true };

        for cell in grid.cells() {
            let passable = grid.is_passable(cell);
            for symmetry in Symmetry::ALL {
                if !flags.holds(symmetry) {
                    continue;
                }
                let image = symmetry.mirror_cell(cell, grid.width(), grid.height());
                if grid.is_passable(image) != passable {
                    flags.set(symmetry, false);
                }
            }
            if flags.none() {
                break;
            }
        }

        info!(
            "[NAV] Symmetry: vertical={} horizontal={} rotational={}",
            flags.vertical, flags.horizontal, flags.rotational
        );
        flags
    }

    pub fn holds(&self, symmetry: Symmetry) -> bool {
        match symmetry {
            Symmetry::Vertical => self.vertical,
            Symmetry::Horizontal => self.horizontal,
            Symmetry::Rotational => self.rotational,
        }
    }

    fn set(&mut self, symmetry: Symmetry, value: bool) {
        match symmetry {
            Symmetry::Vertical => self.vertical = value,
            Symmetry::Horizontal => self.horizontal = value,
            Symmetry::Rotational => self.rotational = value,
        }
    }

    pub fn none(&self) -> bool {
        !(self.vertical || self.horizontal || self.rotational)
    }

    /// Holding classes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Symmetry> + '_ {
        Symmetry::ALL.into_iter().filter(move |s| self.holds(*s))
    }
}
