use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use crate::bot::fixed_math::FixedNum;
use crate::bot::grid::Cell;

/// Number of steps the local navigator looks ahead along the cached field.
pub const DEFAULT_LOOKAHEAD_STEPS: u32 = 3;

/// Hop distance recorded for cells a flood fill never reached.
pub const UNREACHABLE: u32 = u32::MAX;

/// Grid step directions (compass + "stay").
///
/// The discriminants follow compass order so that rotating by one step is an
/// index increment modulo 8. `Center` is the explicit "no move" outcome.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
    Center = 8,
}

impl Direction {
    /// The eight moving directions in compass order. All first-fit scans use this order.
    pub const COMPASS: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Flood-fill expansion order: diagonals first, then cardinals.
    pub const FLOOD_ORDER: [Direction; 8] = [
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Every direction a worker may act in, including its own cell.
    pub const WITH_CENTER: [Direction; 9] = [
        Direction::Center,
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    #[inline]
    pub fn as_index(self) -> usize {
        self as usize
    }

    /// (dx, dy) offset of one step. North is +y.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::NorthEast => (1, 1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, -1),
            Direction::South => (0, -1),
            Direction::SouthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, 1),
            Direction::Center => (0, 0),
        }
    }

    /// Direction whose offset is exactly `(dx, dy)`, each component in -1..=1.
    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, 1) => Some(Direction::North),
            (1, 1) => Some(Direction::NorthEast),
            (1, 0) => Some(Direction::East),
            (1, -1) => Some(Direction::SouthEast),
            (0, -1) => Some(Direction::South),
            (-1, -1) => Some(Direction::SouthWest),
            (-1, 0) => Some(Direction::West),
            (-1, 1) => Some(Direction::NorthWest),
            (0, 0) => Some(Direction::Center),
            _ => None,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::NorthEast | Direction::SouthEast | Direction::SouthWest | Direction::NorthWest
        )
    }

    pub fn opposite(self) -> Direction {
        self.rotate(4)
    }

    /// Rotate clockwise by `steps` eighths of a turn (negative is counter-clockwise).
    /// `Center` does not rotate.
    pub fn rotate(self, steps: i32) -> Direction {
        if self == Direction::Center {
            return self;
        }
        let idx = (self.as_index() as i32 + steps).rem_euclid(8) as usize;
        Direction::COMPASS[idx]
    }

    /// Deviation candidates around `self`, nearest angular deviation first:
    /// -1, +1, -2, +2 compass steps.
    pub fn deviations(self) -> [Direction; 4] {
        [self.rotate(-1), self.rotate(1), self.rotate(-2), self.rotate(2)]
    }

    /// Image of this direction under a grid symmetry.
    pub fn mirror(self, symmetry: Symmetry) -> Direction {
        let (dx, dy) = self.offset();
        let (mx, my) = match symmetry {
            Symmetry::Vertical => (dx, -dy),
            Symmetry::Horizontal => (-dx, dy),
            Symmetry::Rotational => (-dx, -dy),
        };
        // Offsets stay within -1..=1 so this always resolves.
        Direction::from_offset(mx, my).unwrap_or(Direction::Center)
    }
}

/// The three symmetry classes a battlefield may satisfy.
///
/// - `Vertical`: rows mirrored, `(x, y) -> (x, H-1-y)`
/// - `Horizontal`: columns mirrored, `(x, y) -> (W-1-x, y)`
/// - `Rotational`: 180° rotation, `(x, y) -> (W-1-x, H-1-y)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symmetry {
    Vertical,
    Horizontal,
    Rotational,
}

impl Symmetry {
    pub const ALL: [Symmetry; 3] = [Symmetry::Vertical, Symmetry::Horizontal, Symmetry::Rotational];

    /// Image of `cell` on a `width` × `height` grid.
    pub fn mirror_cell(self, cell: Cell, width: usize, height: usize) -> Cell {
        let w = width as i32;
        let h = height as i32;
        match self {
            Symmetry::Vertical => Cell::new(cell.x, h - 1 - cell.y),
            Symmetry::Horizontal => Cell::new(w - 1 - cell.x, cell.y),
            Symmetry::Rotational => Cell::new(w - 1 - cell.x, h - 1 - cell.y),
        }
    }
}

/// Open-set entry for A*. Ordered so that `BinaryHeap` pops the lowest `f` first.
/// Ties prefer the larger `g` (the deeper node), then the smaller cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct State {
    pub f: FixedNum,
    pub g: FixedNum,
    pub cell: Cell,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| self.g.cmp(&other.g))
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
