use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};
use crate::bot::pathfinding::Direction;

/// A grid coordinate. `x` grows east, `y` grows north.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `dir` (the cell itself for `Center`).
    pub fn step(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.offset();
        Cell::new(self.x + dx, self.y + dy)
    }

    pub fn distance_squared_to(self, other: Cell) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Number of king moves between the two cells on an open grid.
    pub fn chebyshev_to(self, other: Cell) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn is_adjacent_to(self, other: Cell) -> bool {
        self.chebyshev_to(other) <= 1
    }

    /// General compass heading from `self` toward `other` (sign of each axis).
    /// `Center` when both cells coincide.
    pub fn direction_to(self, other: Cell) -> Direction {
        let dx = (other.x - self.x).signum();
        let dy = (other.y - self.y).signum();
        Direction::from_offset(dx, dy).unwrap_or(Direction::Center)
    }
}

/// Immutable battlefield terrain: passability and initial resource stock per cell.
///
/// Stored row-major with `index = y * width + x`. Built once per match from the
/// engine's starting map and never mutated afterwards; live resource knowledge
/// is tracked separately by the pod manager.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    passable: FixedBitSet,
    resources: Vec<u32>,
}

impl Grid {
    pub fn new(width: usize, height: usize, passable: FixedBitSet, resources: Vec<u32>) -> Self {
        let size = width * height;
        let mut passable = passable;
        passable.grow(size);
        let mut resources = resources;
        resources.resize(size, 0);
        Self { width, height, passable, resources }
    }

    /// Fully passable grid without resources.
    pub fn open(width: usize, height: usize) -> Self {
        let mut passable = FixedBitSet::with_capacity(width * height);
        passable.insert_range(..);
        Self::new(width, height, passable, vec![0; width * height])
    }

    /// Parse a grid from text rows, first row is the northernmost (`y = height - 1`).
    ///
    /// `#` is impassable, `.` is open ground and `1`-`9` is open ground holding
    /// that many tens of resource units. Short rows are padded with open ground.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut passable = FixedBitSet::with_capacity(width * height);
        let mut resources = vec![0; width * height];

        for (row_idx, row) in rows.iter().enumerate() {
            let y = height - 1 - row_idx;
            let mut chars = row.chars();
            for x in 0..width {
                let idx = y * width + x;
                match chars.next() {
                    Some('#') => {}
                    Some(c) if c.is_ascii_digit() => {
                        passable.insert(idx);
                        resources[idx] = c.to_digit(10).unwrap_or(0) * 10;
                    }
                    _ => passable.insert(idx),
                }
            }
        }

        Self::new(width, height, passable, resources)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// Row-major index of an in-bounds cell.
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        Cell::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Out-of-bounds cells are impassable.
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|idx| self.passable[idx])
    }

    pub fn initial_resources(&self, cell: Cell) -> u32 {
        self.index(cell).map_or(0, |idx| self.resources[idx])
    }

    pub fn passable_bits(&self) -> &FixedBitSet {
        &self.passable
    }

    pub fn resources(&self) -> &[u32] {
        &self.resources
    }

    /// Iterate every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.len()).map(|idx| self.cell_at(idx))
    }

    /// Sum of resource stock over passable cells within a square of `radius`
    /// around `center`, reading stock from `stock` (row-major, same layout).
    pub fn density(&self, stock: &[u32], center: Cell, radius: i32) -> u64 {
        let mut value = 0u64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let cell = Cell::new(center.x + dx, center.y + dy);
                if let Some(idx) = self.index(cell) {
                    if self.passable[idx] {
                        value += stock[idx] as u64;
                    }
                }
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ascii_orientation() {
        let grid = Grid::from_ascii(&[
            "#..",
            "..5",
        ]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        // First row is the top (y = 1)
        assert!(!grid.is_passable(Cell::new(0, 1)));
        assert!(grid.is_passable(Cell::new(0, 0)));
        assert_eq!(grid.initial_resources(Cell::new(2, 0)), 50);
        assert!(!grid.is_passable(Cell::new(3, 0)), "out of bounds is impassable");
    }

    #[test]
    fn test_direction_to_uses_axis_signs() {
        let origin = Cell::new(2, 2);
        assert_eq!(origin.direction_to(Cell::new(2, 2)), Direction::Center);
        assert_eq!(origin.direction_to(Cell::new(9, 3)), Direction::NorthEast);
        assert_eq!(origin.direction_to(Cell::new(2, -4)), Direction::South);
        assert_eq!(origin.step(Direction::West), Cell::new(1, 2));
    }

    #[test]
    fn test_density_skips_walls_and_edges() {
        let grid = Grid::from_ascii(&[
            "1#1",
            "111",
            "111",
        ]);
        let stock = grid.resources().to_vec();
        assert_eq!(grid.density(&stock, Cell::new(1, 1), 1), 80);
        assert_eq!(grid.density(&stock, Cell::new(0, 0), 1), 40);
    }
}
