use fixedbitset::FixedBitSet;
use std::collections::VecDeque;
use tracing::debug;
use crate::bot::action::ActionInterface;
use crate::bot::grid::{Cell, Grid};
use crate::bot::pathfinding::Direction;

/// What the bot believes each cell still holds.
///
/// Starts from the initial stock of the starting map and only ever goes
/// down: every sensed cell is lowered to what the engine reports.
#[derive(Clone, Debug)]
pub struct ResourceMap {
    grid: Grid,
    stock: Vec<u32>,
}

impl ResourceMap {
    pub fn new(grid: Grid) -> Self {
        let stock = grid.resources().to_vec();
        Self { grid, stock }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn stock(&self, cell: Cell) -> u32 {
        self.grid.index(cell).map_or(0, |idx| self.stock[idx])
    }

    pub fn set_stock(&mut self, cell: Cell, amount: u32) {
        if let Some(idx) = self.grid.index(cell) {
            self.stock[idx] = amount;
        }
    }

    pub fn total(&self) -> u64 {
        self.stock.iter().map(|s| *s as u64).sum()
    }

    /// Lower known stock to the sensed value on every visible cell.
    /// Returns the number of cells whose value changed.
    pub fn refresh<A>(&mut self, api: &A) -> usize
    where
        A: ActionInterface + ?Sized,
    {
        let mut changed = 0;
        for idx in 0..self.stock.len() {
            if self.stock[idx] == 0 {
                continue;
            }
            let cell = self.grid.cell_at(idx);
            if !api.can_sense(cell) {
                continue;
            }
            let sensed = api.resource_at(cell);
            if sensed < self.stock[idx] {
                self.stock[idx] = sensed;
                changed += 1;
            }
        }
        changed
    }

    /// Known stock on passable cells of the square of `radius` around `center`.
    pub fn density(&self, center: Cell, radius: i32) -> u64 {
        self.grid.density(&self.stock, center, radius)
    }

    /// Closest cell with known stock reachable from `start`, by plain BFS
    /// over passable cells. `start` itself counts.
    pub fn nearest_deposit(&self, start: Cell) -> Option<Cell> {
        let start_idx = self.grid.index(start)?;
        let mut visited = FixedBitSet::with_capacity(self.grid.len());
        let mut queue = VecDeque::new();
        visited.insert(start_idx);
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            if self.stock(cell) > 0 {
                return Some(cell);
            }
            for dir in Direction::COMPASS {
                let adj = cell.step(dir);
                if !self.grid.is_passable(adj) {
                    continue;
                }
                let Some(idx) = self.grid.index(adj) else {
                    continue;
                };
                if !visited.put(idx) {
                    queue.push_back(adj);
                }
            }
        }

        debug!("[PODS] No reachable deposit from {:?}", start);
        None
    }
}
