use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use tracing::debug;
use lodestar_macros::profile;
use crate::bot::grid::{Cell, Grid};
use super::symmetry::SymmetryFlags;
use super::types::{Direction, Symmetry, UNREACHABLE};

/// Per-target navigation field built by breadth-first flood fill.
///
/// Every reachable cell stores the direction of one step toward the target
/// and its hop distance; the target itself stores `Center` at distance 0.
/// Cells the flood never reached store no direction.
///
/// # Algorithm
///
/// 1. **Flood fill:** BFS from the target over passable cells, 8-connected,
///    uniform step cost
/// 2. **Direction field:** each newly reached cell points back at the cell
///    it was reached from
/// 3. **Distance field:** parent distance + 1
///
/// # Performance
///
/// - **Generation:** O(width × height), once per unique target
/// - **Query:** O(1) array lookup
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavMap {
    pub width: usize,
    pub height: usize,
    pub target: Cell,
    pub direction_field: Vec<Option<Direction>>,
    pub distance_field: Vec<u32>,
}

impl NavMap {
    fn new(width: usize, height: usize, target: Cell) -> Self {
        let size = width * height;
        let mut map = Self {
            width,
            height,
            target,
            direction_field: vec![None; size],
            distance_field: vec![UNREACHABLE; size],
        };
        map.set(target, Direction::Center, 0);
        map
    }

    pub fn get_index(&self, cell: Cell) -> Option<usize> {
        if cell.x < 0 || cell.y < 0 || cell.x as usize >= self.width || cell.y as usize >= self.height {
            return None;
        }
        Some(cell.y as usize * self.width + cell.x as usize)
    }

    fn set(&mut self, cell: Cell, dir: Direction, dist: u32) {
        if let Some(idx) = self.get_index(cell) {
            self.direction_field[idx] = Some(dir);
            self.distance_field[idx] = dist;
        }
    }

    /// Step toward the target from `cell`. `Some(Center)` at the target,
    /// `None` where the target cannot be reached.
    pub fn direction(&self, cell: Cell) -> Option<Direction> {
        self.get_index(cell).and_then(|idx| self.direction_field[idx])
    }

    pub fn distance(&self, cell: Cell) -> Option<u32> {
        self.get_index(cell)
            .map(|idx| self.distance_field[idx])
            .filter(|d| *d != UNREACHABLE)
    }

    /// The cell reached by following the field `steps` times from `from`
    /// without moving. Stops early at the target or where the field ends.
    pub fn lookahead(&self, from: Cell, steps: u32) -> Cell {
        let mut cell = from;
        for _ in 0..steps {
            match self.direction(cell) {
                Some(dir) if dir != Direction::Center => cell = cell.step(dir),
                _ => break,
            }
        }
        cell
    }
}

/// Lazily built, memoised navigation maps for one battlefield.
///
/// Owns the terrain and its symmetry flags for the lifetime of a match. When
/// the terrain is symmetric, one flood fill also yields the maps for the
/// target's mirror images: each discovered (direction, distance) pair is
/// transformed and written into the partner map, no second search is run.
pub struct NavMapCache {
    grid: Grid,
    symmetry: SymmetryFlags,
    maps: FxHashMap<Cell, NavMap>,
    flood_fills: usize,
}

impl NavMapCache {
    pub fn new(grid: Grid) -> Self {
        let symmetry = SymmetryFlags::detect(&grid);
        Self::with_symmetry(grid, symmetry)
    }

    /// Use the given flags instead of detecting them. Flags that the terrain
    /// does not actually satisfy produce wrong partner maps.
    pub fn with_symmetry(grid: Grid, symmetry: SymmetryFlags) -> Self {
        Self { grid, symmetry, maps: FxHashMap::default(), flood_fills: 0 }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn symmetry(&self) -> SymmetryFlags {
        self.symmetry
    }

    pub fn get(&self, target: Cell) -> Option<&NavMap> {
        self.maps.get(&target)
    }

    pub fn contains(&self, target: Cell) -> bool {
        self.maps.contains_key(&target)
    }

    /// Number of cached maps, derived ones included.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Number of flood fills actually run.
    pub fn flood_fill_count(&self) -> usize {
        self.flood_fills
    }

    /// Map toward `target`, building it on first use.
    /// `None` only for a target outside the grid.
    pub fn ensure_map(&mut self, target: Cell) -> Option<&NavMap> {
        if !self.grid.in_bounds(target) {
            return None;
        }
        if !self.maps.contains_key(&target) {
            self.build(target);
        }
        self.maps.get(&target)
    }

    #[profile(2)]
    fn build(&mut self, target: Cell) {
        let width = self.grid.width();
        let height = self.grid.height();

        let mut primary = NavMap::new(width, height, target);
        let mut partners: SmallVec<[(Symmetry, NavMap); 3]> = SmallVec::new();
        for symmetry in self.symmetry.iter() {
            let image = symmetry.mirror_cell(target, width, height);
            if image == target
                || self.maps.contains_key(&image)
                || partners.iter().any(|(_, map)| map.target == image)
            {
                continue;
            }
            partners.push((symmetry, NavMap::new(width, height, image)));
        }

        let mut reached = 1usize;
        let mut queue = VecDeque::new();
        queue.push_back(target);

        while let Some(current) = queue.pop_front() {
            let current_dist = primary.distance(current).unwrap_or(0);

            for dir in Direction::FLOOD_ORDER {
                let adj = current.step(dir);
                if !self.grid.is_passable(adj) {
                    continue;
                }
                let Some(idx) = primary.get_index(adj) else {
                    continue;
                };
                if primary.direction_field[idx].is_some() {
                    continue;
                }

                let nav_dir = dir.opposite();
                let dist = current_dist + 1;
                primary.direction_field[idx] = Some(nav_dir);
                primary.distance_field[idx] = dist;

                for (symmetry, partner) in partners.iter_mut() {
                    let image = symmetry.mirror_cell(adj, width, height);
                    partner.set(image, nav_dir.mirror(*symmetry), dist);
                }

                reached += 1;
                queue.push_back(adj);
            }
        }

        self.flood_fills += 1;
        debug!(
            "[NAV] Flood fill toward {:?} reached {} cells, derived {} symmetric maps",
            target,
            reached,
            partners.len()
        );

        self.maps.insert(target, primary);
        for (_, partner) in partners {
            self.maps.insert(partner.target, partner);
        }
    }
}
