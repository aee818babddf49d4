use fixedbitset::FixedBitSet;
use std::collections::BinaryHeap;
use tracing::debug;
use lodestar_macros::profile;
use crate::bot::fixed_math::{octile, step_cost, FixedNum};
use crate::bot::grid::{Cell, Grid};
use super::types::{Direction, State};

pub(super) fn heuristic(from: Cell, goal: Cell, weight: FixedNum) -> FixedNum {
    weight * octile(from.x - goal.x, from.y - goal.y)
}

/// Walk parent links back from `goal` and return the step taken out of `start`.
fn first_step_of_path(grid: &Grid, parents: &[Option<Direction>], start: Cell, goal: Cell) -> Direction {
    let mut current = goal;
    while let Some(idx) = grid.index(current) {
        let Some(dir) = parents[idx] else {
            break;
        };
        let previous = current.step(dir.opposite());
        if previous == start {
            return dir;
        }
        current = previous;
    }
    Direction::Center
}

/// Weighted A* over the 8-connected grid, returning only the first step.
///
/// `f = g + weight · h` with orthogonal steps costing 1, diagonal steps √2 and
/// `h` the octile distance. `is_open` filters cells beyond terrain passability
/// (e.g. cells occupied by other units); the goal is always enterable. The
/// rest of the path is discarded because a fresh decision is made every turn.
///
/// Returns `Center` when already at the goal or when no path exists.
#[profile]
pub fn first_step<F>(grid: &Grid, start: Cell, goal: Cell, weight: FixedNum, is_open: F) -> Direction
where
    F: Fn(Cell) -> bool,
{
    if start == goal {
        return Direction::Center;
    }
    let (Some(start_idx), Some(_)) = (grid.index(start), grid.index(goal)) else {
        return Direction::Center;
    };

    let mut g_score = vec![FixedNum::MAX; grid.len()];
    let mut parents: Vec<Option<Direction>> = vec![None; grid.len()];
    let mut closed = FixedBitSet::with_capacity(grid.len());
    let mut open_set = BinaryHeap::new();

    g_score[start_idx] = FixedNum::ZERO;
    open_set.push(State { f: heuristic(start, goal, weight), g: FixedNum::ZERO, cell: start });

    let mut expansions = 0usize;
    while let Some(State { g, cell: current, .. }) = open_set.pop() {
        let Some(current_idx) = grid.index(current) else {
            continue;
        };
        if closed[current_idx] {
            continue;
        }
        closed.insert(current_idx);
        expansions += 1;

        if current == goal {
            debug!("[ASTAR] Reached {:?} from {:?} after {} expansions", goal, start, expansions);
            return first_step_of_path(grid, &parents, start, goal);
        }

        for dir in Direction::COMPASS {
            let neighbor = current.step(dir);
            let Some(n_idx) = grid.index(neighbor) else {
                continue;
            };
            if closed[n_idx] {
                continue;
            }
            if neighbor != goal && !(grid.is_passable(neighbor) && is_open(neighbor)) {
                continue;
            }

            let tentative_g = g + step_cost(dir.is_diagonal());
            if tentative_g < g_score[n_idx] {
                g_score[n_idx] = tentative_g;
                parents[n_idx] = Some(dir);
                open_set.push(State {
                    f: tentative_g + heuristic(neighbor, goal, weight),
                    g: tentative_g,
                    cell: neighbor,
                });
            }
        }
    }

    debug!("[ASTAR] No path from {:?} to {:?} ({} expansions)", start, goal, expansions);
    Direction::Center
}
