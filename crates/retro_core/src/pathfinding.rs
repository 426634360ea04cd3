//! Grid-based pathfinding using A*.
//!
//! Search runs over the 4-connected cell grid of a [`WorldBounds`] with a
//! step cost of one and the Manhattan heuristic. The search is a pure
//! function of its inputs and fully deterministic: among equal-priority
//! nodes the lowest cell (x, then y) pops first.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::world::{GridCell, WorldBounds};

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    cell: GridCell,
    /// f_score = g_score + heuristic
    f_score: u32,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so reverse both keys for min-heap behavior.
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Direction offsets for 4-directional movement.
const DIRECTIONS: [(i32, i32); 4] = [
    (0, 1),  // South
    (1, 0),  // East
    (0, -1), // North
    (-1, 0), // West
];

/// Find a path from `start` to `goal`.
///
/// The returned cells exclude `start` and are ordered start to goal, so
/// the last element is `goal`. An empty path means either `start == goal`
/// or the goal cannot be reached (including either end lying off-grid);
/// callers treat both as "hold position".
#[must_use]
pub fn find_path(bounds: &WorldBounds, start: GridCell, goal: GridCell) -> Vec<GridCell> {
    if start == goal || !bounds.is_walkable(start) || !bounds.is_walkable(goal) {
        return Vec::new();
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<GridCell, GridCell> = HashMap::new();
    let mut g_score: HashMap<GridCell, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        cell: start,
        f_score: start.manhattan(goal),
    });

    while let Some(current) = open_set.pop() {
        if current.cell == goal {
            return reconstruct_path(&came_from, start, goal);
        }

        let current_g = g_score.get(&current.cell).copied().unwrap_or(u32::MAX);

        for &(dx, dy) in &DIRECTIONS {
            let next = current.cell.offset(dx, dy);
            if !bounds.is_walkable(next) {
                continue;
            }

            let tentative_g = current_g + 1;
            let neighbor_g = g_score.get(&next).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(next, current.cell);
                g_score.insert(next, tentative_g);
                open_set.push(AStarNode {
                    cell: next,
                    f_score: tentative_g + next.manhattan(goal),
                });
            }
        }
    }

    tracing::trace!(?start, ?goal, "No path found");
    Vec::new()
}

/// Walk `came_from` back from the goal, dropping the start cell.
fn reconstruct_path(
    came_from: &HashMap<GridCell, GridCell>,
    start: GridCell,
    goal: GridCell,
) -> Vec<GridCell> {
    let mut path = Vec::new();
    let mut current = goal;

    while current != start {
        path.push(current);
        match came_from.get(&current) {
            Some(&prev) => current = prev,
            None => return Vec::new(),
        }
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: i32, y: i32) -> GridCell {
        GridCell::new(x, y)
    }

    fn assert_contiguous(start: GridCell, path: &[GridCell]) {
        let mut prev = start;
        for &step in path {
            assert_eq!(prev.manhattan(step), 1, "{prev:?} -> {step:?} is not one step");
            prev = step;
        }
    }

    #[test]
    fn test_straight_line_path() {
        let bounds = WorldBounds::new(16, 16);
        let path = find_path(&bounds, cell(0, 0), cell(3, 0));
        assert_eq!(path, vec![cell(1, 0), cell(2, 0), cell(3, 0)]);
    }

    #[test]
    fn test_diagonal_goal_is_shortest() {
        let bounds = WorldBounds::new(16, 16);
        let start = cell(14, 14);
        let goal = cell(5, 4);
        let path = find_path(&bounds, start, goal);

        assert_eq!(path.len() as u32, start.manhattan(goal));
        assert_eq!(path.last(), Some(&goal));
        assert!(!path.contains(&start));
        assert_contiguous(start, &path);
    }

    #[test]
    fn test_path_to_same_cell_is_empty() {
        let bounds = WorldBounds::new(10, 10);
        assert!(find_path(&bounds, cell(5, 5), cell(5, 5)).is_empty());
    }

    #[test]
    fn test_off_grid_goal_is_unreachable() {
        let bounds = WorldBounds::new(10, 10);
        assert!(find_path(&bounds, cell(0, 0), cell(10, 3)).is_empty());
        assert!(find_path(&bounds, cell(0, 0), cell(-1, 0)).is_empty());
    }

    #[test]
    fn test_off_grid_start_is_unreachable() {
        let bounds = WorldBounds::new(10, 10);
        assert!(find_path(&bounds, cell(12, 0), cell(3, 3)).is_empty());
    }

    #[test]
    fn test_path_stays_in_bounds() {
        let bounds = WorldBounds::new(3, 20);
        let start = cell(0, 19);
        let path = find_path(&bounds, start, cell(2, 0));
        assert_eq!(path.len(), 21);
        assert!(path.iter().all(|c| bounds.contains_cell(*c)));
        assert_contiguous(start, &path);
    }

    #[test]
    fn test_determinism() {
        let bounds = WorldBounds::new(20, 20);
        let path1 = find_path(&bounds, cell(2, 17), cell(15, 3));
        let path2 = find_path(&bounds, cell(2, 17), cell(15, 3));
        let path3 = find_path(&bounds, cell(2, 17), cell(15, 3));

        assert_eq!(path1, path2);
        assert_eq!(path2, path3);
    }

    #[test]
    fn test_node_ordering_prefers_low_f_then_low_cell() {
        let mut heap = BinaryHeap::new();
        heap.push(AStarNode { cell: cell(0, 0), f_score: 5 });
        heap.push(AStarNode { cell: cell(2, 0), f_score: 3 });
        heap.push(AStarNode { cell: cell(1, 7), f_score: 3 });
        heap.push(AStarNode { cell: cell(1, 2), f_score: 3 });

        assert_eq!(heap.pop().unwrap().cell, cell(1, 2));
        assert_eq!(heap.pop().unwrap().cell, cell(1, 7));
        assert_eq!(heap.pop().unwrap().cell, cell(2, 0));
        assert_eq!(heap.pop().unwrap().cell, cell(0, 0));
    }

    #[test]
    fn test_opening_routes_sweep_low_cells_first() {
        let bounds = WorldBounds::new(16, 16);

        let path = find_path(&bounds, cell(14, 14), cell(5, 4));
        let expected: Vec<GridCell> = (5..=13)
            .rev()
            .map(|x| cell(x, 14))
            .chain((4..=13).rev().map(|y| cell(5, y)))
            .collect();
        assert_eq!(path.first(), Some(&cell(13, 14)));
        assert_eq!(path, expected);

        let path = find_path(&bounds, cell(2, 14), cell(5, 4));
        let expected: Vec<GridCell> = (4..=13)
            .rev()
            .map(|y| cell(2, y))
            .chain((3..=5).map(|x| cell(x, 4)))
            .collect();
        assert_eq!(path.first(), Some(&cell(2, 13)));
        assert_eq!(path, expected);
    }
}
