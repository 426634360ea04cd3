//! World bounds and grid cell queries.
//!
//! The world is an integer-sized rectangle anchored at the origin. Every
//! cell inside it is walkable; continuous positions map to cells by
//! truncating toward zero.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// A discrete grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridCell {
    /// Create a new cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The cell's anchor point in world space.
    ///
    /// Cells are addressed by truncation, so the anchor is the cell's
    /// lower corner rather than its centre.
    #[must_use]
    pub fn to_world(self) -> Vec2Fixed {
        Vec2Fixed::from_ints(self.x, self.y)
    }

    /// Cell one step away in the given direction.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Rectangular world extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldBounds {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl WorldBounds {
    /// Create new bounds.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "world width must be positive");
        assert!(height > 0, "world height must be positive");
        Self { width, height }
    }

    /// Width as a fixed-point value.
    #[must_use]
    pub fn width_fixed(&self) -> Fixed {
        Fixed::from_num(self.width)
    }

    /// Height as a fixed-point value.
    #[must_use]
    pub fn height_fixed(&self) -> Fixed {
        Fixed::from_num(self.height)
    }

    /// Whether `0 <= x < width` and `0 <= y < height`.
    #[must_use]
    pub fn contains(&self, pos: Vec2Fixed) -> bool {
        pos.x >= Fixed::ZERO
            && pos.y >= Fixed::ZERO
            && pos.x < self.width_fixed()
            && pos.y < self.height_fixed()
    }

    /// Whether a cell lies on the grid.
    #[must_use]
    pub fn contains_cell(&self, cell: GridCell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && i64::from(cell.x) < i64::from(self.width)
            && i64::from(cell.y) < i64::from(self.height)
    }

    /// Whether a cell can be entered. Every on-grid cell is open.
    #[must_use]
    pub fn is_walkable(&self, cell: GridCell) -> bool {
        self.contains_cell(cell)
    }

    /// Number of cells on the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Cell addressed by a continuous position, truncating toward zero.
    #[must_use]
    pub fn cell_of(pos: Vec2Fixed) -> GridCell {
        GridCell::new(
            pos.x.round_to_zero().saturating_to_num::<i32>(),
            pos.y.round_to_zero().saturating_to_num::<i32>(),
        )
    }

    /// Largest in-bounds coordinate on each axis (`dimension - 1`).
    #[must_use]
    pub fn max_position(&self) -> Vec2Fixed {
        Vec2Fixed::new(
            self.width_fixed() - Fixed::ONE,
            self.height_fixed() - Fixed::ONE,
        )
    }

    /// Clamp a position onto `[0, dimension - 1]` on both axes.
    #[must_use]
    pub fn clamp(&self, pos: Vec2Fixed) -> Vec2Fixed {
        pos.clamp(Vec2Fixed::ZERO, self.max_position())
    }
}

impl Default for WorldBounds {
    /// The 16x16 arena.
    fn default() -> Self {
        Self::new(16, 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_contains_is_half_open() {
        let bounds = WorldBounds::new(16, 16);
        assert!(bounds.contains(Vec2Fixed::ZERO));
        assert!(bounds.contains(Vec2Fixed::new(fx(15.99), fx(15.99))));
        assert!(!bounds.contains(Vec2Fixed::from_ints(16, 0)));
        assert!(!bounds.contains(Vec2Fixed::new(fx(-0.01), fx(3.0))));
    }

    #[test]
    fn test_cell_of_truncates() {
        assert_eq!(
            WorldBounds::cell_of(Vec2Fixed::new(fx(5.9), fx(4.1))),
            GridCell::new(5, 4)
        );
        assert_eq!(WorldBounds::cell_of(Vec2Fixed::ZERO), GridCell::new(0, 0));
        assert_eq!(
            WorldBounds::cell_of(Vec2Fixed::new(fx(-0.5), fx(0.5))),
            GridCell::new(0, 0)
        );
    }

    #[test]
    fn test_contains_cell() {
        let bounds = WorldBounds::new(4, 3);
        assert!(bounds.contains_cell(GridCell::new(3, 2)));
        assert!(!bounds.contains_cell(GridCell::new(4, 0)));
        assert!(!bounds.contains_cell(GridCell::new(0, -1)));
        assert!(bounds.is_walkable(GridCell::new(1, 1)));
    }

    #[test]
    fn test_clamp_to_last_cell() {
        let bounds = WorldBounds::new(16, 16);
        let clamped = bounds.clamp(Vec2Fixed::from_ints(40, -7));
        assert_eq!(clamped, Vec2Fixed::from_ints(15, 0));
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(GridCell::new(0, 0).manhattan(GridCell::new(3, -4)), 7);
    }
}
