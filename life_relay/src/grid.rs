// grid.rs - Grid types for Conway's Game of Life

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::collections::btree_set;
use std::fmt;

use crate::error::GridError;

pub const DEFAULT_GRID_SIZE: u32 = 50;                // Default playing area (50x50)
pub const MAX_GRID_SIDE: u32 = i32::MAX as u32;       // Every in-grid cell fits a Coordinate

/// A cell position. No bounds are implied; bounding is a grid concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The eight surrounding positions, unclipped.
    pub fn neighbours(self) -> impl Iterator<Item = Coordinate> {
        (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| Coordinate::new(self.x.wrapping_add(dx), self.y.wrapping_add(dy)))
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for (i32, i32) {
    fn from(c: Coordinate) -> Self {
        (c.x, c.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Dimensions of the finite universe the compute module reasons about.
///
/// `GridSize::new` enforces that both sides are positive and at most
/// [`MAX_GRID_SIDE`]. Deserialization is purely structural; a grid coming off
/// the wire with a bad size is rejected by the compute module, not by the
/// protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension { width, height });
        }
        if width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(GridError::TooLarge { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn square(side: u32) -> Result<Self, GridError> {
        Self::new(side, side)
    }

    pub fn is_valid(&self) -> bool {
        Self::new(self.width, self.height).is_ok()
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        c.x >= 0
            && c.y >= 0
            && i64::from(c.x) < i64::from(self.width)
            && i64::from(c.y) < i64::from(self.height)
    }

    /// Maps any coordinate onto the torus of this size. Only meaningful for
    /// a valid grid, where every wrapped value fits an `i32`.
    pub fn wrap(&self, c: Coordinate) -> Coordinate {
        let wrap_axis = |v: i32, side: u32| {
            let wrapped = i64::from(v).rem_euclid(i64::from(side.max(1)));
            i32::try_from(wrapped).unwrap_or(i32::MAX)
        };
        Coordinate::new(wrap_axis(c.x, self.width), wrap_axis(c.y, self.height))
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self { width: DEFAULT_GRID_SIZE, height: DEFAULT_GRID_SIZE }
    }
}

impl From<(u32, u32)> for GridSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<GridSize> for (u32, u32) {
    fn from(g: GridSize) -> Self {
        (g.width, g.height)
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sparse set of live cells. Ordered so the wire form is deterministic;
/// equality is set equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliveSet(BTreeSet<Coordinate>);

impl AliveSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        self.0.contains(&c)
    }

    pub fn insert(&mut self, c: Coordinate) -> bool {
        self.0.insert(c)
    }

    pub fn remove(&mut self, c: Coordinate) -> bool {
        self.0.remove(&c)
    }

    /// Flips a cell, returning its new state.
    pub fn toggle(&mut self, c: Coordinate) -> bool {
        if self.0.remove(&c) {
            false
        } else {
            self.0.insert(c);
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> btree_set::Iter<'_, Coordinate> {
        self.0.iter()
    }

    /// Cells that lie inside `grid`.
    pub fn clipped_to(&self, grid: GridSize) -> AliveSet {
        self.iter().copied().filter(|&c| grid.contains(c)).collect()
    }
}

impl FromIterator<Coordinate> for AliveSet {
    fn from_iter<I: IntoIterator<Item = Coordinate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<(i32, i32)> for AliveSet {
    fn from_iter<I: IntoIterator<Item = (i32, i32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(Coordinate::from).collect())
    }
}

impl IntoIterator for AliveSet {
    type Item = Coordinate;
    type IntoIter = btree_set::IntoIter<Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AliveSet {
    type Item = &'a Coordinate;
    type IntoIter = btree_set::Iter<'a, Coordinate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Renders the grid as text, one row per line.
pub fn render_text(cells: &AliveSet, grid: GridSize, live: char, dead: char) -> String {
    let mut out = String::with_capacity((grid.width as usize + 1) * grid.height as usize);
    for y in 0..grid.height as i32 {
        for x in 0..grid.width as i32 {
            out.push(if cells.contains(Coordinate::new(x, y)) { live } else { dead });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size_rejects_zero_dimensions() {
        assert!(GridSize::new(0, 5).is_err());
        assert!(GridSize::new(5, 0).is_err());
        assert_eq!(GridSize::new(3, 4).unwrap().area(), 12);
    }

    #[test]
    fn grid_size_rejects_sides_beyond_i32() {
        assert!(GridSize::new(MAX_GRID_SIDE, MAX_GRID_SIDE).is_ok());
        assert_eq!(
            GridSize::new(u32::MAX, 5),
            Err(GridError::TooLarge { width: u32::MAX, height: 5 })
        );
        assert!(!GridSize { width: 5, height: MAX_GRID_SIDE + 1 }.is_valid());
    }

    #[test]
    fn wrap_at_widest_grid_stays_in_range() {
        let grid = GridSize::new(MAX_GRID_SIDE, 5).unwrap();
        let wrapped = grid.wrap(Coordinate::new(-1, 2));
        assert_eq!(wrapped, Coordinate::new(i32::MAX - 1, 2));
        assert!(grid.contains(wrapped));
    }

    #[test]
    fn wrap_handles_negative_coordinates() {
        let grid = GridSize::new(5, 4).unwrap();
        assert_eq!(grid.wrap(Coordinate::new(-1, -1)), Coordinate::new(4, 3));
        assert_eq!(grid.wrap(Coordinate::new(5, 4)), Coordinate::new(0, 0));
    }

    #[test]
    fn neighbours_excludes_self() {
        let c = Coordinate::new(0, 0);
        let n: Vec<_> = c.neighbours().collect();
        assert_eq!(n.len(), 8);
        assert!(!n.contains(&c));
    }

    #[test]
    fn alive_set_wire_form_is_pairs() {
        let cells: AliveSet = [(2, 1), (0, 3)].into_iter().collect();
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, "[[0,3],[2,1]]");
    }

    #[test]
    fn duplicate_cells_collapse_on_decode() {
        let cells: AliveSet = serde_json::from_str("[[1,1],[1,1],[2,2]]").unwrap();
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn toggle_flips_state() {
        let mut cells = AliveSet::new();
        assert!(cells.toggle(Coordinate::new(1, 1)));
        assert!(!cells.toggle(Coordinate::new(1, 1)));
        assert!(cells.is_empty());
    }

    #[test]
    fn render_text_draws_rows() {
        let cells: AliveSet = [(1, 0)].into_iter().collect();
        let grid = GridSize::new(3, 2).unwrap();
        assert_eq!(render_text(&cells, grid, '#', '.'), ".#.\n...\n");
    }
}
