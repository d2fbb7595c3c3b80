//! The cell store.

use std::fmt;

use crate::color::Hsl;

/// State of a single cell. Only live cells carry a color.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Cell {
    #[default]
    Dead,
    Alive(Hsl),
}

impl Cell {
    pub fn is_alive(&self) -> bool {
        matches!(self, Cell::Alive(_))
    }

    pub fn color(&self) -> Option<Hsl> {
        match self {
            Cell::Alive(color) => Some(*color),
            Cell::Dead => None,
        }
    }
}

/// One generation of the board, stored as a vector of columns.
///
/// A grid is never mutated once built; the next generation is a new grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    columns: Vec<Vec<Cell>>,
    rows: usize,
}

impl Grid {
    /// An all-dead grid.
    pub fn new(columns: usize, rows: usize) -> Self {
        Grid {
            columns: vec![vec![Cell::Dead; rows]; columns],
            rows,
        }
    }

    /// Builds a grid by asking `cell` for every `(x, y)`.
    pub fn from_fn(
        columns: usize,
        rows: usize,
        mut cell: impl FnMut(usize, usize) -> Cell,
    ) -> Self {
        let columns = (0..columns)
            .map(|x| (0..rows).map(|y| cell(x, y)).collect())
            .collect();
        Grid { columns, rows }
    }

    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells.
    pub fn area(&self) -> usize {
        self.columns() * self.rows
    }

    /// The cell at `(x, y)`; anything outside the grid reads as dead.
    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.columns
            .get(x)
            .and_then(|column| column.get(y))
            .copied()
            .unwrap_or(Cell::Dead)
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_alive()
    }

    /// A copy of this grid with `(x, y)` replaced. Out-of-range writes are ignored.
    pub fn with_cell(&self, x: usize, y: usize, cell: Cell) -> Grid {
        let mut next = self.clone();
        if let Some(slot) = next.columns.get_mut(x).and_then(|column| column.get_mut(y)) {
            *slot = cell;
        }
        next
    }

    /// Cells within `radius` of `(x, y)` that lie inside the grid, excluding `(x, y)` itself.
    pub fn neighbors(&self, x: usize, y: usize, radius: usize) -> impl Iterator<Item = Cell> + '_ {
        let r = radius as isize;
        (-r..=r)
            .flat_map(move |dx| (-r..=r).map(move |dy| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .filter_map(move |(dx, dy)| {
                let nx = x.checked_add_signed(dx)?;
                let ny = y.checked_add_signed(dy)?;
                self.columns.get(nx)?.get(ny).copied()
            })
    }

    /// Number of live cells.
    pub fn population(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.iter().filter(|cell| cell.is_alive()).count())
            .sum()
    }

    /// Iterates `(x, y, cell)` in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .flat_map(|(x, column)| column.iter().enumerate().map(move |(y, cell)| (x, y, *cell)))
    }

    /// Whether both grids have the same shape and the same live cells, ignoring colors.
    pub fn same_pattern(&self, other: &Grid) -> bool {
        self.columns() == other.columns()
            && self.rows == other.rows
            && self.iter().all(|(x, y, cell)| cell.is_alive() == other.is_alive(x, y))
    }
}

/// Rows of `1` (alive) and `0` (dead), one line per row.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.rows {
            for x in 0..self.columns() {
                f.write_str(if self.is_alive(x, y) { "1" } else { "0" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
