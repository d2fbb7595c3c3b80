//! Neighbor counting and color tallies around a cell.

use crate::color::Hsl;
use crate::grid::Grid;

/// Count the number of alive neighbors within `radius` of `(x, y)`, excluding the cell itself.
pub fn count_live(grid: &Grid, x: usize, y: usize, radius: usize) -> usize {
    grid.neighbors(x, y, radius).filter(|cell| cell.is_alive()).count()
}

/// Colors of the live cells in the 8-neighborhood of `(x, y)`.
pub fn color_frequencies(grid: &Grid, x: usize, y: usize) -> ColorTally {
    let mut tally = ColorTally::default();
    for color in grid.neighbors(x, y, 1).filter_map(|cell| cell.color()) {
        tally.add(color);
    }
    tally
}

/// Occurrence count per exact color, kept in first-seen order.
///
/// A neighborhood holds at most eight colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTally {
    entries: Vec<(Hsl, usize)>,
}

impl ColorTally {
    pub fn add(&mut self, color: Hsl) {
        match self.entries.iter_mut().find(|(seen, _)| *seen == color) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((color, 1)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Hsl, usize)> + '_ {
        self.entries.iter().copied()
    }

    /// Every color sharing the highest count.
    pub fn most_frequent(&self) -> Vec<Hsl> {
        let best = self.entries.iter().map(|(_, count)| *count).max().unwrap_or(0);
        self.entries
            .iter()
            .filter(|(_, count)| *count == best)
            .map(|(color, _)| *color)
            .collect()
    }

    /// Each color repeated by its count.
    pub fn expanded(&self) -> Vec<Hsl> {
        self.entries
            .iter()
            .flat_map(|(color, count)| std::iter::repeat(*color).take(*count))
            .collect()
    }
}
