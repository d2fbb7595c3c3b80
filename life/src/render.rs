//! What the engine needs from a drawing target, and how a grid is drawn onto it.

use crate::color::Hsl;
use crate::grid::{Cell, Grid};

/// Pixel dimensions of a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub const fn new(width: f32, height: f32) -> Self {
        SurfaceSize { width, height }
    }
}

/// A write-only drawing target.
pub trait RenderSurface {
    fn size(&self) -> SurfaceSize;

    /// Wipes the surface, filling it with `background` if given.
    fn clear(&mut self, background: Option<Hsl>);

    /// Fills the square with top-left corner `(px, py)` and edge `size`.
    fn fill_rect(&mut self, px: f32, py: f32, size: f32, color: Hsl);
}

/// Draws the visible part of `grid`: the `margin` outermost cells on every
/// side stay off screen. Returns the number of cells drawn.
pub fn paint<S: RenderSurface + ?Sized>(
    grid: &Grid,
    surface: &mut S,
    cell_size: f32,
    margin: usize,
    background: Option<Hsl>,
) -> usize {
    surface.clear(background);
    let SurfaceSize { width, height } = surface.size();

    let mut drawn = 0;
    for (x, y, cell) in grid.iter() {
        let Cell::Alive(color) = cell else {
            continue;
        };
        let (Some(sx), Some(sy)) = (x.checked_sub(margin), y.checked_sub(margin)) else {
            continue;
        };
        let (px, py) = (sx as f32 * cell_size, sy as f32 * cell_size);
        if px >= width || py >= height {
            continue;
        }
        surface.fill_rect(px, py, cell_size, color);
        drawn += 1;
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        clears: Vec<Option<Hsl>>,
        rects: Vec<(f32, f32, f32, Hsl)>,
    }

    impl RenderSurface for Recorder {
        fn size(&self) -> SurfaceSize {
            SurfaceSize::new(20.0, 10.0)
        }

        fn clear(&mut self, background: Option<Hsl>) {
            self.clears.push(background);
        }

        fn fill_rect(&mut self, px: f32, py: f32, size: f32, color: Hsl) {
            self.rects.push((px, py, size, color));
        }
    }

    #[test]
    fn margin_cells_stay_off_screen() {
        let red = Hsl::vivid(0.0);
        // 2 visible columns by 1 visible row of 10px cells, margin 1.
        let grid = Grid::from_fn(4, 3, |_, _| Cell::Alive(red));
        let mut surface = Recorder::default();

        let drawn = paint(&grid, &mut surface, 10.0, 1, Some(Hsl::BLACK));
        assert_eq!(drawn, 2);
        assert_eq!(surface.clears, vec![Some(Hsl::BLACK)]);
        assert_eq!(surface.rects, vec![(0.0, 0.0, 10.0, red), (10.0, 0.0, 10.0, red)]);
    }

    #[test]
    fn dead_cells_are_not_drawn() {
        let grid = Grid::new(3, 3).with_cell(1, 1, Cell::Alive(Hsl::WHITE));
        let mut surface = Recorder::default();
        assert_eq!(paint(&grid, &mut surface, 5.0, 0, None), 1);
        assert_eq!(surface.rects, vec![(5.0, 5.0, 5.0, Hsl::WHITE)]);
    }
}
