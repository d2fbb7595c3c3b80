//! Color strategies: how a live cell picks its color from its neighborhood.

use std::fmt;
use std::str::FromStr;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::{self, Hsl};
use crate::grid::Grid;
use crate::neighborhood::{color_frequencies, count_live};

/// Configuration-level name of a color strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Majority,
    BlendWheel,
    BlendSpectrum,
    Density,
    Generational,
    Monochrome,
    Random,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Majority,
        Mode::BlendWheel,
        Mode::BlendSpectrum,
        Mode::Density,
        Mode::Generational,
        Mode::Monochrome,
        Mode::Random,
    ];

    /// Modes eligible when none is configured. `Random` has to be asked for.
    pub const AUTO: [Mode; 6] = [
        Mode::Majority,
        Mode::BlendWheel,
        Mode::BlendSpectrum,
        Mode::Density,
        Mode::Monochrome,
        Mode::Generational,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Majority => "majority",
            Mode::BlendWheel => "blend_wheel",
            Mode::BlendSpectrum => "blend_spectrum",
            Mode::Density => "density",
            Mode::Generational => "generational",
            Mode::Monochrome => "monochrome",
            Mode::Random => "random",
        }
    }

    /// Human-readable title, e.g. "Blend Wheel".
    pub fn title(self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether a run in this mode may keep the colors of surviving cells.
    pub fn supports_persistence(self) -> bool {
        matches!(
            self,
            Mode::Majority
                | Mode::BlendWheel
                | Mode::BlendSpectrum
                | Mode::Random
                | Mode::Generational
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode {0:?}")]
pub struct UnknownMode(String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| UnknownMode(name.to_string()))
    }
}

/// Hue source for the generational strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Generational {
    /// Hue cycles once every `spread` generations, starting `offset` generations in.
    Spectrum { spread: u64, offset: u64 },
    /// All births of a generation share that generation's random color.
    Shared,
}

/// A color strategy with its per-run tunables resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorStrategy {
    Majority,
    BlendWheel,
    BlendSpectrum,
    Density {
        radius: usize,
        inverted: bool,
        span: f32,
        offset: f32,
    },
    Generational(Generational),
    Monochrome(Hsl),
    Random,
}

/// Per-generation inputs shared by every cell of a step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub generation: u64,
    /// One random color drawn per generation.
    pub shared_color: Hsl,
}

impl ColorStrategy {
    pub fn mode(&self) -> Mode {
        match self {
            ColorStrategy::Majority => Mode::Majority,
            ColorStrategy::BlendWheel => Mode::BlendWheel,
            ColorStrategy::BlendSpectrum => Mode::BlendSpectrum,
            ColorStrategy::Density { .. } => Mode::Density,
            ColorStrategy::Generational(_) => Mode::Generational,
            ColorStrategy::Monochrome(_) => Mode::Monochrome,
            ColorStrategy::Random => Mode::Random,
        }
    }

    /// The color for a cell that is alive in the generation being built.
    ///
    /// `grid` is the previous generation.
    pub fn color<R: Rng + ?Sized>(
        &self,
        grid: &Grid,
        x: usize,
        y: usize,
        ctx: &StepContext,
        rng: &mut R,
    ) -> Hsl {
        match *self {
            ColorStrategy::Majority => majority(grid, x, y, rng),
            ColorStrategy::BlendWheel => blend_wheel(grid, x, y, rng),
            ColorStrategy::BlendSpectrum => blend_spectrum(grid, x, y, rng),
            ColorStrategy::Density {
                radius,
                inverted,
                span,
                offset,
            } => density(grid, x, y, radius, inverted, span, offset),
            ColorStrategy::Generational(Generational::Spectrum { spread, offset }) => {
                generation_hue(ctx.generation, spread, offset)
            }
            ColorStrategy::Generational(Generational::Shared) => ctx.shared_color,
            ColorStrategy::Monochrome(color) => color,
            ColorStrategy::Random => color::random_bright(rng),
        }
    }
}

fn majority<R: Rng + ?Sized>(grid: &Grid, x: usize, y: usize, rng: &mut R) -> Hsl {
    let tally = color_frequencies(grid, x, y);
    match tally.most_frequent().choose(rng) {
        Some(color) => *color,
        None => color::random_bright(rng),
    }
}

fn blend_wheel<R: Rng + ?Sized>(grid: &Grid, x: usize, y: usize, rng: &mut R) -> Hsl {
    let colors = color_frequencies(grid, x, y).expanded();
    color::average(&colors).unwrap_or_else(|| color::random_bright(rng))
}

fn blend_spectrum<R: Rng + ?Sized>(grid: &Grid, x: usize, y: usize, rng: &mut R) -> Hsl {
    let tally = color_frequencies(grid, x, y);
    let (colors, weights): (Vec<Hsl>, Vec<f32>) = tally.iter().map(|(c, n)| (c, n as f32)).unzip();
    match color::linear_average(&colors, &weights) {
        Some(blend) => Hsl::new(blend.h.round(), blend.s.round(), blend.l.round()),
        None => color::random_bright(rng),
    }
}

/// Fraction of the neighborhood that counts as fully dense.
const DENSITY_SATURATION: f32 = 0.4;

fn density(
    grid: &Grid,
    x: usize,
    y: usize,
    radius: usize,
    inverted: bool,
    span: f32,
    offset: f32,
) -> Hsl {
    let side = 2 * radius + 1;
    let max_density = (side * side - 1) as f32 * DENSITY_SATURATION;
    let neighbors = count_live(grid, x, y, radius) as f32;
    let mut density = (neighbors / max_density).clamp(0.0, 1.0);
    if inverted {
        density = 1.0 - density;
    }
    Hsl::vivid(density * span + offset)
}

fn generation_hue(generation: u64, spread: u64, offset: u64) -> Hsl {
    let spread = spread.max(1);
    let phase = ((u128::from(generation) + u128::from(offset)) % u128::from(spread)) as u64;
    Hsl::vivid(phase as f32 / spread as f32 * 360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const A: Hsl = Hsl::new(30.0, 80.0, 50.0);
    const B: Hsl = Hsl::new(200.0, 60.0, 40.0);

    fn ctx() -> StepContext {
        StepContext {
            generation: 7,
            shared_color: Hsl::new(42.0, 90.0, 50.0),
        }
    }

    /// Center cell (1, 1) surrounded by three A and one B.
    fn three_to_one() -> Grid {
        Grid::new(3, 3)
            .with_cell(0, 0, Cell::Alive(A))
            .with_cell(2, 0, Cell::Alive(A))
            .with_cell(0, 2, Cell::Alive(A))
            .with_cell(2, 2, Cell::Alive(B))
    }

    #[test]
    fn majority_picks_most_common_color() {
        let grid = three_to_one();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(ColorStrategy::Majority.color(&grid, 1, 1, &ctx(), &mut rng), A);
        }
    }

    #[test]
    fn majority_breaks_ties_among_leaders() {
        let grid = Grid::new(3, 3).with_cell(0, 0, Cell::Alive(A)).with_cell(2, 2, Cell::Alive(B));
        let mut rng = StdRng::seed_from_u64(3);
        let picks: Vec<Hsl> = (0..64)
            .map(|_| ColorStrategy::Majority.color(&grid, 1, 1, &ctx(), &mut rng))
            .collect();
        assert!(picks.iter().all(|c| *c == A || *c == B));
        assert!(picks.contains(&A));
        assert!(picks.contains(&B));
    }

    #[test]
    fn lonely_cells_get_a_random_color() {
        let grid = Grid::new(3, 3);
        let mut rng = StdRng::seed_from_u64(11);
        let blending = [
            ColorStrategy::Majority,
            ColorStrategy::BlendWheel,
            ColorStrategy::BlendSpectrum,
        ];
        for strategy in blending {
            let c = strategy.color(&grid, 1, 1, &ctx(), &mut rng);
            assert!((55.0..=100.0).contains(&c.s), "{strategy:?} gave {c}");
        }
    }

    #[test]
    fn blend_wheel_weights_by_frequency() {
        let mut rng = StdRng::seed_from_u64(0);
        let c = ColorStrategy::BlendWheel.color(&three_to_one(), 1, 1, &ctx(), &mut rng);
        assert!((c.s - 75.0).abs() < 1e-3);
        assert!((c.l - 47.5).abs() < 1e-3);
        assert!(c.h > 30.0 && c.h < 200.0);
    }

    #[test]
    fn blend_spectrum_rounds_the_linear_mean() {
        let mut rng = StdRng::seed_from_u64(0);
        let c = ColorStrategy::BlendSpectrum.color(&three_to_one(), 1, 1, &ctx(), &mut rng);
        // (3 * 30 + 200) / 4 = 72.5
        assert_eq!(c, Hsl::new(73.0, 75.0, 48.0));
    }

    #[test]
    fn density_hue_stays_in_its_band() {
        let strategy = ColorStrategy::Density {
            radius: 2,
            inverted: false,
            span: 100.0,
            offset: 50.0,
        };
        let empty = Grid::new(5, 5);
        let full = Grid::from_fn(5, 5, |_, _| Cell::Alive(A));
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(strategy.color(&empty, 2, 2, &ctx(), &mut rng), Hsl::vivid(50.0));
        assert_eq!(strategy.color(&full, 2, 2, &ctx(), &mut rng), Hsl::vivid(150.0));

        let inverted = ColorStrategy::Density {
            radius: 2,
            inverted: true,
            span: 100.0,
            offset: 50.0,
        };
        assert_eq!(inverted.color(&empty, 2, 2, &ctx(), &mut rng), Hsl::vivid(150.0));
    }

    #[test]
    fn generational_spectrum_cycles_with_the_generation() {
        let grid = Grid::new(3, 3);
        let strategy = ColorStrategy::Generational(Generational::Spectrum {
            spread: 100,
            offset: 18,
        });
        let mut rng = StdRng::seed_from_u64(0);
        let at = |generation| StepContext { generation, ..ctx() };
        assert_eq!(strategy.color(&grid, 0, 0, &at(7), &mut rng), Hsl::vivid(90.0));
        assert_eq!(strategy.color(&grid, 2, 1, &at(7), &mut rng), Hsl::vivid(90.0));
        assert_eq!(strategy.color(&grid, 0, 0, &at(82), &mut rng), Hsl::vivid(0.0));
    }

    #[test]
    fn shared_and_monochrome_ignore_neighbors() {
        let grid = three_to_one();
        let mut rng = StdRng::seed_from_u64(0);
        let shared = ColorStrategy::Generational(Generational::Shared);
        assert_eq!(shared.color(&grid, 1, 1, &ctx(), &mut rng), ctx().shared_color);
        assert_eq!(ColorStrategy::Monochrome(B).color(&grid, 1, 1, &ctx(), &mut rng), B);
    }

    #[test]
    fn mode_names_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.name().parse::<Mode>(), Ok(mode));
        }
        assert!("plaid".parse::<Mode>().is_err());
        assert_eq!(Mode::BlendWheel.title(), "Blend Wheel");
        assert!(!Mode::AUTO.contains(&Mode::Random));
    }
}
