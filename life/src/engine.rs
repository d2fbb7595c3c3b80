//! The generation loop: rule application, coloring, and reseeding.
//!
//! A live cell survives with two or three live neighbors and dies otherwise.
//! A dead cell comes to life with exactly three live neighbors.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::codec;
use crate::color::{self, Hsl};
use crate::config::Options;
use crate::error::{ConfigurationError, DecodeError};
use crate::grid::{Cell, Grid};
use crate::neighborhood::count_live;
use crate::render::SurfaceSize;
use crate::runtime::RuntimeState;
use crate::snapshot::{Frame, SnapshotReader};
use crate::strategy::StepContext;

/// Whether a cell is alive in the next generation.
pub fn next_state(alive: bool, live_neighbors: usize) -> bool {
    matches!((alive, live_neighbors), (true, 2..=3) | (false, 3))
}

/// Grid size for a surface: visible cells plus the hidden margin on every side.
pub fn grid_dimensions(
    options: &Options,
    surface: SurfaceSize,
) -> Result<(usize, usize), ConfigurationError> {
    let visible = |pixels: f32| (pixels / options.cell_pixel_size).floor().max(0.0) as usize;
    let margin = 2 * options.off_grid_margin;
    let columns = visible(surface.width) + margin;
    let rows = visible(surface.height) + margin;
    if columns == 0 || rows == 0 {
        return Err(ConfigurationError::EmptyGrid {
            width: surface.width,
            height: surface.height,
        });
    }
    Ok((columns, rows))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No grid has been seeded yet.
    Uninitialized,
    /// Freshly seeded or loaded, not yet stepped.
    Seeded,
    Running,
}

/// Why a step ended the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReseedReason {
    LowPopulation,
    Stagnant,
    MaxGenerations,
}

impl fmt::Display for ReseedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReseedReason::LowPopulation => "low population",
            ReseedReason::Stagnant => "stagnant population",
            ReseedReason::MaxGenerations => "generation limit",
        })
    }
}

/// Result of one call to [`LifeEngine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Generation now published (1 right after a reseed).
    pub generation: u64,
    pub population: usize,
    pub reseed: Option<ReseedReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSample {
    pub live_cells: usize,
    pub generation: u64,
}

/// Counts consecutive generations with an unchanged population.
///
/// Still lifes and period-2 blinkers are caught; oscillators whose population
/// changes within the period are not.
#[derive(Debug, Default)]
struct StagnationTracker {
    last: Option<PopulationSample>,
    repeats: u32,
}

impl StagnationTracker {
    fn prime(&mut self, sample: PopulationSample) {
        self.last = Some(sample);
        self.repeats = 0;
    }

    fn record(&mut self, sample: PopulationSample) -> u32 {
        match self.last {
            Some(last) if last.live_cells == sample.live_cells => self.repeats += 1,
            _ => {
                self.last = Some(sample);
                self.repeats = 0;
            }
        }
        self.repeats
    }

    /// Generation at which the current population count first appeared.
    fn since(&self) -> Option<u64> {
        self.last.map(|sample| sample.generation)
    }
}

pub struct LifeEngine {
    options: Options,
    surface: SurfaceSize,
    grid: Arc<Grid>,
    runtime: Arc<RuntimeState>,
    generation: u64,
    population: usize,
    phase: Phase,
    tracker: StagnationTracker,
    published: SnapshotReader,
    rng: StdRng,
}

impl LifeEngine {
    pub fn new(options: Options, surface: SurfaceSize) -> Result<Self, ConfigurationError> {
        Self::with_rng(options, surface, StdRng::from_os_rng())
    }

    /// Like [`LifeEngine::new`] with a reproducible random sequence.
    pub fn seeded(
        options: Options,
        surface: SurfaceSize,
        seed: u64,
    ) -> Result<Self, ConfigurationError> {
        Self::with_rng(options, surface, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        options: Options,
        surface: SurfaceSize,
        mut rng: StdRng,
    ) -> Result<Self, ConfigurationError> {
        options.validate()?;
        let (columns, rows) = grid_dimensions(&options, surface)?;
        let grid = Arc::new(Grid::new(columns, rows));
        let runtime = Arc::new(RuntimeState::roll(&options, &mut rng));
        let published = SnapshotReader::new(Frame {
            grid: Arc::clone(&grid),
            runtime: Arc::clone(&runtime),
            generation: 0,
            population: 0,
        });

        Ok(LifeEngine {
            options,
            surface,
            grid,
            runtime,
            generation: 0,
            population: 0,
            phase: Phase::Uninitialized,
            tracker: StagnationTracker::default(),
            published,
            rng,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn population(&self) -> usize {
        self.population
    }

    pub fn grid(&self) -> Arc<Grid> {
        Arc::clone(&self.grid)
    }

    pub fn runtime(&self) -> Arc<RuntimeState> {
        Arc::clone(&self.runtime)
    }

    /// A handle that always sees the latest published frame.
    pub fn subscribe(&self) -> SnapshotReader {
        self.published.clone()
    }

    pub fn frame(&self) -> Arc<Frame> {
        self.published.latest()
    }

    /// Records a new surface size. The grid is resized at the next reset.
    pub fn set_surface(&mut self, surface: SurfaceSize) -> Result<(), ConfigurationError> {
        grid_dimensions(&self.options, surface)?;
        self.surface = surface;
        Ok(())
    }

    /// Replaces the options and starts a new run with them.
    pub fn reconfigure(&mut self, options: Options) -> Result<(), ConfigurationError> {
        options.validate()?;
        grid_dimensions(&options, self.surface)?;
        self.options = options;
        self.reset();
        Ok(())
    }

    /// Starts a new run: fresh runtime parameters, a freshly seeded grid, and
    /// one generation already applied.
    pub fn reset(&mut self) {
        self.generation = 0;
        self.runtime = Arc::new(RuntimeState::roll(&self.options, &mut self.rng));
        debug!(
            "new run: {} (mutation rate {:.3}, persist colors {}, spontaneous {:?})",
            self.runtime.title(),
            self.runtime.mutation_rate,
            self.runtime.persists(),
            self.runtime.spontaneous,
        );

        let grid = self.generate_random_grid(self.options.start_population_fraction);
        self.grid = Arc::new(grid);
        self.advance();
        self.tracker.prime(self.sample());
        self.phase = Phase::Seeded;
        self.publish();
    }

    /// A grid sized for the current surface with each cell alive with
    /// probability `population`, colored by the run's seed palette.
    pub fn generate_random_grid(&mut self, population: f64) -> Grid {
        let (columns, rows) = grid_dimensions(&self.options, self.surface)
            .unwrap_or((self.grid.columns(), self.grid.rows()));
        let population = population.clamp(0.0, 1.0);
        let palette = self.runtime.palette;
        let rng = &mut self.rng;
        Grid::from_fn(columns, rows, |x, y| {
            if rng.random_bool(population) {
                Cell::Alive(palette.color(x, y, columns, rows, rng))
            } else {
                Cell::Dead
            }
        })
    }

    /// Advances one generation, then reseeds if the run has died out,
    /// stagnated, or hit the generation limit.
    pub fn step(&mut self) -> StepOutcome {
        if self.phase == Phase::Uninitialized {
            self.reset();
        }

        self.advance();
        self.phase = Phase::Running;

        let reseed = self.check_run();
        match reseed {
            Some(ReseedReason::Stagnant) => {
                info!(
                    "Resetting at generation {}: {} live cells unchanged since generation {}.",
                    self.generation,
                    self.population,
                    self.tracker.since().unwrap_or_default(),
                );
                self.reset();
            }
            Some(reason) => {
                info!("Resetting at generation {}: {reason}.", self.generation);
                self.reset();
            }
            None => self.publish(),
        }

        StepOutcome {
            generation: self.generation,
            population: self.population,
            reseed,
        }
    }

    /// Advances `count` generations, stopping early on a reseed.
    pub fn steps(&mut self, count: usize) -> Option<StepOutcome> {
        let mut last = None;
        for _ in 0..count {
            let outcome = self.step();
            last = Some(outcome);
            if outcome.reseed.is_some() {
                break;
            }
        }
        last
    }

    /// Replaces the current grid, e.g. with a hand-built pattern. Its size is
    /// kept until the next reset.
    pub fn load_grid(&mut self, grid: Grid) {
        self.generation = 0;
        self.population = grid.population();
        self.grid = Arc::new(grid);
        self.tracker.prime(self.sample());
        self.phase = Phase::Seeded;
        self.publish();
    }

    /// Loads a pattern produced by [`codec::encode`], coloring live cells
    /// with the run's seed palette. The current grid is kept on error.
    pub fn load_pattern(&mut self, text: &str) -> Result<(), DecodeError> {
        let (columns, rows) = (self.grid.columns(), self.grid.rows());
        let pattern = codec::decode(text, columns, rows)
            .inspect_err(|err| warn!("rejected pattern: {err}"))?;

        let palette = self.runtime.palette;
        let rng = &mut self.rng;
        let grid = Grid::from_fn(columns, rows, |x, y| {
            if pattern.is_alive(x, y) {
                Cell::Alive(palette.color(x, y, columns, rows, rng))
            } else {
                Cell::Dead
            }
        });
        self.load_grid(grid);
        Ok(())
    }

    /// The current alive/dead pattern in codec form.
    pub fn encode(&self) -> String {
        codec::encode(&self.grid)
    }

    /// Applies the rule to every cell of the current grid, reading only the
    /// current grid, and installs the result.
    fn advance(&mut self) {
        let previous = Arc::clone(&self.grid);
        let runtime = Arc::clone(&self.runtime);
        self.generation += 1;

        let ctx = StepContext {
            generation: self.generation,
            shared_color: color::random_bright(&mut self.rng),
        };
        let generation = self.generation;
        let spontaneous = runtime.spontaneous.filter(|s| generation % s.every == 0);
        let rng = &mut self.rng;

        let next = Grid::from_fn(previous.columns(), previous.rows(), |x, y| {
            let current = previous.get(x, y);
            let mut alive = next_state(current.is_alive(), count_live(&previous, x, y, 1));
            if !alive {
                if let Some(spontaneous) = spontaneous {
                    alive = rng.random_bool(spontaneous.probability);
                }
            }

            if alive {
                Cell::Alive(resolve_color(&runtime, &previous, x, y, current, &ctx, rng))
            } else {
                Cell::Dead
            }
        });

        self.population = next.population();
        self.grid = Arc::new(next);
    }

    fn check_run(&mut self) -> Option<ReseedReason> {
        let area = self.grid.area().max(1) as f64;
        if (self.population as f64 / area) < self.options.min_population_fraction {
            return Some(ReseedReason::LowPopulation);
        }

        let repeats = self.tracker.record(self.sample());
        let threshold = self.options.stale_generation_threshold;
        if threshold > 0 && repeats >= threshold {
            return Some(ReseedReason::Stagnant);
        }

        match self.options.max_generations {
            Some(max) if self.generation >= max => Some(ReseedReason::MaxGenerations),
            _ => None,
        }
    }

    fn sample(&self) -> PopulationSample {
        PopulationSample {
            live_cells: self.population,
            generation: self.generation,
        }
    }

    fn publish(&self) {
        self.published.publish(Frame {
            grid: Arc::clone(&self.grid),
            runtime: Arc::clone(&self.runtime),
            generation: self.generation,
            population: self.population,
        });
    }
}

/// Color of a cell alive in the next generation: a mutation, the kept color
/// of a surviving cell when the run persists colors, or the strategy's pick.
fn resolve_color<R: Rng + ?Sized>(
    runtime: &RuntimeState,
    previous: &Grid,
    x: usize,
    y: usize,
    current: Cell,
    ctx: &StepContext,
    rng: &mut R,
) -> Hsl {
    if runtime.mutation_rate > 0.0 && rng.random_bool(runtime.mutation_rate) {
        return color::random_bright(rng);
    }
    if runtime.persists() {
        if let Cell::Alive(kept) = current {
            return kept;
        }
    }
    runtime.strategy.color(previous, x, y, ctx, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{SeedPalette, Spontaneous};
    use crate::strategy::{ColorStrategy, Mode};
    use std::time::Instant;

    const SURFACE: SurfaceSize = SurfaceSize::new(100.0, 50.0);

    fn quiet(mode: Mode) -> Options {
        Options {
            mode: Some(mode),
            persist_colors: Some(false),
            mutation_chance: 0.0,
            spontaneous_chance: 0.0,
            min_population_fraction: 0.0,
            stale_generation_threshold: 0,
            ..Options::default()
        }
    }

    fn live(h: f32) -> Cell {
        Cell::Alive(Hsl::new(h, 80.0, 50.0))
    }

    fn plain_run(strategy: ColorStrategy) -> RuntimeState {
        RuntimeState {
            strategy,
            mutation_rate: 0.0,
            persist_colors: false,
            spontaneous: None,
            palette: SeedPalette::Plain(Hsl::WHITE),
            started_at: Instant::now(),
        }
    }

    /// The 8 positions around (1, 1) in a 3x3 grid.
    const RING: [(usize, usize); 8] =
        [(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2), (2, 2)];

    #[test]
    fn rule_table() {
        for n in 0..=8 {
            assert_eq!(next_state(true, n), n == 2 || n == 3, "alive with {n}");
            assert_eq!(next_state(false, n), n == 3, "dead with {n}");
        }
    }

    #[test]
    fn step_applies_the_rule_for_every_neighbor_count() {
        let mut engine = LifeEngine::seeded(quiet(Mode::Monochrome), SURFACE, 1).unwrap();
        for center_alive in [false, true] {
            for n in 0..=8 {
                let mut grid = Grid::new(3, 3);
                for &(x, y) in &RING[..n] {
                    grid = grid.with_cell(x, y, live(10.0));
                }
                if center_alive {
                    grid = grid.with_cell(1, 1, live(10.0));
                }
                engine.load_grid(grid);
                engine.step();
                let expected = if center_alive { n == 2 || n == 3 } else { n == 3 };
                assert_eq!(engine.grid().is_alive(1, 1), expected, "alive={center_alive} n={n}");
            }
        }
    }

    #[test]
    fn step_keeps_grid_dimensions() {
        let mut engine = LifeEngine::seeded(quiet(Mode::Majority), SURFACE, 2).unwrap();
        engine.reset();
        let (columns, rows) = (engine.grid().columns(), engine.grid().rows());
        assert_eq!((columns, rows), (40, 30));
        for _ in 0..5 {
            engine.step();
            assert_eq!(engine.grid().columns(), columns);
            assert_eq!(engine.grid().rows(), rows);
        }

        engine.load_grid(Grid::new(7, 5).with_cell(1, 1, live(0.0)));
        engine.step();
        assert_eq!((engine.grid().columns(), engine.grid().rows()), (7, 5));
    }

    #[test]
    fn blinker_oscillates() {
        let mut engine = LifeEngine::seeded(quiet(Mode::Monochrome), SURFACE, 3).unwrap();
        let horizontal = Grid::new(5, 5)
            .with_cell(1, 2, live(0.0))
            .with_cell(2, 2, live(0.0))
            .with_cell(3, 2, live(0.0));
        engine.load_grid(horizontal.clone());

        engine.step();
        assert_eq!(engine.grid().to_string(), "00000\n00100\n00100\n00100\n00000\n");
        engine.step();
        assert!(engine.grid().same_pattern(&horizontal));
    }

    #[test]
    fn persisted_colors_survive() {
        let block = Grid::new(4, 4)
            .with_cell(1, 1, live(10.0))
            .with_cell(2, 1, live(100.0))
            .with_cell(1, 2, live(200.0))
            .with_cell(2, 2, live(300.0));

        let persist = Options {
            persist_colors: Some(true),
            ..quiet(Mode::Majority)
        };
        let mut engine = LifeEngine::seeded(persist, SURFACE, 4).unwrap();
        engine.load_grid(block.clone());
        engine.step();
        assert_eq!(*engine.grid(), block);

        // Without persistence every cell adopts one of its three neighbors' colors.
        let mut engine = LifeEngine::seeded(quiet(Mode::Majority), SURFACE, 4).unwrap();
        engine.load_grid(block.clone());
        engine.step();
        for (x, y, cell) in block.iter().filter(|(_, _, cell)| cell.is_alive()) {
            assert_ne!(engine.grid().get(x, y), cell);
            assert!(engine.grid().is_alive(x, y));
        }
    }

    #[test]
    fn spontaneous_generation_fills_eligible_generations_only() {
        let color = Hsl::new(42.0, 90.0, 50.0);
        let mut engine = LifeEngine::seeded(quiet(Mode::Monochrome), SURFACE, 6).unwrap();
        engine.runtime = Arc::new(RuntimeState {
            spontaneous: Some(Spontaneous {
                probability: 1.0,
                every: 2,
            }),
            ..plain_run(ColorStrategy::Monochrome(color))
        });
        engine.load_grid(Grid::new(6, 4));

        let outcome = engine.step();
        assert_eq!((outcome.generation, outcome.population), (1, 0));

        let outcome = engine.step();
        assert_eq!((outcome.generation, outcome.population), (2, 24));
        assert!(engine.grid().iter().all(|(_, _, cell)| cell == Cell::Alive(color)));

        // Odd generation: only the rule applies, and only the corners survive.
        let outcome = engine.step();
        assert_eq!((outcome.generation, outcome.population), (3, 4));
    }

    #[test]
    fn mutation_wins_over_persistence() {
        // Saturation 50 is below anything random_bright produces.
        let kept = Cell::Alive(Hsl::new(42.0, 50.0, 50.0));
        let block = Grid::new(4, 4)
            .with_cell(1, 1, kept)
            .with_cell(2, 1, kept)
            .with_cell(1, 2, kept)
            .with_cell(2, 2, kept);

        let mut engine = LifeEngine::seeded(quiet(Mode::Majority), SURFACE, 7).unwrap();
        engine.runtime = Arc::new(RuntimeState {
            mutation_rate: 1.0,
            persist_colors: true,
            ..plain_run(ColorStrategy::Majority)
        });
        assert!(engine.runtime().persists());
        engine.load_grid(block.clone());
        engine.step();

        assert!(engine.grid().same_pattern(&block));
        for (x, y, _) in block.iter().filter(|(_, _, cell)| cell.is_alive()) {
            assert_ne!(engine.grid().get(x, y), kept);
        }
    }

    #[test]
    fn newborns_take_the_majority_color() {
        let mut engine = LifeEngine::seeded(quiet(Mode::Majority), SURFACE, 5).unwrap();
        // Three cells in an L give birth at (1, 1).
        let grid = Grid::new(4, 4)
            .with_cell(0, 0, live(40.0))
            .with_cell(1, 0, live(40.0))
            .with_cell(0, 1, live(40.0));
        engine.load_grid(grid);
        engine.step();
        assert_eq!(engine.grid().get(1, 1), live(40.0));
    }

    #[test]
    fn stagnation_tracker_counts_repeats() {
        let mut tracker = StagnationTracker::default();
        let sample = |live_cells, generation| PopulationSample { live_cells, generation };
        tracker.prime(sample(4, 0));
        assert_eq!(tracker.record(sample(4, 1)), 1);
        assert_eq!(tracker.record(sample(4, 2)), 2);
        assert_eq!(tracker.since(), Some(0));
        assert_eq!(tracker.record(sample(5, 3)), 0);
        assert_eq!(tracker.record(sample(5, 4)), 1);
        assert_eq!(tracker.since(), Some(3));
    }

    #[test]
    fn grid_dimensions_include_the_margin() {
        let options = Options {
            cell_pixel_size: 10.0,
            off_grid_margin: 2,
            ..Options::default()
        };
        assert_eq!(grid_dimensions(&options, SurfaceSize::new(95.0, 40.0)).unwrap(), (13, 8));

        let bare = Options {
            off_grid_margin: 0,
            ..options
        };
        assert!(matches!(
            grid_dimensions(&bare, SurfaceSize::new(5.0, 40.0)),
            Err(ConfigurationError::EmptyGrid { .. })
        ));
    }
}
