//! Per-run parameters, rolled once at reset and fixed until the next one.

use std::time::Instant;

use rand::Rng;

use crate::color::{self, Hsl};
use crate::config::Options;
use crate::strategy::{ColorStrategy, Generational, Mode};

/// Chance that a generational run cycles through the hue wheel rather than sharing one color.
const GENERATIONAL_SPECTRUM_CHANCE: f64 = 0.7;
/// Upper bound of the generational spread when no generation limit is configured.
const DEFAULT_SPREAD_LIMIT: u64 = 1000;
const MIN_SPREAD: u64 = 100;
/// Upper bound of the generational spread even for huge generation limits.
const MAX_SPREAD: u64 = u32::MAX as u64;
const MAX_SPONTANEOUS_PROBABILITY: f64 = 0.001;

/// Random revival of dead cells, independent of the rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spontaneous {
    /// Chance per dead cell on an eligible generation.
    pub probability: f64,
    /// Only every `every`-th generation is eligible.
    pub every: u64,
}

/// How cells of a freshly seeded grid are colored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedPalette {
    Plain(Hsl),
    Spectrum(SpectrumField),
    Random,
}

impl SeedPalette {
    pub fn color<R: Rng + ?Sized>(
        &self,
        x: usize,
        y: usize,
        columns: usize,
        rows: usize,
        rng: &mut R,
    ) -> Hsl {
        match self {
            SeedPalette::Plain(color) => *color,
            SeedPalette::Spectrum(field) => field.color(x, y, columns, rows),
            SeedPalette::Random => color::random_bright(rng),
        }
    }
}

/// Positional rainbow: hue sweeps along one axis, lightness along the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumField {
    repeats: u32,
    forward: bool,
    rotated: bool,
    x_shift: u32,
    y_shift: u32,
}

impl SpectrumField {
    pub fn roll<R: Rng + ?Sized>(max_repeats: u32, rng: &mut R) -> Self {
        SpectrumField {
            repeats: rng.random_range(1..=max_repeats.max(1)),
            forward: rng.random_bool(0.5),
            rotated: rng.random_bool(0.5),
            x_shift: rng.random_range(1..=1000),
            y_shift: rng.random_range(1..=1000),
        }
    }

    pub fn color(&self, x: usize, y: usize, columns: usize, rows: usize) -> Hsl {
        let band = |pos: usize, shift: u32, extent: usize| {
            (pos as f64 + f64::from(shift)) / (extent.max(1) as f64 / f64::from(self.repeats))
        };
        let xb = band(x, self.x_shift, columns);
        let yb = band(y, self.y_shift, rows);

        // Alternate bands run in opposite directions so the sweep has no seams.
        let direction = |b: f64| {
            if (b % 2.0).floor() == 0.0 {
                self.forward
            } else {
                !self.forward
            }
        };
        let modifier = |b: f64| {
            let fraction = ((b * 10000.0) % 10000.0).floor() / 10000.0;
            if direction(b) {
                fraction
            } else {
                1.0 - fraction
            }
        };

        let (hue_band, light_band) = if self.rotated { (xb, yb) } else { (yb, xb) };
        let hue = (modifier(hue_band) * 360.0) % 360.0;
        let lightness = (modifier(light_band) * 50.0) % 50.0 + 30.0;
        Hsl::new(hue as f32, 100.0, lightness as f32)
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeState {
    pub strategy: ColorStrategy,
    /// Chance that a live cell takes a fresh random color instead of its strategy's.
    pub mutation_rate: f64,
    pub persist_colors: bool,
    pub spontaneous: Option<Spontaneous>,
    pub palette: SeedPalette,
    pub started_at: Instant,
}

impl RuntimeState {
    pub fn roll<R: Rng + ?Sized>(options: &Options, rng: &mut R) -> Self {
        let mutation_rate = if rng.random_bool(options.mutation_chance) {
            rng.random::<f64>() * options.max_mutation_rate
        } else {
            0.0
        };

        let spontaneous = rng.random_bool(options.spontaneous_chance).then(|| Spontaneous {
            probability: MAX_SPONTANEOUS_PROBABILITY * rng.random::<f64>(),
            every: rng.random_range(1..=3),
        });

        let mode = match options.mode {
            Some(mode) => mode,
            None => Mode::AUTO[rng.random_range(0..Mode::AUTO.len())],
        };
        let persist_colors = options.persist_colors.unwrap_or_else(|| rng.random_bool(0.5));
        let strategy = roll_strategy(mode, options, rng);

        let palette = match mode {
            Mode::Monochrome | Mode::Density if options.background_color.is_some() => {
                SeedPalette::Plain(Hsl::BLACK)
            }
            Mode::Monochrome | Mode::Density => SeedPalette::Plain(Hsl::WHITE),
            _ if rng.random_bool(options.spectrum_probability) => {
                SeedPalette::Spectrum(SpectrumField::roll(options.max_spectrum_repeats, rng))
            }
            _ => SeedPalette::Random,
        };

        RuntimeState {
            strategy,
            mutation_rate,
            persist_colors,
            spontaneous,
            palette,
            started_at: Instant::now(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.strategy.mode()
    }

    /// Whether surviving cells keep their previous color this run.
    pub fn persists(&self) -> bool {
        match self.mode() {
            Mode::Generational => true,
            mode => mode.supports_persistence() && self.persist_colors,
        }
    }

    /// Mode name plus active modifiers, e.g. "Density (mutations, spontaneous generation)".
    pub fn title(&self) -> String {
        let mut modifiers = Vec::new();
        if self.mutation_rate > 0.0 {
            modifiers.push("mutations");
        }
        match self.strategy {
            ColorStrategy::Generational(Generational::Spectrum { .. }) => {
                modifiers.push("spectrum")
            }
            ColorStrategy::Generational(Generational::Shared) => modifiers.push("random"),
            _ => {}
        }
        if self.spontaneous.is_some() {
            modifiers.push("spontaneous generation");
        }

        let title = self.mode().title();
        if modifiers.is_empty() {
            title
        } else {
            format!("{title} ({})", modifiers.join(", "))
        }
    }
}

fn roll_strategy<R: Rng + ?Sized>(mode: Mode, options: &Options, rng: &mut R) -> ColorStrategy {
    match mode {
        Mode::Majority => ColorStrategy::Majority,
        Mode::BlendWheel => ColorStrategy::BlendWheel,
        Mode::BlendSpectrum => ColorStrategy::BlendSpectrum,
        Mode::Random => ColorStrategy::Random,
        Mode::Monochrome => ColorStrategy::Monochrome(color::random_bright(rng)),
        Mode::Density => {
            let span = rng.random_range(90..=120);
            ColorStrategy::Density {
                radius: rng.random_range(2..=5),
                inverted: rng.random_bool(0.5),
                span: span as f32,
                offset: rng.random_range(0..=360 - span) as f32,
            }
        }
        Mode::Generational => {
            if !rng.random_bool(GENERATIONAL_SPECTRUM_CHANCE) {
                return ColorStrategy::Generational(Generational::Shared);
            }
            let limit = options
                .max_generations
                .unwrap_or(DEFAULT_SPREAD_LIMIT)
                .clamp(MIN_SPREAD, MAX_SPREAD);
            let spread = centered_range(MIN_SPREAD, limit, rng);
            let offset = rng.random_range(0..spread);
            ColorStrategy::Generational(Generational::Spectrum { spread, offset })
        }
    }
}

/// Integer in `[min, max]`, biased towards the middle (mean of two uniform draws).
fn centered_range<R: Rng + ?Sized>(min: u64, max: u64, rng: &mut R) -> u64 {
    let centered = (rng.random::<f64>() + rng.random::<f64>()) / 2.0;
    let width = (max - min) as f64 + 1.0;
    min.saturating_add((centered * width) as u64).min(max)
}
