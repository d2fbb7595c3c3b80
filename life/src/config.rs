//! Engine options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Hsl;
use crate::error::ConfigurationError;
use crate::strategy::Mode;

/// Everything a caller can tune. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Edge length of one cell in pixels.
    pub cell_pixel_size: f32,
    /// Target time between two generations.
    pub step_interval_ms: u64,
    /// Shortest pause between generations, however slow a step was.
    pub min_step_interval_ms: u64,
    /// Share of cells alive in a freshly seeded grid.
    pub start_population_fraction: f64,
    /// Reseed once the live share drops below this.
    pub min_population_fraction: f64,
    pub max_generations: Option<u64>,
    /// Reseed after this many generations in a row with an unchanged population. 0 disables.
    pub stale_generation_threshold: u32,
    /// Pinned color strategy; picked at random on every reset when absent.
    pub mode: Option<Mode>,
    /// Keep colors of surviving cells; a coin flip per run when absent.
    pub persist_colors: Option<bool>,
    pub max_spectrum_repeats: u32,
    pub background_color: Option<Hsl>,
    /// Hidden cells on every side of the visible area.
    pub off_grid_margin: usize,
    /// Chance that a seeded grid is painted as a positional spectrum.
    pub spectrum_probability: f64,
    /// Chance that a run has mutations at all.
    pub mutation_chance: f64,
    /// Upper bound of a run's mutation rate.
    pub max_mutation_rate: f64,
    /// Chance that a run has spontaneous generation.
    pub spontaneous_chance: f64,
    pub show_fps: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            cell_pixel_size: 5.0,
            step_interval_ms: 100,
            min_step_interval_ms: 5,
            start_population_fraction: 0.35,
            min_population_fraction: 0.05,
            max_generations: None,
            stale_generation_threshold: 100,
            mode: None,
            persist_colors: None,
            max_spectrum_repeats: 5,
            background_color: None,
            off_grid_margin: 10,
            spectrum_probability: 0.4,
            mutation_chance: 0.1,
            max_mutation_rate: 0.1,
            spontaneous_chance: 0.05,
            show_fps: false,
        }
    }
}

impl Options {
    /// Parses options from JSON and validates them.
    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        let options: Options = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cell_pixel_size.is_nan() || self.cell_pixel_size <= 0.0 {
            return Err(ConfigurationError::CellSize(self.cell_pixel_size));
        }
        if self.step_interval_ms == 0 {
            return Err(ConfigurationError::Interval {
                name: "step_interval_ms",
            });
        }
        if self.min_step_interval_ms == 0 {
            return Err(ConfigurationError::Interval {
                name: "min_step_interval_ms",
            });
        }
        for (name, value) in [
            ("start_population_fraction", self.start_population_fraction),
            ("min_population_fraction", self.min_population_fraction),
            ("spectrum_probability", self.spectrum_probability),
            ("mutation_chance", self.mutation_chance),
            ("max_mutation_rate", self.max_mutation_rate),
            ("spontaneous_chance", self.spontaneous_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::Fraction { name, value });
            }
        }
        if self.max_spectrum_repeats == 0 {
            return Err(ConfigurationError::SpectrumRepeats);
        }
        if self.max_generations == Some(0) {
            return Err(ConfigurationError::MaxGenerations);
        }
        Ok(())
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn min_step_interval(&self) -> Duration {
        Duration::from_millis(self.min_step_interval_ms)
    }
}
