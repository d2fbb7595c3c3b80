//! Conway's Game of Life where every live cell carries a color derived from
//! its neighbors.
//!
//! [`LifeEngine`] owns the current generation and the parameters of the
//! running simulation. Each [`LifeEngine::step`] builds a new [`Grid`] from
//! the previous one, colors live cells with the run's [`ColorStrategy`], and
//! reseeds when the population dies out or stops changing.

pub mod codec;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod neighborhood;
pub mod render;
pub mod runtime;
pub mod scheduler;
pub mod snapshot;
pub mod strategy;

pub use color::Hsl;
pub use config::Options;
pub use engine::{LifeEngine, Phase, ReseedReason, StepOutcome};
pub use error::{ConfigurationError, DecodeError};
pub use grid::{Cell, Grid};
pub use render::{RenderSurface, SurfaceSize};
pub use runtime::RuntimeState;
pub use scheduler::Scheduler;
pub use snapshot::{Frame, SnapshotReader};
pub use strategy::{ColorStrategy, Mode};
