//! Hand-off of finished generations to readers such as a renderer.
//!
//! The engine swaps in a new `Arc<Frame>` after every step; readers clone the
//! `Arc` and keep drawing from it while the next generation is computed.

use std::sync::{Arc, Mutex, PoisonError};

use crate::grid::Grid;
use crate::runtime::RuntimeState;

/// One published generation with the run it belongs to.
#[derive(Debug, Clone)]
pub struct Frame {
    pub grid: Arc<Grid>,
    pub runtime: Arc<RuntimeState>,
    pub generation: u64,
    pub population: usize,
}

/// Shared slot holding the latest frame.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    slot: Arc<Mutex<Arc<Frame>>>,
}

impl SnapshotReader {
    pub(crate) fn new(frame: Frame) -> Self {
        SnapshotReader {
            slot: Arc::new(Mutex::new(Arc::new(frame))),
        }
    }

    /// The most recently published frame.
    pub fn latest(&self) -> Arc<Frame> {
        let guard = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub(crate) fn publish(&self, frame: Frame) {
        let frame = Arc::new(frame);
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = frame;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn frame(generation: u64) -> Frame {
        let runtime = RuntimeState::roll(&Options::default(), &mut StdRng::seed_from_u64(0));
        Frame {
            grid: Arc::new(Grid::new(2, 2)),
            runtime: Arc::new(runtime),
            generation,
            population: 0,
        }
    }

    #[test]
    fn readers_keep_their_frame_after_a_publish() {
        let reader = SnapshotReader::new(frame(1));
        let other = reader.clone();
        let held = reader.latest();

        reader.publish(frame(2));
        assert_eq!(held.generation, 1);
        assert_eq!(other.latest().generation, 2);
    }
}
