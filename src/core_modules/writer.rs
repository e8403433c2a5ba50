//! The final write: exactly one worker encodes and persists the working image.

use crate::core_modules::raster::Raster;
use crate::core_modules::shared_state::SharedState;
use crate::error::Result;
use tracing::info;

/// Persists `working` unless another worker already has.
///
/// Returns `true` for the one worker that performed the write. The flag is set
/// before encoding, so a failed write is reported once and never retried.
pub fn write_once(state: &SharedState, working: &Raster, tid: usize) -> Result<bool> {
    let mut written = state.write_flag()?;
    if *written {
        return Ok(false);
    }
    *written = true;

    let output = &state.config().output;
    state.store().persist(&working.to_rgb_image()?, output)?;
    info!(tid, path = %output.display(), "contour image written");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::core_modules::utils::image_helper::MemoryImageStore;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn only_one_worker_writes() {
        let store = Arc::new(MemoryImageStore::new());
        let state = SharedState::new(RunConfig::new("in.ppm", "out.ppm", 6), store.clone());
        let raster = Raster::new(2, 2);
        let writers = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for tid in 0..6 {
                let (state, raster, writers) = (&state, &raster, &writers);
                s.spawn(move || {
                    if write_once(state, raster, tid).expect("write") {
                        writers.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(writers.load(Ordering::SeqCst), 1);
        assert_eq!(store.persist_count(), 1);
        assert!(store.get(Path::new("out.ppm")).is_some());
    }
}
