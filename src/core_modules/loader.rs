// THEORY:
// The loader is the first thing every worker runs. Its job is to make sure the
// inputs exist exactly once no matter how many workers ask for them:
//
// 1.  **Frames**: The first worker through the frame lock decodes the source and
//     decides whether a separate working buffer is needed. If the source already
//     fits the bounds, the working image *is* the source (same `Arc`); otherwise a
//     blank buffer at exactly the bounded size is allocated for the rescaler.
// 2.  **Contour table**: The table is allocated under its own lock, independent of
//     the frame lock.
// 3.  **Contour tiles**: After the first barrier, each worker decodes the slice of
//     the 16 tiles the partitioner assigns to it, so every tile is read once.

use crate::config::CONTOUR_CONFIG_COUNT;
use crate::core_modules::contour_table::ContourTable;
use crate::core_modules::partition;
use crate::core_modules::raster::Raster;
use crate::core_modules::shared_state::{Frames, SharedState};
use crate::error::{ContourError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Decodes the source image and allocates the working image, once.
pub fn load_frames(state: &SharedState) -> Result<Arc<Frames>> {
    state.frames().get_or_build(|| {
        let config = state.config();
        let decoded = state.store().load(&config.input)?;
        let source = Arc::new(Raster::from_rgb_image(&decoded));

        let fits = source.width() <= config.max_width && source.height() <= config.max_height;
        let working = if fits {
            Arc::clone(&source)
        } else {
            Arc::new(Raster::new(config.max_width, config.max_height))
        };

        info!(
            width = source.width(),
            height = source.height(),
            working_width = working.width(),
            working_height = working.height(),
            aliased = fits,
            "source image decoded"
        );
        Ok(Frames { source, working })
    })
}

/// Allocates the empty contour table, once.
pub fn allocate_contours(state: &SharedState) -> Result<Arc<ContourTable>> {
    state
        .contours()
        .get_or_build(|| Ok(ContourTable::new(state.config().stride)))
}

/// Decodes this worker's share of the contour tiles into `table`.
pub fn load_patches(state: &SharedState, table: &ContourTable, tid: usize) -> Result<()> {
    let config = state.config();
    for index in partition::slice(tid, config.workers, CONTOUR_CONFIG_COUNT) {
        let path = config.contour_path(index);
        let patch = state
            .store()
            .load(&path)
            .map_err(|err| ContourError::patch(index, &path, err.to_string()))?;
        table.install(index, patch, &path)?;
        debug!(tid, index, "contour tile loaded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::core_modules::utils::image_helper::{ImageStore, MemoryImageStore};
    use image::RgbImage;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryImageStore,
        loads: AtomicUsize,
    }

    impl ImageStore for CountingStore {
        fn load(&self, path: &Path) -> Result<RgbImage> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(path)
        }

        fn persist(&self, image: &RgbImage, path: &Path) -> Result<()> {
            self.inner.persist(image, path)
        }
    }

    fn state_with(source: RgbImage, workers: usize, max: u32) -> (SharedState, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::default());
        store.inner.insert("in.ppm", source);
        let mut config = RunConfig::new("in.ppm", "out.ppm", workers);
        config.max_width = max;
        config.max_height = max;
        (SharedState::new(config, store.clone()), store)
    }

    #[test]
    fn source_within_bounds_is_aliased() {
        let (state, _) = state_with(RgbImage::from_pixel(32, 32, image::Rgb([1, 2, 3])), 1, 32);
        let frames = load_frames(&state).expect("frames");
        assert!(frames.is_aliased());
        assert_eq!(frames.working.get(31, 31), [1, 2, 3]);
    }

    #[test]
    fn oversized_source_gets_a_bounded_buffer() {
        let (state, _) = state_with(RgbImage::new(33, 10), 1, 32);
        let frames = load_frames(&state).expect("frames");
        assert!(!frames.is_aliased());
        assert_eq!((frames.working.width(), frames.working.height()), (32, 32));
    }

    #[test]
    fn source_is_decoded_once_for_many_workers() {
        let (state, store) = state_with(RgbImage::new(8, 8), 8, 2048);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| load_frames(&state).expect("frames"));
            }
        });
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn every_tile_is_decoded_exactly_once() {
        let workers = 5;
        let (state, store) = state_with(RgbImage::new(8, 8), workers, 2048);
        for k in 0..CONTOUR_CONFIG_COUNT {
            store
                .inner
                .insert(state.config().contour_path(k), RgbImage::new(8, 8));
        }
        let table = allocate_contours(&state).expect("table");
        std::thread::scope(|s| {
            for tid in 0..workers {
                let (state, table) = (&state, &table);
                s.spawn(move || load_patches(state, table, tid).expect("tiles"));
            }
        });
        assert!(table.is_complete());
        assert_eq!(store.loads.load(Ordering::SeqCst), CONTOUR_CONFIG_COUNT);
    }
}
