// THEORY:
// The `pipeline` module is the top-level API of the crate. It owns the worker pool
// for one run: it builds the shared context, starts exactly `workers` OS threads
// that each walk the same five-phase sequence with their own id, joins them, and
// reports either success or the first failure any worker recorded.
//
// Phase sequence (identical on every worker):
//   load + allocate  -> [Allocated]
//   rescale          -> [Rescaled]
//   lattice + tiles  -> [Prepared]
//   sample           -> [Sampled]
//   march            -> [Marched]
//   write once
//
// Nothing in a phase reads data that an earlier phase has not finished producing;
// the barrier in brackets is what guarantees it.

use crate::config::RunConfig;
use crate::core_modules::shared_state::{Phase, PhaseCursor, SharedState};
use crate::core_modules::utils::image_helper::{FsImageStore, ImageStore};
use crate::core_modules::{grid_sampler, loader, marcher, rescaler, writer};
use crate::error::{ContourError, Result};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

// Re-export the in-memory store for callers that run without the file system.
pub use crate::core_modules::utils::image_helper::MemoryImageStore;

/// Runs the full pipeline against the file system.
pub fn run(config: RunConfig) -> Result<()> {
    run_with_store(config, Arc::new(FsImageStore))
}

/// Runs the full pipeline, reading and writing images through `store`.
pub fn run_with_store(config: RunConfig, store: Arc<dyn ImageStore>) -> Result<()> {
    config.validate()?;
    let workers = config.workers;
    let started = Instant::now();
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        workers,
        "starting contour run"
    );

    let state = Arc::new(SharedState::new(config, store));

    let mut handles = Vec::with_capacity(workers);
    for tid in 0..workers {
        let shared = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name(format!("contour-worker-{tid}"))
            .spawn(move || worker(tid, &shared))
            .map_err(|source| ContourError::Spawn { tid, source })?;
        handles.push(handle);
    }

    let mut panicked = None;
    for (tid, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() && panicked.is_none() {
            panicked = Some(ContourError::WorkerPanicked { tid });
        }
    }

    if let Some(err) = panicked.or_else(|| state.take_failure()) {
        return Err(err);
    }
    info!(elapsed_ms = started.elapsed().as_millis() as u64, "contour run finished");
    Ok(())
}

/// Entry point of every worker thread.
fn worker(tid: usize, state: &SharedState) {
    let mut phases = PhaseCursor::new(state, tid);
    match run_phases(tid, state, &mut phases) {
        Ok(()) | Err(ContourError::Halted) => {}
        Err(err) => {
            debug!(tid, error = %err, "worker failed");
            state.record_failure(err);
        }
    }
    // Dropping the cursor waits on any barrier this worker has not reached.
}

fn run_phases(tid: usize, state: &SharedState, phases: &mut PhaseCursor<'_>) -> Result<()> {
    let config = state.config();
    let workers = config.workers;

    let frames = loader::load_frames(state)?;
    let contours = loader::allocate_contours(state)?;
    phases.arrive(Phase::Allocated)?;

    rescaler::rescale(&frames, tid, workers);
    phases.arrive(Phase::Rescaled)?;

    let lattice = grid_sampler::allocate_lattice(state, &frames.working)?;
    loader::load_patches(state, &contours, tid)?;
    phases.arrive(Phase::Prepared)?;
    debug_assert!(contours.is_complete(), "contour tiles missing after the load phase");

    grid_sampler::sample(
        &lattice,
        &frames.working,
        config.stride,
        config.threshold,
        tid,
        workers,
    );
    phases.arrive(Phase::Sampled)?;

    marcher::march(&frames.working, &lattice, &contours, tid, workers)?;
    phases.arrive(Phase::Marched)?;

    if writer::write_once(state, &frames.working, tid)? {
        debug!(tid, "worker performed the final write");
    }
    Ok(())
}
