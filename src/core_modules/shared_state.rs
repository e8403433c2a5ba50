// THEORY:
// `SharedState` is the one context object every worker holds a reference to. It
// replaces what would otherwise be process-wide globals: the images, the contour
// table, the lattice, the locks guarding their construction, and the barriers that
// separate the compute phases.
//
// Key architectural principles:
// 1.  **Guarded lazy construction**: Each lazily-built resource lives in its own
//     `LazySlot`, so building one never serializes against building another. The
//     first worker to take a slot's lock builds the resource; every other worker
//     finds it ready and takes a clone of the `Arc`.
// 2.  **Barriers publish, locks deduplicate**: The slot lock only decides *who*
//     builds. What makes the fully-built contents (including everything written
//     through `Raster` and lattice atomics) visible to all workers is the phase
//     barrier that every worker passes after releasing the lock.
// 3.  **Failure is a phase outcome, not a deadlock**: A worker that fails records
//     the error here and keeps arriving at every remaining barrier through its
//     `PhaseCursor`. Everyone else sees the failure after the next rendezvous and
//     stops doing work, so the pool always drains and the orchestrator can report
//     the first error.

use crate::config::RunConfig;
use crate::core_modules::contour_table::ContourTable;
use crate::core_modules::lattice::OccupancyLattice;
use crate::core_modules::raster::Raster;
use crate::core_modules::utils::image_helper::ImageStore;
use crate::error::{ContourError, Result};
use std::sync::{Arc, Barrier, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// The five rendezvous points, in the order every worker reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Source decoded, working buffer and contour table allocated.
    Allocated,
    /// Working image fully resampled (or aliased).
    Rescaled,
    /// Lattice allocated and every contour patch loaded.
    Prepared,
    /// Every lattice cell sampled.
    Sampled,
    /// Every lattice cell stamped into the working image.
    Marched,
}

pub const PHASE_COUNT: usize = 5;

impl Phase {
    pub const ALL: [Phase; PHASE_COUNT] = [
        Phase::Allocated,
        Phase::Rescaled,
        Phase::Prepared,
        Phase::Sampled,
        Phase::Marched,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// The decoded source and the image the later phases work on.
#[derive(Debug)]
pub struct Frames {
    pub source: Arc<Raster>,
    pub working: Arc<Raster>,
}

impl Frames {
    /// True when the source fit the bounds and no resampling copy exists.
    pub fn is_aliased(&self) -> bool {
        Arc::ptr_eq(&self.source, &self.working)
    }
}

enum SlotState<T> {
    Empty,
    Ready(Arc<T>),
    Failed,
}

/// A resource built at most once by whichever worker gets to it first.
pub struct LazySlot<T> {
    resource: &'static str,
    state: Mutex<SlotState<T>>,
}

impl<T> LazySlot<T> {
    fn new(resource: &'static str) -> Self {
        Self {
            resource,
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Returns the resource, building it under the slot lock if nobody has yet.
    ///
    /// A failed build is remembered: later callers get `ContourError::Halted`
    /// instead of retrying the construction.
    pub fn get_or_build(&self, build: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let mut guard = self.state.lock().map_err(|_| ContourError::PoisonedLock {
            resource: self.resource,
        })?;
        match &*guard {
            SlotState::Ready(existing) => return Ok(Arc::clone(existing)),
            SlotState::Failed => return Err(ContourError::Halted),
            SlotState::Empty => {}
        }
        match build() {
            Ok(value) => {
                let built = Arc::new(value);
                *guard = SlotState::Ready(Arc::clone(&built));
                debug!(resource = self.resource, "constructed shared resource");
                Ok(built)
            }
            Err(err) => {
                *guard = SlotState::Failed;
                Err(err)
            }
        }
    }

    /// The published resource, if it has been built.
    #[cfg(test)]
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            SlotState::Ready(existing) => Some(Arc::clone(existing)),
            _ => None,
        }
    }
}

/// Everything the workers share for one run.
pub struct SharedState {
    config: RunConfig,
    store: Arc<dyn ImageStore>,
    frames: LazySlot<Frames>,
    contours: LazySlot<ContourTable>,
    lattice: LazySlot<OccupancyLattice>,
    written: Mutex<bool>,
    failure: Mutex<Option<ContourError>>,
    barriers: [Barrier; PHASE_COUNT],
}

impl SharedState {
    pub fn new(config: RunConfig, store: Arc<dyn ImageStore>) -> Self {
        let workers = config.workers;
        Self {
            config,
            store,
            frames: LazySlot::new("frames"),
            contours: LazySlot::new("contours"),
            lattice: LazySlot::new("lattice"),
            written: Mutex::new(false),
            failure: Mutex::new(None),
            barriers: std::array::from_fn(|_| Barrier::new(workers)),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ImageStore {
        self.store.as_ref()
    }

    pub fn frames(&self) -> &LazySlot<Frames> {
        &self.frames
    }

    pub fn contours(&self) -> &LazySlot<ContourTable> {
        &self.contours
    }

    pub fn lattice(&self) -> &LazySlot<OccupancyLattice> {
        &self.lattice
    }

    /// Lock guarding the "final image written" flag.
    pub fn write_flag(&self) -> Result<MutexGuard<'_, bool>> {
        self.written.lock().map_err(|_| ContourError::PoisonedLock {
            resource: "write flag",
        })
    }

    /// Records `err` unless an earlier failure is already recorded.
    pub fn record_failure(&self, err: ContourError) {
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            *failure = Some(err);
        }
    }

    pub fn failed(&self) -> bool {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Takes the first recorded failure, if any.
    pub fn take_failure(&self) -> Option<ContourError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Blocks until every worker has reached `phase`.
    fn rendezvous(&self, phase: Phase) {
        if self.barriers[phase.index()].wait().is_leader() {
            debug!(?phase, "phase complete");
        }
    }
}

/// Tracks which barriers one worker has passed.
///
/// Dropping the cursor, including during a panic, waits on every barrier the
/// worker has not reached yet, so the rest of the pool is never left blocked.
pub struct PhaseCursor<'a> {
    state: &'a SharedState,
    tid: usize,
    next: usize,
}

impl<'a> PhaseCursor<'a> {
    pub fn new(state: &'a SharedState, tid: usize) -> Self {
        Self { state, tid, next: 0 }
    }

    /// Waits at `phase`, then reports whether the run is still healthy.
    pub fn arrive(&mut self, phase: Phase) -> Result<()> {
        debug_assert_eq!(phase.index(), self.next, "phases must be reached in order");
        self.state.rendezvous(phase);
        self.next = phase.index() + 1;
        if self.state.failed() {
            Err(ContourError::Halted)
        } else {
            Ok(())
        }
    }

    fn drain(&mut self) {
        while self.next < PHASE_COUNT {
            self.state.rendezvous(Phase::ALL[self.next]);
            self.next += 1;
        }
    }
}

impl Drop for PhaseCursor<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.state
                .record_failure(ContourError::WorkerPanicked { tid: self.tid });
        }
        self.drain();
    }
}
