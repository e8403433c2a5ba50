//! Unified error type for the contouring pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for contour_march operations.
#[derive(Error, Debug)]
pub enum ContourError {
    /// Decode or encode failures reported by the `image` crate.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A contour patch asset is missing or does not match the stride.
    #[error("contour patch {index} ({path}): {reason}")]
    Patch {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    /// Invalid run configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker {tid}: {source}")]
    Spawn {
        tid: usize,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked and could not be joined cleanly.
    #[error("worker {tid} panicked")]
    WorkerPanicked { tid: usize },

    /// Another worker already failed; this worker stopped at the next phase boundary.
    #[error("run halted after an earlier failure")]
    Halted,

    /// A resource lock was poisoned by a panicking worker.
    #[error("lock guarding {resource} was poisoned")]
    PoisonedLock { resource: &'static str },

    /// A raster buffer does not hold exactly `width * height * 3` channels.
    #[error("raster buffer of {len} bytes does not match {width}x{height}")]
    RasterSize { width: u32, height: u32, len: usize },
}

/// Type alias for Results using ContourError
pub type Result<T> = std::result::Result<T, ContourError>;

impl ContourError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a contour patch error
    pub fn patch(index: usize, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Patch {
            index,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Process exit status for failures that carry an OS error code.
    ///
    /// A refused thread spawn exits with the raw code the OS returned; every
    /// other failure uses the generic status chosen by the caller.
    pub fn os_exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
