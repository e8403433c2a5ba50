// THEORY:
// `RunConfig` is the single source of truth for one contouring run. It carries the
// three user-facing values (input path, output path, worker count) alongside the
// fixed algorithm constants, which are exposed as public fields so tests can shrink
// them (smaller bounds, other strides) without touching the pipeline itself.

use crate::error::{ContourError, Result};
use std::path::PathBuf;
use tracing::warn;

/// Spacing, in pixels, between two lattice samples. Also the side of every contour patch.
pub const DEFAULT_STRIDE: u32 = 8;
/// A lattice cell is "inside" when the average channel value is at or below this.
pub const DEFAULT_THRESHOLD: u8 = 200;
/// Images larger than this in either dimension are resampled down to exactly this size.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;
/// Number of marching-squares configurations, one patch each.
pub const CONTOUR_CONFIG_COUNT: usize = 16;

/// Configuration for a single run of the contouring pipeline.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub workers: usize,
    /// Directory holding `0.ppm` through `15.ppm`.
    pub contours_dir: PathBuf,
    pub stride: u32,
    pub threshold: u8,
    pub max_width: u32,
    pub max_height: u32,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            workers,
            contours_dir: PathBuf::from("contours"),
            stride: DEFAULT_STRIDE,
            threshold: DEFAULT_THRESHOLD,
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
        }
    }

    /// Path of the patch for configuration `index`.
    pub fn contour_path(&self, index: usize) -> PathBuf {
        self.contours_dir.join(format!("{index}.ppm"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ContourError::config("worker count must be at least 1"));
        }
        if self.stride == 0 {
            return Err(ContourError::config("stride must be at least 1"));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ContourError::config(format!(
                "bounded dimensions must be non-zero, got {}x{}",
                self.max_width, self.max_height
            )));
        }

        let cores = num_cpus::get();
        if self.workers > cores {
            warn!(workers = self.workers, cores, "more workers than available cores");
        }
        Ok(())
    }
}
