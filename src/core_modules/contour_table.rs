// THEORY:
// The `ContourTable` holds the 16 precomputed marching-squares tiles, one per
// corner configuration. The table itself is allocated once under the contour lock;
// the tiles are then decoded in parallel, each worker loading the indices the
// partitioner hands it. Every slot is a `OnceLock`, so a tile can be installed
// exactly once and never changes afterwards.

use crate::config::CONTOUR_CONFIG_COUNT;
use crate::error::{ContourError, Result};
use image::RgbImage;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct ContourTable {
    stride: u32,
    patches: [OnceLock<RgbImage>; CONTOUR_CONFIG_COUNT],
}

impl ContourTable {
    /// An empty table whose tiles must all be `stride` x `stride`.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            patches: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Installs the tile for configuration `index`. `origin` is only used for error reporting.
    pub fn install(&self, index: usize, patch: RgbImage, origin: &Path) -> Result<()> {
        let slot = self
            .patches
            .get(index)
            .ok_or_else(|| ContourError::patch(index, origin, "index outside 0..16"))?;
        if patch.dimensions() != (self.stride, self.stride) {
            return Err(ContourError::patch(
                index,
                origin,
                format!(
                    "expected a {0}x{0} tile, found {1}x{2}",
                    self.stride,
                    patch.width(),
                    patch.height()
                ),
            ));
        }
        slot.set(patch)
            .map_err(|_| ContourError::patch(index, origin, "tile installed twice"))
    }

    /// The tile for configuration `index`, once it has been installed.
    pub fn patch(&self, index: usize) -> Option<&RgbImage> {
        self.patches.get(index).and_then(OnceLock::get)
    }

    pub fn is_complete(&self) -> bool {
        self.patches.iter().all(|slot| slot.get().is_some())
    }
}
