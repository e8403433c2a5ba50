// THEORY:
// The grid sampler turns the working image into the binary occupancy lattice the
// marcher walks. A cell is "inside" when the truncated channel average of the pixel
// under it is at or below the threshold.
//
// Work split:
// -   Primary rows `[0, P)` are partitioned across workers. Each worker samples the
//     primary columns of its rows at `x = col * stride` and the border column at the
//     image's rightmost pixel.
// -   The bottom border row `P` is sampled along the image's bottom row by the
//     worker holding the last slice only, so no two workers touch the same cell.

use crate::core_modules::lattice::OccupancyLattice;
use crate::core_modules::partition;
use crate::core_modules::raster::{Raster, average};
use crate::core_modules::shared_state::SharedState;
use crate::error::Result;
use std::sync::Arc;

/// Allocates the lattice from the working image's final dimensions, once.
pub fn allocate_lattice(state: &SharedState, working: &Raster) -> Result<Arc<OccupancyLattice>> {
    let stride = state.config().stride;
    state
        .lattice()
        .get_or_build(|| Ok(OccupancyLattice::for_image(working.width(), working.height(), stride)))
}

#[inline]
fn inside(image: &Raster, x: u32, y: u32, threshold: u8) -> bool {
    average(image.get(x, y)) <= threshold
}

/// Samples this worker's rows of the lattice (and the bottom border for the last worker).
pub fn sample(
    lattice: &OccupancyLattice,
    image: &Raster,
    stride: u32,
    threshold: u8,
    tid: usize,
    workers: usize,
) {
    let rows = lattice.primary_rows();
    let cols = lattice.primary_cols();
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let right = image.width() - 1;
    let bottom = image.height() - 1;

    for row in partition::slice(tid, workers, rows) {
        let y = row as u32 * stride;
        for col in 0..cols {
            lattice.set(row, col, inside(image, col as u32 * stride, y, threshold));
        }
        lattice.set(row, cols, inside(image, right, y, threshold));
    }

    if tid == workers - 1 {
        for col in 0..cols {
            lattice.set(rows, col, inside(image, col as u32 * stride, bottom, threshold));
        }
        lattice.set(rows, cols, inside(image, right, bottom, threshold));
    }
}
