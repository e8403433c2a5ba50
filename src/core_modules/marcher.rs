// THEORY:
// The marcher is the marching-squares step proper. For every primary lattice cell
// it reads the four corners clockwise from the top-left, forms the 4-bit
// configuration code, and stamps the matching contour tile over the `stride` x
// `stride` block of the working image that the cell covers.
//
// Rows are partitioned exactly like the grid sampler's, and each cell owns a
// disjoint block of pixels, so workers never write the same pixel.

use crate::core_modules::contour_table::ContourTable;
use crate::core_modules::lattice::OccupancyLattice;
use crate::core_modules::partition;
use crate::core_modules::raster::Raster;
use crate::error::{ContourError, Result};
use image::RgbImage;

/// Copies `patch` into `image` with its top-left corner at `(x, y)`.
#[inline]
fn stamp(image: &Raster, patch: &RgbImage, x: u32, y: u32) {
    for (px, py, pixel) in patch.enumerate_pixels() {
        image.set(x + px, y + py, pixel.0);
    }
}

/// Stamps this worker's rows of cells into the working image.
pub fn march(
    image: &Raster,
    lattice: &OccupancyLattice,
    table: &ContourTable,
    tid: usize,
    workers: usize,
) -> Result<()> {
    let stride = table.stride();
    for row in partition::slice(tid, workers, lattice.primary_rows()) {
        for col in 0..lattice.primary_cols() {
            let code = lattice.configuration(row, col);
            let patch = table.patch(code).ok_or_else(|| {
                ContourError::patch(code, table_origin(code), "tile was never loaded")
            })?;
            stamp(image, patch, col as u32 * stride, row as u32 * stride);
        }
    }
    Ok(())
}

fn table_origin(code: usize) -> String {
    format!("<contour table slot {code}>")
}
