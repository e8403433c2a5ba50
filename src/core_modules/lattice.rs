// THEORY:
// The `OccupancyLattice` is the binary sampling of the working image that the
// marcher walks. It has `P = height / stride` primary rows and `Q = width / stride`
// primary columns, plus one border row and one border column so that every primary
// cell has its right, lower, and lower-right neighbours without bounds checks.
//
// It is a single flat buffer of `(P + 1) * (Q + 1)` cells. Each row is written by
// exactly one worker during sampling (the border row by the last worker) and the
// whole lattice is read-only once the sampling barrier has been passed.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct OccupancyLattice {
    primary_rows: usize,
    primary_cols: usize,
    cells: Box<[AtomicBool]>,
}

impl OccupancyLattice {
    /// Sizes the lattice for a working image of `width` x `height` pixels.
    pub fn for_image(width: u32, height: u32, stride: u32) -> Self {
        let primary_rows = (height / stride) as usize;
        let primary_cols = (width / stride) as usize;
        let len = (primary_rows + 1) * (primary_cols + 1);
        Self {
            primary_rows,
            primary_cols,
            cells: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Number of primary rows, `P`. Row `P` is the bottom border.
    pub fn primary_rows(&self) -> usize {
        self.primary_rows
    }

    /// Number of primary columns, `Q`. Column `Q` is the right border.
    pub fn primary_cols(&self) -> usize {
        self.primary_cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(row <= self.primary_rows && col <= self.primary_cols);
        row * (self.primary_cols + 1) + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[self.index(row, col)].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set(&self, row: usize, col: usize, value: bool) {
        self.cells[self.index(row, col)].store(value, Ordering::Relaxed);
    }

    /// Marching-squares configuration of cell `(row, col)`.
    ///
    /// Corners are read clockwise from the top-left: TL = 8, TR = 4, BR = 2, BL = 1.
    #[inline]
    pub fn configuration(&self, row: usize, col: usize) -> usize {
        8 * self.get(row, col) as usize
            + 4 * self.get(row, col + 1) as usize
            + 2 * self.get(row + 1, col + 1) as usize
            + self.get(row + 1, col) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_include_border() {
        let lattice = OccupancyLattice::for_image(16, 16, 8);
        assert_eq!((lattice.primary_rows(), lattice.primary_cols()), (2, 2));
        lattice.set(2, 2, true);
        assert!(lattice.get(2, 2));
    }

    #[test]
    fn non_square_images_split_rows_by_height() {
        let lattice = OccupancyLattice::for_image(40, 17, 8);
        assert_eq!(lattice.primary_rows(), 2);
        assert_eq!(lattice.primary_cols(), 5);
    }

    #[test]
    fn configuration_weights_corners_clockwise() {
        let lattice = OccupancyLattice::for_image(8, 8, 8);
        // (TL, TR, BR, BL) = (1, 0, 1, 0)
        lattice.set(0, 0, true);
        lattice.set(1, 1, true);
        assert_eq!(lattice.configuration(0, 0), 10);

        lattice.set(0, 1, true);
        lattice.set(1, 0, true);
        assert_eq!(lattice.configuration(0, 0), 15);
    }

    #[test]
    fn empty_configuration_is_zero() {
        let lattice = OccupancyLattice::for_image(8, 8, 8);
        assert_eq!(lattice.configuration(0, 0), 0);
    }
}
