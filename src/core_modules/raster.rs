// THEORY:
// The `Raster` is the shared pixel buffer every phase reads from or writes into.
// Several workers hold the same `Arc<Raster>` at once and each writes a disjoint
// region handed out by the partitioner, so the buffer has to accept writes through
// a shared reference.
//
// Key architectural principles:
// 1.  **Interior mutability without locks**: Channels are stored as `AtomicU8` and
//     accessed with `Relaxed` ordering. On every mainstream target that compiles to
//     plain byte loads and stores, so the hot loops pay nothing for it.
// 2.  **Ordering comes from the phases**: `Relaxed` only promises that a byte is never
//     torn. Whether phase `k + 1` sees what phase `k` wrote is decided by the barrier
//     between them, which is a full happens-before edge.
// 3.  **Boundary with the codec layer**: Decoding and encoding stay in the `image`
//     crate. A `Raster` is built from an `RgbImage` once and snapshotted back into one
//     for the final write.

use crate::error::{ContourError, Result};
use image::RgbImage;
use std::sync::atomic::{AtomicU8, Ordering};

pub type Rgb = [u8; 3];

const CHANNELS: usize = 3;

/// A row-major RGB8 buffer that tolerates concurrent writes to disjoint pixels.
#[derive(Debug)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Box<[AtomicU8]>,
}

impl Raster {
    /// Allocates a black raster of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * CHANNELS;
        Self {
            width,
            height,
            data: (0..len).map(|_| AtomicU8::new(0)).collect(),
        }
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().iter().map(|&b| AtomicU8::new(b)).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Rgb {
        self.get_index(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    pub fn get_index(&self, index: usize) -> Rgb {
        let base = index * CHANNELS;
        [
            self.data[base].load(Ordering::Relaxed),
            self.data[base + 1].load(Ordering::Relaxed),
            self.data[base + 2].load(Ordering::Relaxed),
        ]
    }

    #[inline]
    pub fn set(&self, x: u32, y: u32, rgb: Rgb) {
        self.set_index(y as usize * self.width as usize + x as usize, rgb);
    }

    #[inline]
    pub fn set_index(&self, index: usize, rgb: Rgb) {
        let base = index * CHANNELS;
        for (channel, value) in self.data[base..base + CHANNELS].iter().zip(rgb) {
            channel.store(value, Ordering::Relaxed);
        }
    }

    /// Copies the current contents into an owned `RgbImage` for encoding.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let bytes: Vec<u8> = self.data.iter().map(|b| b.load(Ordering::Relaxed)).collect();
        let len = bytes.len();
        RgbImage::from_raw(self.width, self.height, bytes).ok_or(ContourError::RasterSize {
            width: self.width,
            height: self.height,
            len,
        })
    }
}

/// Truncating channel average used for thresholding.
#[inline]
pub fn average(rgb: Rgb) -> u8 {
    ((rgb[0] as u16 + rgb[1] as u16 + rgb[2] as u16) / 3) as u8
}
