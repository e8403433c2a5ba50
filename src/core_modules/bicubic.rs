//! Catmull-Rom bicubic point sampling over a `Raster`.

use crate::core_modules::raster::{Raster, Rgb};

#[inline]
fn cubic_hermite(a: f32, b: f32, c: f32, d: f32, t: f32) -> f32 {
    let a3 = -a / 2.0 + (3.0 * b) / 2.0 - (3.0 * c) / 2.0 + d / 2.0;
    let a2 = a - (5.0 * b) / 2.0 + 2.0 * c - d / 2.0;
    let a1 = -a / 2.0 + c / 2.0;
    let a0 = b;
    ((a3 * t + a2) * t + a1) * t + a0
}

#[inline]
fn clamped(image: &Raster, x: i64, y: i64) -> Rgb {
    let x = x.clamp(0, image.width() as i64 - 1) as u32;
    let y = y.clamp(0, image.height() as i64 - 1) as u32;
    image.get(x, y)
}

/// Samples `image` at normalized coordinates `(u, v)` in `[0, 1]`.
///
/// `u` runs along the width and `v` along the height. Neighbours that fall outside
/// the image are clamped to the nearest edge pixel.
pub fn sample(image: &Raster, u: f32, v: f32) -> Rgb {
    let x = u * image.width() as f32 - 0.5;
    let y = v * image.height() as f32 - 0.5;
    let x_int = x.floor() as i64;
    let y_int = y.floor() as i64;
    let x_fract = x - x.floor();
    let y_fract = y - y.floor();

    let mut neighbourhood = [[[0u8; 3]; 4]; 4];
    for (row, dy) in neighbourhood.iter_mut().zip(-1i64..=2) {
        for (cell, dx) in row.iter_mut().zip(-1i64..=2) {
            *cell = clamped(image, x_int + dx, y_int + dy);
        }
    }

    let mut out = [0u8; 3];
    for (channel, value) in out.iter_mut().enumerate() {
        let mut columns = [0f32; 4];
        for (column, row) in columns.iter_mut().zip(&neighbourhood) {
            *column = cubic_hermite(
                row[0][channel] as f32,
                row[1][channel] as f32,
                row[2][channel] as f32,
                row[3][channel] as f32,
                x_fract,
            );
        }
        let blended = cubic_hermite(columns[0], columns[1], columns[2], columns[3], y_fract);
        *value = blended.round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(width: u32, height: u32, rgb: Rgb) -> Raster {
        let raster = Raster::new(width, height);
        for i in 0..raster.pixel_count() {
            raster.set_index(i, rgb);
        }
        raster
    }

    #[test]
    fn uniform_image_samples_uniformly() {
        let raster = uniform(7, 5, [12, 200, 99]);
        for &(u, v) in &[(0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (0.13, 0.87)] {
            assert_eq!(sample(&raster, u, v), [12, 200, 99]);
        }
    }

    #[test]
    fn pixel_centres_are_reproduced() {
        let raster = Raster::new(4, 4);
        raster.set(1, 2, [255, 0, 0]);
        // Centre of pixel (1, 2) sits at u = 1.5 / 4, v = 2.5 / 4.
        assert_eq!(sample(&raster, 1.5 / 4.0, 2.5 / 4.0), [255, 0, 0]);
        assert_eq!(sample(&raster, 3.5 / 4.0, 0.5 / 4.0), [0, 0, 0]);
    }

    #[test]
    fn step_edge_interpolates_between_levels() {
        let raster = Raster::new(4, 1);
        raster.set(2, 0, [255, 255, 255]);
        raster.set(3, 0, [255, 255, 255]);
        let between = sample(&raster, 2.0 / 4.0, 0.5);
        assert!(between[0] > 0 && between[0] < 255);
    }
}
