//! Codec boundary: decoding inputs and contour tiles, encoding the final image.

use crate::error::Result;
use image::{ImageEncoder, RgbImage};
use std::collections::HashMap;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Where images come from and where the finished image goes.
///
/// The pipeline only ever talks to this trait, so tests can swap in an in-memory
/// store and count writes.
pub trait ImageStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<RgbImage>;
    fn persist(&self, image: &RgbImage, path: &Path) -> Result<()>;
}

/// File-system store backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsImageStore;

impl ImageStore for FsImageStore {
    fn load(&self, path: &Path) -> Result<RgbImage> {
        let decoded = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;
        Ok(decoded.to_rgb8())
    }

    fn persist(&self, image: &RgbImage, path: &Path) -> Result<()> {
        if is_ppm(path) {
            save_ppm(image, path)
        } else {
            image.save(path)?;
            Ok(())
        }
    }
}

/// In-memory store for embedding the pipeline without touching the file system.
///
/// Images are keyed by path. Every `persist` call is counted.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<PathBuf, RgbImage>>,
    persists: AtomicUsize,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, image: RgbImage) {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), image);
    }

    pub fn get(&self, path: &Path) -> Option<RgbImage> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Number of times `persist` has been called.
    pub fn persist_count(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }
}

impl ImageStore for MemoryImageStore {
    fn load(&self, path: &Path) -> Result<RgbImage> {
        self.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no image stored at {}", path.display()),
            )
            .into()
        })
    }

    fn persist(&self, image: &RgbImage, path: &Path) -> Result<()> {
        self.persists.fetch_add(1, Ordering::SeqCst);
        self.insert(path, image.clone());
        Ok(())
    }
}

fn is_ppm(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"))
}

/// Writes a binary (P6) pixmap.
pub fn save_ppm(image: &RgbImage, path: &Path) -> Result<()> {
    use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};

    let output = BufWriter::new(std::fs::File::create(path)?);
    let encoder =
        PnmEncoder::new(output).with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary));

    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContourError;

    #[test]
    fn save_white_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("white_file.ppm");
        let image = RgbImage::from_pixel(50, 30, image::Rgb([255, 255, 255]));

        FsImageStore.persist(&image, &path).expect("Error Saving File.");
        let loaded = FsImageStore.load(&path).expect("Error Loading File.");

        assert_eq!(loaded, image);
    }

    #[test]
    fn save_gradient_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gradient_file.png");
        let mut image = RgbImage::new(64, 16);
        let mut intensity = 0u8;

        for pixel in image.pixels_mut() {
            *pixel = image::Rgb([intensity, intensity, intensity]);
            intensity = intensity.wrapping_add(1);
        }

        FsImageStore.persist(&image, &path).expect("Error Saving File.");
        assert_eq!(FsImageStore.load(&path).expect("reload"), image);
    }

    #[test]
    fn ppm_header_is_binary_pixmap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.ppm");
        save_ppm(&RgbImage::new(2, 1), &path).expect("save");
        let bytes = std::fs::read(&path).expect("read back");
        assert_eq!(&bytes[..2], b"P6");
    }

    #[test]
    fn memory_store_counts_persists() {
        let store = MemoryImageStore::new();
        let image = RgbImage::new(1, 1);
        store.persist(&image, Path::new("a")).expect("persist");
        store.persist(&image, Path::new("b")).expect("persist");
        assert_eq!(store.persist_count(), 2);
        assert_eq!(store.load(Path::new("a")).expect("stored"), image);
        assert!(matches!(store.load(Path::new("c")), Err(ContourError::Io(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = FsImageStore.load(Path::new("definitely/not/here.ppm"));
        assert!(matches!(result, Err(ContourError::Io(_))));
    }
}
