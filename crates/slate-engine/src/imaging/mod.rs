//! CPU-side RGBA8 images.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::coords::Rect;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image")]
    Decode(#[from] image::ImageError),

    #[error("{width}x{height} RGBA8 needs {expected} bytes, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Where an image's pixels came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    File(PathBuf),
    /// Encoded bytes or raw pixels handed over by the caller.
    Memory,
}

/// Tightly packed RGBA8 pixels, rows top to bottom unless flipped on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    origin: ImageOrigin,
}

impl Image {
    /// Wraps raw RGBA8 pixels.
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            origin: ImageOrigin::Memory,
        })
    }

    /// Reads and decodes an image file, converting it to RGBA8.
    pub fn load(path: impl AsRef<Path>, flip_vertically: bool) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut image = Self::decode(&bytes, flip_vertically)?;
        image.origin = ImageOrigin::File(path.to_path_buf());
        log::debug!("loaded {} ({}x{})", path.display(), image.width, image.height);
        Ok(image)
    }

    /// Decodes an encoded image (PNG, JPEG, BMP) from memory.
    pub fn decode(bytes: &[u8], flip_vertically: bool) -> Result<Self, ImageError> {
        let mut rgba = image::load_from_memory(bytes)?.into_rgba8();
        if flip_vertically {
            image::imageops::flip_vertical_in_place(&mut rgba);
        }

        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        Ok(Self {
            pixels: rgba.into_raw(),
            width,
            height,
            origin: ImageOrigin::Memory,
        })
    }

    /// Bounds of the image at the origin: `(0, 0, width, height)`.
    #[inline]
    pub fn shape(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn origin(&self) -> &ImageOrigin {
        &self.origin
    }

    /// Releases the pixel storage.
    pub fn destroy(self) {}
}
