//! Reference-buffer provider: decode, downscale, and gray-convert images.
//!
//! The search itself never sees images, only the flattened row-major gray
//! pixels produced here.

use std::path::Path;

use image::{DynamicImage, GrayImage, imageops::FilterType};

/// Error type for image loading and saving.
#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Downscale factor must be non-zero")]
    InvalidScale,

    #[error("Image of {width}x{height} is too small for downscale factor {scale}")]
    TooSmall { width: u32, height: u32, scale: u32 },

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// An 8-bit grayscale frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major pixels, `width * height` bytes.
    pub pixels: Vec<u8>,
}

impl GrayFrame {
    /// Build a frame, checking the buffer size.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImagingError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(ImagingError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Same dimensions, different pixels.
    pub fn with_pixels(&self, pixels: Vec<u8>) -> Result<Self, ImagingError> {
        Self::new(self.width, self.height, pixels)
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Save as an image; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ImagingError> {
        let image = GrayImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or(
            ImagingError::BufferSize {
                expected: self.width as usize * self.height as usize,
                actual: self.pixels.len(),
            },
        )?;
        image.save(path)?;
        Ok(())
    }
}

/// Shrink by an integer factor with nearest-neighbour sampling.
pub fn downscale(image: &DynamicImage, scale: u32) -> Result<DynamicImage, ImagingError> {
    if scale == 0 {
        return Err(ImagingError::InvalidScale);
    }
    let (width, height) = (image.width(), image.height());
    let (target_w, target_h) = (width / scale, height / scale);
    if target_w == 0 || target_h == 0 {
        return Err(ImagingError::TooSmall {
            width,
            height,
            scale,
        });
    }
    Ok(image.resize_exact(target_w, target_h, FilterType::Nearest))
}

/// Widen an 8-bit channel to 16 bits, premultiplied by alpha.
fn premultiplied16(channel: u8, alpha: u8) -> u32 {
    let c = channel as u32 * 0x101;
    let a = alpha as u32 * 0x101;
    c * a / 0xffff
}

/// Gray value as the rounded mean of the alpha-premultiplied red, green, and
/// blue channels in 16-bit space. Saturates at 255.
pub fn to_gray(image: &DynamicImage) -> GrayFrame {
    let rgba = image.to_rgba8();
    let pixels = rgba
        .pixels()
        .map(|p| {
            let sum: u32 = p.0[..3]
                .iter()
                .map(|&c| premultiplied16(c, p[3]))
                .sum();
            ((2 * sum + 768) / 1536).min(255) as u8
        })
        .collect();

    GrayFrame {
        width: rgba.width(),
        height: rgba.height(),
        pixels,
    }
}

/// Load an image, downscale it by `scale`, and convert it to gray.
pub fn load_reference<P: AsRef<Path>>(path: P, scale: u32) -> Result<GrayFrame, ImagingError> {
    let image = image::open(path)?;
    let small = downscale(&image, scale)?;
    Ok(to_gray(&small))
}
