//! Raster to native pixel buffer conversion
//!
//! The native `SetImage` call takes a raw byte pointer together with the bytes
//! per pixel and bytes per scanline. Everything here derives those two numbers
//! from the raster's bit depth and checks the payload against them.
//!
//! Pixels are passed as byte sequences (gray, or R,G,B per pixel, or MSB-first
//! bit rows for 1-bit images), so the buffer has the same layout on every
//! platform and needs no byte swapping.

use crate::error::{OcrError, Result};
use scribe_imaging::{PixelStorage, Raster};
use tracing::debug;

/// Bit depths the native engine accepts from this crate
pub const SUPPORTED_DEPTHS: [u32; 3] = [1, 8, 24];

/// Pixels laid out exactly as the native engine reads them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    stride: u32,
}

impl PixelBuffer {
    /// Pixel bytes, exactly `height * stride` long
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bit depth, one of [`SUPPORTED_DEPTHS`]
    pub fn bits_per_pixel(&self) -> u32 {
        self.bits_per_pixel
    }

    /// 0 for 1-bit images, which the native API treats as packed binary
    pub fn bytes_per_pixel(&self) -> u32 {
        bytes_per_pixel(self.bits_per_pixel)
    }

    /// Bytes per scanline
    pub fn stride(&self) -> u32 {
        self.stride
    }
}

/// `bits_per_pixel / 8`, integer division
pub fn bytes_per_pixel(bits_per_pixel: u32) -> u32 {
    bits_per_pixel / 8
}

/// Bytes per scanline: `ceil(width * bits_per_pixel / 8)`, or None when
/// that does not fit in a `u32`
pub fn stride(width: u32, bits_per_pixel: u32) -> Option<u32> {
    let bits = u64::from(width) * u64::from(bits_per_pixel);
    u32::try_from(bits.div_ceil(8)).ok()
}

/// Convert a raster into a native pixel buffer.
///
/// Storage that is not one byte per sample is first reduced to 8-bit
/// grayscale. The returned buffer holds exactly `height * stride` bytes.
pub fn to_native_buffer(raster: &Raster) -> Result<PixelBuffer> {
    let (width, height) = (raster.width(), raster.height());
    if width == 0 || height == 0 {
        return Err(OcrError::Marshal(format!(
            "raster has no pixels ({}x{})",
            width, height
        )));
    }

    let (bits_per_pixel, mut data) = match raster.storage() {
        PixelStorage::Bytes {
            bits_per_pixel,
            data,
        } => (*bits_per_pixel, data.clone()),
        PixelStorage::Samples(image) => {
            debug!(
                "normalizing {:?} raster to 8-bit grayscale",
                image.color()
            );
            (8, image.to_luma8().into_raw())
        }
    };

    if !SUPPORTED_DEPTHS.contains(&bits_per_pixel) {
        return Err(OcrError::Marshal(format!(
            "unsupported bit depth: {}",
            bits_per_pixel
        )));
    }

    let stride = stride(width, bits_per_pixel).ok_or_else(|| {
        OcrError::Marshal(format!(
            "scanline too long: {} pixels at {} bpp",
            width, bits_per_pixel
        ))
    })?;
    let expected = usize::try_from(u64::from(stride) * u64::from(height)).map_err(|_| {
        OcrError::Marshal(format!("raster too large: {} rows of {} bytes", height, stride))
    })?;
    if data.len() < expected {
        return Err(OcrError::Marshal(format!(
            "pixel payload too short: expected {} bytes ({} rows of {}), got {}",
            expected,
            height,
            stride,
            data.len()
        )));
    }
    data.truncate(expected);

    debug!(
        "marshaled {}x{} raster: {} bpp, stride {}",
        width, height, bits_per_pixel, stride
    );

    Ok(PixelBuffer {
        data,
        width,
        height,
        bits_per_pixel,
        stride,
    })
}
