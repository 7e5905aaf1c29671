use image::DynamicImage;

/// Pixel storage backing a [`Raster`]
#[derive(Debug, Clone)]
pub enum PixelStorage {
    /// Byte-addressable pixels, each row padded to a whole number of bytes.
    /// 1-bit rows are packed most significant bit first.
    Bytes { bits_per_pixel: u32, data: Vec<u8> },

    /// Decoded image whose samples are not one byte each (16-bit, float,
    /// alpha layouts). Has to be normalized before it can be marshaled.
    Samples(DynamicImage),
}

/// An in-memory page: dimensions plus pixel storage
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    storage: PixelStorage,
}

impl Raster {
    /// Wrap raw row-major pixel bytes. Nothing is validated here; the
    /// marshaler checks the payload against the derived stride.
    pub fn from_bytes(width: u32, height: u32, bits_per_pixel: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            storage: PixelStorage::Bytes {
                bits_per_pixel,
                data,
            },
        }
    }

    /// 1 bit per pixel, MSB first, rows padded to whole bytes
    pub fn binary(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self::from_bytes(width, height, 1, data)
    }

    /// Wrap a decoded image. 8-bit gray and 8-bit RGB keep their bytes as-is,
    /// every other layout is kept as samples.
    pub fn from_image(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let storage = match image {
            DynamicImage::ImageLuma8(buf) => PixelStorage::Bytes {
                bits_per_pixel: 8,
                data: buf.into_raw(),
            },
            DynamicImage::ImageRgb8(buf) => PixelStorage::Bytes {
                bits_per_pixel: 24,
                data: buf.into_raw(),
            },
            other => PixelStorage::Samples(other),
        };

        Self {
            width,
            height,
            storage,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bit depth of the stored pixels
    pub fn bits_per_pixel(&self) -> u32 {
        match &self.storage {
            PixelStorage::Bytes { bits_per_pixel, .. } => *bits_per_pixel,
            PixelStorage::Samples(image) => u32::from(image.color().bits_per_pixel()),
        }
    }

    /// Underlying pixel storage
    pub fn storage(&self) -> &PixelStorage {
        &self.storage
    }
}

impl From<DynamicImage> for Raster {
    fn from(image: DynamicImage) -> Self {
        Self::from_image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, RgbImage};

    #[test]
    fn test_gray_image_keeps_bytes() {
        let raster = Raster::from_image(DynamicImage::ImageLuma8(GrayImage::new(5, 3)));
        assert_eq!(raster.bits_per_pixel(), 8);
        match raster.storage() {
            PixelStorage::Bytes { data, .. } => assert_eq!(data.len(), 15),
            PixelStorage::Samples(_) => panic!("expected byte storage"),
        }
    }

    #[test]
    fn test_rgb_image_is_24_bit() {
        let raster = Raster::from_image(DynamicImage::ImageRgb8(RgbImage::new(4, 2)));
        assert_eq!(raster.bits_per_pixel(), 24);
        assert_eq!((raster.width(), raster.height()), (4, 2));
    }

    #[test]
    fn test_wide_samples_are_not_bytes() {
        let wide: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(3, 3);
        let raster = Raster::from_image(DynamicImage::ImageLuma16(wide));
        assert_eq!(raster.bits_per_pixel(), 16);
        assert!(matches!(raster.storage(), PixelStorage::Samples(_)));
    }
}
