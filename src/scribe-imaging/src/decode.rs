//! File and in-memory decoding into pages

use crate::error::{ImagingError, Result};
use crate::raster::Raster;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// One decoded page, or the reason it could not be decoded
pub type Page = Result<Raster>;

/// Read an image file and decode every page in it
pub fn load_pages(path: impl AsRef<Path>) -> Result<Vec<Page>> {
    let path = path.as_ref();
    debug!("loading pages from {:?}", path);

    let bytes = std::fs::read(path)?;
    decode_pages(&bytes)
}

/// Decode every page in an encoded image.
///
/// The outer error means the container itself is unusable. Inner errors belong
/// to single frames; the frames around them are still returned in order.
pub fn decode_pages(bytes: &[u8]) -> Result<Vec<Page>> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or(ImagingError::UnknownFormat)?;

    let pages = match format {
        ImageFormat::Gif => decode_frames(bytes)?,
        _ => vec![reader.decode().map(Raster::from_image).map_err(ImagingError::from)],
    };

    let failed = pages.iter().filter(|p| p.is_err()).count();
    if failed > 0 {
        warn!("{} of {} page(s) failed to decode", failed, pages.len());
    }
    debug!("decoded {} page(s) as {:?}", pages.len(), format);

    Ok(pages)
}

/// Frames up to and including the first one that fails. The frame iterator
/// does not advance past a corrupt block, so nothing after it is readable.
fn decode_frames(bytes: &[u8]) -> Result<Vec<Page>> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;

    let mut pages = Vec::new();
    for frame in decoder.into_frames() {
        match frame {
            Ok(frame) => {
                // Drop the alpha channel so the frame marshals as 24-bit color
                let rgb = DynamicImage::ImageRgba8(frame.into_buffer()).into_rgb8();
                pages.push(Ok(Raster::from_image(DynamicImage::ImageRgb8(rgb))));
            }
            Err(e) => {
                warn!("stopping at frame {}: {}", pages.len() + 1, e);
                pages.push(Err(e.into()));
                break;
            }
        }
    }

    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Frame, GrayImage, Luma, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([200]));
        let mut out = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn gif_bytes(frames: usize) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            let frames = (0..frames).map(|_| Frame::new(RgbaImage::new(6, 4)));
            encoder.encode_frames(frames).unwrap();
        }
        out
    }

    #[test]
    fn test_single_png_page() {
        let pages = decode_pages(&png_bytes(7, 3)).unwrap();
        assert_eq!(pages.len(), 1);

        let raster = pages[0].as_ref().unwrap();
        assert_eq!((raster.width(), raster.height()), (7, 3));
        assert_eq!(raster.bits_per_pixel(), 8);
    }

    #[test]
    fn test_gif_frames_become_pages() {
        let pages = decode_pages(&gif_bytes(3)).unwrap();
        assert_eq!(pages.len(), 3);
        for page in &pages {
            let raster = page.as_ref().unwrap();
            assert_eq!(raster.bits_per_pixel(), 24);
            assert_eq!((raster.width(), raster.height()), (6, 4));
        }
    }

    #[test]
    fn test_corrupt_gif_block_ends_decoding() {
        let mut bytes = gif_bytes(2);
        assert_eq!(bytes.pop(), Some(0x3B));
        bytes.push(0x99);
        bytes.extend_from_slice(&[0; 16]);

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(decode_pages(&bytes));
        });
        let pages = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("decoding a corrupt GIF did not finish")
            .unwrap();

        assert!(pages.len() >= 2);
        assert!(pages[0].is_ok());
        assert!(pages[1].is_ok());
        assert!(pages.last().unwrap().is_err());
        assert_eq!(pages.iter().filter(|p| p.is_err()).count(), 1);
    }

    #[test]
    fn test_unknown_format() {
        let result = decode_pages(b"definitely not an image");
        assert!(matches!(result, Err(ImagingError::UnknownFormat)));
    }

    #[test]
    fn test_load_pages_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, png_bytes(10, 10)).unwrap();

        let pages = load_pages(&path).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_pages(dir.path().join("missing.png"));
        assert!(matches!(result, Err(ImagingError::Io(_))));
    }
}
