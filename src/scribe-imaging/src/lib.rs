//! scribe-imaging - Image decoding for Scribe
//!
//! Turns image files into [`Raster`] pages the OCR core can marshal. Multi-frame
//! containers yield one page per frame, and a frame that fails to decode is
//! reported as a failed page instead of failing the whole file.

mod decode;
mod error;
mod raster;

pub use decode::{decode_pages, load_pages, Page};
pub use error::{ImagingError, Result};
pub use raster::{PixelStorage, Raster};
