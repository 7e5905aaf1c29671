//! scribe-ocr - Tesseract integration for Scribe
//!
//! Safe facade over the Tesseract C API. [`Tesseract`] holds the engine
//! configuration and runs recognition over rasters, image files and raw pixel
//! buffers, returning plain text or hOCR. It can also render whole documents
//! (text, hOCR, searchable PDF, box, UNLV) and walk recognition results word by
//! word.
//!
//! The native library is reached through the [`TessApi`] trait. Enable the
//! `native` feature to link libtesseract and get [`NativeApi`].

mod api;
mod config;
mod engine;
mod error;
mod iterator;
mod pixels;
mod renderer;
mod session;
mod types;

#[cfg(feature = "native")]
mod ffi;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use api::TessApi;
pub use config::{EngineConfig, HOCR_VARIABLE};
pub use engine::{Engine, PageImage, Recognized};
pub use error::{OcrError, Result};
pub use iterator::{Elements, RecognizedElement, ResultCursor};
pub use pixels::{bytes_per_pixel, stride, to_native_buffer, PixelBuffer, SUPPORTED_DEPTHS};
pub use renderer::RendererChain;
pub use session::{DocumentReport, Tesseract, HOCR_BEGIN, HOCR_END};
pub use types::{EngineMode, OutputFormat, PageIteratorLevel, PageSegMode, Rect, RenderFormat};

#[cfg(feature = "native")]
pub use ffi::NativeApi;

pub use scribe_imaging::{Page, Raster};

/// Version string of the linked libtesseract
#[cfg(feature = "native")]
pub fn native_version() -> String {
    NativeApi.version()
}
