//! The native engine boundary.
//!
//! [`TessApi`] mirrors the subset of the Tesseract C API the crate drives. Each
//! method corresponds to exactly one native entry point and keeps its argument
//! shapes (C strings, raw pixel slices, `i32` dimensions, 0-based page indices);
//! the safe wrappers in [`crate::engine`], [`crate::renderer`] and
//! [`crate::iterator`] own the handles and sequence the calls.
//!
//! # Ownership
//!
//! - `create` hands out a handle that must go back through `delete` exactly once.
//! - `renderer_insert` moves `next` into the chain; only the head is deleted.
//! - Text-returning methods copy the native string and release it before
//!   returning, so no native pointer escapes the implementation.

use crate::types::{EngineMode, PageIteratorLevel, PageSegMode, RenderFormat};
use std::ffi::CStr;

pub trait TessApi {
    /// Engine instance (`TessBaseAPI*`)
    type Handle;
    /// Head or member of a renderer chain (`TessResultRenderer*`)
    type Renderer;
    /// Result iterator together with the page iterator it drives
    type ResultIter;

    /// Native library version string
    fn version(&self) -> String;

    fn create(&self) -> Option<Self::Handle>;

    /// `TessBaseAPIInit1`; false when the language data cannot be loaded
    fn init(
        &self,
        handle: &mut Self::Handle,
        datapath: &CStr,
        language: &CStr,
        mode: EngineMode,
        configs: &[&CStr],
    ) -> bool;

    fn delete(&self, handle: Self::Handle);

    /// Returns whether the engine recognized the variable name
    fn set_variable(&self, handle: &mut Self::Handle, name: &CStr, value: &CStr) -> bool;

    fn set_page_seg_mode(&self, handle: &mut Self::Handle, mode: PageSegMode);

    /// The native side copies `data`; it is not retained after the call
    fn set_image(
        &self,
        handle: &mut Self::Handle,
        data: &[u8],
        width: i32,
        height: i32,
        bytes_per_pixel: i32,
        bytes_per_line: i32,
    );

    fn set_rectangle(&self, handle: &mut Self::Handle, left: i32, top: i32, width: i32, height: i32);

    fn set_input_name(&self, handle: &mut Self::Handle, name: &CStr);

    /// True on success
    fn recognize(&self, handle: &mut Self::Handle) -> bool;

    fn utf8_text(&self, handle: &mut Self::Handle) -> Option<String>;

    /// `page_index` is 0-based
    fn hocr_text(&self, handle: &mut Self::Handle, page_index: i32) -> Option<String>;

    /// `datapath` is only consulted by the PDF renderer (font lookup)
    fn renderer_create(
        &self,
        format: RenderFormat,
        outputbase: &CStr,
        datapath: &CStr,
    ) -> Option<Self::Renderer>;

    fn renderer_insert(&self, head: &mut Self::Renderer, next: Self::Renderer);

    fn renderer_begin_document(&self, renderer: &mut Self::Renderer, title: &CStr) -> bool;

    fn renderer_add_image(&self, renderer: &mut Self::Renderer, handle: &mut Self::Handle) -> bool;

    fn renderer_end_document(&self, renderer: &mut Self::Renderer) -> bool;

    /// Deletes the head and every renderer inserted behind it
    fn renderer_delete(&self, renderer: Self::Renderer);

    /// None when there is no recognition result to walk
    fn result_iter(&self, handle: &mut Self::Handle) -> Option<Self::ResultIter>;

    fn iter_begin(&self, iter: &mut Self::ResultIter);

    /// Moves to the next element at `level`; false once past the last one
    fn iter_next(&self, iter: &mut Self::ResultIter, level: PageIteratorLevel) -> bool;

    fn iter_text(&self, iter: &Self::ResultIter, level: PageIteratorLevel) -> Option<String>;

    fn iter_confidence(&self, iter: &Self::ResultIter, level: PageIteratorLevel) -> f32;

    /// (left, top, right, bottom)
    fn iter_bounding_box(
        &self,
        iter: &Self::ResultIter,
        level: PageIteratorLevel,
    ) -> Option<(i32, i32, i32, i32)>;

    fn iter_delete(&self, iter: Self::ResultIter);
}
