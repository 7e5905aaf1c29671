//! libtesseract C API bindings
//!
//! Hand-written declarations for the entry points [`TessApi`] needs. Every
//! native pointer lives in one of the wrapper types below and is only
//! dereferenced by libtesseract itself.

use crate::api::TessApi;
use crate::types::{EngineMode, PageIteratorLevel, PageSegMode, RenderFormat};
use std::ffi::CStr;
use std::os::raw::{c_char, c_float, c_int, c_uchar, c_void};
use std::ptr::{self, NonNull};

#[repr(C)]
pub struct TessBaseAPI {
    _opaque: [u8; 0],
}

#[repr(C)]
pub struct TessResultRenderer {
    _opaque: [u8; 0],
}

#[repr(C)]
pub struct TessResultIterator {
    _opaque: [u8; 0],
}

#[repr(C)]
pub struct TessPageIterator {
    _opaque: [u8; 0],
}

const TRUE: c_int = 1;

#[link(name = "tesseract")]
extern "C" {
    fn TessVersion() -> *const c_char;
    fn TessDeleteText(text: *const c_char);

    fn TessBaseAPICreate() -> *mut TessBaseAPI;
    fn TessBaseAPIDelete(handle: *mut TessBaseAPI);
    fn TessBaseAPIInit1(
        handle: *mut TessBaseAPI,
        datapath: *const c_char,
        language: *const c_char,
        oem: c_int,
        configs: *mut *mut c_char,
        configs_size: c_int,
    ) -> c_int;
    fn TessBaseAPISetVariable(handle: *mut TessBaseAPI, name: *const c_char, value: *const c_char) -> c_int;
    fn TessBaseAPISetPageSegMode(handle: *mut TessBaseAPI, mode: c_int);
    fn TessBaseAPISetImage(
        handle: *mut TessBaseAPI,
        imagedata: *const c_uchar,
        width: c_int,
        height: c_int,
        bytes_per_pixel: c_int,
        bytes_per_line: c_int,
    );
    fn TessBaseAPISetRectangle(handle: *mut TessBaseAPI, left: c_int, top: c_int, width: c_int, height: c_int);
    fn TessBaseAPISetInputName(handle: *mut TessBaseAPI, name: *const c_char);
    fn TessBaseAPIRecognize(handle: *mut TessBaseAPI, monitor: *mut c_void) -> c_int;
    fn TessBaseAPIGetUTF8Text(handle: *mut TessBaseAPI) -> *mut c_char;
    fn TessBaseAPIGetHOCRText(handle: *mut TessBaseAPI, page_number: c_int) -> *mut c_char;

    fn TessTextRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    fn TessHOcrRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    fn TessPDFRendererCreate(
        outputbase: *const c_char,
        datadir: *const c_char,
        textonly: c_int,
    ) -> *mut TessResultRenderer;
    fn TessBoxTextRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    fn TessUnlvRendererCreate(outputbase: *const c_char) -> *mut TessResultRenderer;
    fn TessDeleteResultRenderer(renderer: *mut TessResultRenderer);
    fn TessResultRendererInsert(renderer: *mut TessResultRenderer, next: *mut TessResultRenderer);
    fn TessResultRendererBeginDocument(renderer: *mut TessResultRenderer, title: *const c_char) -> c_int;
    fn TessResultRendererAddImage(renderer: *mut TessResultRenderer, api: *mut TessBaseAPI) -> c_int;
    fn TessResultRendererEndDocument(renderer: *mut TessResultRenderer) -> c_int;

    fn TessBaseAPIGetIterator(handle: *mut TessBaseAPI) -> *mut TessResultIterator;
    fn TessResultIteratorDelete(iter: *mut TessResultIterator);
    fn TessResultIteratorNext(iter: *mut TessResultIterator, level: c_int) -> c_int;
    fn TessResultIteratorGetPageIterator(iter: *mut TessResultIterator) -> *mut TessPageIterator;
    fn TessResultIteratorGetUTF8Text(iter: *const TessResultIterator, level: c_int) -> *mut c_char;
    fn TessResultIteratorConfidence(iter: *const TessResultIterator, level: c_int) -> c_float;
    fn TessPageIteratorBegin(iter: *mut TessPageIterator);
    fn TessPageIteratorBoundingBox(
        iter: *const TessPageIterator,
        level: c_int,
        left: *mut c_int,
        top: *mut c_int,
        right: *mut c_int,
        bottom: *mut c_int,
    ) -> c_int;
}

pub struct NativeHandle(NonNull<TessBaseAPI>);

pub struct NativeRenderer(NonNull<TessResultRenderer>);

/// The page iterator is owned by the result iterator and is not freed
/// separately.
pub struct NativeResultIter {
    iter: NonNull<TessResultIterator>,
    page: NonNull<TessPageIterator>,
}

/// The linked libtesseract
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeApi;

/// Copy a native string and free the original
fn take_text(text: *mut c_char) -> Option<String> {
    if text.is_null() {
        return None;
    }
    // SAFETY: non-null strings returned by libtesseract are NUL-terminated
    // and owned by the caller until passed to TessDeleteText.
    let copied = unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned();
    unsafe { TessDeleteText(text) };
    Some(copied)
}

impl TessApi for NativeApi {
    type Handle = NativeHandle;
    type Renderer = NativeRenderer;
    type ResultIter = NativeResultIter;

    fn version(&self) -> String {
        let version = unsafe { TessVersion() };
        if version.is_null() {
            return String::new();
        }
        // Static string, not freed
        unsafe { CStr::from_ptr(version) }.to_string_lossy().into_owned()
    }

    fn create(&self) -> Option<NativeHandle> {
        NonNull::new(unsafe { TessBaseAPICreate() }).map(NativeHandle)
    }

    fn init(
        &self,
        handle: &mut NativeHandle,
        datapath: &CStr,
        language: &CStr,
        mode: EngineMode,
        configs: &[&CStr],
    ) -> bool {
        // The C signature takes `char**` but never writes through it
        let mut config_ptrs: Vec<*mut c_char> = configs.iter().map(|c| c.as_ptr() as *mut c_char).collect();
        let configs_ptr = if config_ptrs.is_empty() {
            ptr::null_mut()
        } else {
            config_ptrs.as_mut_ptr()
        };
        let Ok(configs_size) = c_int::try_from(config_ptrs.len()) else {
            return false;
        };

        let status = unsafe {
            TessBaseAPIInit1(
                handle.0.as_ptr(),
                datapath.as_ptr(),
                language.as_ptr(),
                mode as c_int,
                configs_ptr,
                configs_size,
            )
        };
        status == 0
    }

    fn delete(&self, handle: NativeHandle) {
        unsafe { TessBaseAPIDelete(handle.0.as_ptr()) }
    }

    fn set_variable(&self, handle: &mut NativeHandle, name: &CStr, value: &CStr) -> bool {
        unsafe { TessBaseAPISetVariable(handle.0.as_ptr(), name.as_ptr(), value.as_ptr()) == TRUE }
    }

    fn set_page_seg_mode(&self, handle: &mut NativeHandle, mode: PageSegMode) {
        unsafe { TessBaseAPISetPageSegMode(handle.0.as_ptr(), mode as c_int) }
    }

    fn set_image(
        &self,
        handle: &mut NativeHandle,
        data: &[u8],
        width: i32,
        height: i32,
        bytes_per_pixel: i32,
        bytes_per_line: i32,
    ) {
        // SAFETY: the caller sized `data` as height * bytes_per_line; the
        // engine copies the pixels before returning.
        unsafe {
            TessBaseAPISetImage(
                handle.0.as_ptr(),
                data.as_ptr(),
                width,
                height,
                bytes_per_pixel,
                bytes_per_line,
            )
        }
    }

    fn set_rectangle(&self, handle: &mut NativeHandle, left: i32, top: i32, width: i32, height: i32) {
        unsafe { TessBaseAPISetRectangle(handle.0.as_ptr(), left, top, width, height) }
    }

    fn set_input_name(&self, handle: &mut NativeHandle, name: &CStr) {
        unsafe { TessBaseAPISetInputName(handle.0.as_ptr(), name.as_ptr()) }
    }

    fn recognize(&self, handle: &mut NativeHandle) -> bool {
        unsafe { TessBaseAPIRecognize(handle.0.as_ptr(), ptr::null_mut()) == 0 }
    }

    fn utf8_text(&self, handle: &mut NativeHandle) -> Option<String> {
        take_text(unsafe { TessBaseAPIGetUTF8Text(handle.0.as_ptr()) })
    }

    fn hocr_text(&self, handle: &mut NativeHandle, page_index: i32) -> Option<String> {
        take_text(unsafe { TessBaseAPIGetHOCRText(handle.0.as_ptr(), page_index) })
    }

    fn renderer_create(
        &self,
        format: RenderFormat,
        outputbase: &CStr,
        datapath: &CStr,
    ) -> Option<NativeRenderer> {
        let base = outputbase.as_ptr();
        let renderer = unsafe {
            match format {
                RenderFormat::Text => TessTextRendererCreate(base),
                RenderFormat::Hocr => TessHOcrRendererCreate(base),
                RenderFormat::Pdf => TessPDFRendererCreate(base, datapath.as_ptr(), 0),
                RenderFormat::Box => TessBoxTextRendererCreate(base),
                RenderFormat::Unlv => TessUnlvRendererCreate(base),
            }
        };
        NonNull::new(renderer).map(NativeRenderer)
    }

    fn renderer_insert(&self, head: &mut NativeRenderer, next: NativeRenderer) {
        // `next` is owned by the chain from here on
        unsafe { TessResultRendererInsert(head.0.as_ptr(), next.0.as_ptr()) }
    }

    fn renderer_begin_document(&self, renderer: &mut NativeRenderer, title: &CStr) -> bool {
        unsafe { TessResultRendererBeginDocument(renderer.0.as_ptr(), title.as_ptr()) == TRUE }
    }

    fn renderer_add_image(&self, renderer: &mut NativeRenderer, handle: &mut NativeHandle) -> bool {
        unsafe { TessResultRendererAddImage(renderer.0.as_ptr(), handle.0.as_ptr()) == TRUE }
    }

    fn renderer_end_document(&self, renderer: &mut NativeRenderer) -> bool {
        unsafe { TessResultRendererEndDocument(renderer.0.as_ptr()) == TRUE }
    }

    fn renderer_delete(&self, renderer: NativeRenderer) {
        unsafe { TessDeleteResultRenderer(renderer.0.as_ptr()) }
    }

    fn result_iter(&self, handle: &mut NativeHandle) -> Option<NativeResultIter> {
        let iter = NonNull::new(unsafe { TessBaseAPIGetIterator(handle.0.as_ptr()) })?;
        match NonNull::new(unsafe { TessResultIteratorGetPageIterator(iter.as_ptr()) }) {
            Some(page) => Some(NativeResultIter { iter, page }),
            None => {
                unsafe { TessResultIteratorDelete(iter.as_ptr()) };
                None
            }
        }
    }

    fn iter_begin(&self, iter: &mut NativeResultIter) {
        unsafe { TessPageIteratorBegin(iter.page.as_ptr()) }
    }

    fn iter_next(&self, iter: &mut NativeResultIter, level: PageIteratorLevel) -> bool {
        unsafe { TessResultIteratorNext(iter.iter.as_ptr(), level as c_int) == TRUE }
    }

    fn iter_text(&self, iter: &NativeResultIter, level: PageIteratorLevel) -> Option<String> {
        take_text(unsafe { TessResultIteratorGetUTF8Text(iter.iter.as_ptr(), level as c_int) })
    }

    fn iter_confidence(&self, iter: &NativeResultIter, level: PageIteratorLevel) -> f32 {
        unsafe { TessResultIteratorConfidence(iter.iter.as_ptr(), level as c_int) }
    }

    fn iter_bounding_box(
        &self,
        iter: &NativeResultIter,
        level: PageIteratorLevel,
    ) -> Option<(i32, i32, i32, i32)> {
        let (mut left, mut top, mut right, mut bottom) = (0, 0, 0, 0);
        let found = unsafe {
            TessPageIteratorBoundingBox(
                iter.page.as_ptr(),
                level as c_int,
                &mut left,
                &mut top,
                &mut right,
                &mut bottom,
            )
        };
        (found == TRUE).then_some((left, top, right, bottom))
    }

    fn iter_delete(&self, iter: NativeResultIter) {
        unsafe { TessResultIteratorDelete(iter.iter.as_ptr()) }
    }
}
