//! Recording stand-in for the native engine, used by the unit tests here and
//! by downstream crates through the `testing` feature.
//!
//! Every call is journaled so tests can assert on the exact native call
//! sequence. Recognized text is derived from the first pixel byte of the
//! current image, which lets tests tell pages apart.

use crate::api::TessApi;
use crate::types::{EngineMode, PageIteratorLevel, PageSegMode, RenderFormat};
use std::cell::RefCell;
use std::ffi::CStr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create,
    Init {
        datapath: String,
        language: String,
        mode: EngineMode,
        configs: Vec<String>,
    },
    Delete,
    SetVariable(String, String),
    SetPageSegMode(PageSegMode),
    SetImage {
        width: i32,
        height: i32,
        bytes_per_pixel: i32,
        bytes_per_line: i32,
        len: usize,
    },
    SetRectangle(i32, i32, i32, i32),
    SetInputName(String),
    Recognize,
    Utf8Text,
    HocrText(i32),
    RendererCreate(RenderFormat, String),
    RendererInsert,
    BeginDocument(String),
    AddImage,
    EndDocument,
    RendererDelete(Vec<RenderFormat>),
    IterCreate,
    IterDelete,
}

#[derive(Debug, Clone)]
pub struct FakeWord {
    text: String,
    confidence: f32,
    bbox: (i32, i32, i32, i32),
}

impl FakeWord {
    pub fn new(text: &str, confidence: f32, bbox: (i32, i32, i32, i32)) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            bbox,
        }
    }
}

pub struct FakeHandle {
    page_id: Option<u8>,
    recognized: bool,
}

pub struct FakeRenderer {
    basename: String,
    formats: Vec<RenderFormat>,
    pages: usize,
}

pub struct FakeIter {
    words: Vec<FakeWord>,
    pos: usize,
}

#[derive(Default)]
pub struct FakeApi {
    journal: RefCell<Vec<Call>>,
    fail_init: bool,
    fail_recognize: bool,
    fail_renderer: Option<RenderFormat>,
    words: Vec<FakeWord>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_recognize(mut self) -> Self {
        self.fail_recognize = true;
        self
    }

    pub fn failing_renderer(mut self, format: RenderFormat) -> Self {
        self.fail_renderer = Some(format);
        self
    }

    pub fn with_words(mut self, words: Vec<FakeWord>) -> Self {
        self.words = words;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.journal.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Iterator over the configured words, as if recognition had run
    pub fn make_iter(&self) -> Option<FakeIter> {
        self.record(Call::IterCreate);
        Some(FakeIter {
            words: self.words.clone(),
            pos: 0,
        })
    }

    fn record(&self, call: Call) {
        self.journal.borrow_mut().push(call);
    }
}

fn lossy(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl TessApi for FakeApi {
    type Handle = FakeHandle;
    type Renderer = FakeRenderer;
    type ResultIter = FakeIter;

    fn version(&self) -> String {
        "5.3.0-fake".to_string()
    }

    fn create(&self) -> Option<FakeHandle> {
        self.record(Call::Create);
        Some(FakeHandle {
            page_id: None,
            recognized: false,
        })
    }

    fn init(
        &self,
        _handle: &mut FakeHandle,
        datapath: &CStr,
        language: &CStr,
        mode: EngineMode,
        configs: &[&CStr],
    ) -> bool {
        self.record(Call::Init {
            datapath: lossy(datapath),
            language: lossy(language),
            mode,
            configs: configs.iter().map(|c| lossy(c)).collect(),
        });
        !self.fail_init
    }

    fn delete(&self, _handle: FakeHandle) {
        self.record(Call::Delete);
    }

    fn set_variable(&self, _handle: &mut FakeHandle, name: &CStr, value: &CStr) -> bool {
        self.record(Call::SetVariable(lossy(name), lossy(value)));
        !lossy(name).starts_with("no_such")
    }

    fn set_page_seg_mode(&self, _handle: &mut FakeHandle, mode: PageSegMode) {
        self.record(Call::SetPageSegMode(mode));
    }

    fn set_image(
        &self,
        handle: &mut FakeHandle,
        data: &[u8],
        width: i32,
        height: i32,
        bytes_per_pixel: i32,
        bytes_per_line: i32,
    ) {
        self.record(Call::SetImage {
            width,
            height,
            bytes_per_pixel,
            bytes_per_line,
            len: data.len(),
        });
        handle.page_id = data.first().copied();
        handle.recognized = false;
    }

    fn set_rectangle(&self, _handle: &mut FakeHandle, left: i32, top: i32, width: i32, height: i32) {
        self.record(Call::SetRectangle(left, top, width, height));
    }

    fn set_input_name(&self, _handle: &mut FakeHandle, name: &CStr) {
        self.record(Call::SetInputName(lossy(name)));
    }

    fn recognize(&self, handle: &mut FakeHandle) -> bool {
        self.record(Call::Recognize);
        if self.fail_recognize || handle.page_id.is_none() {
            return false;
        }
        handle.recognized = true;
        true
    }

    fn utf8_text(&self, handle: &mut FakeHandle) -> Option<String> {
        self.record(Call::Utf8Text);
        let id = handle.page_id.filter(|_| handle.recognized)?;
        Some(format!("page {}\n", id))
    }

    fn hocr_text(&self, handle: &mut FakeHandle, page_index: i32) -> Option<String> {
        self.record(Call::HocrText(page_index));
        let id = handle.page_id.filter(|_| handle.recognized)?;
        Some(format!(
            "  <div class='ocr_page' id='page_{}'>page {}</div>\n",
            page_index + 1,
            id
        ))
    }

    fn renderer_create(
        &self,
        format: RenderFormat,
        outputbase: &CStr,
        _datapath: &CStr,
    ) -> Option<FakeRenderer> {
        self.record(Call::RendererCreate(format, lossy(outputbase)));
        if self.fail_renderer == Some(format) {
            return None;
        }
        Some(FakeRenderer {
            basename: lossy(outputbase),
            formats: vec![format],
            pages: 0,
        })
    }

    fn renderer_insert(&self, head: &mut FakeRenderer, next: FakeRenderer) {
        self.record(Call::RendererInsert);
        head.formats.extend(next.formats);
    }

    fn renderer_begin_document(&self, _renderer: &mut FakeRenderer, title: &CStr) -> bool {
        self.record(Call::BeginDocument(lossy(title)));
        true
    }

    fn renderer_add_image(&self, renderer: &mut FakeRenderer, handle: &mut FakeHandle) -> bool {
        self.record(Call::AddImage);
        if !handle.recognized {
            return false;
        }
        renderer.pages += 1;
        true
    }

    /// Writes one file per format, like the native renderers do
    fn renderer_end_document(&self, renderer: &mut FakeRenderer) -> bool {
        self.record(Call::EndDocument);
        renderer.formats.iter().all(|format| {
            let path = PathBuf::from(format!("{}.{}", renderer.basename, format.extension()));
            std::fs::write(path, format!("{} page(s)\n", renderer.pages)).is_ok()
        })
    }

    fn renderer_delete(&self, renderer: FakeRenderer) {
        self.record(Call::RendererDelete(renderer.formats));
    }

    fn result_iter(&self, handle: &mut FakeHandle) -> Option<FakeIter> {
        if !handle.recognized {
            return None;
        }
        self.make_iter()
    }

    fn iter_begin(&self, iter: &mut FakeIter) {
        iter.pos = 0;
    }

    fn iter_next(&self, iter: &mut FakeIter, _level: PageIteratorLevel) -> bool {
        if iter.pos + 1 < iter.words.len() {
            iter.pos += 1;
            true
        } else {
            false
        }
    }

    fn iter_text(&self, iter: &FakeIter, _level: PageIteratorLevel) -> Option<String> {
        iter.words
            .get(iter.pos)
            .map(|w| w.text.clone())
            .filter(|t| !t.is_empty())
    }

    fn iter_confidence(&self, iter: &FakeIter, _level: PageIteratorLevel) -> f32 {
        iter.words.get(iter.pos).map_or(0.0, |w| w.confidence)
    }

    fn iter_bounding_box(
        &self,
        iter: &FakeIter,
        _level: PageIteratorLevel,
    ) -> Option<(i32, i32, i32, i32)> {
        iter.words.get(iter.pos).map(|w| w.bbox)
    }

    fn iter_delete(&self, _iter: FakeIter) {
        self.record(Call::IterDelete);
    }
}
