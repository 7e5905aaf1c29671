//! The recognition session: configuration plus the public OCR entry points.
//!
//! Every entry point creates its own engine handle, runs its pages through
//! it, and releases it before returning, on success and on error alike.

use crate::api::TessApi;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{OcrError, Result};
use crate::iterator::RecognizedElement;
use crate::pixels::to_native_buffer;
use crate::renderer::RendererChain;
use crate::types::{EngineMode, OutputFormat, PageIteratorLevel, PageSegMode, Rect, RenderFormat};
use scribe_imaging::{Page, Raster};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Opening of a multi-page hOCR document
pub const HOCR_BEGIN: &str = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\"\n    \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">\n<html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"en\" lang=\"en\">\n <head>\n  <title></title>\n  <meta http-equiv=\"Content-Type\" content=\"text/html;charset=utf-8\" />\n  <meta name='ocr-system' content='tesseract' />\n  <meta name='ocr-capabilities' content='ocr_page ocr_carea ocr_par ocr_line ocrx_word'/>\n </head>\n <body>\n";

/// Closing of a multi-page hOCR document
pub const HOCR_END: &str = " </body>\n</html>\n";

/// Outcome for one input of [`Tesseract::create_documents`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub input: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub pages_rendered: usize,
    pub pages_skipped: usize,
}

/// OCR session over a native engine boundary `A`.
///
/// Holds configuration only; no native state survives between calls. Create
/// one session per thread when recognizing in parallel.
pub struct Tesseract<A: TessApi> {
    api: A,
    config: EngineConfig,
}

#[cfg(feature = "native")]
impl Tesseract<crate::ffi::NativeApi> {
    /// Session over the linked libtesseract with default settings
    pub fn new() -> Self {
        Self::with_api(crate::ffi::NativeApi)
    }
}

#[cfg(feature = "native")]
impl Default for Tesseract<crate::ffi::NativeApi> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: TessApi> Tesseract<A> {
    /// Session over `api` with default settings
    pub fn with_api(api: A) -> Self {
        Self::with_config(api, EngineConfig::default())
    }

    /// Session over `api` with the given settings
    pub fn with_config(api: A, config: EngineConfig) -> Self {
        Self { api, config }
    }

    /// The native boundary this session drives
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Settings applied to every new engine handle
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutable access to the settings
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Directory holding the `*.traineddata` files
    pub fn set_datapath(&mut self, datapath: impl Into<PathBuf>) {
        self.config.datapath = datapath.into();
    }

    /// Language identifier(s), `+`-separated
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.config.language = language.into();
    }

    /// OCR engine mode passed at init
    pub fn set_engine_mode(&mut self, mode: EngineMode) {
        self.config.engine_mode = mode;
    }

    /// `None` leaves the engine's own default in place
    pub fn set_page_seg_mode(&mut self, mode: Option<PageSegMode>) {
        self.config.page_seg_mode = mode;
    }

    /// Produce hOCR instead of plain text
    pub fn set_hocr(&mut self, hocr: bool) {
        self.config.set_hocr(hocr);
    }

    /// Engine variable applied after init
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.config.variables.insert(name.into(), value.into());
    }

    /// Named config files applied at init, in order
    pub fn set_configs(&mut self, configs: Vec<String>) {
        self.config.configs = configs;
    }

    fn open_engine(&self) -> Result<Engine<'_, A>> {
        Engine::from_config(&self.api, &self.config)
    }

    /// Recognize one raster
    pub fn do_ocr_image(&self, raster: &Raster, roi: Option<Rect>) -> Result<String> {
        self.recognize_single(raster, None, roi)
    }

    /// Recognize a raw pixel buffer of the given bit depth (1, 8 or 24)
    pub fn do_ocr_buffer(
        &self,
        width: u32,
        height: u32,
        data: &[u8],
        bits_per_pixel: u32,
        input_name: Option<&str>,
        roi: Option<Rect>,
    ) -> Result<String> {
        let raster = Raster::from_bytes(width, height, bits_per_pixel, data.to_vec());
        self.recognize_single(&raster, input_name, roi)
    }

    /// Decode an image file and recognize every page in it. The path is
    /// given to the engine as the input name so a zone file next to the
    /// image is picked up.
    pub fn do_ocr_file(&self, path: impl AsRef<Path>, roi: Option<Rect>) -> Result<String> {
        let path = path.as_ref();
        let pages = scribe_imaging::load_pages(path)?;
        let input_name = path.to_string_lossy();
        self.do_ocr_pages(pages, Some(&input_name), roi)
    }

    /// Recognize pages in order and concatenate their output.
    ///
    /// Pages that failed to decode or cannot be marshaled are logged and left
    /// out; the remaining pages keep their original page numbers. Fails only
    /// when no page could be recognized, or when the engine itself fails.
    pub fn do_ocr_pages<I>(&self, pages: I, input_name: Option<&str>, roi: Option<Rect>) -> Result<String>
    where
        I: IntoIterator<Item = Page>,
    {
        let format = self.config.output;
        let mut engine = self.open_engine()?;

        let mut out = String::new();
        let mut total = 0;
        let mut recognized = 0;
        let mut last_failure = None;

        for (index, page) in pages.into_iter().enumerate() {
            total += 1;
            let page_number = index as u32 + 1;

            let buffer = match page.map_err(OcrError::from).and_then(|r| to_native_buffer(&r)) {
                Ok(buffer) => buffer,
                Err(e) => {
                    error!("skipping page {}: {}", page_number, e);
                    last_failure = Some(e);
                    continue;
                }
            };

            let mut page = engine.set_image(&buffer, roi)?.recognize(input_name)?;
            out.push_str(&page.text(format, page_number)?);
            recognized += 1;
        }

        if recognized == 0 {
            return Err(OcrError::NoPagesRecognized {
                pages: total,
                last: last_failure.map(Box::new),
            });
        }
        if recognized < total {
            warn!("recognized {} of {} page(s)", recognized, total);
        } else {
            debug!("recognized {} page(s)", recognized);
        }

        Ok(wrap_output(format, out))
    }

    fn recognize_single(&self, raster: &Raster, input_name: Option<&str>, roi: Option<Rect>) -> Result<String> {
        let format = self.config.output;
        let buffer = to_native_buffer(raster)?;
        let mut engine = self.open_engine()?;

        let mut page = engine.set_image(&buffer, roi)?.recognize(input_name)?;
        let text = page.text(format, 1)?;

        Ok(wrap_output(format, text))
    }

    /// Recognize a raster and return its elements at `level`
    pub fn words(&self, raster: &Raster, level: PageIteratorLevel) -> Result<Vec<RecognizedElement>> {
        let buffer = to_native_buffer(raster)?;
        let mut engine = self.open_engine()?;

        let mut page = engine.set_image(&buffer, None)?.recognize(None)?;
        let elements: Vec<RecognizedElement> = page.cursor()?.elements(level).collect();

        debug!("collected {} element(s) at {:?} level", elements.len(), level);
        Ok(elements)
    }

    /// Render each input file into every format, writing to the output
    /// basename at the same position.
    ///
    /// Inputs are independent: a failing input gets an error entry and the
    /// batch moves on. Only argument errors and engine initialization
    /// failure fail the call as a whole.
    pub fn create_documents<P, Q>(
        &self,
        inputs: &[P],
        basenames: &[Q],
        formats: &[RenderFormat],
    ) -> Result<Vec<Result<DocumentReport>>>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        if inputs.len() != basenames.len() {
            return Err(OcrError::InvalidArgument(format!(
                "{} input(s) but {} output basename(s)",
                inputs.len(),
                basenames.len()
            )));
        }
        if formats.is_empty() {
            return Err(OcrError::InvalidArgument(
                "at least one output format is required".to_string(),
            ));
        }

        let mut engine = self.open_engine()?;
        let mut reports = Vec::with_capacity(inputs.len());

        for (input, basename) in inputs.iter().zip(basenames) {
            let input = input.as_ref();
            let result = self.render_document(&mut engine, input, basename.as_ref(), formats);
            match &result {
                Ok(report) => info!(
                    "rendered {:?}: {} page(s) into {} file(s)",
                    input,
                    report.pages_rendered,
                    report.outputs.len()
                ),
                Err(e) => error!("failed to render {:?}: {}", input, e),
            }
            reports.push(result);
        }

        Ok(reports)
    }

    fn render_document(
        &self,
        engine: &mut Engine<'_, A>,
        input: &Path,
        basename: &Path,
        formats: &[RenderFormat],
    ) -> Result<DocumentReport> {
        let pages = scribe_imaging::load_pages(input)?;
        let input_name = input.to_string_lossy();
        let title = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut chain = RendererChain::build(&self.api, basename, formats, &self.config.datapath)?;
        chain.begin_document(&title)?;

        let mut report = DocumentReport {
            input: input.to_path_buf(),
            outputs: chain.output_paths(),
            pages_rendered: 0,
            pages_skipped: 0,
        };
        let mut last_failure = None;

        for (index, page) in pages.into_iter().enumerate() {
            let buffer = match page.map_err(OcrError::from).and_then(|r| to_native_buffer(&r)) {
                Ok(buffer) => buffer,
                Err(e) => {
                    error!("skipping page {} of {:?}: {}", index + 1, input, e);
                    report.pages_skipped += 1;
                    last_failure = Some(e);
                    continue;
                }
            };

            let mut page = engine.set_image(&buffer, None)?.recognize(Some(&input_name))?;
            chain.add_image(&mut page)?;
            report.pages_rendered += 1;
        }

        if report.pages_rendered == 0 {
            return Err(OcrError::NoPagesRecognized {
                pages: report.pages_skipped,
                last: last_failure.map(Box::new),
            });
        }

        chain.end_document()?;
        Ok(report)
    }
}

fn wrap_output(format: OutputFormat, body: String) -> String {
    match format {
        OutputFormat::Text => body,
        OutputFormat::Hocr => {
            let mut doc = String::with_capacity(HOCR_BEGIN.len() + body.len() + HOCR_END.len());
            doc.push_str(HOCR_BEGIN);
            doc.push_str(&body);
            doc.push_str(HOCR_END);
            doc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeApi, FakeWord};
    use scribe_imaging::ImagingError;

    fn page(id: u8) -> Page {
        Ok(Raster::from_bytes(4, 4, 8, vec![id; 16]))
    }

    fn broken_page() -> Page {
        Err(ImagingError::UnknownFormat)
    }

    fn deletes(api: &FakeApi) -> usize {
        api.count(|c| matches!(c, Call::Delete))
    }

    #[test]
    fn test_single_image() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let raster = Raster::from_bytes(4, 4, 8, vec![7; 16]);

        assert_eq!(ocr.do_ocr_image(&raster, None).unwrap(), "page 7\n");
        assert_eq!(deletes(ocr.api()), 1);
    }

    #[test]
    fn test_single_image_marshal_failure_is_typed() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let raster = Raster::from_bytes(100, 100, 8, vec![0; 10]);

        let err = ocr.do_ocr_image(&raster, None).unwrap_err();
        assert!(matches!(err, OcrError::Marshal(_)));
        assert_eq!(deletes(ocr.api()), 0);
        assert_eq!(ocr.api().count(|c| matches!(c, Call::Create)), 0);
    }

    #[test]
    fn test_failed_page_is_omitted() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let text = ocr
            .do_ocr_pages(vec![page(1), broken_page(), page(3)], None, None)
            .unwrap();

        assert_eq!(text, "page 1\npage 3\n");
        assert_eq!(deletes(ocr.api()), 1);
    }

    #[test]
    fn test_unmarshalable_page_is_omitted() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let bad = Ok(Raster::from_bytes(4, 4, 12, vec![9; 64]));
        let text = ocr.do_ocr_pages(vec![bad, page(2)], None, None).unwrap();
        assert_eq!(text, "page 2\n");
    }

    #[test]
    fn test_all_pages_failing_is_an_error() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let err = ocr
            .do_ocr_pages(vec![broken_page(), broken_page()], None, None)
            .unwrap_err();

        match err {
            OcrError::NoPagesRecognized { pages, last } => {
                assert_eq!(pages, 2);
                assert!(matches!(last.as_deref(), Some(OcrError::Imaging(_))));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(deletes(ocr.api()), 1);
    }

    #[test]
    fn test_no_pages_is_an_error() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let result = ocr.do_ocr_pages(Vec::new(), None, None);
        assert!(matches!(result, Err(OcrError::NoPagesRecognized { pages: 0, .. })));
    }

    #[test]
    fn test_hocr_wrapped_once() {
        for n in 1..=4u8 {
            let mut ocr = Tesseract::with_api(FakeApi::new());
            ocr.set_hocr(true);
            let pages: Vec<Page> = (1..=n).map(page).collect();

            let doc = ocr.do_ocr_pages(pages, None, None).unwrap();
            assert!(doc.starts_with(HOCR_BEGIN));
            assert!(doc.ends_with(HOCR_END));
            assert_eq!(doc.matches("<html").count(), 1);
            assert_eq!(doc.matches("</html>").count(), 1);
            assert_eq!(doc.matches("class='ocr_page'").count(), n as usize);
        }
    }

    #[test]
    fn test_hocr_page_numbers_keep_position() {
        let mut ocr = Tesseract::with_api(FakeApi::new());
        ocr.set_hocr(true);
        let doc = ocr
            .do_ocr_pages(vec![page(1), broken_page(), page(3)], None, None)
            .unwrap();

        assert!(doc.contains("id='page_1'"));
        assert!(!doc.contains("id='page_2'"));
        assert!(doc.contains("id='page_3'"));
        assert!(ocr.api().calls().contains(&Call::HocrText(2)));
        assert!(ocr
            .api()
            .calls()
            .contains(&Call::SetVariable("tessedit_create_hocr".to_string(), "1".to_string())));
    }

    #[test]
    fn test_recognition_failure_aborts_and_disposes() {
        let ocr = Tesseract::with_api(FakeApi::new().failing_recognize());
        let err = ocr.do_ocr_pages(vec![page(1), page(2)], None, None).unwrap_err();

        assert!(matches!(err, OcrError::Recognition(_)));
        assert_eq!(deletes(ocr.api()), 1);
    }

    #[test]
    fn test_init_failure_is_fatal() {
        let ocr = Tesseract::with_api(FakeApi::new().failing_init());
        let err = ocr.do_ocr_pages(vec![page(1)], None, None).unwrap_err();

        assert!(matches!(err, OcrError::InitFailed(_)));
        assert_eq!(ocr.api().count(|c| matches!(c, Call::Recognize)), 0);
        assert_eq!(deletes(ocr.api()), 1);
    }

    #[test]
    fn test_zero_area_roi_matches_whole_image() {
        let whole = Tesseract::with_api(FakeApi::new());
        let zero = Tesseract::with_api(FakeApi::new());
        let raster = Raster::from_bytes(4, 4, 8, vec![5; 16]);

        let a = whole.do_ocr_image(&raster, None).unwrap();
        let b = zero.do_ocr_image(&raster, Some(Rect::new(0, 0, 0, 0))).unwrap();

        assert_eq!(a, b);
        assert_eq!(whole.api().calls(), zero.api().calls());
    }

    #[test]
    fn test_buffer_entry_point() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let data = vec![4u8; 129 * 2];
        let text = ocr
            .do_ocr_buffer(1025, 2, &data, 1, Some("scan.tif"), Some(Rect::new(0, 0, 100, 2)))
            .unwrap();

        assert_eq!(text, "page 4\n");
        let calls = ocr.api().calls();
        assert!(calls.contains(&Call::SetImage {
            width: 1025,
            height: 2,
            bytes_per_pixel: 0,
            bytes_per_line: 129,
            len: 258,
        }));
        assert!(calls.contains(&Call::SetRectangle(0, 0, 100, 2)));
        assert!(calls.contains(&Call::SetInputName("scan.tif".to_string())));
    }

    #[test]
    fn test_words_in_traversal_order() {
        let api = FakeApi::new().with_words(vec![
            FakeWord::new("The", 95.0, (36, 92, 96, 116)),
            FakeWord::new("(quick)", 92.5, (109, 92, 236, 121)),
            FakeWord::new("[brown]", 93.1, (252, 92, 389, 121)),
            FakeWord::new("{fox}", 91.0, (402, 92, 501, 121)),
            FakeWord::new("jumps!", 90.2, (514, 92, 634, 121)),
        ]);
        let ocr = Tesseract::with_api(api);
        let raster = Raster::from_bytes(640, 480, 8, vec![1; 640 * 480]);

        let words = ocr.words(&raster, PageIteratorLevel::Word).unwrap();
        let transcript: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(transcript.join(" "), "The (quick) [brown] {fox} jumps!");

        for word in &words {
            assert!(word.bbox.width >= 0 && word.bbox.height >= 0);
            assert!(word.bbox.x >= 0 && word.bbox.x + word.bbox.width <= 640);
            assert!(word.bbox.y >= 0 && word.bbox.y + word.bbox.height <= 480);
            assert!((0.0..=100.0).contains(&word.confidence));
        }

        assert_eq!(ocr.api().count(|c| matches!(c, Call::IterDelete)), 1);
        assert_eq!(deletes(ocr.api()), 1);
    }

    #[test]
    fn test_missing_file_is_an_imaging_error() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = Tesseract::with_api(FakeApi::new());

        let err = ocr.do_ocr_file(dir.path().join("absent.png"), None).unwrap_err();
        assert!(matches!(err, OcrError::Imaging(ImagingError::Io(_))));
        assert!(ocr.api().calls().is_empty());
    }

    #[test]
    fn test_mismatched_batch_arrays() {
        let ocr = Tesseract::with_api(FakeApi::new());
        let result = ocr.create_documents(&["a.png", "b.png"], &["out/a"], &[RenderFormat::Text]);
        assert!(matches!(result, Err(OcrError::InvalidArgument(_))));
        assert!(ocr.api().calls().is_empty());
    }

    fn write_png(path: &Path, shade: u8) {
        image::GrayImage::from_pixel(8, 8, image::Luma([shade]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_create_documents_single_pass_per_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("eurotext.png");
        write_png(&input, 42);
        let base = dir.path().join("doc1");

        let ocr = Tesseract::with_api(FakeApi::new());
        let formats = [RenderFormat::Hocr, RenderFormat::Pdf, RenderFormat::Text];
        let reports = ocr.create_documents(&[&input], &[&base], &formats).unwrap();

        let report = reports[0].as_ref().unwrap();
        assert_eq!(report.pages_rendered, 1);
        for ext in ["hocr", "pdf", "txt"] {
            assert!(dir.path().join(format!("doc1.{}", ext)).exists());
        }
        assert_eq!(report.outputs[1], dir.path().join("doc1.pdf"));

        let api = ocr.api();
        assert_eq!(api.count(|c| matches!(c, Call::Recognize)), 1);
        assert_eq!(api.count(|c| matches!(c, Call::AddImage)), 1);
        assert_eq!(api.count(|c| matches!(c, Call::BeginDocument(t) if t == "eurotext")), 1);
        assert_eq!(api.count(|c| matches!(c, Call::EndDocument)), 1);
        assert_eq!(api.count(|c| matches!(c, Call::RendererDelete(_))), 1);
        assert_eq!(deletes(api), 1);
    }

    #[test]
    fn test_create_documents_continues_past_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        write_png(&good, 10);
        let missing = dir.path().join("missing.png");
        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();

        let ocr = Tesseract::with_api(FakeApi::new());
        let reports = ocr
            .create_documents(
                &[&missing, &garbage, &good],
                &[dir.path().join("m"), dir.path().join("g"), dir.path().join("ok")],
                &[RenderFormat::Text],
            )
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert!(reports[0].is_err());
        assert!(reports[1].is_err());
        assert!(reports[2].is_ok());
        assert!(dir.path().join("ok.txt").exists());
        assert!(!dir.path().join("m.txt").exists());
        assert_eq!(deletes(ocr.api()), 1);
    }
}
