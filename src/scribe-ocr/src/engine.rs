//! Engine handle lifecycle and the per-page recognition states
//!
//! An [`Engine`] owns one native handle from creation until it is disposed,
//! either explicitly or when dropped. A page moves through
//! `Engine::set_image` -> [`PageImage::recognize`] -> [`Recognized`], and each
//! state borrows the engine mutably, so text and iterators can only be taken
//! from a page that was recognized on the handle that still holds it.

use crate::api::TessApi;
use crate::config::EngineConfig;
use crate::error::{OcrError, Result};
use crate::iterator::ResultCursor;
use crate::pixels::PixelBuffer;
use crate::types::{EngineMode, OutputFormat, PageSegMode, Rect};
use std::ffi::{CStr, CString};
use std::path::Path;
use tracing::{debug, info, warn};

/// Initialized native engine instance
pub struct Engine<'a, A: TessApi> {
    api: &'a A,
    handle: Option<A::Handle>,
}

impl<'a, A: TessApi> Engine<'a, A> {
    /// Create and initialize a native engine.
    ///
    /// Fails if the language data cannot be loaded from `datapath`; the
    /// half-created handle is released before returning.
    pub fn init(
        api: &'a A,
        datapath: &Path,
        language: &str,
        mode: EngineMode,
        configs: &[String],
    ) -> Result<Self> {
        let datapath_c = path_cstring(datapath)?;
        let language_c = to_cstring(language, "language")?;
        let configs_c = configs
            .iter()
            .map(|c| to_cstring(c, "config name"))
            .collect::<Result<Vec<_>>>()?;
        let config_refs: Vec<&CStr> = configs_c.iter().map(CString::as_c_str).collect();

        let handle = api
            .create()
            .ok_or_else(|| OcrError::InitFailed("engine allocation failed".to_string()))?;
        let mut engine = Self {
            api,
            handle: Some(handle),
        };

        let ok = match engine.handle.as_mut() {
            Some(handle) => api.init(handle, &datapath_c, &language_c, mode, &config_refs),
            None => false,
        };
        if !ok {
            return Err(OcrError::InitFailed(format!(
                "could not load language '{}' from {:?}",
                language, datapath
            )));
        }

        info!(
            language,
            datapath = %datapath.display(),
            mode = ?mode,
            configs = configs.len(),
            "OCR engine initialized"
        );
        Ok(engine)
    }

    /// Initialize from a config: init parameters, then the page segmentation
    /// mode (only when set), then every engine variable
    pub fn from_config(api: &'a A, config: &EngineConfig) -> Result<Self> {
        let mut engine = Self::init(
            api,
            &config.datapath,
            &config.language,
            config.engine_mode,
            &config.configs,
        )?;

        if let Some(mode) = config.page_seg_mode {
            engine.set_page_seg_mode(mode)?;
        }
        for (name, value) in &config.variables {
            engine.set_variable(name, value)?;
        }

        Ok(engine)
    }

    /// Whether the native handle is still held
    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    /// Set one engine variable. Unknown names are not an error.
    pub fn set_variable(&mut self, name: &str, value: &str) -> Result<()> {
        let name_c = to_cstring(name, "variable name")?;
        let value_c = to_cstring(value, "variable value")?;
        let api = self.api;
        let handle = self.handle()?;

        if !api.set_variable(handle, &name_c, &value_c) {
            debug!("engine did not accept variable {}", name);
        }
        Ok(())
    }

    /// Override the engine's page segmentation mode
    pub fn set_page_seg_mode(&mut self, mode: PageSegMode) -> Result<()> {
        let api = self.api;
        api.set_page_seg_mode(self.handle()?, mode);
        debug!("page segmentation mode set to {:?}", mode);
        Ok(())
    }

    /// Hand a page to the engine, optionally restricted to `roi`.
    /// An empty rectangle means the whole image.
    pub fn set_image(&mut self, buffer: &PixelBuffer, roi: Option<Rect>) -> Result<PageImage<'_, 'a, A>> {
        let width = to_c_int(buffer.width(), "width")?;
        let height = to_c_int(buffer.height(), "height")?;
        let bytes_per_pixel = to_c_int(buffer.bytes_per_pixel(), "bytes per pixel")?;
        let stride = to_c_int(buffer.stride(), "stride")?;

        let api = self.api;
        let handle = self.handle()?;
        api.set_image(handle, buffer.data(), width, height, bytes_per_pixel, stride);

        if let Some(rect) = roi.filter(|r| !r.is_empty()) {
            api.set_rectangle(handle, rect.x, rect.y, rect.width, rect.height);
            debug!("recognition restricted to {:?}", rect);
        }

        Ok(PageImage { engine: self })
    }

    /// Release the native handle. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.api.delete(handle);
            debug!("engine handle disposed");
        }
    }

    pub(crate) fn api(&self) -> &'a A {
        self.api
    }

    pub(crate) fn handle(&mut self) -> Result<&mut A::Handle> {
        self.handle.as_mut().ok_or(OcrError::NotInitialized)
    }
}

impl<A: TessApi> Drop for Engine<'_, A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A page whose pixels are loaded but not yet recognized
pub struct PageImage<'e, 'a, A: TessApi> {
    engine: &'e mut Engine<'a, A>,
}

impl<'e, 'a, A: TessApi> PageImage<'e, 'a, A> {
    /// Run recognition. A non-empty `input_name` is given to the engine first
    /// so it can find side inputs such as a zone file next to the image.
    pub fn recognize(self, input_name: Option<&str>) -> Result<Recognized<'e, 'a, A>> {
        let api = self.engine.api();
        if let Some(name) = input_name.filter(|n| !n.is_empty()) {
            let name_c = to_cstring(name, "input name")?;
            api.set_input_name(self.engine.handle()?, &name_c);
        }

        if !api.recognize(self.engine.handle()?) {
            warn!("native recognition reported failure");
            return Err(OcrError::Recognition(
                "the engine could not recognize the page".to_string(),
            ));
        }

        Ok(Recognized {
            engine: self.engine,
        })
    }
}

/// A page the engine has recognized
pub struct Recognized<'e, 'a, A: TessApi> {
    engine: &'e mut Engine<'a, A>,
}

impl<'e, 'a, A: TessApi> Recognized<'e, 'a, A> {
    /// Retrieve the page's text. `page_number` is 1-based and only matters
    /// for hOCR, where it becomes the page id.
    pub fn text(&mut self, format: OutputFormat, page_number: u32) -> Result<String> {
        let api = self.engine.api();
        let handle = self.engine.handle()?;

        let text = match format {
            OutputFormat::Text => api.utf8_text(handle),
            OutputFormat::Hocr => {
                let page_index = page_number
                    .checked_sub(1)
                    .ok_or_else(|| {
                        OcrError::InvalidArgument("page numbers start at 1".to_string())
                    })?;
                api.hocr_text(handle, to_c_int(page_index, "page number")?)
            }
        };

        text.ok_or_else(|| OcrError::Recognition("the engine returned no text".to_string()))
    }

    /// Walk the recognition result element by element
    pub fn cursor(&mut self) -> Result<ResultCursor<'_, A>> {
        let api = self.engine.api();
        let iter = api.result_iter(self.engine.handle()?);
        Ok(ResultCursor::new(api, iter))
    }

    pub(crate) fn handle(&mut self) -> Result<&mut A::Handle> {
        self.engine.handle()
    }
}

pub(crate) fn to_cstring(value: &str, what: &str) -> Result<CString> {
    CString::new(value)
        .map_err(|_| OcrError::InvalidArgument(format!("{} contains a NUL byte: {:?}", what, value)))
}

pub(crate) fn path_cstring(path: &Path) -> Result<CString> {
    let s = path
        .to_str()
        .ok_or_else(|| OcrError::InvalidArgument(format!("path is not valid UTF-8: {:?}", path)))?;
    to_cstring(s, "path")
}

fn to_c_int(value: u32, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| OcrError::InvalidArgument(format!("{} out of range: {}", what, value)))
}
