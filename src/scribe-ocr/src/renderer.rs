//! Document renderer chains
//!
//! One chain writes every requested format for one input file. The first
//! renderer created is the head; the rest are inserted behind it, and deleting
//! the head releases the whole chain.

use crate::api::TessApi;
use crate::engine::{path_cstring, to_cstring, Recognized};
use crate::error::{OcrError, Result};
use crate::types::RenderFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct RendererChain<'a, A: TessApi> {
    api: &'a A,
    head: Option<A::Renderer>,
    basename: PathBuf,
    formats: Vec<RenderFormat>,
}

impl<'a, A: TessApi> RendererChain<'a, A> {
    /// Create one renderer per format, in order, all bound to `basename`
    pub fn build(
        api: &'a A,
        basename: &Path,
        formats: &[RenderFormat],
        datapath: &Path,
    ) -> Result<Self> {
        if formats.is_empty() {
            return Err(OcrError::InvalidArgument(
                "at least one output format is required".to_string(),
            ));
        }

        let basename_c = path_cstring(basename)?;
        let datapath_c = path_cstring(datapath)?;

        let mut chain = Self {
            api,
            head: None,
            basename: basename.to_path_buf(),
            formats: Vec::with_capacity(formats.len()),
        };

        for &format in formats {
            let renderer = api
                .renderer_create(format, &basename_c, &datapath_c)
                .ok_or_else(|| {
                    OcrError::Renderer(format!(
                        "could not create {} renderer for {:?}",
                        format, basename
                    ))
                })?;

            match chain.head.as_mut() {
                Some(head) => api.renderer_insert(head, renderer),
                None => chain.head = Some(renderer),
            }
            chain.formats.push(format);
        }

        debug!("built renderer chain {:?} for {:?}", chain.formats, basename);
        Ok(chain)
    }

    /// Formats in chain order
    pub fn formats(&self) -> &[RenderFormat] {
        &self.formats
    }

    /// Files the chain writes, in chain order
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.formats
            .iter()
            .map(|format| {
                let mut name = self.basename.clone().into_os_string();
                name.push(".");
                name.push(format.extension());
                PathBuf::from(name)
            })
            .collect()
    }

    /// Start a document titled `title` in every output
    pub fn begin_document(&mut self, title: &str) -> Result<()> {
        let title_c = to_cstring(title, "document title")?;
        let api = self.api;
        if !api.renderer_begin_document(self.head()?, &title_c) {
            return Err(OcrError::Renderer(format!(
                "could not begin document {:?}",
                self.basename
            )));
        }
        Ok(())
    }

    /// Render one recognized page into every output
    pub fn add_image(&mut self, page: &mut Recognized<'_, '_, A>) -> Result<()> {
        let api = self.api;
        let handle = page.handle()?;
        let head = self
            .head
            .as_mut()
            .ok_or_else(|| OcrError::Renderer("renderer chain already released".to_string()))?;

        if !api.renderer_add_image(head, handle) {
            return Err(OcrError::Renderer(format!(
                "could not add page to {:?}",
                self.basename
            )));
        }
        Ok(())
    }

    /// Finish the document and write the output files
    pub fn end_document(&mut self) -> Result<()> {
        let api = self.api;
        if !api.renderer_end_document(self.head()?) {
            return Err(OcrError::Renderer(format!(
                "could not finish document {:?}",
                self.basename
            )));
        }
        Ok(())
    }

    fn head(&mut self) -> Result<&mut A::Renderer> {
        self.head
            .as_mut()
            .ok_or_else(|| OcrError::Renderer("renderer chain already released".to_string()))
    }
}

impl<A: TessApi> Drop for RendererChain<'_, A> {
    fn drop(&mut self) {
        if let Some(head) = self.head.take() {
            self.api.renderer_delete(head);
        }
    }
}
