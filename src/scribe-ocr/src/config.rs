//! Engine configuration

use crate::types::{EngineMode, OutputFormat, PageSegMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Engine variable that makes the native side produce hOCR
pub const HOCR_VARIABLE: &str = "tessedit_create_hocr";

/// Everything applied to a freshly created engine handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the `*.traineddata` files
    pub datapath: PathBuf,

    /// Language identifier(s), `+`-separated (e.g. "eng+deu")
    pub language: String,

    pub engine_mode: EngineMode,

    /// Only sent to the engine when set
    pub page_seg_mode: Option<PageSegMode>,

    /// Named config files from `tessdata/configs`, applied in order at init
    pub configs: Vec<String>,

    /// Engine variables set after init. Names are not validated here.
    pub variables: BTreeMap<String, String>,

    pub output: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            datapath: PathBuf::from("./"),
            language: "eng".to_string(),
            engine_mode: EngineMode::Default,
            page_seg_mode: None,
            configs: Vec::new(),
            variables: BTreeMap::new(),
            output: OutputFormat::Text,
        }
    }
}

impl EngineConfig {
    /// Switch between hOCR and plain text output, keeping the engine
    /// variable in step with the retrieval format
    pub fn set_hocr(&mut self, hocr: bool) {
        self.output = if hocr {
            OutputFormat::Hocr
        } else {
            OutputFormat::Text
        };
        self.variables.insert(
            HOCR_VARIABLE.to_string(),
            if hocr { "1" } else { "0" }.to_string(),
        );
    }
}
