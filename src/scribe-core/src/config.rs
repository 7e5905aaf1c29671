//! TOML configuration with named profiles
//!
//! ```toml
//! [engine]
//! datapath = "/usr/share/tessdata"
//! language = "eng+deu"
//! page_seg_mode = "single_block"
//!
//! [engine.variables]
//! load_system_dawg = "F"
//!
//! [output]
//! formats = ["pdf", "text"]
//! directory = "out"
//!
//! [profiles.receipts.engine]
//! language = "eng"
//! page_seg_mode = "sparse_text"
//! ```

use anyhow::{Context, Result};
use scribe_ocr::{EngineConfig, OutputFormat, RenderFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub output: OutputConfig,

    /// Named overrides selected with `--profile`
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Emit hOCR instead of plain text from `scribe ocr`
    #[serde(default)]
    pub hocr: bool,

    /// Formats written by `scribe documents`
    #[serde(default = "default_formats")]
    pub formats: Vec<RenderFormat>,

    /// Where document outputs go when no basename is given
    pub directory: Option<PathBuf>,
}

/// A profile replaces whole tables of the base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub engine: Option<EngineConfig>,
    pub output: Option<OutputConfig>,
}

fn default_formats() -> Vec<RenderFormat> {
    vec![RenderFormat::Text]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            hocr: false,
            formats: default_formats(),
            directory: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config TOML {:?}", path))
    }

    /// Load `path` if given, otherwise the per-user config file if it exists,
    /// otherwise defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                debug!("using config file {:?}", path);
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn apply_profile(mut self, profile_name: &str) -> Result<Self> {
        let profile = self
            .profiles
            .get(profile_name)
            .with_context(|| format!("Profile '{}' not found", profile_name))?
            .clone();

        if let Some(engine) = profile.engine {
            self.engine = engine;
        }
        if let Some(output) = profile.output {
            self.output = output;
        }

        Ok(self)
    }

    /// Engine settings with the output format applied
    pub fn engine_config(&self) -> EngineConfig {
        let mut engine = self.engine.clone();
        let hocr = self.output.hocr || engine.output == OutputFormat::Hocr;
        if hocr {
            engine.set_hocr(true);
        }
        engine
    }
}

/// `<config dir>/scribe/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scribe").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_ocr::PageSegMode;
    use std::io::Write;

    const SAMPLE: &str = r#"
[engine]
datapath = "/usr/share/tessdata"
language = "eng+deu"

[engine.variables]
load_system_dawg = "F"

[output]
formats = ["pdf", "text"]
directory = "out"

[profiles.receipts.engine]
language = "eng"
page_seg_mode = "sparse_text"

[profiles.markup.output]
hocr = true
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_file() {
        let file = write_config(SAMPLE);
        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.engine.datapath, PathBuf::from("/usr/share/tessdata"));
        assert_eq!(config.engine.language, "eng+deu");
        assert_eq!(config.engine.variables.get("load_system_dawg").map(String::as_str), Some("F"));
        assert_eq!(config.output.formats, vec![RenderFormat::Pdf, RenderFormat::Text]);
        assert_eq!(config.output.directory, Some(PathBuf::from("out")));
        assert_eq!(config.profiles.len(), 2);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = write_config("");
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.output.formats, vec![RenderFormat::Text]);
        assert!(!config.output.hocr);
    }

    #[test]
    fn test_profile_replaces_table() {
        let file = write_config(SAMPLE);
        let config = Config::from_file(file.path()).unwrap().apply_profile("receipts").unwrap();

        assert_eq!(config.engine.language, "eng");
        assert_eq!(config.engine.page_seg_mode, Some(PageSegMode::SparseText));
        // Unset fields come from defaults, not the base table
        assert_eq!(config.engine.datapath, PathBuf::from("./"));
        assert_eq!(config.output.formats, vec![RenderFormat::Pdf, RenderFormat::Text]);
    }

    #[test]
    fn test_unknown_profile() {
        let result = Config::default().apply_profile("nope");
        assert!(result.is_err());
    }

    #[test]
    fn test_hocr_output_sets_engine_variable() {
        let file = write_config(SAMPLE);
        let config = Config::from_file(file.path()).unwrap().apply_profile("markup").unwrap();
        let engine = config.engine_config();

        assert_eq!(engine.output, OutputFormat::Hocr);
        assert_eq!(
            engine.variables.get("tessedit_create_hocr").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_malformed_file() {
        let file = write_config("[engine\nlanguage = ");
        assert!(Config::from_file(file.path()).is_err());
    }
}
