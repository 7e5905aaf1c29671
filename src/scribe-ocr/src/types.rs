//! Engine enumerations and geometry shared across the crate.
//!
//! Discriminants match the values the native C API expects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OCR engine mode (`OcrEngineMode` in the C API)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    TesseractOnly = 0,
    LstmOnly = 1,
    Combined = 2,
    #[default]
    Default = 3,
}

/// Page segmentation mode (`PageSegMode` in the C API)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    OsdOnly = 0,
    AutoOsd = 1,
    AutoOnly = 2,
    Auto = 3,
    SingleColumn = 4,
    SingleBlockVertText = 5,
    SingleBlock = 6,
    SingleLine = 7,
    SingleWord = 8,
    CircleWord = 9,
    SingleChar = 10,
    SparseText = 11,
    SparseTextOsd = 12,
    RawLine = 13,
}

impl PageSegMode {
    const ALL: [PageSegMode; 14] = [
        PageSegMode::OsdOnly,
        PageSegMode::AutoOsd,
        PageSegMode::AutoOnly,
        PageSegMode::Auto,
        PageSegMode::SingleColumn,
        PageSegMode::SingleBlockVertText,
        PageSegMode::SingleBlock,
        PageSegMode::SingleLine,
        PageSegMode::SingleWord,
        PageSegMode::CircleWord,
        PageSegMode::SingleChar,
        PageSegMode::SparseText,
        PageSegMode::SparseTextOsd,
        PageSegMode::RawLine,
    ];

    /// Look up a mode by its native number (`--psm N` on the tesseract CLI)
    pub fn from_number(n: u32) -> Option<Self> {
        Self::ALL.get(n as usize).copied()
    }
}

/// Structural level of a recognized element (`PageIteratorLevel`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageIteratorLevel {
    Block = 0,
    Paragraph = 1,
    Line = 2,
    Word = 3,
    Symbol = 4,
}

impl FromStr for PageIteratorLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "paragraph" | "para" => Ok(Self::Paragraph),
            "line" | "textline" => Ok(Self::Line),
            "word" => Ok(Self::Word),
            "symbol" | "char" => Ok(Self::Symbol),
            other => Err(format!("unknown iterator level '{}'", other)),
        }
    }
}

/// Text retrieved directly from a recognized page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Hocr,
}

/// Output written by a document renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderFormat {
    Text,
    Hocr,
    Pdf,
    Box,
    Unlv,
}

impl RenderFormat {
    /// Extension the native renderer appends to the output basename
    pub fn extension(&self) -> &'static str {
        match self {
            RenderFormat::Text => "txt",
            RenderFormat::Hocr => "hocr",
            RenderFormat::Pdf => "pdf",
            RenderFormat::Box => "box",
            RenderFormat::Unlv => "unlv",
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderFormat::Text => "text",
            RenderFormat::Hocr => "hocr",
            RenderFormat::Pdf => "pdf",
            RenderFormat::Box => "box",
            RenderFormat::Unlv => "unlv",
        };
        f.write_str(name)
    }
}

impl FromStr for RenderFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "hocr" => Ok(Self::Hocr),
            "pdf" => Ok(Self::Pdf),
            "box" => Ok(Self::Box),
            "unlv" => Ok(Self::Unlv),
            other => Err(format!("unknown render format '{}'", other)),
        }
    }
}

/// Axis-aligned rectangle in raster pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Rectangle from its top-left corner and size
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from native left/top/right/bottom, clamping inverted edges to zero size
    pub fn from_corners(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: right.saturating_sub(left).max(0),
            height: bottom.saturating_sub(top).max(0),
        }
    }

    /// A rectangle without area selects the whole image
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl FromStr for Rect {
    type Err = String;

    /// Parses `x,y,width,height`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid rectangle '{}': {}", s, e))?;

        match parts.as_slice() {
            [x, y, w, h] => Ok(Rect::new(*x, *y, *w, *h)),
            _ => Err(format!("expected x,y,width,height, got '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_discriminants() {
        assert_eq!(EngineMode::Default as i32, 3);
        assert_eq!(PageSegMode::SingleLine as i32, 7);
        assert_eq!(PageSegMode::RawLine as i32, 13);
        assert_eq!(PageIteratorLevel::Word as i32, 3);
    }

    #[test]
    fn test_psm_from_number() {
        assert_eq!(PageSegMode::from_number(6), Some(PageSegMode::SingleBlock));
        assert_eq!(PageSegMode::from_number(14), None);
        for n in 0..14 {
            assert_eq!(PageSegMode::from_number(n).map(|m| m as u32), Some(n));
        }
    }

    #[test]
    fn test_zero_area_rect_is_empty() {
        assert!(Rect::new(10, 10, 0, 50).is_empty());
        assert!(Rect::new(10, 10, 50, 0).is_empty());
        assert!(Rect::default().is_empty());
        assert!(!Rect::new(0, 0, 1024, 800).is_empty());
    }

    #[test]
    fn test_from_corners() {
        assert_eq!(Rect::from_corners(36, 92, 136, 120), Rect::new(36, 92, 100, 28));
        assert_eq!(Rect::from_corners(50, 50, 40, 40), Rect::new(50, 50, 0, 0));
    }

    #[test]
    fn test_parse_rect() {
        assert_eq!("0,0,1024,800".parse::<Rect>(), Ok(Rect::new(0, 0, 1024, 800)));
        assert!("1,2,3".parse::<Rect>().is_err());
        assert!("a,b,c,d".parse::<Rect>().is_err());
    }

    #[test]
    fn test_parse_render_format() {
        assert_eq!("PDF".parse::<RenderFormat>(), Ok(RenderFormat::Pdf));
        assert_eq!("txt".parse::<RenderFormat>(), Ok(RenderFormat::Text));
        assert!("docx".parse::<RenderFormat>().is_err());
        assert_eq!(RenderFormat::Hocr.extension(), "hocr");
    }

    #[test]
    fn test_serde_names() {
        let mode: PageSegMode = serde_json::from_str("\"single_block\"").unwrap();
        assert_eq!(mode, PageSegMode::SingleBlock);
        let level: PageIteratorLevel = serde_json::from_str("\"word\"").unwrap();
        assert_eq!(level, PageIteratorLevel::Word);
    }
}
