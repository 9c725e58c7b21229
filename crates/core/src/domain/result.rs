// Recognition Result Model

use crate::domain::geometry::{BoundingBox, PageSize};
use serde::{Deserialize, Serialize};

/// Marker the backend puts in front of a stored-file path
pub const STORED_FILE_MARKER: &str = "filepath://";

/// Level of granularity of a recognized region (tesseract levels 1..=5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Page,
    Block,
    Paragraph,
    Line,
    Word,
}

impl Granularity {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Granularity::Page),
            2 => Some(Granularity::Block),
            3 => Some(Granularity::Paragraph),
            4 => Some(Granularity::Line),
            5 => Some(Granularity::Word),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Granularity::Page => 1,
            Granularity::Block => 2,
            Granularity::Paragraph => 3,
            Granularity::Line => 4,
            Granularity::Word => 5,
        }
    }
}

/// One recognized text span, box in native document pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionItem {
    pub granularity: Granularity,
    pub text: String,
    pub bbox: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl RegionItem {
    pub fn new(granularity: Granularity, text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            granularity,
            text: text.into(),
            bbox,
            confidence: None,
        }
    }

    /// Only non-blank words are drawn; coarser levels would nest boxes
    pub fn is_drawable(&self) -> bool {
        self.granularity == Granularity::Word && !self.text.trim().is_empty()
    }
}

/// Region set of one page, with the native size the boxes refer to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRegions {
    pub page_number: u32,
    pub native_size: PageSize,
    pub items: Vec<RegionItem>,
}

/// Per-file recognition result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileResult {
    pub filename: String,
    /// Inline marker, stored-file reference (`filepath://...`), static path or URL
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub text: Option<String>,
    /// `data:image/<ext>;base64,...` for single-image sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_image: Option<String>,
    #[serde(default)]
    pub pages: Vec<PageRegions>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
}

impl FileResult {
    pub fn is_inline_image(&self) -> bool {
        self.inline_image.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Region set for a 1-based page number
    pub fn page(&self, page_number: u32) -> Option<&PageRegions> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    /// Source rewritten to a retrievable path (see [`resolve_stored_reference`])
    pub fn resolved_source(&self, static_prefix: &str) -> String {
        resolve_stored_reference(&self.source, static_prefix)
    }
}

/// Rewrites a leading `filepath://` marker to the static-asset prefix.
///
/// Anything else is returned untouched.
pub fn resolve_stored_reference(source: &str, static_prefix: &str) -> String {
    match source.strip_prefix(STORED_FILE_MARKER) {
        Some(rest) => format!("{}{}", static_prefix, rest),
        None => source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_levels() {
        assert_eq!(Granularity::from_level(5), Some(Granularity::Word));
        assert_eq!(Granularity::from_level(1), Some(Granularity::Page));
        assert_eq!(Granularity::from_level(0), None);
        assert_eq!(Granularity::from_level(6), None);
        assert_eq!(Granularity::Line.level(), 4);
    }

    #[test]
    fn test_only_non_blank_words_are_drawable() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(RegionItem::new(Granularity::Word, "hello", bbox).is_drawable());
        assert!(!RegionItem::new(Granularity::Word, "   ", bbox).is_drawable());
        assert!(!RegionItem::new(Granularity::Line, "hello world", bbox).is_drawable());
    }

    #[test]
    fn test_resolve_stored_reference() {
        assert_eq!(
            resolve_stored_reference("filepath://tmp/a.pdf", "/static/uploads/"),
            "/static/uploads/tmp/a.pdf"
        );
        assert_eq!(
            resolve_stored_reference("/static/uploads/ocr_1_a.pdf", "/static/uploads/"),
            "/static/uploads/ocr_1_a.pdf"
        );
        assert_eq!(
            resolve_stored_reference("https://example.com/filepath://x", "/static/uploads/"),
            "https://example.com/filepath://x"
        );
    }

    #[test]
    fn test_page_lookup_by_number() {
        let result = FileResult {
            pages: vec![
                PageRegions {
                    page_number: 2,
                    native_size: PageSize::new(10, 10),
                    items: vec![],
                },
                PageRegions {
                    page_number: 1,
                    native_size: PageSize::new(20, 20),
                    items: vec![],
                },
            ],
            ..Default::default()
        };
        assert_eq!(result.page(1).unwrap().native_size, PageSize::new(20, 20));
        assert!(result.page(3).is_none());
    }
}
