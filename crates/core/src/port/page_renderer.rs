// Page Renderer Port (Interface)
// Decodes a document page into a raster surface

use crate::domain::PageSize;
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Where a displayable document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentRef {
    /// `data:image/<ext>;base64,...`
    InlineImage { data_url: String },
    /// Absolute URL (stored-file references are resolved before this point)
    Remote { url: String },
    /// File on the local disk
    Local { path: PathBuf },
}

impl DocumentRef {
    /// Best-effort MIME type of the document
    pub fn mime(&self) -> Option<String> {
        match self {
            DocumentRef::InlineImage { data_url } => data_url
                .strip_prefix("data:")
                .and_then(|rest| rest.split(';').next())
                .map(str::to_string),
            DocumentRef::Remote { url } => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                mime_guess::from_path(path).first().map(|m| m.to_string())
            }
            DocumentRef::Local { path } => mime_guess::from_path(path).first().map(|m| m.to_string()),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime().as_deref() == Some("application/pdf")
    }
}

/// Decoded RGBA pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Raster {
    /// Opaque white raster
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![255; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn size(&self) -> PageSize {
        PageSize::new(self.width, self.height)
    }
}

/// One rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// 1-based page number
    pub page_number: u32,
    pub page_count: u32,
    pub raster: Raster,
}

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Unsupported document: {0}")]
    Unsupported(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Renderer process failed: {0}")]
    Subprocess(String),

    #[error("Renderer timeout after {0}ms")]
    Timeout(u64),

    #[error("Page {page} out of range (document has {count})")]
    PageOutOfRange { page: u32, count: u32 },
}

/// Page Renderer trait
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Number of pages of the document
    async fn page_count(&self, document: &DocumentRef) -> Result<u32, RenderError>;

    /// Render a 1-based page
    async fn render_page(
        &self,
        document: &DocumentRef,
        page_number: u32,
    ) -> Result<RenderedPage, RenderError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Renderer producing blank rasters of scripted sizes
    pub struct ScriptedRenderer {
        page_sizes: Vec<PageSize>,
        failure: Option<RenderError>,
        broken_pages: Vec<u32>,
        renders: Mutex<Vec<u32>>,
    }

    impl ScriptedRenderer {
        /// One entry per page
        pub fn new(page_sizes: Vec<PageSize>) -> Self {
            Self {
                page_sizes,
                failure: None,
                broken_pages: Vec::new(),
                renders: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: RenderError) -> Self {
            Self {
                page_sizes: Vec::new(),
                failure: Some(error),
                broken_pages: Vec::new(),
                renders: Mutex::new(Vec::new()),
            }
        }

        /// Rendering this page fails with a decode error
        pub fn with_broken_page(mut self, page_number: u32) -> Self {
            self.broken_pages.push(page_number);
            self
        }

        /// Page numbers rendered so far, in call order
        pub fn rendered_pages(&self) -> Vec<u32> {
            self.renders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageRenderer for ScriptedRenderer {
        async fn page_count(&self, _document: &DocumentRef) -> Result<u32, RenderError> {
            match &self.failure {
                Some(err) => Err(err.clone()),
                None => Ok(self.page_sizes.len() as u32),
            }
        }

        async fn render_page(
            &self,
            _document: &DocumentRef,
            page_number: u32,
        ) -> Result<RenderedPage, RenderError> {
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            if self.broken_pages.contains(&page_number) {
                return Err(RenderError::Decode(format!("page {}", page_number)));
            }
            let count = self.page_sizes.len() as u32;
            let size = page_number
                .checked_sub(1)
                .and_then(|idx| self.page_sizes.get(idx as usize))
                .ok_or(RenderError::PageOutOfRange {
                    page: page_number,
                    count,
                })?;
            self.renders.lock().unwrap().push(page_number);
            Ok(RenderedPage {
                page_number,
                page_count: count,
                raster: Raster::blank(size.width, size.height),
            })
        }
    }
}
