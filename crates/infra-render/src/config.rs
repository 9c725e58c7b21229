// Render adapter configuration

use std::path::PathBuf;
use std::time::Duration;

/// 1.5x the 72 dpi PDF user space
pub const DEFAULT_PDF_DPI: u32 = 108;

pub const DEFAULT_SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// `pdftoppm` binary (poppler-utils)
    pub pdftoppm_bin: PathBuf,
    /// `pdfinfo` binary (poppler-utils)
    pub pdfinfo_bin: PathBuf,
    pub pdf_dpi: u32,
    pub subprocess_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Where fetched and inline PDFs are staged for the subprocesses
    pub staging_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pdftoppm_bin: PathBuf::from("pdftoppm"),
            pdfinfo_bin: PathBuf::from("pdfinfo"),
            pdf_dpi: DEFAULT_PDF_DPI,
            subprocess_timeout: DEFAULT_SUBPROCESS_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            staging_dir: std::env::temp_dir().join("ocrdeck"),
        }
    }
}

impl RenderConfig {
    pub fn with_pdf_dpi(mut self, dpi: u32) -> Self {
        self.pdf_dpi = dpi.max(1);
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }
}
