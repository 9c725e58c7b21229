// PDF rasterization through poppler-utils subprocesses
// pdfinfo for the page count, pdftoppm for one page at a time (PNG on stdout)

use crate::config::RenderConfig;
use crate::raster::decode_image;
use ocrdeck_core::port::{Raster, RenderError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

pub struct PdfRasterizer {
    pdftoppm_bin: PathBuf,
    pdfinfo_bin: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl PdfRasterizer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            pdftoppm_bin: config.pdftoppm_bin.clone(),
            pdfinfo_bin: config.pdfinfo_bin.clone(),
            dpi: config.pdf_dpi,
            timeout: config.subprocess_timeout,
        }
    }

    pub async fn page_count(&self, pdf: &Path) -> Result<u32, RenderError> {
        let output = self
            .run(&self.pdfinfo_bin, vec![pdf.as_os_str().to_owned()])
            .await?;
        parse_page_count(&String::from_utf8_lossy(&output.stdout))
    }

    /// Rasterize one 1-based page
    pub async fn render(&self, pdf: &Path, page_number: u32) -> Result<Raster, RenderError> {
        let page = page_number.to_string();
        let args: Vec<OsString> = vec![
            "-png".into(),
            "-r".into(),
            self.dpi.to_string().into(),
            "-f".into(),
            page.clone().into(),
            "-l".into(),
            page.into(),
            "-singlefile".into(),
            pdf.as_os_str().to_owned(),
        ];

        let started = std::time::Instant::now();
        let output = self.run(&self.pdftoppm_bin, args).await?;
        if output.stdout.is_empty() {
            return Err(RenderError::Subprocess(format!(
                "pdftoppm produced no output for page {}",
                page_number
            )));
        }
        let raster = decode_image(&output.stdout)?;

        info!(
            pdf = %pdf.display(),
            page_number,
            width = raster.width,
            height = raster.height,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "PDF page rasterized"
        );
        Ok(raster)
    }

    /// Spawn `program` and wait for its output, bounded by the timeout
    async fn run(&self, program: &Path, args: Vec<OsString>) -> Result<Output, RenderError> {
        debug!(program = %program.display(), args = ?args, "Spawning renderer process");

        let child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Subprocess(format!("{}: {}", program.display(), e)))?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(RenderError::Subprocess(e.to_string())),
            Err(_) => return Err(RenderError::Timeout(self.timeout.as_millis() as u64)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Subprocess(format!(
                "{} exited with {:?}: {}",
                program.display(),
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(output)
    }
}

/// `Pages:` line of `pdfinfo` output
pub fn parse_page_count(pdfinfo: &str) -> Result<u32, RenderError> {
    pdfinfo
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|count| *count > 0)
        .ok_or_else(|| RenderError::Decode("pdfinfo reported no page count".to_string()))
}
