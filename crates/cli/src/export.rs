// Overlay export: every page of a job's first result as PNG

use anyhow::{Context, Result};
use ocrdeck_core::application::{PresentOutcome, ResultPresenter};
use ocrdeck_core::domain::Job;
use ocrdeck_infra_render::RasterCanvas;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// `<short job id>-p<page>.png`
pub fn page_file_name(job: &Job, page: u32) -> String {
    format!("{}-p{}.png", job.id.short(), page)
}

/// Render each page with its word boxes into `out_dir`.
///
/// Pages whose rendering fails are skipped; pages without region data are
/// written without boxes.
pub async fn export_overlays(
    presenter: &mut ResultPresenter,
    canvas: &mut RasterCanvas,
    job: &Job,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::new();
    let first = presenter.show(job, canvas).await;
    let Some((_, page_count)) = presenter.current_page() else {
        if let PresentOutcome::Fallback { reason } = first {
            warn!(job_id = %job.id, reason = %reason, "Nothing to export");
        }
        return Ok(written);
    };

    let mut outcome = Some(first);
    let mut page = 1;
    loop {
        match outcome {
            Some(PresentOutcome::Drawn { page, .. })
            | Some(PresentOutcome::NoOverlay { page, .. }) => {
                let path = out_dir.join(page_file_name(job, page));
                canvas
                    .save_png(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(job_id = %job.id, page, path = %path.display(), "Overlay exported");
                written.push(path);
            }
            Some(PresentOutcome::Fallback { reason }) => {
                warn!(job_id = %job.id, page, reason = %reason, "Page not exported");
            }
            Some(PresentOutcome::Nothing) | None => {}
        }
        if page >= page_count {
            break;
        }
        page += 1;
        outcome = presenter.go_to_page(page, canvas).await;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocrdeck_core::application::TrackerConfig;
    use ocrdeck_core::domain::{
        BoundingBox, FileResult, Granularity, JobId, JobStatus, JobUpdate, PageRegions, PageSize,
        RegionItem, SubmittedFile,
    };
    use ocrdeck_core::port::page_renderer::mocks::ScriptedRenderer;
    use std::sync::Arc;

    fn job_with_pages(pages: u32) -> Job {
        let mut job = Job::new(
            JobId::remote("abcdef0123"),
            vec![SubmittedFile::new("doc.pdf", "en")],
            JobStatus::Pending,
            0,
        )
        .unwrap();
        let result = FileResult {
            filename: "doc.pdf".into(),
            source: "/data/doc.pdf".into(),
            pages: (1..=pages)
                .map(|page_number| PageRegions {
                    page_number,
                    native_size: PageSize::new(100, 100),
                    items: vec![RegionItem::new(
                        Granularity::Word,
                        "word",
                        BoundingBox::new(10.0, 10.0, 20.0, 20.0),
                    )],
                })
                .collect(),
            ..Default::default()
        };
        job.apply(
            JobUpdate::status(JobStatus::Completed).with_results(vec![result]),
            10,
        );
        job
    }

    #[tokio::test]
    async fn test_export_writes_every_page() {
        let renderer = Arc::new(ScriptedRenderer::new(vec![
            PageSize::new(50, 50),
            PageSize::new(50, 50),
        ]));
        let mut presenter = ResultPresenter::new(renderer, &TrackerConfig::default());
        let mut canvas = RasterCanvas::new();
        let dir = std::env::temp_dir().join(format!("ocrdeck-export-{}", std::process::id()));

        let job = job_with_pages(2);
        let written = export_overlays(&mut presenter, &mut canvas, &job, &dir)
            .await
            .unwrap();

        assert_eq!(
            written,
            vec![dir.join("abcdef01-p1.png"), dir.join("abcdef01-p2.png")]
        );
        assert!(written.iter().all(|p| p.exists()));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_export_skips_broken_page() {
        let renderer = Arc::new(
            ScriptedRenderer::new(vec![PageSize::new(50, 50); 3]).with_broken_page(2),
        );
        let mut presenter = ResultPresenter::new(renderer, &TrackerConfig::default());
        let mut canvas = RasterCanvas::new();
        let dir = std::env::temp_dir().join(format!("ocrdeck-broken-{}", std::process::id()));

        let job = job_with_pages(3);
        let written = export_overlays(&mut presenter, &mut canvas, &job, &dir)
            .await
            .unwrap();

        assert_eq!(
            written,
            vec![dir.join("abcdef01-p1.png"), dir.join("abcdef01-p3.png")]
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_export_without_results_writes_nothing() {
        let renderer = Arc::new(ScriptedRenderer::new(vec![PageSize::new(10, 10)]));
        let mut presenter = ResultPresenter::new(renderer, &TrackerConfig::default());
        let mut canvas = RasterCanvas::new();
        let dir = std::env::temp_dir().join(format!("ocrdeck-empty-{}", std::process::id()));

        let job = Job::new(
            JobId::remote("nothing"),
            vec![SubmittedFile::new("a.png", "en")],
            JobStatus::Pending,
            0,
        )
        .unwrap();
        let written = export_overlays(&mut presenter, &mut canvas, &job, &dir)
            .await
            .unwrap();
        assert!(written.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
