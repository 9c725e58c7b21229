// Visual result view: rendered page plus word boxes

use crate::application::config::TrackerConfig;
use crate::domain::{FileResult, Job, JobId, Scale};
use crate::port::{DocumentRef, OverlayStyle, OverlaySurface, PageRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a render attempt produced
#[derive(Debug, Clone, PartialEq)]
pub enum PresentOutcome {
    /// Page and word boxes drawn
    Drawn { page: u32, page_count: u32, boxes: usize },
    /// Page drawn, overlay skipped
    NoOverlay {
        page: u32,
        page_count: u32,
        reason: String,
    },
    /// Document could not be rendered; the text view is all there is
    Fallback { reason: String },
    /// Job has no result to show yet
    Nothing,
}

/// Document reference of a result.
///
/// Inline images win; otherwise the source is resolved (`filepath://` to the
/// static prefix) and turned into a URL when a base URL is configured.
pub fn document_for(
    result: &FileResult,
    static_prefix: &str,
    asset_base_url: Option<&str>,
) -> Option<DocumentRef> {
    if let Some(data_url) = &result.inline_image {
        return Some(DocumentRef::InlineImage {
            data_url: data_url.clone(),
        });
    }

    let source = result.resolved_source(static_prefix);
    if source.is_empty() {
        return None;
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        return Some(DocumentRef::Remote { url: source });
    }
    match asset_base_url {
        Some(base) if source.starts_with('/') => Some(DocumentRef::Remote {
            url: format!("{}{}", base.trim_end_matches('/'), source),
        }),
        _ => Some(DocumentRef::Local {
            path: PathBuf::from(source),
        }),
    }
}

struct PageView {
    job_id: JobId,
    document: DocumentRef,
    result: FileResult,
    page: u32,
    page_count: u32,
}

/// Result Presenter
pub struct ResultPresenter {
    renderer: Arc<dyn PageRenderer>,
    style: OverlayStyle,
    static_prefix: String,
    asset_base_url: Option<String>,
    view: Option<PageView>,
}

impl ResultPresenter {
    pub fn new(renderer: Arc<dyn PageRenderer>, config: &TrackerConfig) -> Self {
        Self {
            renderer,
            style: config.overlay_style,
            static_prefix: config.static_prefix.clone(),
            asset_base_url: config.asset_base_url.clone(),
            view: None,
        }
    }

    /// Job currently on display
    pub fn showing(&self) -> Option<&JobId> {
        self.view.as_ref().map(|v| &v.job_id)
    }

    /// `(page, page_count)` of the current view
    pub fn current_page(&self) -> Option<(u32, u32)> {
        self.view.as_ref().map(|v| (v.page, v.page_count))
    }

    /// Show the first page of a job's representative (first) result
    pub async fn show(&mut self, job: &Job, surface: &mut dyn OverlaySurface) -> PresentOutcome {
        self.view = None;
        surface.clear();

        let Some(result) = job.results.first() else {
            return PresentOutcome::Nothing;
        };
        let Some(document) =
            document_for(result, &self.static_prefix, self.asset_base_url.as_deref())
        else {
            debug!(job_id = %job.id, "Result has no displayable source");
            return PresentOutcome::Fallback {
                reason: "no displayable source".to_string(),
            };
        };

        let page_count = if document.is_pdf() {
            match self.renderer.page_count(&document).await {
                Ok(count) if count > 0 => count,
                Ok(_) => {
                    warn!(job_id = %job.id, "Document has no pages");
                    return PresentOutcome::Fallback {
                        reason: "document has no pages".to_string(),
                    };
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "Failed to open document");
                    return PresentOutcome::Fallback {
                        reason: e.to_string(),
                    };
                }
            }
        } else {
            1
        };

        self.view = Some(PageView {
            job_id: job.id.clone(),
            document,
            result: result.clone(),
            page: 1,
            page_count,
        });
        self.render_current(surface).await
    }

    /// Advance one page; None at the last page or without a view
    pub async fn next_page(&mut self, surface: &mut dyn OverlaySurface) -> Option<PresentOutcome> {
        let (page, page_count) = self.current_page()?;
        if page >= page_count {
            return None;
        }
        self.go_to_page(page + 1, surface).await
    }

    /// Go back one page; None at the first page or without a view
    pub async fn previous_page(
        &mut self,
        surface: &mut dyn OverlaySurface,
    ) -> Option<PresentOutcome> {
        let (page, _) = self.current_page()?;
        if page <= 1 {
            return None;
        }
        self.go_to_page(page - 1, surface).await
    }

    /// Render a 1-based page; None when out of range or without a view.
    ///
    /// A page that falls back leaves the current page where it was.
    pub async fn go_to_page(
        &mut self,
        page: u32,
        surface: &mut dyn OverlaySurface,
    ) -> Option<PresentOutcome> {
        let view = self.view.as_mut()?;
        if page == 0 || page > view.page_count {
            return None;
        }
        let previous = std::mem::replace(&mut view.page, page);

        let outcome = self.render_current(surface).await;
        if matches!(outcome, PresentOutcome::Fallback { .. }) {
            if let Some(view) = self.view.as_mut() {
                view.page = previous;
            }
        }
        Some(outcome)
    }

    async fn render_current(&mut self, surface: &mut dyn OverlaySurface) -> PresentOutcome {
        let Some(view) = self.view.as_ref() else {
            return PresentOutcome::Nothing;
        };
        let (page, page_count) = (view.page, view.page_count);

        surface.clear();
        let rendered = match self.renderer.render_page(&view.document, page).await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(job_id = %view.job_id, page, error = %e, "Page rendering failed");
                return PresentOutcome::Fallback {
                    reason: e.to_string(),
                };
            }
        };
        surface.draw_raster(&rendered.raster);

        let Some(regions) = view.result.page(page) else {
            debug!(job_id = %view.job_id, page, "No region data for page");
            return PresentOutcome::NoOverlay {
                page,
                page_count,
                reason: "no region data for page".to_string(),
            };
        };

        let Some(scale) = Scale::between(regions.native_size, surface.size()) else {
            warn!(
                job_id = %view.job_id,
                page,
                width = regions.native_size.width,
                height = regions.native_size.height,
                "Degenerate native page size, overlay skipped"
            );
            return PresentOutcome::NoOverlay {
                page,
                page_count,
                reason: "degenerate native page size".to_string(),
            };
        };

        let mut boxes = 0;
        for item in regions.items.iter().filter(|item| item.is_drawable()) {
            surface.draw_box(scale.map(item.bbox), &self.style);
            boxes += 1;
        }

        PresentOutcome::Drawn {
            page,
            page_count,
            boxes,
        }
    }
}
