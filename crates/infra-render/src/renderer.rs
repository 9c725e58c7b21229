// Page Renderer implementation
// PDFs go through poppler, everything else is a single-page image

use crate::config::RenderConfig;
use crate::pdf::PdfRasterizer;
use crate::raster::decode_image;
use crate::source::DocumentLoader;
use async_trait::async_trait;
use ocrdeck_core::port::{DocumentRef, PageRenderer, RenderError, RenderedPage};

pub struct DocumentRenderer {
    loader: DocumentLoader,
    pdf: PdfRasterizer,
}

impl DocumentRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        Ok(Self::from_parts(
            DocumentLoader::new(config)?,
            PdfRasterizer::new(config),
        ))
    }

    pub fn from_parts(loader: DocumentLoader, pdf: PdfRasterizer) -> Self {
        Self { loader, pdf }
    }
}

#[async_trait]
impl PageRenderer for DocumentRenderer {
    async fn page_count(&self, document: &DocumentRef) -> Result<u32, RenderError> {
        if !document.is_pdf() {
            return Ok(1);
        }
        let path = self.loader.local_path(document).await?;
        self.pdf.page_count(&path).await
    }

    async fn render_page(
        &self,
        document: &DocumentRef,
        page_number: u32,
    ) -> Result<RenderedPage, RenderError> {
        if document.is_pdf() {
            let path = self.loader.local_path(document).await?;
            let page_count = self.pdf.page_count(&path).await?;
            if page_number == 0 || page_number > page_count {
                return Err(RenderError::PageOutOfRange {
                    page: page_number,
                    count: page_count,
                });
            }
            let raster = self.pdf.render(&path, page_number).await?;
            return Ok(RenderedPage {
                page_number,
                page_count,
                raster,
            });
        }

        if page_number != 1 {
            return Err(RenderError::PageOutOfRange {
                page: page_number,
                count: 1,
            });
        }
        let bytes = self.loader.load(document).await?;
        Ok(RenderedPage {
            page_number,
            page_count: 1,
            raster: decode_image(&bytes)?,
        })
    }
}
