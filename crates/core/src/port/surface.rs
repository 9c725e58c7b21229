// Overlay Surface Port (Interface)
// The display target pages and region boxes are drawn onto

use crate::domain::{BoundingBox, PageSize};
use crate::port::page_renderer::Raster;

/// Box styling: outlined rectangle plus a faint fill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    pub stroke_rgba: [u8; 4],
    pub fill_rgba: [u8; 4],
    pub line_width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_rgba: [255, 0, 0, 255],
            fill_rgba: [255, 0, 0, 26], // ~10% opacity
            line_width: 2,
        }
    }
}

/// Drawing target
///
/// `size()` is the current render size and may differ from the raster
/// size (zoom, device pixel ratio); boxes are mapped against it.
pub trait OverlaySurface: Send {
    /// Drop the current page and every overlay
    fn clear(&mut self);

    /// Paint a page raster, resizing the surface as needed
    fn draw_raster(&mut self, raster: &Raster);

    /// Current render size in surface pixels
    fn size(&self) -> PageSize;

    /// Outline + faint fill at render-space coordinates
    fn draw_box(&mut self, bbox: BoundingBox, style: &OverlayStyle);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum SurfaceOp {
        Clear,
        Raster(PageSize),
        Box(BoundingBox),
    }

    /// Surface recording every call; `zoom` scales the raster size to emulate
    /// a display that is larger or smaller than the decoded page
    #[derive(Debug)]
    pub struct RecordingSurface {
        pub ops: Vec<SurfaceOp>,
        zoom: f64,
        size: PageSize,
    }

    impl RecordingSurface {
        pub fn new() -> Self {
            Self::with_zoom(1.0)
        }

        pub fn with_zoom(zoom: f64) -> Self {
            Self {
                ops: Vec::new(),
                zoom,
                size: PageSize::new(0, 0),
            }
        }

        pub fn boxes(&self) -> Vec<BoundingBox> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    SurfaceOp::Box(b) => Some(*b),
                    _ => None,
                })
                .collect()
        }
    }

    impl Default for RecordingSurface {
        fn default() -> Self {
            Self::new()
        }
    }

    impl OverlaySurface for RecordingSurface {
        fn clear(&mut self) {
            self.ops.push(SurfaceOp::Clear);
        }

        fn draw_raster(&mut self, raster: &Raster) {
            self.size = PageSize::new(
                (raster.width as f64 * self.zoom).round() as u32,
                (raster.height as f64 * self.zoom).round() as u32,
            );
            self.ops.push(SurfaceOp::Raster(raster.size()));
        }

        fn size(&self) -> PageSize {
            self.size
        }

        fn draw_box(&mut self, bbox: BoundingBox, _style: &OverlayStyle) {
            self.ops.push(SurfaceOp::Box(bbox));
        }
    }
}
