// In-memory overlay surface on an RGBA image

use crate::raster::to_rgba;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use ocrdeck_core::domain::{BoundingBox, PageSize};
use ocrdeck_core::port::{OverlayStyle, OverlaySurface, Raster, RenderError};
use std::path::Path;
use tracing::warn;

/// Canvas that pages are painted on and boxes are drawn over.
///
/// `zoom` resizes every painted raster, so the render size differs from the
/// decoded page size the same way a scaled display would.
pub struct RasterCanvas {
    image: RgbaImage,
    zoom: f64,
}

impl RasterCanvas {
    pub fn new() -> Self {
        Self::with_zoom(1.0)
    }

    pub fn with_zoom(zoom: f64) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        Self {
            image: RgbaImage::new(0, 0),
            zoom,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        if self.is_empty() {
            return Err(RenderError::Unsupported("nothing rendered".to_string()));
        }
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| RenderError::Decode(e.to_string()))
    }

    fn blend(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let alpha = rgba[3] as f64 / 255.0;
        let pixel = self.image.get_pixel_mut(x, y);
        for channel in 0..3 {
            let over = rgba[channel] as f64 * alpha + pixel.0[channel] as f64 * (1.0 - alpha);
            pixel.0[channel] = over.round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Pixel span covered by `[start, start+len)`, clamped to `[0, limit)`
    fn span(start: f64, len: f64, limit: u32) -> Option<(u32, u32)> {
        if !start.is_finite() || !len.is_finite() || len <= 0.0 {
            return None;
        }
        let from = start.floor().max(0.0);
        let to = (start + len).ceil().min(limit as f64);
        if from >= to {
            return None;
        }
        Some((from as u32, to as u32))
    }
}

impl Default for RasterCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlaySurface for RasterCanvas {
    fn clear(&mut self) {
        self.image = RgbaImage::new(0, 0);
    }

    fn draw_raster(&mut self, raster: &Raster) {
        let page = match to_rgba(raster) {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Painting blank page instead of malformed raster");
                RgbaImage::from_pixel(raster.width, raster.height, Rgba([255, 255, 255, 255]))
            }
        };

        if (self.zoom - 1.0).abs() < f64::EPSILON {
            self.image = page;
            return;
        }
        let width = ((page.width() as f64) * self.zoom).round().max(1.0) as u32;
        let height = ((page.height() as f64) * self.zoom).round().max(1.0) as u32;
        self.image = imageops::resize(&page, width, height, FilterType::Triangle);
    }

    fn size(&self) -> PageSize {
        PageSize::new(self.image.width(), self.image.height())
    }

    fn draw_box(&mut self, bbox: BoundingBox, style: &OverlayStyle) {
        let (Some((x0, x1)), Some((y0, y1))) = (
            Self::span(bbox.left, bbox.width, self.image.width()),
            Self::span(bbox.top, bbox.height, self.image.height()),
        ) else {
            return;
        };

        let line = style.line_width.max(1);
        for y in y0..y1 {
            for x in x0..x1 {
                let on_edge =
                    x < x0 + line || x + line >= x1 || y < y0 + line || y + line >= y1;
                let rgba = if on_edge {
                    style.stroke_rgba
                } else {
                    style.fill_rgba
                };
                self.blend(x, y, rgba);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(width: u32, height: u32) -> Raster {
        Raster::blank(width, height)
    }

    #[test]
    fn test_zoom_changes_render_size() {
        let mut canvas = RasterCanvas::with_zoom(2.0);
        canvas.draw_raster(&white(50, 40));
        assert_eq!(canvas.size(), PageSize::new(100, 80));

        canvas.clear();
        assert!(canvas.is_empty());
    }

    #[test]
    fn test_box_outline_and_fill() {
        let mut canvas = RasterCanvas::new();
        canvas.draw_raster(&white(40, 40));
        canvas.draw_box(
            BoundingBox::new(10.0, 10.0, 20.0, 20.0),
            &OverlayStyle::default(),
        );

        // outline is opaque red
        assert_eq!(canvas.image().get_pixel(10, 15).0, [255, 0, 0, 255]);
        // interior is a faint red tint
        let inside = canvas.image().get_pixel(20, 20).0;
        assert_eq!(inside[0], 255);
        assert!(inside[1] > 200 && inside[1] < 255);
        // outside untouched
        assert_eq!(canvas.image().get_pixel(5, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_box_is_clipped_to_canvas() {
        let mut canvas = RasterCanvas::new();
        canvas.draw_raster(&white(10, 10));
        canvas.draw_box(
            BoundingBox::new(-5.0, 8.0, 100.0, 100.0),
            &OverlayStyle::default(),
        );
        canvas.draw_box(
            BoundingBox::new(50.0, 50.0, 10.0, 10.0),
            &OverlayStyle::default(),
        );
        canvas.draw_box(
            BoundingBox::new(1.0, 1.0, 0.0, f64::NAN),
            &OverlayStyle::default(),
        );
        assert_eq!(canvas.image().get_pixel(0, 9).0, [255, 0, 0, 255]);
        assert_eq!(canvas.image().get_pixel(1, 1).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_malformed_raster_paints_blank() {
        let mut canvas = RasterCanvas::new();
        canvas.draw_raster(&Raster {
            width: 4,
            height: 4,
            rgba: vec![0; 3],
        });
        assert_eq!(canvas.size(), PageSize::new(4, 4));
    }

    #[test]
    fn test_save_png() {
        let mut canvas = RasterCanvas::new();
        let path = std::env::temp_dir().join(format!(
            "ocrdeck-canvas-{}.png",
            uuid::Uuid::new_v4().simple()
        ));
        assert!(canvas.save_png(&path).is_err());

        canvas.draw_raster(&white(6, 6));
        canvas.save_png(&path).unwrap();
        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.width(), 6);
        std::fs::remove_file(path).unwrap();
    }
}
