//! Geometry Mapper
//!
//! Maps recognition-space boxes (native document pixels) onto the rendered
//! surface. Pure functions, no state.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Pixel dimensions of a page (native or rendered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero dimension cannot be used as a scale denominator
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Per-axis scale factor from native space to render space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Scale for drawing `native`-space boxes onto a `rendered` surface.
    ///
    /// Returns `None` for degenerate native dimensions; this is the
    /// division-by-zero guard callers must go through before mapping.
    pub fn between(native: PageSize, rendered: PageSize) -> Option<Self> {
        if native.is_degenerate() {
            return None;
        }
        Some(Self {
            x: rendered.width as f64 / native.width as f64,
            y: rendered.height as f64 / native.height as f64,
        })
    }

    pub fn map(&self, bbox: BoundingBox) -> BoundingBox {
        map_box(bbox, self.x, self.y)
    }
}

/// `{left*sx, top*sy, width*sx, height*sy}`
pub fn map_box(bbox: BoundingBox, scale_x: f64, scale_y: f64) -> BoundingBox {
    BoundingBox {
        left: bbox.left * scale_x,
        top: bbox.top * scale_y,
        width: bbox.width * scale_x,
        height: bbox.height * scale_y,
    }
}
