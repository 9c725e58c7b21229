// ocrdeck Infrastructure - Page rendering and overlay canvas
// PageRenderer via the image crate and poppler-utils subprocesses,
// OverlaySurface on an in-memory RGBA canvas

pub mod canvas;
pub mod config;
pub mod pdf;
pub mod raster;
pub mod renderer;
pub mod source;

pub use canvas::RasterCanvas;
pub use config::RenderConfig;
pub use pdf::PdfRasterizer;
pub use renderer::DocumentRenderer;
pub use source::DocumentLoader;
