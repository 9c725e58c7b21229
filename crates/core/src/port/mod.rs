// Port Layer - Interfaces for external collaborators

pub mod id_provider; // For deterministic testing
pub mod page_renderer;
pub mod recognition_backend;
pub mod surface;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use page_renderer::{DocumentRef, PageRenderer, Raster, RenderError, RenderedPage};
pub use recognition_backend::{
    BackendError, BatchAccepted, BatchItem, BatchSubmission, JobSnapshot, RecognitionBackend,
    SyncRecognition, SyncRequest,
};
pub use surface::{OverlayStyle, OverlaySurface};
pub use time_provider::TimeProvider;
