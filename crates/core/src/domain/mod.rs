// Domain Layer - Pure business logic and entities

pub mod error;
pub mod geometry;
pub mod job;
pub mod result;
pub mod timing;

// Re-exports
pub use error::DomainError;
pub use geometry::{map_box, BoundingBox, PageSize, Scale};
pub use job::{Job, JobId, JobOrigin, JobStatus, JobUpdate, MergeOutcome, SubmittedFile};
pub use result::{FileResult, Granularity, PageRegions, RegionItem};
