//! Wire -> domain conversion

use crate::wire::{
    WireBatchAccepted, WireBatchFile, WireFileResult, WireJobStatus, WirePage, WireRegion,
    WireSyncResponse,
};
use ocrdeck_core::domain::timing::{parse_duration_ms, parse_timestamp};
use ocrdeck_core::domain::{
    BoundingBox, FileResult, Granularity, JobStatus, PageRegions, PageSize, RegionItem,
};
use ocrdeck_core::port::{BackendError, BatchAccepted, BatchItem, JobSnapshot, SyncRecognition};
use tracing::debug;

/// Status value the backend uses for unknown jobs
pub const NOT_FOUND_STATUS: &str = "not_found";

fn region(wire: WireRegion) -> Option<RegionItem> {
    let Some(granularity) = Granularity::from_level(wire.level) else {
        debug!(level = wire.level, "Skipping region with unknown level");
        return None;
    };
    Some(RegionItem {
        granularity,
        text: wire.text.unwrap_or_default(),
        bbox: BoundingBox::new(wire.left, wire.top, wire.width, wire.height),
        // tesseract reports -1 for rows that are not words
        confidence: wire.conf.filter(|c| *c >= 0.0),
    })
}

fn page(wire: WirePage) -> PageRegions {
    PageRegions {
        page_number: wire.page_num,
        native_size: PageSize::new(wire.image_width, wire.image_height),
        items: wire.ocr_data.into_iter().filter_map(region).collect(),
    }
}

pub fn file_result(wire: WireFileResult) -> FileResult {
    FileResult {
        filename: wire.filename.unwrap_or_default(),
        source: wire.source.unwrap_or_default(),
        language: wire.language,
        text: wire.text,
        inline_image: wire.image_base64.filter(|data| data.starts_with("data:")),
        pages: wire.ocr_data.into_iter().map(page).collect(),
        error: wire.error.filter(|e| !e.is_empty()),
        engine_version: wire.tesseract_version,
    }
}

pub fn sync_recognition(wire: WireSyncResponse) -> SyncRecognition {
    SyncRecognition {
        started_at: wire.start_time.as_deref().and_then(parse_timestamp),
        ended_at: wire.end_time.as_deref().and_then(parse_timestamp),
        duration_ms: wire.duration.as_deref().and_then(parse_duration_ms),
        result: file_result(wire.result),
    }
}

pub fn job_snapshot(job_id: &str, wire: WireJobStatus) -> Result<JobSnapshot, BackendError> {
    if wire.status == NOT_FOUND_STATUS {
        return Err(BackendError::NotFound(job_id.to_string()));
    }
    let status = JobStatus::parse(&wire.status).ok_or_else(|| {
        BackendError::Decode(format!("Unknown job status '{}'", wire.status))
    })?;

    Ok(JobSnapshot {
        status,
        results: wire.results.into_iter().map(file_result).collect(),
        started_at: wire.overall_start_time.as_deref().and_then(parse_timestamp),
        ended_at: wire.overall_end_time.as_deref().and_then(parse_timestamp),
        duration_ms: wire.overall_duration.as_deref().and_then(parse_duration_ms),
        error: wire.error.filter(|e| !e.is_empty()),
    })
}

pub fn batch_accepted(wire: WireBatchAccepted) -> Result<BatchAccepted, BackendError> {
    let job_id = wire
        .job_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| BackendError::Decode("Batch accepted without a job id".to_string()))?;
    let status = match wire.status.as_deref() {
        None => JobStatus::Pending,
        Some(raw) => JobStatus::parse(raw)
            .ok_or_else(|| BackendError::Decode(format!("Unknown job status '{}'", raw)))?,
    };
    Ok(BatchAccepted {
        job_id,
        status,
        message: wire.message,
    })
}

pub fn batch_file(item: BatchItem) -> WireBatchFile {
    match item {
        BatchItem::Inline {
            filename,
            base64,
            language,
        } => WireBatchFile::Inline {
            filename,
            base64,
            language,
        },
        BatchItem::Url { url, language } => WireBatchFile::Url { url, language },
    }
}
