//! Shared fixtures for the integration scenarios

#![allow(dead_code)]

use ocrdeck_core::application::{BatchInput, LocalFile, TrackerConfig, TrackerSession};
use ocrdeck_core::domain::{
    BoundingBox, FileResult, Granularity, JobStatus, PageRegions, PageSize, RegionItem,
};
use ocrdeck_core::port::id_provider::mocks::SequentialIdProvider;
use ocrdeck_core::port::recognition_backend::mocks::ScriptedBackend;
use ocrdeck_core::port::time_provider::mocks::ManualClock;
use ocrdeck_core::port::{BatchAccepted, JobSnapshot};
use std::sync::Arc;

pub struct Fixture {
    pub backend: Arc<ScriptedBackend>,
    pub clock: Arc<ManualClock>,
    pub session: TrackerSession,
}

pub fn fixture() -> Fixture {
    fixture_with(TrackerConfig::default())
}

pub fn fixture_with(config: TrackerConfig) -> Fixture {
    let backend = Arc::new(ScriptedBackend::new());
    let clock = Arc::new(ManualClock::new(1_000));
    let session = TrackerSession::new(
        config,
        backend.clone(),
        clock.clone(),
        Arc::new(SequentialIdProvider::default()),
    );
    Fixture {
        backend,
        clock,
        session,
    }
}

pub fn png(name: &str) -> BatchInput {
    BatchInput::File(local_png(name))
}

pub fn local_png(name: &str) -> LocalFile {
    LocalFile::new(name, vec![0x89, b'P', b'N', b'G'])
}

pub fn accepted(job_id: &str) -> BatchAccepted {
    BatchAccepted {
        job_id: job_id.to_string(),
        status: JobStatus::Pending,
        message: Some("Job submitted".to_string()),
    }
}

/// Result with one word box on a 100x50 page
pub fn result(filename: &str) -> FileResult {
    FileResult {
        filename: filename.to_string(),
        source: format!("/data/{}", filename),
        language: Some("en".to_string()),
        text: Some("Hello".to_string()),
        pages: vec![PageRegions {
            page_number: 1,
            native_size: PageSize::new(100, 50),
            items: vec![
                RegionItem::new(
                    Granularity::Line,
                    "Hello",
                    BoundingBox::new(5.0, 5.0, 80.0, 40.0),
                ),
                RegionItem::new(
                    Granularity::Word,
                    "Hello",
                    BoundingBox::new(10.0, 20.0, 30.0, 40.0),
                ),
            ],
        }],
        ..Default::default()
    }
}

pub fn snapshot(status: JobStatus, results: Vec<FileResult>) -> JobSnapshot {
    JobSnapshot {
        status,
        results,
        started_at: None,
        ended_at: None,
        duration_ms: None,
        error: None,
    }
}

pub fn finished(results: Vec<FileResult>, ended_at: i64) -> JobSnapshot {
    JobSnapshot {
        ended_at: Some(ended_at),
        ..snapshot(JobStatus::Completed, results)
    }
}
