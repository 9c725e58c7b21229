//! End-to-end scenarios: submission through refresh to presentation
//!
//! Backend, clock and ids are scripted; tokio time is paused so heartbeat
//! and ticker periods elapse deterministically.

mod common;

use common::*;
use ocrdeck_core::application::presenter::visual::PresentOutcome;
use ocrdeck_core::application::{Dashboard, Notification, ResultPresenter, TrackerConfig};
use ocrdeck_core::domain::{BoundingBox, JobStatus, PageSize};
use ocrdeck_core::error::AppError;
use ocrdeck_core::port::page_renderer::mocks::ScriptedRenderer;
use ocrdeck_core::port::surface::mocks::RecordingSurface;
use ocrdeck_core::port::{BackendError, SyncRecognition};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

/// Synchronous image: in_progress at once, completed on answer, never polled
#[tokio::test(start_paused = true)]
async fn test_sync_image_end_to_end() {
    let f = fixture();
    f.backend.push_sync(Ok(SyncRecognition {
        result: result("scan.png"),
        started_at: Some(1_000),
        ended_at: Some(2_234),
        duration_ms: Some(1_234.0),
    }));
    let mut notifications = f.session.subscribe();

    let job_id = f
        .session
        .submit_sync(local_png("scan.png"), "en")
        .await
        .unwrap();

    let job = f.session.store().get(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.results.len(), 1);
    assert_eq!(job.results[0].text.as_deref(), Some("Hello"));
    assert_eq!(job.duration_ms, Some(1_234.0));

    // created in_progress, then exactly one terminal change
    let mut terminal_changes = 0;
    let mut first_status = None;
    loop {
        match notifications.try_recv() {
            Ok(Notification::JobChanged {
                status,
                became_terminal,
                ..
            }) => {
                first_status.get_or_insert(status);
                if became_terminal {
                    terminal_changes += 1;
                }
            }
            Ok(_) => {}
            Err(TryRecvError::Empty) => break,
            Err(e) => panic!("notification channel failed: {}", e),
        }
    }
    assert_eq!(first_status, Some(JobStatus::InProgress));
    assert_eq!(terminal_changes, 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(f.backend.sync_calls(), 1);
    assert_eq!(f.backend.total_status_calls(), 0);
    assert!(!f.session.timers().is_heartbeat_running());
    assert_eq!(f.session.timers().active_tickers(), 0);

    let mut dashboard = Dashboard::new();
    dashboard.refresh(&f.session.jobs(), f.session.live(), f.session.now_millis());
    let row = dashboard.row(&job_id).unwrap();
    assert_eq!(row.content.progress, "1/1");
    assert_eq!(row.content.duration, "00:01.234");
    assert_eq!(f.session.focused().map(|j| j.id), Some(job_id));
}

/// Two files async: pending, 1/2 in progress, then completed and quiet
#[tokio::test(start_paused = true)]
async fn test_async_two_files_end_to_end() {
    let f = fixture();
    f.backend.push_batch(Ok(accepted("job-1")));
    f.backend.push_status(
        "job-1",
        Ok(snapshot(JobStatus::InProgress, vec![result("a.png")])),
    );
    f.backend.push_status(
        "job-1",
        Ok(finished(vec![result("a.png"), result("b.png")], 9_000)),
    );

    let receipt = f
        .session
        .submit_batch(vec![png("a.png"), png("b.png")], "en")
        .await
        .unwrap();
    let job_id = receipt.job_id.clone();
    assert_eq!(receipt.status, JobStatus::Pending);
    assert_eq!(
        f.session.store().get(&job_id).unwrap().status,
        JobStatus::Pending
    );
    assert!(f.session.timers().is_heartbeat_running());
    assert!(f.session.timers().is_ticking(&job_id));

    // first heartbeat tick fires immediately
    tokio::time::sleep(Duration::from_millis(10)).await;
    let mut dashboard = Dashboard::new();
    dashboard.refresh(&f.session.jobs(), f.session.live(), f.session.now_millis());
    let row = dashboard.row(&job_id).unwrap().clone();
    assert_eq!(row.content.progress, "1/2");
    assert_eq!(row.content.status, JobStatus::InProgress);
    assert!(row.content.active);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let job = f.session.store().get(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.results.len(), 2);
    assert_eq!(job.ended_at, Some(9_000));

    dashboard.refresh(&f.session.jobs(), f.session.live(), f.session.now_millis());
    let updated = dashboard.row(&job_id).unwrap();
    assert_eq!(updated.row_id, row.row_id);
    assert_eq!(updated.content.progress, "2/2");

    assert!(!f.session.timers().is_ticking(&job_id));
    assert!(!f.session.timers().is_heartbeat_running());

    let calls = f.backend.status_calls("job-1");
    assert_eq!(calls, 2);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(f.backend.status_calls("job-1"), calls);
}

/// Finished job shown with its word box mapped onto a 2x display
#[tokio::test(start_paused = true)]
async fn test_completed_job_overlay_at_zoom() {
    let f = fixture();
    f.backend.push_batch(Ok(accepted("job-1")));
    f.backend
        .push_status("job-1", Ok(finished(vec![result("page.png")], 2_000)));

    f.session
        .submit_batch(vec![png("page.png")], "en")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let job = f.session.focused().unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let renderer = Arc::new(ScriptedRenderer::new(vec![PageSize::new(100, 50)]));
    let mut presenter = ResultPresenter::new(renderer, &TrackerConfig::default());
    let mut surface = RecordingSurface::with_zoom(2.0);

    let outcome = presenter.show(&job, &mut surface).await;
    assert_eq!(
        outcome,
        PresentOutcome::Drawn {
            page: 1,
            page_count: 1,
            boxes: 1
        }
    );
    // line-level item is not drawn, the word is scaled by 2
    assert_eq!(
        surface.boxes(),
        vec![BoundingBox::new(20.0, 40.0, 60.0, 80.0)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_sync_transport_failure_fails_job() {
    let f = fixture();
    f.backend
        .push_sync(Err(BackendError::Transport("connection refused".into())));

    let err = f
        .session
        .submit_sync(local_png("scan.png"), "en")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Backend(BackendError::Transport(_))));

    let jobs = f.session.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert!(jobs[0].error.as_deref().unwrap().contains("connection refused"));
    assert_eq!(f.session.timers().active_tickers(), 0);
}

#[tokio::test]
async fn test_unsupported_input_creates_no_job() {
    let f = fixture();
    let err = f
        .session
        .submit_sync(
            ocrdeck_core::application::LocalFile::new("notes.txt", b"hi".to_vec()),
            "en",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UnsupportedInput(_)));
    assert!(f.session.store().is_empty());
    assert_eq!(f.backend.sync_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_batch_creates_no_job() {
    let f = fixture();
    f.backend.push_batch(Err(BackendError::Rejected {
        status: 500,
        message: "queue full".into(),
    }));

    let err = f
        .session
        .submit_batch(vec![png("a.png")], "en")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Backend(_)));
    assert!(f.session.store().is_empty());
    assert!(!f.session.timers().is_heartbeat_running());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_job_fails_on_refresh() {
    let f = fixture();
    f.backend.push_batch(Ok(accepted("ghost")));

    let receipt = f
        .session
        .submit_batch(vec![png("a.png")], "en")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let job = f.session.store().get(&receipt.job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.is_some());
    assert!(!f.session.timers().is_heartbeat_running());
}
