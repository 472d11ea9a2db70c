mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use sunlapse_acquisition::{
    AcquisitionParams, AcquisitionSession, RunOutcome, SessionOptions, SessionState, StatusEvent,
};

fn params(dir: &std::path::Path, num_images: u32, interval_secs: u64, start: u64) -> AcquisitionParams {
    AcquisitionParams {
        num_images,
        interval_secs,
        target_dir: dir.to_path_buf(),
        source: "SDO/AIA 171".to_string(),
        start_number: start,
    }
}

fn jpg_names(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn run_writes_exactly_the_requested_sequence() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = support::StaticFetcher::new(support::jpeg_bytes());
    let session = AcquisitionSession::new(fetcher.clone())
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let handle = session.start(params(tmp.path(), 3, 2, 10)).await.unwrap();
    let (events, report) = handle.collect().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.frames.len(), 3);
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(
        jpg_names(tmp.path()),
        vec!["07mar24_sun_10.jpg", "07mar24_sun_11.jpg", "07mar24_sun_12.jpg"]
    );

    let saved = |n: u64| StatusEvent::Saved {
        filename: format!("07mar24_sun_{n}.jpg"),
    };
    let tick = |s: u64| StatusEvent::Countdown {
        seconds_remaining: s,
    };
    assert_eq!(
        events,
        vec![
            saved(10),
            tick(2),
            tick(1),
            saved(11),
            tick(2),
            tick(1),
            saved(12),
            StatusEvent::Completed,
        ]
    );

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.last_outcome(), Some(RunOutcome::Completed));
}

#[tokio::test]
async fn saved_frames_decode_as_images() {
    let tmp = tempfile::tempdir().unwrap();
    let session = AcquisitionSession::new(support::StaticFetcher::new(support::jpeg_bytes()))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let report = session
        .start(params(tmp.path(), 1, 1, 1))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let image = image::open(&report.frames[0]).unwrap();
    assert_eq!((image.width(), image.height()), (16, 12));
}

#[tokio::test]
async fn stop_during_wait_ends_run_promptly() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = support::StaticFetcher::new(support::jpeg_bytes());
    let session = AcquisitionSession::new(fetcher.clone())
        .with_clock(support::fixed_clock())
        .with_options(SessionOptions {
            tick: Duration::from_secs(1),
        });

    let mut handle = session.start(params(tmp.path(), 5, 3600, 1)).await.unwrap();
    assert_eq!(session.state(), SessionState::Running);

    let first = handle.next_event().await.unwrap();
    assert!(matches!(first, StatusEvent::Saved { .. }));
    let second = handle.next_event().await.unwrap();
    assert_eq!(
        second,
        StatusEvent::Countdown {
            seconds_remaining: 3600
        }
    );

    let stopped_at = Instant::now();
    session.stop();
    let (rest, report) = handle.collect().await.unwrap();

    assert!(stopped_at.elapsed() < Duration::from_secs(1));
    assert_eq!(rest.last(), Some(&StatusEvent::Stopped));
    assert!(!rest.contains(&StatusEvent::Completed));
    assert_eq!(report.outcome, RunOutcome::Stopped);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(jpg_names(tmp.path()), vec!["07mar24_sun_1.jpg"]);
    assert!(!session.is_running());
}

#[tokio::test]
async fn handle_stop_is_equivalent_to_session_stop() {
    let tmp = tempfile::tempdir().unwrap();
    let session = AcquisitionSession::new(support::StaticFetcher::new(support::jpeg_bytes()))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let mut handle = session.start(params(tmp.path(), 10, 1000, 1)).await.unwrap();
    handle.next_event().await.unwrap();
    handle.stop();
    let report = handle.wait().await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Stopped);
}

#[tokio::test]
async fn not_found_fails_run_without_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let url = support::serve("404 Not Found", b"gone".to_vec()).await;
    let session = AcquisitionSession::new(support::LocalHttpFetcher::new(url))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let (events, report) = session
        .start(params(tmp.path(), 3, 1, 1))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    match &events[0] {
        StatusEvent::Failed { cause } => assert!(cause.contains("404"), "{cause}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(matches!(report.outcome, RunOutcome::Failed { .. }));
    assert!(report.frames.is_empty());
    assert!(jpg_names(tmp.path()).is_empty());
    assert!(!session.is_running());
}

#[tokio::test]
async fn download_error_after_first_frame_fails_run_and_keeps_frame() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = support::FailingAfterFetcher::new(support::jpeg_bytes(), 1);
    let session = AcquisitionSession::new(fetcher.clone())
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let (events, report) = session
        .start(params(tmp.path(), 4, 2, 1))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(events.len(), 4);
    assert_eq!(
        events[..3],
        [
            StatusEvent::Saved {
                filename: "07mar24_sun_1.jpg".to_string()
            },
            StatusEvent::Countdown {
                seconds_remaining: 2
            },
            StatusEvent::Countdown {
                seconds_remaining: 1
            },
        ]
    );
    match &events[3] {
        StatusEvent::Failed { cause } => assert!(cause.contains("connection reset"), "{cause}"),
        other => panic!("expected failure, got {other:?}"),
    }

    assert!(matches!(report.outcome, RunOutcome::Failed { .. }));
    assert_eq!(report.frames.len(), 1);
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(jpg_names(tmp.path()), vec!["07mar24_sun_1.jpg"]);
    assert!(!session.is_running());
}

#[tokio::test]
async fn real_http_success_writes_frame() {
    let tmp = tempfile::tempdir().unwrap();
    let url = support::serve("200 OK", support::jpeg_bytes()).await;
    let session = AcquisitionSession::new(support::LocalHttpFetcher::new(url))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let (events, report) = session
        .start(params(tmp.path(), 2, 1, 4))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(events.last(), Some(&StatusEvent::Completed));
    assert_eq!(
        jpg_names(tmp.path()),
        vec!["07mar24_sun_4.jpg", "07mar24_sun_5.jpg"]
    );
}

#[tokio::test]
async fn undecodable_body_fails_run() {
    let tmp = tempfile::tempdir().unwrap();
    let session = AcquisitionSession::new(support::StaticFetcher::new(b"<html>oops</html>".to_vec()))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let (events, report) = session
        .start(params(tmp.path(), 2, 1, 1))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert!(matches!(events.as_slice(), [StatusEvent::Failed { .. }]));
    assert!(matches!(report.outcome, RunOutcome::Failed { .. }));
    assert!(jpg_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn invalid_params_start_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("never-created");
    let fetcher = support::StaticFetcher::new(support::jpeg_bytes());
    let session = AcquisitionSession::new(fetcher.clone());

    let cases = [
        AcquisitionParams {
            num_images: 0,
            ..params(&target, 1, 1, 1)
        },
        AcquisitionParams {
            interval_secs: 0,
            ..params(&target, 1, 1, 1)
        },
        AcquisitionParams {
            start_number: 0,
            ..params(&target, 1, 1, 1)
        },
        AcquisitionParams {
            source: "Unknown Feed".to_string(),
            ..params(&target, 1, 1, 1)
        },
    ];

    for case in cases {
        let err = session.start(case).await.err().expect("start should fail");
        assert!(err.is_invalid_input(), "{err}");
    }

    assert!(!target.exists());
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.last_outcome(), None);
}

#[tokio::test]
async fn start_creates_missing_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("nested").join("frames");
    let session = AcquisitionSession::new(support::StaticFetcher::new(support::jpeg_bytes()))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    session
        .start(params(&target, 1, 1, 1))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(jpg_names(&target), vec!["07mar24_sun_1.jpg"]);
}

#[tokio::test]
async fn stop_without_run_is_noop() {
    let session = AcquisitionSession::new(support::StaticFetcher::new(Vec::new()));
    session.stop();
    session.stop();
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn session_can_run_again_after_stop() {
    let tmp = tempfile::tempdir().unwrap();
    let session = AcquisitionSession::new(support::StaticFetcher::new(support::jpeg_bytes()))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    let mut first = session.start(params(tmp.path(), 5, 1000, 1)).await.unwrap();
    first.next_event().await.unwrap();
    session.stop();
    assert_eq!(first.wait().await.unwrap().outcome, RunOutcome::Stopped);

    // Stopping after the run ended stays a no-op.
    session.stop();

    let report = session
        .start(params(tmp.path(), 1, 1, 20))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(
        jpg_names(tmp.path()),
        vec!["07mar24_sun_1.jpg", "07mar24_sun_20.jpg"]
    );
}

#[tokio::test]
async fn dropped_handle_does_not_abort_run() {
    let tmp = tempfile::tempdir().unwrap();
    let fetcher = support::StaticFetcher::new(support::jpeg_bytes());
    let session = Arc::new(
        AcquisitionSession::new(fetcher.clone())
            .with_clock(support::fixed_clock())
            .with_options(support::fast_options()),
    );

    drop(session.start(params(tmp.path(), 2, 1, 1)).await.unwrap());

    let deadline = Instant::now() + Duration::from_secs(5);
    while session.is_running() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(session.last_outcome(), Some(RunOutcome::Completed));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restart_right_after_completion_is_not_stopped() {
    let tmp = tempfile::tempdir().unwrap();
    let session = AcquisitionSession::new(support::StaticFetcher::new(support::jpeg_bytes()))
        .with_clock(support::fixed_clock())
        .with_options(support::fast_options());

    for round in 0..50u64 {
        let first = session
            .start(params(tmp.path(), 1, 1, round * 2 + 1))
            .await
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while session.is_running() && Instant::now() < deadline {
            tokio::task::yield_now().await;
        }
        assert!(!session.is_running(), "round {round} never finished");

        let second = session
            .start(params(tmp.path(), 1, 1, round * 2 + 2))
            .await
            .unwrap();

        assert_eq!(first.wait().await.unwrap().outcome, RunOutcome::Completed);
        let report = second.wait().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed, "round {round}");
        assert_eq!(report.frames.len(), 1);
    }
}
