use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use unearth_core::{Category, ScanConfig};
use unearth_session::{
    CoordinatorError, MAX_SCANNING_PROGRESS, ScanCoordinator, ScanEvent, ScanOutcome, ScanState,
};

/// Collect events until the scan publishes its final lifecycle state.
fn collect(mut rx: mpsc::Receiver<ScanEvent>) -> JoinHandle<Vec<ScanEvent>> {
    tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let last = matches!(
                event,
                ScanEvent::Lifecycle {
                    state: ScanState::Completed | ScanState::Error | ScanState::Idle
                }
            );
            events.push(event);
            if last {
                break;
            }
        }
        events
    })
}

fn config(root: &Path) -> ScanConfig {
    ScanConfig::builder()
        .roots(vec![root.to_path_buf()])
        .batch_delay_ms(0u64)
        .build()
        .unwrap()
}

fn example_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0];
    jpeg.resize(5000, 0);
    fs::write(temp.path().join("photo.jpg"), jpeg).unwrap();
    fs::write(temp.path().join("note.txt"), "twenty bytes of text").unwrap();
    temp
}

fn completions(events: &[ScanEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ScanEvent::Completed(_)))
        .count()
}

fn states(events: &[ScanEvent]) -> Vec<ScanState> {
    events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Lifecycle { state } => Some(*state),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_example_scan() {
    let temp = example_dir();
    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);

    let handle = coordinator.start_scan(config(temp.path())).unwrap();
    let outcome = handle.wait().await;
    let events = events.await.unwrap();

    let ScanOutcome::Completed(summary) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(summary.total_files_found, 2);
    assert_eq!(summary.total_bytes_scanned, 5020);
    assert_eq!(summary.categories_summary[Category::Image], 1);
    assert_eq!(summary.categories_summary[Category::Document], 1);
    assert_eq!(summary.categories_summary[Category::Other], 0);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["categoriesSummary"]["images"], 1);
    assert_eq!(json["categoriesSummary"]["documents"], 1);
    assert_eq!(json["categoriesSummary"]["others"], 0);

    assert_eq!(
        states(&events),
        vec![
            ScanState::Initializing,
            ScanState::Scanning,
            ScanState::Finalizing,
            ScanState::Completed
        ]
    );
    assert_eq!(completions(&events), 1);
    assert!(matches!(events[events.len() - 2], ScanEvent::Completed(_)));
    assert_eq!(coordinator.state(), ScanState::Completed);
}

#[tokio::test]
async fn test_progress_caps_before_final_report() {
    let temp = example_dir();
    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);

    coordinator.start_scan(config(temp.path())).unwrap().wait().await;
    let events = events.await.unwrap();

    let progress: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress(p) => Some(p.progress),
            _ => None,
        })
        .collect();
    let (last, running) = progress.split_last().unwrap();
    assert_eq!(*last, 100.0);
    assert!(running.iter().all(|p| *p <= MAX_SCANNING_PROGRESS));
    assert!(running.windows(2).all(|w| w[0] <= w[1]));

    // The 100% report comes after every batch and before completion.
    let final_progress = events
        .iter()
        .position(|e| matches!(e, ScanEvent::Progress(p) if p.progress == 100.0))
        .unwrap();
    let last_batch = events
        .iter()
        .rposition(|e| matches!(e, ScanEvent::FileBatch(_)))
        .unwrap();
    let completed = events
        .iter()
        .position(|e| matches!(e, ScanEvent::Completed(_)))
        .unwrap();
    assert!(last_batch < final_progress && final_progress < completed);
}

#[tokio::test]
async fn test_batches_per_category() {
    let temp = TempDir::new().unwrap();
    for i in 0..120 {
        fs::write(temp.path().join(format!("a{i:03}.jpg")), "j").unwrap();
    }
    for i in 0..3 {
        fs::write(temp.path().join(format!("z{i}.pdf")), "p").unwrap();
    }

    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);
    coordinator.start_scan(config(temp.path())).unwrap().wait().await;
    let events = events.await.unwrap();

    let batches: Vec<(Category, usize, usize)> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::FileBatch(b) => Some((b.category, b.batch_index, b.files.len())),
            _ => None,
        })
        .collect();
    assert_eq!(
        batches,
        vec![
            (Category::Image, 0, 50),
            (Category::Image, 1, 50),
            (Category::Image, 2, 20),
            (Category::Document, 0, 3),
        ]
    );

    let first = events
        .iter()
        .find_map(|e| match e {
            ScanEvent::FileBatch(b) => Some(b.files[0].entry.name.to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(first, "a000.jpg");
}

#[tokio::test]
async fn test_concurrent_start_is_rejected() {
    let temp = example_dir();
    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);

    let first = coordinator.start_scan(config(temp.path())).unwrap();
    let second = coordinator.start_scan(config(temp.path()));
    assert!(matches!(second, Err(CoordinatorError::ScanInProgress)));
    assert!(coordinator.state().is_active());

    let ScanOutcome::Completed(summary) = first.wait().await else {
        panic!("first scan should complete");
    };
    assert_eq!(summary.total_files_found, 2);
    assert_eq!(completions(&events.await.unwrap()), 1);
}

#[tokio::test]
async fn test_new_scan_after_completion() {
    let temp = example_dir();
    let (tx, mut rx) = mpsc::channel(256);
    let coordinator = ScanCoordinator::new(tx);

    let first = coordinator.start_scan(config(temp.path())).unwrap();
    let first_id = first.id();
    assert!(matches!(first.wait().await, ScanOutcome::Completed(_)));

    let second = coordinator.start_scan(config(temp.path())).unwrap();
    assert_eq!(second.id(), first_id + 1);
    let ScanOutcome::Completed(summary) = second.wait().await else {
        panic!("second scan should complete");
    };
    assert_eq!(summary.total_files_found, 2);

    let mut completed = 0;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ScanEvent::Completed(_)) {
            completed += 1;
        }
    }
    assert_eq!(completed, 2);
}

#[tokio::test]
async fn test_cancel_while_paused() {
    let temp = example_dir();
    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);

    let handle = coordinator.start_scan(config(temp.path())).unwrap();
    coordinator.pause();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(coordinator.state().is_active());

    coordinator.cancel();
    assert_eq!(handle.wait().await, ScanOutcome::Cancelled);

    let events = events.await.unwrap();
    assert_eq!(completions(&events), 0);
    assert!(!events.iter().any(|e| matches!(e, ScanEvent::FileBatch(_))));
    assert_eq!(states(&events).last(), Some(&ScanState::Idle));
    assert_eq!(coordinator.state(), ScanState::Idle);

    // The coordinator accepts a new scan afterwards.
    assert!(coordinator.start_scan(config(temp.path())).is_ok());
}

#[tokio::test]
async fn test_pause_then_resume_completes() {
    let temp = example_dir();
    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);

    let handle = coordinator.start_scan(config(temp.path())).unwrap();
    coordinator.pause();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_ne!(coordinator.state(), ScanState::Completed);

    coordinator.resume();
    assert!(matches!(handle.wait().await, ScanOutcome::Completed(_)));
    assert_eq!(completions(&events.await.unwrap()), 1);
}

#[tokio::test]
async fn test_controls_without_scan_are_noops() {
    let (tx, _rx) = mpsc::channel(16);
    let coordinator = ScanCoordinator::new(tx);

    coordinator.pause();
    coordinator.resume();
    coordinator.cancel();
    assert_eq!(coordinator.state(), ScanState::Idle);
}

#[tokio::test]
async fn test_dropped_receiver_fails_scan_once() {
    let temp = example_dir();
    let (tx, rx) = mpsc::channel(16);
    drop(rx);
    let coordinator = ScanCoordinator::new(tx);
    let mut state_rx = coordinator.subscribe_state();

    let outcome = coordinator.start_scan(config(temp.path())).unwrap().wait().await;
    assert!(matches!(outcome, ScanOutcome::Failed(ref msg) if msg.contains("receiver")));
    assert_eq!(coordinator.state(), ScanState::Error);
    assert_eq!(*state_rx.borrow_and_update(), ScanState::Error);

    // An errored coordinator is available again.
    assert!(coordinator.start_scan(config(temp.path())).is_ok());
}

#[tokio::test]
async fn test_content_dedupe() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.jpg"), "identical").unwrap();
    fs::write(temp.path().join("b.jpg"), "identical").unwrap();
    fs::write(temp.path().join("c.jpg"), "different").unwrap();

    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);
    let config = ScanConfig::builder()
        .roots(vec![temp.path().to_path_buf()])
        .batch_delay_ms(0u64)
        .dedupe_content(true)
        .build()
        .unwrap();

    let ScanOutcome::Completed(summary) = coordinator.start_scan(config).unwrap().wait().await
    else {
        panic!("scan should complete");
    };
    assert_eq!(summary.total_files_found, 2);
    assert_eq!(summary.duplicates_removed, 1);
    assert_eq!(summary.categories_summary[Category::Image], 2);
    events.await.unwrap();
}

#[tokio::test]
async fn test_missing_root_completes_empty() {
    let temp = TempDir::new().unwrap();
    let (tx, rx) = mpsc::channel(16);
    let events = collect(rx);
    let coordinator = ScanCoordinator::new(tx);

    let outcome = coordinator
        .start_scan(config(&temp.path().join("absent")))
        .unwrap()
        .wait()
        .await;
    let ScanOutcome::Completed(summary) = outcome else {
        panic!("missing roots are not an error");
    };
    assert_eq!(summary.total_files_found, 0);
    assert_eq!(summary.categories_summary.total(), 0);
    assert_eq!(completions(&events.await.unwrap()), 1);
}

fn wide_tree(dirs: usize, files: usize) -> TempDir {
    let temp = TempDir::new().unwrap();
    for d in 0..dirs {
        let dir = temp.path().join(format!("dir{d:03}"));
        fs::create_dir(&dir).unwrap();
        for f in 0..files {
            fs::write(dir.join(format!("file{f:04}.txt")), "x").unwrap();
        }
    }
    temp
}

fn per_file_progress(root: &Path) -> ScanConfig {
    ScanConfig::builder()
        .roots(vec![root.to_path_buf()])
        .batch_delay_ms(0u64)
        .progress_every_files(1u64)
        .build()
        .unwrap()
}

/// Receive until the walker has reported at least one file.
async fn wait_for_walk(rx: &mut mpsc::Receiver<ScanEvent>, seen: &mut Vec<ScanEvent>) {
    while let Some(event) = rx.recv().await {
        let walking = matches!(&event, ScanEvent::Progress(p) if p.files_scanned >= 1);
        seen.push(event);
        if walking {
            return;
        }
    }
    panic!("event channel closed before the walk reported progress");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_during_walk() {
    let temp = wide_tree(20, 200);
    let (tx, mut rx) = mpsc::channel(4);
    let coordinator = ScanCoordinator::new(tx);

    let handle = coordinator.start_scan(per_file_progress(temp.path())).unwrap();
    let mut events = Vec::new();
    wait_for_walk(&mut rx, &mut events).await;
    assert_eq!(coordinator.state(), ScanState::Scanning);

    coordinator.cancel();
    let rest = collect(rx);
    let outcome = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("cancelled walk did not stop");
    assert_eq!(outcome, ScanOutcome::Cancelled);

    events.extend(rest.await.unwrap());
    assert_eq!(completions(&events), 0);
    assert!(!events.iter().any(|e| matches!(e, ScanEvent::FileBatch(_))));
    assert_eq!(states(&events).last(), Some(&ScanState::Idle));
    assert_eq!(coordinator.state(), ScanState::Idle);

    // The slot is free once the walker has gone.
    assert!(coordinator.start_scan(config(temp.path())).is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_receiver_dropped_during_paused_walk() {
    let temp = wide_tree(40, 1000);
    let (tx, mut rx) = mpsc::channel(1);
    let coordinator = ScanCoordinator::new(tx);

    let handle = coordinator.start_scan(per_file_progress(temp.path())).unwrap();
    let mut events = Vec::new();
    wait_for_walk(&mut rx, &mut events).await;

    coordinator.pause();
    drop(rx);
    let outcome = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("scan kept walking after its receiver was dropped");

    assert!(matches!(outcome, ScanOutcome::Failed(ref msg) if msg.contains("receiver")));
    assert_eq!(coordinator.state(), ScanState::Error);
    assert!(coordinator.start_scan(config(temp.path())).is_ok());
}
