//! Polling settles exactly once regardless of duplicate responses

use parking_lot::Mutex;
use proptest::prelude::*;
use scriptsync::backend::ScriptedBackend;
use scriptsync::generation::{
    Baseline, ComparatorKind, GenerationCoordinator, GenerationObserver, GenerationTask,
    PollSettings, TaskStatus,
};
use scriptsync::{DocumentKind, DocumentRef, FailureKind, GenerationPayload, Version};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Counter {
    settled: Mutex<u32>,
    failed: Mutex<u32>,
}

impl GenerationObserver for Counter {
    fn on_poll(&self, _task: &GenerationTask, _versions: &[Version]) {}

    fn on_settled(&self, _task: &GenerationTask, _versions: Vec<Version>) {
        *self.settled.lock() += 1;
    }

    fn on_failed(&self, _task: &GenerationTask, _failure: &FailureKind) {
        *self.failed.lock() += 1;
    }
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

fn numbered(count: usize) -> Vec<Version> {
    (1..=count)
        .map(|n| Version::new(format!("v{}", n), n as u64, ""))
        .collect()
}

/// For any number of duplicate responses before the new version appears, the
/// task settles exactly once and polling stops.
#[test]
fn test_duplicate_responses_settle_once_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0usize..8, 1usize..5), |(duplicates, existing)| {
            let doc = DocumentRef::new("p", DocumentKind::Story);
            let before = numbered(existing);
            let after = numbered(existing + 1);

            let backend = Arc::new(ScriptedBackend::new());
            for _ in 0..duplicates {
                backend.push_poll(&doc, Ok(before.clone()));
            }
            // The completed set is then observed repeatedly.
            backend.set_versions(&doc, after);

            let counter = Arc::new(Counter::default());
            let runtime = paused_runtime();
            let status = runtime.block_on(async {
                let coordinator = GenerationCoordinator::new(
                    doc.clone(),
                    backend.clone(),
                    PollSettings::default(),
                    ComparatorKind::NewVersionId,
                );
                let mut handle = coordinator
                    .start(
                        GenerationPayload::from_seed("s"),
                        Baseline::from_versions(&before),
                        counter.clone(),
                    )
                    .await
                    .unwrap();
                let status = handle.wait().await;
                tokio::time::sleep(Duration::from_secs(30)).await;
                status
            });

            prop_assert!(matches!(status, TaskStatus::Settled { .. }), "expected Settled, got {:?}", status);
            prop_assert_eq!(*counter.settled.lock(), 1);
            prop_assert_eq!(*counter.failed.lock(), 0);
            prop_assert_eq!(backend.fetch_count(), duplicates + 1);
            Ok(())
        })
        .unwrap();
}

/// Failures below the retry budget never fail the task.
#[test]
fn test_failures_within_budget_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0u32..4, proptest::collection::vec(0u32..4, 1..4)), |(max_retries, bursts)| {
            let doc = DocumentRef::new("p", DocumentKind::Story);
            let backend = Arc::new(ScriptedBackend::new());
            let within_budget = bursts.iter().all(|&burst| burst <= max_retries);
            for burst in &bursts {
                for _ in 0..*burst {
                    backend.push_poll(
                        &doc,
                        Err(scriptsync::BackendError::Transport("flaky".into())),
                    );
                }
                backend.push_poll(&doc, Ok(Vec::new()));
            }
            backend.set_versions(&doc, numbered(1));

            let settings = PollSettings {
                max_poll_retries: max_retries,
                ..PollSettings::default()
            };
            let runtime = paused_runtime();
            let status = runtime.block_on(async {
                let coordinator = GenerationCoordinator::new(
                    doc.clone(),
                    backend.clone(),
                    settings,
                    ComparatorKind::NewVersionId,
                );
                let mut handle = coordinator
                    .start(
                        GenerationPayload::from_seed("s"),
                        Baseline::default(),
                        Arc::new(Counter::default()),
                    )
                    .await
                    .unwrap();
                handle.wait().await
            });

            if within_budget {
                prop_assert!(matches!(status, TaskStatus::Settled { .. }), "expected Settled, got {:?}", status);
            } else {
                let exhausted = matches!(
                    status.failure(),
                    Some(FailureKind::PollRetriesExhausted { .. })
                );
                prop_assert!(exhausted);
            }
            Ok(())
        })
        .unwrap();
}
