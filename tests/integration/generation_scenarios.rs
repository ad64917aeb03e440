//! End-to-end generation flows through ContentContext with a scripted backend

use super::test_utils::{backend_with, mount, version, versions};
use scriptsync::backend::ScriptedBackend;
use scriptsync::context::{ContextEvent, ContextSettings};
use scriptsync::generation::{ComparatorKind, PollSettings, TaskStatus};
use scriptsync::persistence::{MemoryPersistence, PersistedSelection};
use scriptsync::selection::ReconcileWarning;
use scriptsync::{
    BackendError, CoordinatorError, DocumentKind, DocumentRef, FailureKind, GenerationPayload,
};
use std::sync::Arc;
use std::time::Duration;

fn story() -> DocumentRef {
    DocumentRef::new("p1", DocumentKind::Story)
}

#[tokio::test(start_paused = true)]
async fn test_settles_on_fourth_poll_and_persists() {
    let doc = story();
    let backend = backend_with(&doc, versions(&["v1"]));
    let persistence = Arc::new(MemoryPersistence::new());
    let ctx = mount(&doc, &backend, persistence.clone(), ContextSettings::default()).await;
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v1");

    for _ in 0..3 {
        backend.push_poll(&doc, Ok(versions(&["v1"])));
    }
    backend.push_poll(&doc, Ok(versions(&["v1", "v2"])));
    let fetches_at_mount = backend.fetch_count();

    let mut handle = ctx.submit(GenerationPayload::from_seed("a heist")).await.unwrap();
    assert!(ctx.generating());

    let status = handle.wait().await;
    assert_eq!(
        status,
        TaskStatus::Settled {
            latest: Some("v2".into())
        }
    );
    assert_eq!(backend.fetch_count() - fetches_at_mount, 4);
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v2");
    assert!(!ctx.generating());

    let stored = PersistedSelection::load(persistence.as_ref(), &doc)
        .unwrap()
        .unwrap();
    assert_eq!(stored.selected_version_id.as_str(), "v2");

    // Settled exactly once: no further polling.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.fetch_count() - fetches_at_mount, 4);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_leaves_selection_unchanged() {
    let doc = story();
    let backend = backend_with(&doc, versions(&["v1", "v2"]));
    let persistence = Arc::new(MemoryPersistence::new());
    let settings = ContextSettings {
        poll: PollSettings {
            poll_interval: Duration::from_millis(1500),
            max_poll_duration: Duration::from_secs(10),
            max_poll_retries: 3,
        },
        comparator: ComparatorKind::NewVersionId,
    };
    let ctx = mount(&doc, &backend, persistence.clone(), settings).await;
    let mut events = ctx.subscribe();

    let mut handle = ctx.submit(GenerationPayload::from_seed("x")).await.unwrap();
    let status = handle.wait().await;
    assert!(status.failure().is_some_and(FailureKind::is_timeout));

    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v2");
    assert!(!ctx.generating());
    assert!(persistence.is_empty());
    match events.recv().await.unwrap() {
        ContextEvent::Failed { failure, .. } => assert!(failure.is_timeout()),
        other => panic!("unexpected event {:?}", other),
    }

    let polled = backend.fetch_count();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.fetch_count(), polled);
}

#[tokio::test(start_paused = true)]
async fn test_poll_failures_exhaust_retries() {
    let doc = story();
    let backend = backend_with(&doc, versions(&["v1"]));
    let ctx = mount(
        &doc,
        &backend,
        Arc::new(MemoryPersistence::new()),
        ContextSettings::default(),
    )
    .await;

    for _ in 0..4 {
        backend.push_poll(&doc, Err(BackendError::Transport("503".into())));
    }
    let mut handle = ctx.submit(GenerationPayload::from_notes("tighten")).await.unwrap();
    let status = handle.wait().await;
    assert!(matches!(
        status.failure(),
        Some(FailureKind::PollRetriesExhausted { attempts: 4, .. })
    ));
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v1");

    // The document can generate again after a failure.
    backend.append_version(&doc, version("v2", 2));
    let mut retry = ctx.submit(GenerationPayload::from_notes("tighten")).await.unwrap();
    assert!(matches!(retry.wait().await, TaskStatus::Settled { .. }));
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v2");
}

#[tokio::test(start_paused = true)]
async fn test_double_submit_yields_one_task() {
    let doc = story();
    let backend = Arc::new(ScriptedBackend::new());
    backend.set_submit_delay(Some(Duration::from_millis(200)));
    let ctx = Arc::new(
        mount(
            &doc,
            &backend,
            Arc::new(MemoryPersistence::new()),
            ContextSettings::default(),
        )
        .await,
    );

    let first = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move { ctx.submit(GenerationPayload::from_seed("a")).await })
    };
    tokio::task::yield_now().await;
    let second = ctx.submit(GenerationPayload::from_seed("b")).await;

    assert!(matches!(second, Err(CoordinatorError::Conflict(_))));
    assert!(first.await.unwrap().is_ok());
    assert_eq!(backend.submit_count(), 1);
    ctx.cancel_generation();
}

#[tokio::test(start_paused = true)]
async fn test_generation_clears_user_override() {
    let doc = story();
    let backend = backend_with(&doc, versions(&["v1", "v2"]));
    let ctx = mount(
        &doc,
        &backend,
        Arc::new(MemoryPersistence::new()),
        ContextSettings::default(),
    )
    .await;
    ctx.select_version(&"v1".into()).unwrap();
    assert!(ctx.selection().user_override);

    backend.append_version(&doc, version("v3", 3));
    let mut handle = ctx.submit(GenerationPayload::from_seed("again")).await.unwrap();
    handle.wait().await;

    let selection = ctx.selection();
    assert_eq!(selection.selected.unwrap().as_str(), "v3");
    assert!(!selection.user_override);
}

#[tokio::test(start_paused = true)]
async fn test_settle_without_newer_version_warns() {
    let doc = story();
    let backend = backend_with(&doc, vec![version("v2", 2)]);
    let ctx = mount(
        &doc,
        &backend,
        Arc::new(MemoryPersistence::new()),
        ContextSettings::default(),
    )
    .await;
    let mut events = ctx.subscribe();

    // A new id appears, but it does not outrank the current latest.
    backend.push_poll(&doc, Ok(vec![version("v2", 2), version("old", 1)]));
    let mut handle = ctx.submit(GenerationPayload::from_seed("x")).await.unwrap();
    assert!(matches!(handle.wait().await, TaskStatus::Settled { .. }));

    assert_eq!(
        events.recv().await.unwrap(),
        ContextEvent::Warning {
            document: doc.clone(),
            warning: ReconcileWarning::NoNewVersion {
                latest: Some("v2".into())
            },
        }
    );
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v2");
}

#[tokio::test(start_paused = true)]
async fn test_bulk_generation_waits_for_requested_count() {
    let doc = DocumentRef::new("p1", DocumentKind::Scene);
    let backend = backend_with(&doc, versions(&["s1"]));
    let settings = ContextSettings {
        poll: PollSettings::default(),
        comparator: ComparatorKind::CountReached,
    };
    let ctx = mount(&doc, &backend, Arc::new(MemoryPersistence::new()), settings).await;

    backend.push_poll(&doc, Ok(versions(&["s1", "s2"])));
    backend.push_poll(&doc, Ok(versions(&["s1", "s2", "s3"])));
    let fetches_at_mount = backend.fetch_count();

    let payload = GenerationPayload::from_seed("act two").with_requested_count(2);
    let mut handle = ctx.submit(payload).await.unwrap();
    assert!(matches!(handle.wait().await, TaskStatus::Settled { .. }));
    assert_eq!(backend.fetch_count() - fetches_at_mount, 2);
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "s3");
}
