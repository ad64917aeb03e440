//! Selection restore and persistence across context lifetimes

use super::test_utils::{backend_with, mount, version, versions};
use scriptsync::context::ContextSettings;
use scriptsync::persistence::{
    selection_key, MemoryPersistence, PersistedSelection, PersistenceAdapter, SledPersistence,
};
use scriptsync::{DocumentKind, DocumentRef, GenerationPayload};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test(start_paused = true)]
async fn test_persisted_selection_wins_over_latest() {
    let doc = DocumentRef::new("p", DocumentKind::Scene);
    let persistence = Arc::new(MemoryPersistence::new());
    persistence.set("p_scene_selectedVersion", "v1").unwrap();

    let backend = backend_with(&doc, versions(&["v1", "v2", "v3"]));
    let ctx = mount(&doc, &backend, persistence.clone(), ContextSettings::default()).await;
    assert_eq!(ctx.current_version().unwrap().id().as_str(), "v1");
    assert!(ctx.selection().user_override);

    // Unrelated refreshes never move an overridden selection.
    backend.append_version(&doc, version("v4", 4));
    ctx.refresh().await.unwrap();
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v1");

    // A completed generation does.
    backend.append_version(&doc, version("v5", 5));
    let mut handle = ctx.submit(GenerationPayload::from_seed("more")).await.unwrap();
    handle.wait().await;
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v5");
}

#[tokio::test(start_paused = true)]
async fn test_stale_persisted_selection_falls_back_to_latest() {
    let doc = DocumentRef::new("p", DocumentKind::Story);
    let persistence = Arc::new(MemoryPersistence::new());
    PersistedSelection::new(&doc, "deleted".into())
        .store(persistence.as_ref(), &doc)
        .unwrap();

    let backend = backend_with(&doc, versions(&["v1", "v2"]));
    let ctx = mount(&doc, &backend, persistence, ContextSettings::default()).await;
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v2");
    assert!(!ctx.selection().user_override);
}

#[tokio::test(start_paused = true)]
async fn test_pin_round_trips_through_sled() {
    let dir = TempDir::new().unwrap();
    let doc = DocumentRef::with_scene("p", DocumentKind::Script, "2");
    let backend = backend_with(&doc, versions(&["v1", "v2", "v3"]));

    {
        let persistence: Arc<dyn PersistenceAdapter> =
            Arc::new(SledPersistence::open(dir.path()).unwrap());
        let ctx = mount(&doc, &backend, persistence, ContextSettings::default()).await;
        ctx.pin_version(&"v2".into()).unwrap();
    }

    let sled = SledPersistence::open(dir.path()).unwrap();
    assert_eq!(sled.keys().unwrap(), vec![selection_key(&doc)]);
    let persistence: Arc<dyn PersistenceAdapter> = Arc::new(sled);
    let ctx = mount(&doc, &backend, persistence, ContextSettings::default()).await;
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v2");
}

#[tokio::test(start_paused = true)]
async fn test_preview_is_forgotten_on_remount() {
    let doc = DocumentRef::new("p", DocumentKind::Story);
    let persistence = Arc::new(MemoryPersistence::new());
    let backend = backend_with(&doc, versions(&["v1", "v2"]));

    let ctx = mount(&doc, &backend, persistence.clone(), ContextSettings::default()).await;
    ctx.select_version(&"v1".into()).unwrap();
    ctx.unmount();

    let ctx = mount(&doc, &backend, persistence, ContextSettings::default()).await;
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v2");
}

#[tokio::test(start_paused = true)]
async fn test_restore_deferred_until_versions_load() {
    let doc = DocumentRef::new("p", DocumentKind::Story);
    let persistence = Arc::new(MemoryPersistence::new());
    persistence.set(&selection_key(&doc), "v1").unwrap();

    let backend = backend_with(&doc, Vec::new());
    let ctx = mount(&doc, &backend, persistence, ContextSettings::default()).await;
    assert!(ctx.current_version().is_none());

    backend.set_versions(&doc, versions(&["v1", "v2"]));
    ctx.refresh().await.unwrap();
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v1");
}

#[tokio::test(start_paused = true)]
async fn test_select_latest_returns_to_following() {
    let doc = DocumentRef::new("p", DocumentKind::Story);
    let backend = backend_with(&doc, versions(&["v1", "v2"]));
    let ctx = mount(
        &doc,
        &backend,
        Arc::new(MemoryPersistence::new()),
        ContextSettings::default(),
    )
    .await;
    ctx.select_version(&"v1".into()).unwrap();
    ctx.select_latest().unwrap();

    backend.append_version(&doc, version("v3", 3));
    ctx.refresh().await.unwrap();
    assert_eq!(ctx.selected_version_id().unwrap().as_str(), "v3");
}
