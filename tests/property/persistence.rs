//! Persisted selection records survive storage for any document and id

use proptest::prelude::*;
use scriptsync::persistence::{selection_key, MemoryPersistence, PersistedSelection};
use scriptsync::{DocumentKind, DocumentRef, VersionId};

fn kind_strategy() -> impl Strategy<Value = DocumentKind> {
    prop_oneof![
        Just(DocumentKind::Story),
        Just(DocumentKind::Scene),
        Just(DocumentKind::Script),
    ]
}

#[test]
fn test_store_load_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                "[a-z0-9]{1,12}",
                kind_strategy(),
                proptest::option::of("[0-9]{1,3}"),
                "[A-Za-z0-9_-]{1,24}",
            ),
            |(parent, kind, scene, id)| {
                let doc = match scene {
                    Some(scene) => DocumentRef::with_scene(parent.as_str(), kind, scene.as_str()),
                    None => DocumentRef::new(parent.as_str(), kind),
                };
                let adapter = MemoryPersistence::new();

                PersistedSelection::new(&doc, VersionId::new(id.as_str()))
                    .store(&adapter, &doc)
                    .unwrap();
                let loaded = PersistedSelection::load(&adapter, &doc).unwrap().unwrap();

                prop_assert_eq!(loaded.selected_version_id.as_str(), id.as_str());
                prop_assert_eq!(loaded.parent_id.as_str(), parent.as_str());
                prop_assert_eq!(loaded.document_kind, doc.kind_segment());
                prop_assert_eq!(adapter.len(), 1);
                Ok(())
            },
        )
        .unwrap();
}

/// Values written by older clients were bare ids; they decode to the same record.
#[test]
fn test_bare_id_matches_record_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&("[a-z0-9]{1,12}", "[A-Za-z0-9_-]{1,24}"), |(parent, id)| {
            let doc = DocumentRef::new(parent.as_str(), DocumentKind::Story);
            let record = PersistedSelection::new(&doc, VersionId::new(id.as_str()));

            let from_bare = PersistedSelection::decode(&doc, &id).unwrap();
            let from_json = PersistedSelection::decode(&doc, &record.encode().unwrap()).unwrap();

            prop_assert_eq!(&from_bare, &record);
            prop_assert_eq!(&from_json, &record);
            Ok(())
        })
        .unwrap();
}

/// Distinct scenes never share a key.
#[test]
fn test_scene_keys_distinct_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&("[0-9]{1,4}", "[0-9]{1,4}"), |(a, b)| {
            prop_assume!(a != b);
            let one = DocumentRef::with_scene("p", DocumentKind::Scene, a.as_str());
            let two = DocumentRef::with_scene("p", DocumentKind::Scene, b.as_str());
            prop_assert_ne!(selection_key(&one), selection_key(&two));
            Ok(())
        })
        .unwrap();
}
