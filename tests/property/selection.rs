//! Selection reconciliation invariants under arbitrary event sequences

use proptest::prelude::*;
use proptest::sample::Index;
use scriptsync::persistence::MemoryPersistence;
use scriptsync::selection::{SelectMode, SelectionReconciler};
use scriptsync::store::VersionStore;
use scriptsync::{DocumentKind, DocumentRef, Version, VersionId};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Event {
    /// Versions created elsewhere show up on a refresh.
    ExternalRefresh(usize),
    Preview(Index),
    Pin(Index),
    SelectLatest,
    /// A generation settles, with or without producing a version.
    Generation(bool),
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![
        (0usize..3).prop_map(Event::ExternalRefresh),
        any::<Index>().prop_map(Event::Preview),
        any::<Index>().prop_map(Event::Pin),
        Just(Event::SelectLatest),
        any::<bool>().prop_map(Event::Generation),
    ]
}

struct Server {
    versions: Vec<Version>,
}

impl Server {
    fn new() -> Self {
        Self {
            versions: vec![Version::new("v1", 1, "")],
        }
    }

    fn append(&mut self) {
        let n = self.versions.len() as u64 + 1;
        self.versions.push(Version::new(format!("v{}", n), n, ""));
    }

    fn pick(&self, index: &Index) -> VersionId {
        self.versions[index.index(self.versions.len())].id().clone()
    }
}

fn number_of(store: &VersionStore, id: Option<&VersionId>) -> Option<u64> {
    id.and_then(|id| store.get_version(id)).map(Version::version_number)
}

/// Automatic moves never go backward, overridden selections never move on
/// unrelated refreshes, and settled generations land on the new latest.
#[test]
fn test_reconciliation_invariants_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&proptest::collection::vec(event_strategy(), 1..30), |events| {
            let doc = DocumentRef::new("p", DocumentKind::Script);
            let mut server = Server::new();
            let mut store = VersionStore::new();
            store.load(server.versions.clone());
            let mut reconciler =
                SelectionReconciler::new(doc.clone(), Arc::new(MemoryPersistence::new()));
            reconciler.mount(&store);

            for event in events {
                let before = reconciler.pointer().clone();
                let before_number = number_of(&store, before.selected.as_ref());

                match event {
                    Event::ExternalRefresh(added) => {
                        for _ in 0..added {
                            server.append();
                        }
                        store.load(server.versions.clone());
                        reconciler.on_external_refresh(&store);

                        let after = reconciler.pointer();
                        if before.user_override {
                            prop_assert_eq!(&after.selected, &before.selected);
                        } else {
                            prop_assert!(number_of(&store, after.selected.as_ref()) >= before_number);
                        }
                    }
                    Event::Preview(index) => {
                        let id = server.pick(&index);
                        reconciler.on_user_selected(&id, &store, SelectMode::Preview).unwrap();
                        prop_assert_eq!(reconciler.selected(), Some(&id));
                        prop_assert_eq!(
                            reconciler.is_user_override(),
                            store.latest_version_id() != Some(&id)
                        );
                    }
                    Event::Pin(index) => {
                        let id = server.pick(&index);
                        reconciler.on_user_selected(&id, &store, SelectMode::Pin).unwrap();
                        prop_assert_eq!(reconciler.selected(), Some(&id));
                    }
                    Event::SelectLatest => {
                        let latest = store.latest_version_id().cloned().unwrap();
                        reconciler.on_user_selected(&latest, &store, SelectMode::Preview).unwrap();
                        prop_assert!(!reconciler.is_user_override());
                    }
                    Event::Generation(produced) => {
                        reconciler.record_pre_generation(&store);
                        if produced {
                            server.append();
                        }
                        store.load(server.versions.clone());
                        let result = reconciler.on_generation_settled(&store);
                        if produced {
                            prop_assert!(result.is_ok());
                            prop_assert_eq!(reconciler.selected(), store.latest_version_id());
                            prop_assert!(!reconciler.is_user_override());
                        } else {
                            prop_assert!(result.is_err());
                            prop_assert_eq!(reconciler.pointer(), &before);
                        }
                    }
                }
            }
            Ok(())
        })
        .unwrap();
}
