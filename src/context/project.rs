//! Project-level composition root.
//!
//! Shares one backend and one persistence adapter between every document of
//! a parent project and caches the mounted contexts.

use super::ContentContext;
use crate::backend::ContentBackend;
use crate::config::GenerationConfig;
use crate::error::CoordinatorError;
use crate::persistence::PersistenceAdapter;
use crate::selection::SelectionChange;
use crate::types::{DocumentKind, DocumentRef, ParentId, SceneKey};
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct ProjectContexts {
    parent_id: ParentId,
    backend: Arc<dyn ContentBackend>,
    persistence: Arc<dyn PersistenceAdapter>,
    generation: GenerationConfig,
    contexts: Mutex<HashMap<DocumentRef, Arc<ContentContext>>>,
}

impl ProjectContexts {
    pub fn new(
        parent_id: impl Into<ParentId>,
        backend: Arc<dyn ContentBackend>,
        persistence: Arc<dyn PersistenceAdapter>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            backend,
            persistence,
            generation,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    pub fn parent_id(&self) -> &ParentId {
        &self.parent_id
    }

    fn document(&self, kind: DocumentKind, scene_key: Option<SceneKey>) -> DocumentRef {
        match scene_key {
            Some(key) => DocumentRef::with_scene(self.parent_id.clone(), kind, key),
            None => DocumentRef::new(self.parent_id.clone(), kind),
        }
    }

    /// Context for a document, mounting it on first use.
    pub async fn open(
        &self,
        kind: DocumentKind,
        scene_key: Option<SceneKey>,
    ) -> Arc<ContentContext> {
        let document = self.document(kind, scene_key);
        if let Some(existing) = self.contexts.lock().get(&document) {
            return Arc::clone(existing);
        }

        let mounted = Arc::new(
            ContentContext::mount(
                document.clone(),
                Arc::clone(&self.backend),
                Arc::clone(&self.persistence),
                self.generation.settings_for(kind),
            )
            .await,
        );
        // A concurrent open may have mounted the same document meanwhile.
        Arc::clone(
            self.contexts
                .lock()
                .entry(document)
                .or_insert(mounted),
        )
    }

    pub async fn story(&self) -> Arc<ContentContext> {
        self.open(DocumentKind::Story, None).await
    }

    pub async fn scene(&self, key: impl Into<SceneKey>) -> Arc<ContentContext> {
        self.open(DocumentKind::Scene, Some(key.into())).await
    }

    pub async fn script(&self, key: impl Into<SceneKey>) -> Arc<ContentContext> {
        self.open(DocumentKind::Script, Some(key.into())).await
    }

    pub fn open_documents(&self) -> Vec<DocumentRef> {
        self.contexts.lock().keys().cloned().collect()
    }

    /// Refresh every open document concurrently.
    pub async fn refresh_all(&self) -> Vec<(DocumentRef, Result<SelectionChange, CoordinatorError>)> {
        let contexts: Vec<Arc<ContentContext>> = self.contexts.lock().values().cloned().collect();
        let results = join_all(contexts.iter().map(|ctx| ctx.refresh())).await;
        contexts
            .iter()
            .map(|ctx| ctx.document().clone())
            .zip(results)
            .collect()
    }

    /// Forget a document's context, stopping any polling it owns.
    pub fn close(&self, document: &DocumentRef) -> bool {
        match self.contexts.lock().remove(document) {
            Some(ctx) => {
                ctx.cancel_generation();
                info!(document = %document, "Closed content context");
                true
            }
            None => false,
        }
    }

    pub fn close_all(&self) {
        let drained: Vec<_> = self.contexts.lock().drain().collect();
        for (_, ctx) in drained {
            ctx.cancel_generation();
        }
    }
}
