use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::EngineResult;
use crate::models::Snapshot;

/// Store holds the current snapshot. Readers get a cheap `Arc` clone and
/// never observe a partial write; writers replace the snapshot wholesale.
#[derive(Clone, Default)]
pub struct Store {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl Store {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// The snapshot as of now
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().await.clone()
    }

    /// Run a mutation against the current snapshot and swap in its result.
    /// The write lock is held for the whole call, so mutations are serialised;
    /// on error the current snapshot is left untouched.
    pub async fn apply<T, F>(&self, mutate: F) -> EngineResult<T>
    where
        F: FnOnce(&Snapshot) -> EngineResult<(Snapshot, T)>,
    {
        let mut guard = self.current.write().await;
        let (next, out) = mutate(&guard)?;
        *guard = Arc::new(next);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{catalog, EngineError};
    use crate::models::CreateTemplateRequest;

    fn req(id: &str) -> CreateTemplateRequest {
        CreateTemplateRequest {
            id: Some(id.to_string()),
            name: id.to_uppercase(),
            description: None,
        }
    }

    #[test]
    fn test_apply_swaps_snapshot() {
        tokio_test::block_on(async {
            let store = Store::default();
            let before = store.snapshot().await;

            let t = store
                .apply(|s| catalog::create_template(s, &req("t1")))
                .await
                .unwrap();
            assert_eq!(t.id, "t1");

            // earlier readers keep their snapshot
            assert!(before.templates.is_empty());
            assert_eq!(store.snapshot().await.templates.len(), 1);
        });
    }

    #[test]
    fn test_failed_apply_leaves_snapshot() {
        tokio_test::block_on(async {
            let store = Store::default();
            store
                .apply(|s| catalog::create_template(s, &req("t1")))
                .await
                .unwrap();

            let err = store
                .apply(|s| catalog::create_template(s, &req("t1")))
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Conflict(_)));
            assert_eq!(store.snapshot().await.templates.len(), 1);
        });
    }
}
