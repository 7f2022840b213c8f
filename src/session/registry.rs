//! Process-wide session registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::llm::ReasoningEngine;
use crate::storage::SessionStorage;

use super::SessionWorkflow;

/// Thread-safe mapping from session id to workflow instance.
///
/// Owned by the service process and injected into the front ends. Workflows
/// are created lazily on first query; two concurrent creations for the same
/// id converge on a single instance.
pub struct SessionRegistry {
    engine: Arc<dyn ReasoningEngine>,
    storage: Arc<dyn SessionStorage>,
    workflows: RwLock<HashMap<String, Arc<SessionWorkflow>>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("session_count", &self.workflows.read().unwrap().len())
            .finish()
    }
}

impl SessionRegistry {
    /// Create an empty registry binding every workflow to the given engine
    /// and storage collaborators.
    #[must_use]
    pub fn new(engine: Arc<dyn ReasoningEngine>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            engine,
            storage,
            workflows: RwLock::new(HashMap::new()),
        }
    }

    /// Look up the workflow for `session_id`, creating it if unseen.
    ///
    /// An absent or empty id generates a fresh unique identifier. Returns
    /// the effective id together with the workflow.
    pub fn get_or_create(&self, session_id: Option<&str>) -> (String, Arc<SessionWorkflow>) {
        let id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        // Fast path: existing session under the read lock.
        {
            let guard = self.workflows.read().unwrap();
            if let Some(workflow) = guard.get(&id) {
                return (id, Arc::clone(workflow));
            }
        }

        // Slow path: the entry check under the write lock makes a racing
        // creation observe and reuse the first instance.
        let mut guard = self.workflows.write().unwrap();
        let workflow = guard.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(session_id = %id, "Creating session workflow");
            Arc::new(SessionWorkflow::new(
                id.clone(),
                Arc::clone(&self.engine),
                Arc::clone(&self.storage),
            ))
        });
        (id, Arc::clone(workflow))
    }

    /// Snapshot of all known session ids.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.workflows.read().unwrap().keys().cloned().collect()
    }

    /// Delete a session. Returns `false` when the id is unknown; the
    /// registry is left unchanged in that case.
    pub fn delete(&self, session_id: &str) -> bool {
        let removed = self.workflows.write().unwrap().remove(session_id);
        if removed.is_none() {
            return false;
        }

        if let Err(e) = self.storage.delete(session_id) {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Failed to delete persisted session state"
            );
        }
        tracing::info!(session_id = %session_id, "Session deleted");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::EngineReply;
    use crate::storage::MemoryStorage;

    struct StaticEngine;

    #[async_trait::async_trait]
    impl ReasoningEngine for StaticEngine {
        async fn run(&self, _prompt: &str) -> anyhow::Result<EngineReply> {
            Ok(EngineReply {
                answer: "ok".to_string(),
                invocations: vec![],
            })
        }
    }

    fn registry() -> SessionRegistry {
        SessionRegistry::new(Arc::new(StaticEngine), Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_generates_id_when_absent_or_empty() {
        let registry = registry();

        let (id1, _) = registry.get_or_create(None);
        let (id2, _) = registry.get_or_create(Some(""));

        assert!(Uuid::parse_str(&id1).is_ok());
        assert!(Uuid::parse_str(&id2).is_ok());
        assert_ne!(id1, id2);
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let registry = registry();

        let (id, first) = registry.get_or_create(Some("known"));
        let (id2, second) = registry.get_or_create(Some("known"));

        assert_eq!(id, "known");
        assert_eq!(id2, "known");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_delete_semantics() {
        let registry = registry();
        let (_, _wf) = registry.get_or_create(Some("a"));

        assert!(!registry.delete("unknown"));
        assert_eq!(registry.list(), vec!["a".to_string()]);

        assert!(registry.delete("a"));
        assert!(registry.list().is_empty());
        assert!(!registry.delete("a"));
    }

    #[tokio::test]
    async fn test_session_isolation() {
        let registry = registry();

        let (_, a) = registry.get_or_create(Some("a"));
        let (_, b) = registry.get_or_create(Some("b"));

        a.run("only in a", true).await.unwrap();

        assert_eq!(a.turn_count(), 1);
        assert_eq!(b.turn_count(), 0);
    }

    #[test]
    fn test_concurrent_creation_converges() {
        let registry = Arc::new(registry());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_or_create(Some("racy")).1)
            })
            .collect();

        let workflows: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for w in &workflows[1..] {
            assert!(Arc::ptr_eq(&workflows[0], w));
        }
    }
}
