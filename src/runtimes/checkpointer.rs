//! Pluggable persistence for resumable workflow instances.
//!
//! A [`Checkpointer`] stores the full merged state of an instance after each
//! run so a later process can pick the conversation back up. Backends are
//! interchangeable behind the trait; the in-memory implementation lives here,
//! the SQLite one in [`super::checkpointer_sqlite`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::state::VersionedState;

/// Snapshot of a workflow instance as persisted by a checkpointer.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkflowInstance {
    /// Caller-supplied identifier, unique per backend.
    pub instance_id: String,
    /// Full merged state at the time of the save.
    pub state: VersionedState,
    /// Number of node executions the last run performed.
    pub current_step: u64,
    /// First time this instance was saved.
    pub created_at: DateTime<Utc>,
    /// Time of the most recent save.
    pub updated_at: DateTime<Utc>,
}

impl WorkflowInstance {
    /// Builds a fresh instance record stamped with the current time.
    pub fn new(instance_id: impl Into<String>, state: VersionedState, current_step: u64) -> Self {
        let now = Utc::now();
        Self {
            instance_id: instance_id.into(),
            state,
            current_step,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Selects a checkpointer backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointerType {
    /// Volatile storage; state is lost when the process exits.
    InMemory,
    /// Durable SQLite-backed storage.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// Errors surfaced by checkpointer backends.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    #[error("checkpointer backend error: {message}")]
    #[diagnostic(
        code(stateloom::checkpointer::backend),
        help("Check backend connectivity and schema.")
    )]
    Backend { message: String },

    #[error("persisted state could not be decoded: {message}")]
    #[diagnostic(
        code(stateloom::checkpointer::corrupt),
        help("The stored record does not match the current persistence shape.")
    )]
    Corrupt { message: String },

    #[error("checkpointer error: {message}")]
    #[diagnostic(code(stateloom::checkpointer::other))]
    Other { message: String },
}

pub type Result<T> = std::result::Result<T, CheckpointerError>;

/// Persistence contract for workflow instances.
///
/// `save` is an upsert: re-saving an instance replaces its state and
/// `updated_at` while preserving `created_at`.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist the instance, replacing any record with the same id.
    async fn save(&self, instance: WorkflowInstance) -> Result<()>;

    /// Load an instance by id; `Ok(None)` when no record exists.
    async fn load(&self, instance_id: &str) -> Result<Option<WorkflowInstance>>;

    /// List the ids of every persisted instance.
    async fn list_instances(&self) -> Result<Vec<String>>;
}

/// Volatile checkpointer for tests and development.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    instances: RwLock<FxHashMap<String, WorkflowInstance>>,
}

impl InMemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, mut instance: WorkflowInstance) -> Result<()> {
        let mut guard = self.instances.write();
        if let Some(existing) = guard.get(&instance.instance_id) {
            instance.created_at = existing.created_at;
        }
        instance.updated_at = Utc::now();
        guard.insert(instance.instance_id.clone(), instance);
        Ok(())
    }

    async fn load(&self, instance_id: &str) -> Result<Option<WorkflowInstance>> {
        Ok(self.instances.read().get(instance_id).cloned())
    }

    async fn list_instances(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.instances.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let cp = InMemoryCheckpointer::new();
        let state = VersionedState::new_with_query("hello");
        cp.save(WorkflowInstance::new("inst-1", state.clone(), 3))
            .await
            .unwrap();

        let loaded = cp.load("inst-1").await.unwrap().expect("saved instance");
        assert_eq!(loaded.state, state);
        assert_eq!(loaded.current_step, 3);
        assert!(cp.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_preserves_created_at() {
        let cp = InMemoryCheckpointer::new();
        cp.save(WorkflowInstance::new(
            "inst-1",
            VersionedState::default(),
            1,
        ))
        .await
        .unwrap();
        let first = cp.load("inst-1").await.unwrap().unwrap();

        cp.save(WorkflowInstance::new(
            "inst-1",
            VersionedState::new_with_query("again"),
            2,
        ))
        .await
        .unwrap();
        let second = cp.load("inst-1").await.unwrap().unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.current_step, 2);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn list_instances_is_sorted() {
        let cp = InMemoryCheckpointer::new();
        for id in ["b", "a", "c"] {
            cp.save(WorkflowInstance::new(id, VersionedState::default(), 0))
                .await
                .unwrap();
        }
        assert_eq!(cp.list_instances().await.unwrap(), vec!["a", "b", "c"]);
    }
}
