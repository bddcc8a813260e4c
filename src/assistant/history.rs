//! Best-effort conversation-history persistence.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// External store of past exchanges, keyed by the caller's identity.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn append(
        &self,
        identity: &str,
        query: &str,
        response: &str,
        context: &FxHashMap<String, Value>,
    ) -> Result<(), HistoryError>;
}

/// Failure from the history backend.
#[derive(Debug, Error, Diagnostic)]
pub enum HistoryError {
    #[error("history store failed: {message}")]
    #[diagnostic(code(stateloom::assistant::history))]
    Backend { message: String },
}

/// Wraps a [`ConversationStore`] so writes can never fail the caller.
///
/// History is cosmetic relative to the run: a failed append is logged and
/// swallowed here, in one place, instead of guarded at every call site.
#[derive(Clone)]
pub struct BestEffortStore {
    inner: Arc<dyn ConversationStore>,
}

impl BestEffortStore {
    pub fn new(inner: Arc<dyn ConversationStore>) -> Self {
        Self { inner }
    }

    /// Append the exchange, logging and swallowing any backend failure.
    pub async fn record(
        &self,
        identity: &str,
        query: &str,
        response: &str,
        context: &FxHashMap<String, Value>,
    ) {
        if let Err(err) = self.inner.append(identity, query, response, context).await {
            tracing::warn!(identity, error = %err, "history append failed; continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl ConversationStore for FailingStore {
        async fn append(
            &self,
            _identity: &str,
            _query: &str,
            _response: &str,
            _context: &FxHashMap<String, Value>,
        ) -> Result<(), HistoryError> {
            Err(HistoryError::Backend {
                message: "down".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn record_swallows_backend_failure() {
        let store = BestEffortStore::new(Arc::new(FailingStore));
        store
            .record("sess", "q", "r", &FxHashMap::default())
            .await;
    }
}
