#![allow(dead_code)]

//! Shared stub collaborators for integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use std::sync::Arc;

use stateloom::app::App;
use stateloom::assistant::{
    AssistantBuildError, ChatClient, ClientError, ContextLookup, ConversationStore, HistoryError,
    LookupError, build_assistant_graph,
};

/// Echoes the whole prompt back, so assertions can check that context made
/// it into the model call.
pub struct EchoClient;

#[async_trait]
impl ChatClient for EchoClient {
    async fn invoke(&self, prompt: &str) -> Result<String, ClientError> {
        Ok(format!("echo: {prompt}"))
    }
}

/// Always fails, for exercising the model-failure path.
pub struct FailingClient;

#[async_trait]
impl ChatClient for FailingClient {
    async fn invoke(&self, _prompt: &str) -> Result<String, ClientError> {
        Err(ClientError::Invocation {
            provider: "stub".to_string(),
            message: "model unavailable".to_string(),
        })
    }
}

/// Lookup returning a fixed user record.
pub struct StubUserLookup;

#[async_trait]
impl ContextLookup for StubUserLookup {
    async fn lookup(&self, _query: &str) -> Result<FxHashMap<String, Value>, LookupError> {
        let mut fields = FxHashMap::default();
        fields.insert("userData".to_string(), json!({"balance": 42}));
        Ok(fields)
    }
}

/// Lookup returning a fixed product record.
pub struct StubProductLookup;

#[async_trait]
impl ContextLookup for StubProductLookup {
    async fn lookup(&self, _query: &str) -> Result<FxHashMap<String, Value>, LookupError> {
        let mut fields = FxHashMap::default();
        fields.insert("productData".to_string(), json!({"stock": 7}));
        Ok(fields)
    }
}

/// Lookup whose backend is down.
pub struct FailingLookup;

#[async_trait]
impl ContextLookup for FailingLookup {
    async fn lookup(&self, _query: &str) -> Result<FxHashMap<String, Value>, LookupError> {
        Err(LookupError::Backend {
            service: "stub".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// History store that remembers what was appended.
#[derive(Default)]
pub struct RecordingStore {
    pub entries: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl ConversationStore for RecordingStore {
    async fn append(
        &self,
        identity: &str,
        query: &str,
        response: &str,
        _context: &FxHashMap<String, Value>,
    ) -> Result<(), HistoryError> {
        self.entries.lock().push((
            identity.to_string(),
            query.to_string(),
            response.to_string(),
        ));
        Ok(())
    }
}

/// History store whose backend always fails.
pub struct FailingStore;

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
            message: "history store down".to_string(),
        })
    }
}

/// Assistant wired entirely from healthy stubs.
pub fn stub_assistant() -> Result<App, AssistantBuildError> {
    build_assistant_graph(
        Arc::new(EchoClient),
        Arc::new(StubUserLookup),
        Arc::new(StubProductLookup),
        Arc::new(RecordingStore::default()),
    )
}
