//! Context-lookup collaborators feeding the context bag.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

/// External data source queried by a context-fetch node.
///
/// "Not found" is not an error: implementations return an empty map for
/// queries they know nothing about and reserve `Err` for transport or
/// backend failure.
#[async_trait]
pub trait ContextLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<FxHashMap<String, Value>, LookupError>;
}

/// Transport/backend failure from a lookup service.
#[derive(Debug, Error, Diagnostic)]
pub enum LookupError {
    #[error("lookup backend '{service}' failed: {message}")]
    #[diagnostic(code(stateloom::assistant::lookup))]
    Backend { service: String, message: String },
}
