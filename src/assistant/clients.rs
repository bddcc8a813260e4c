//! Model-client abstraction and the provider registry.
//!
//! Clients are selected through an explicit registry validated at startup:
//! every provider name maps to a constructor function, and asking for an
//! unregistered provider fails before any graph is built rather than deep
//! inside a node.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

use super::config::{AssistantConfig, ConfigError};

/// A language-model client: prompt text in, response text out.
///
/// Implementations own their transport, timeouts, and retries; the engine
/// treats an invocation as an opaque operation that completes or fails.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn invoke(&self, prompt: &str) -> Result<String, ClientError>;
}

/// Errors surfaced by model clients.
#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error("model invocation failed ({provider}): {message}")]
    #[diagnostic(code(stateloom::assistant::client))]
    Invocation { provider: String, message: String },
}

impl std::fmt::Debug for dyn ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChatClient")
    }
}

/// Constructor function producing a client from configuration.
pub type ClientBuilder = Arc<dyn Fn(&AssistantConfig) -> Arc<dyn ChatClient> + Send + Sync>;

/// Maps provider identifiers to client constructors.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    builders: FxHashMap<String, ClientBuilder>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider constructor.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateProvider`] when the name is already taken.
    pub fn register(
        &mut self,
        provider: impl Into<String>,
        builder: ClientBuilder,
    ) -> Result<&mut Self, ConfigError> {
        let provider = provider.into();
        if self.builders.contains_key(&provider) {
            return Err(ConfigError::DuplicateProvider(provider));
        }
        self.builders.insert(provider, builder);
        Ok(self)
    }

    /// Builds the client the configuration names.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownProvider`] listing the registered names, so a
    /// typo in configuration is diagnosable at startup.
    pub fn client_for(&self, config: &AssistantConfig) -> Result<Arc<dyn ChatClient>, ConfigError> {
        match self.builders.get(&config.provider) {
            Some(builder) => Ok(builder(config)),
            None => Err(ConfigError::UnknownProvider {
                provider: config.provider.clone(),
                known: self.providers(),
            }),
        }
    }

    /// Registered provider names, sorted.
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClient(String);

    #[async_trait]
    impl ChatClient for FixedClient {
        async fn invoke(&self, _prompt: &str) -> Result<String, ClientError> {
            Ok(self.0.clone())
        }
    }

    fn fixed(answer: &str) -> ClientBuilder {
        let answer = answer.to_string();
        Arc::new(move |_config| Arc::new(FixedClient(answer.clone())) as Arc<dyn ChatClient>)
    }

    #[tokio::test]
    async fn registry_builds_the_named_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register("echo", fixed("echoed")).unwrap();

        let client = registry
            .client_for(&AssistantConfig::new("echo", "default"))
            .unwrap();
        assert_eq!(client.invoke("hi").await.unwrap(), "echoed");
    }

    #[test]
    fn unknown_provider_lists_known_names() {
        let mut registry = ProviderRegistry::new();
        registry.register("echo", fixed("a")).unwrap();
        registry.register("mock", fixed("b")).unwrap();

        let err = registry
            .client_for(&AssistantConfig::new("gpt", "default"))
            .expect_err("gpt is not registered");
        assert!(matches!(
            err,
            ConfigError::UnknownProvider { ref known, .. } if known == &["echo", "mock"]
        ));
    }

    #[test]
    fn duplicate_provider_is_rejected() {
        let mut registry = ProviderRegistry::new();
        registry.register("echo", fixed("a")).unwrap();
        let err = registry.register("echo", fixed("b")).expect_err("dup");
        assert!(matches!(err, ConfigError::DuplicateProvider(p) if p == "echo"));
    }
}
