//! Environment-driven configuration for the assistant's model client.

use miette::Diagnostic;
use thiserror::Error;

/// Model-client settings, usually loaded from the environment.
///
/// The provider name selects a client constructor from the
/// [`ProviderRegistry`](super::clients::ProviderRegistry); the remaining
/// fields are passed through to whichever client gets built, so swapping
/// providers never touches node logic.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantConfig {
    /// Provider identifier, matched against the registry at startup.
    pub provider: String,
    /// Model name handed to the provider.
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl AssistantConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Load configuration from the environment (`.env` files honored).
    ///
    /// - `STATELOOM_PROVIDER` (required)
    /// - `STATELOOM_MODEL` (default `"default"`)
    /// - `STATELOOM_TEMPERATURE`, `STATELOOM_MAX_TOKENS` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let provider =
            std::env::var("STATELOOM_PROVIDER").map_err(|_| ConfigError::Missing {
                var: "STATELOOM_PROVIDER",
            })?;
        let model =
            std::env::var("STATELOOM_MODEL").unwrap_or_else(|_| "default".to_string());
        let temperature = parse_optional("STATELOOM_TEMPERATURE")?;
        let max_tokens = parse_optional("STATELOOM_MAX_TOKENS")?;
        Ok(Self {
            provider,
            model,
            temperature,
            max_tokens,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(None),
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

/// Configuration and provider-registry errors, all surfaced at startup.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing environment variable {var}")]
    #[diagnostic(
        code(stateloom::assistant::config_missing),
        help("Set the variable in the environment or a .env file.")
    )]
    Missing { var: &'static str },

    #[error("invalid value '{value}' for {var}")]
    #[diagnostic(code(stateloom::assistant::config_invalid))]
    Invalid { var: &'static str, value: String },

    #[error("unknown provider '{provider}' (registered: {known:?})")]
    #[diagnostic(
        code(stateloom::assistant::unknown_provider),
        help("Register the provider before building the assistant.")
    )]
    UnknownProvider { provider: String, known: Vec<String> },

    #[error("provider '{0}' registered more than once")]
    #[diagnostic(code(stateloom::assistant::duplicate_provider))]
    DuplicateProvider(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_leaves_tuning_unset() {
        let config = AssistantConfig::new("echo", "default");
        assert_eq!(config.provider, "echo");
        assert!(config.temperature.is_none());
        assert!(config.max_tokens.is_none());
    }
}
