//! Structured error values stored in the state's error channel.
//!
//! A node that catches its own failure records an [`ErrorEvent`] instead of
//! raising; the graph's conditional edges then route the run to a recovery
//! node. The executor produces the same shape for failures nodes did not
//! catch, so downstream consumers see one error vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An error event with scope, failure details, tags, and context.
///
/// # Examples
///
/// ```
/// use stateloom::channels::errors::{ErrorEvent, FaultDetail};
/// use serde_json::json;
///
/// let event = ErrorEvent::node("process", 3, FaultDetail::msg("model invocation failed"))
///     .with_tag("model")
///     .with_context(json!({"provider": "echo"}));
///
/// let json_str = serde_json::to_string(&event).unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorEvent {
    #[serde(default = "chrono::Utc::now")]
    pub when: DateTime<Utc>,
    #[serde(default)]
    pub scope: ErrorScope,
    #[serde(default)]
    pub error: FaultDetail,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
}

impl ErrorEvent {
    /// Create a node-scoped error event.
    pub fn node<S: Into<String>>(kind: S, step: u64, error: FaultDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Node {
                kind: kind.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create a runner-scoped error event (step-limit faults and the like).
    pub fn runner<S: Into<String>>(instance: S, step: u64, error: FaultDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::Runner {
                instance: instance.into(),
                step,
            },
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Create an app-scoped error event.
    pub fn app(error: FaultDetail) -> Self {
        Self {
            when: Utc::now(),
            scope: ErrorScope::App,
            error,
            tags: Vec::new(),
            context: serde_json::Value::Null,
        }
    }

    /// Add a single tag to this error event.
    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add context metadata to this error event.
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }

    /// Returns true if this event carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Where in the system an error event originated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ErrorScope {
    Node {
        kind: String,
        step: u64,
    },
    Runner {
        instance: String,
        step: u64,
    },
    #[default]
    App,
}

/// A failure message with optional cause chain and structured details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaultDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<FaultDetail>>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Default for FaultDetail {
    fn default() -> Self {
        FaultDetail {
            message: String::new(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }
}

impl std::fmt::Display for FaultDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FaultDetail {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|c| c as &dyn std::error::Error)
    }
}

impl FaultDetail {
    pub fn msg<M: Into<String>>(m: M) -> Self {
        FaultDetail {
            message: m.into(),
            cause: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_cause(mut self, cause: FaultDetail) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}
