//! Node execution framework.
//!
//! This module provides the core abstractions for executable workflow nodes:
//! the [`Node`] trait, the execution context, the [`NodePartial`] state delta,
//! and node error types.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::channels::errors::ErrorEvent;
use crate::message::Message;
use crate::state::StateSnapshot;
use crate::types::ChannelType;

/// Core trait defining executable workflow nodes.
///
/// A node is a single unit of computation: it receives an immutable snapshot
/// of the merged state plus an execution context, performs its work (possibly
/// calling external collaborators), and returns a [`NodePartial`] describing
/// only the channels it wants to update. It never mutates shared state
/// directly, so a retry could not double-apply a merge.
///
/// # Error Handling
///
/// Nodes handle failure in two ways:
/// 1. **Recoverable**: catch the failure, record it in the partial's error
///    channel, and let the graph's conditional edges route to recovery
/// 2. **Uncaught**: return `Err(NodeError)`; the executor converts it into
///    the same error-channel shape centrally
///
/// # Examples
///
/// ```
/// use stateloom::node::{Node, NodeContext, NodeError, NodePartial};
/// use stateloom::state::StateSnapshot;
/// use stateloom::message::Message;
/// use async_trait::async_trait;
///
/// struct EchoNode;
///
/// #[async_trait]
/// impl Node for EchoNode {
///     async fn run(
///         &self,
///         snapshot: StateSnapshot,
///         ctx: NodeContext,
///     ) -> Result<NodePartial, NodeError> {
///         Ok(NodePartial::new()
///             .with_messages(vec![Message::assistant(&snapshot.query)])
///             .with_thoughts(vec![ctx.trace("echoed the query")]))
///     }
/// }
/// ```
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node with the given state snapshot and context.
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError>;

    /// The channels this node declares it may write.
    ///
    /// Used by graph compilation to verify that a node feeding a conditional
    /// edge actually writes the channel the edge's resolver reads. The
    /// default declares every channel, which disables the check for nodes
    /// that do not care to be precise.
    fn writes(&self) -> &'static [ChannelType] {
        &ChannelType::ALL
    }
}

/// Execution context passed to nodes.
///
/// Identifies where in the run the node is executing; used for trace entries
/// and structured log events.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Identifier of the executing node.
    pub node_id: String,
    /// Current step number within the run (1-based).
    pub step: u64,
}

impl NodeContext {
    /// Build a trace-log entry stamped with this node's identity and step.
    ///
    /// The entry is also emitted as a `tracing` debug event so live logs and
    /// the persisted thoughts channel tell the same story.
    pub fn trace(&self, text: impl Into<String>) -> String {
        let text = text.into();
        tracing::debug!(node = %self.node_id, step = self.step, "{text}");
        format!("[{}#{}] {}", self.node_id, self.step, text)
    }
}

/// Partial state update returned by node execution.
///
/// One optional field per channel; `None` means "leave the channel alone"
/// and the channel's reducer is not invoked for it. Unknown channels are
/// impossible by construction.
#[derive(Clone, Debug, Default)]
pub struct NodePartial {
    /// Messages to append to the conversation log.
    pub messages: Option<Vec<Message>>,
    /// Replacement query text.
    pub query: Option<String>,
    /// Entries to shallow-merge into the context bag.
    pub context: Option<FxHashMap<String, serde_json::Value>>,
    /// Replacement current-step marker.
    pub step: Option<String>,
    /// Error event to record in the error slot.
    pub error: Option<ErrorEvent>,
    /// Trace entries to append to the thoughts log.
    pub thoughts: Option<Vec<String>>,
    /// Replacement identity/session key.
    pub session: Option<String>,
}

impl NodePartial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no channel carries data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_none()
            && self.query.is_none()
            && self.context.is_none()
            && self.step.is_none()
            && self.error.is_none()
            && self.thoughts.is_none()
            && self.session.is_none()
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: FxHashMap<String, serde_json::Value>) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorEvent) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn with_thoughts(mut self, thoughts: Vec<String>) -> Self {
        self.thoughts = Some(thoughts);
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }
}

/// Errors that can escape node execution.
///
/// Returning one of these halts nothing: the executor converts it into an
/// error-channel entry and the run continues along its edges. Nodes that want
/// richer trace messages catch their own failures instead.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(stateloom::node::missing_input),
        help("Check that an upstream node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// External provider or service error.
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(stateloom::node::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(stateloom::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(
        code(stateloom::node::validation),
        help("Check input data format and required fields.")
    )]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_partial_reports_empty() {
        assert!(NodePartial::new().is_empty());
        assert!(!NodePartial::new().with_step("process").is_empty());
    }

    #[test]
    fn trace_entries_carry_node_and_step() {
        let ctx = NodeContext {
            node_id: "router".to_string(),
            step: 2,
        };
        assert_eq!(ctx.trace("routing"), "[router#2] routing");
    }
}
