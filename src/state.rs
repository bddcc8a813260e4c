//! State management for the Stateloom workflow framework.
//!
//! State is organized into versioned channels, one per [`ChannelType`]:
//!
//! - **messages**: conversation log (append)
//! - **query**: the current query text (replace)
//! - **context**: free-form context bag (shallow merge)
//! - **step**: the current-step marker conditional edges route on (replace)
//! - **error**: error slot, `None` until a failure is recorded (replace)
//! - **thoughts**: trace log of node decisions (append)
//! - **session**: identity/session key (replace)
//!
//! Every channel always holds a value: defaults seed anything the caller did
//! not provide, so nodes never null-check structure, only value-level absence
//! (the `Option` inside the error and session channels).
//!
//! # Examples
//!
//! ```
//! use stateloom::state::VersionedState;
//! use serde_json::json;
//!
//! let state = VersionedState::builder()
//!     .with_query("What is my account balance?")
//!     .with_session("sess_42")
//!     .with_context_entry("tier", json!("gold"))
//!     .build();
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.query, "What is my account balance?");
//! assert_eq!(snapshot.session.as_deref(), Some("sess_42"));
//! assert!(snapshot.error.is_none());
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::channels::{
    Channel, ContextChannel, ErrorChannel, MessagesChannel, QueryChannel, SessionChannel,
    StepChannel, ThoughtsChannel, errors::ErrorEvent,
};
use crate::message::Message;

/// The main state container for workflow execution.
///
/// Each field is an independently versioned channel; reducers are the only
/// code that writes to them during a run. A run owns its state outright, so
/// concurrent runs never observe each other's channels.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct VersionedState {
    /// Conversation message log.
    pub messages: MessagesChannel,
    /// Current query text.
    pub query: QueryChannel,
    /// Context bag filled by lookup nodes.
    pub context: ContextChannel,
    /// Current-step marker.
    pub step: StepChannel,
    /// Error slot.
    pub error: ErrorChannel,
    /// Trace log of node decisions.
    pub thoughts: ThoughtsChannel,
    /// Identity/session key.
    pub session: SessionChannel,
}

/// Per-channel version counters captured alongside a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelVersions {
    pub messages: u32,
    pub query: u32,
    pub context: u32,
    pub step: u32,
    pub error: u32,
    pub thoughts: u32,
    pub session: u32,
}

/// Immutable snapshot of workflow state at a specific point in time.
///
/// Snapshots are created by [`VersionedState::snapshot()`] and passed to nodes
/// during execution. Nodes treat them as read-only input; all change flows
/// back through [`crate::node::NodePartial`] and the reducer merge.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    pub messages: Vec<Message>,
    pub query: String,
    pub context: FxHashMap<String, Value>,
    pub step: String,
    pub error: Option<ErrorEvent>,
    pub thoughts: Vec<String>,
    pub session: Option<String>,
    pub versions: ChannelVersions,
}

impl StateSnapshot {
    /// The newest assistant-role message, which callers treat as the
    /// response payload of the run.
    #[must_use]
    pub fn latest_response(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.has_role(Message::ASSISTANT))
            .map(|m| m.content.as_str())
    }
}

impl VersionedState {
    /// Creates a state seeded with a user query.
    ///
    /// The query text is stored both as the query channel value and as the
    /// first user message, matching how callers hand a fresh question to the
    /// assistant graph.
    pub fn new_with_query(query: &str) -> Self {
        let mut state = Self::default();
        state.query.set(query.to_string());
        state.messages.get_mut().push(Message::user(query));
        state
    }

    /// Creates a builder for constructing state with a fluent API.
    pub fn builder() -> VersionedStateBuilder {
        VersionedStateBuilder::default()
    }

    /// Creates an immutable snapshot of the current state.
    ///
    /// Clones all channel data; O(n) in channel sizes.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            messages: self.messages.snapshot(),
            query: self.query.snapshot(),
            context: self.context.snapshot(),
            step: self.step.snapshot(),
            error: self.error.snapshot(),
            thoughts: self.thoughts.snapshot(),
            session: self.session.snapshot(),
            versions: ChannelVersions {
                messages: self.messages.version(),
                query: self.query.version(),
                context: self.context.version(),
                step: self.step.version(),
                error: self.error.version(),
                thoughts: self.thoughts.version(),
                session: self.session.version(),
            },
        }
    }

    /// The newest assistant-role message in the log, if any.
    #[must_use]
    pub fn latest_response(&self) -> Option<&str> {
        self.messages
            .get()
            .iter()
            .rev()
            .find(|m| m.has_role(Message::ASSISTANT))
            .map(|m| m.content.as_str())
    }
}

/// Fluent builder for [`VersionedState`].
///
/// Useful when setting up complex initial states for tests or when restoring
/// state from an external source.
#[derive(Debug, Default)]
pub struct VersionedStateBuilder {
    messages: Vec<Message>,
    query: Option<String>,
    context: FxHashMap<String, Value>,
    session: Option<String>,
}

impl VersionedStateBuilder {
    /// Sets the query channel and appends the matching user message.
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self.messages.push(Message::user(query));
        self
    }

    /// Appends a message without touching the query channel.
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the identity/session key.
    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }

    /// Inserts one entry into the context bag.
    pub fn with_context_entry(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    /// Builds the final state. All channels start at version 1.
    pub fn build(self) -> VersionedState {
        let mut state = VersionedState {
            messages: MessagesChannel::new(self.messages, 1),
            context: ContextChannel::new(self.context, 1),
            ..VersionedState::default()
        };
        if let Some(query) = self.query {
            state.query.set(query);
        }
        if let Some(session) = self.session {
            state.session.set(Some(session));
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_give_every_channel_a_value() {
        let snapshot = VersionedState::default().snapshot();
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.query, "");
        assert!(snapshot.context.is_empty());
        assert_eq!(snapshot.step, "");
        assert!(snapshot.error.is_none());
        assert!(snapshot.thoughts.is_empty());
        assert!(snapshot.session.is_none());
        assert_eq!(snapshot.versions.messages, 1);
    }

    #[test]
    fn new_with_query_seeds_message_log() {
        let state = VersionedState::new_with_query("hello");
        let snapshot = state.snapshot();
        assert_eq!(snapshot.query, "hello");
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].role, Message::USER);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut state = VersionedState::new_with_query("hello");
        state
            .context
            .get_mut()
            .insert("k".to_string(), json!("before"));
        let snapshot = state.snapshot();
        state
            .context
            .get_mut()
            .insert("k".to_string(), json!("after"));
        assert_eq!(snapshot.context.get("k"), Some(&json!("before")));
    }

    #[test]
    fn latest_response_picks_newest_assistant_message() {
        let state = VersionedState::builder()
            .with_query("q")
            .with_message(Message::assistant("first"))
            .with_message(Message::user("follow-up"))
            .with_message(Message::assistant("second"))
            .build();
        assert_eq!(state.latest_response(), Some("second"));
        assert_eq!(state.snapshot().latest_response(), Some("second"));
    }
}
