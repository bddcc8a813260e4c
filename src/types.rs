//! Core types for the Stateloom workflow framework.
//!
//! This module defines the fundamental types used throughout the system for
//! identifying nodes and channels in workflow graphs.
//!
//! # Key Types
//!
//! - [`NodeKind`]: Identifies nodes in a workflow graph, including the virtual
//!   `Start`/`End` sentinels
//! - [`ChannelType`]: Identifies the state channels a run carries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Step marker value the executor writes when it converts an uncaught node
/// failure into state. Graphs that recover from node failures route on it.
pub const STEP_ERROR: &str = "error";

/// Identifies a node within a workflow graph.
///
/// `NodeKind` serves as a unique identifier for nodes in the execution graph.
/// `Start` and `End` are virtual sentinels: they are never executed and exist
/// only so edges can express where a run enters and leaves the graph.
///
/// # Persistence
///
/// `NodeKind` supports serialization for checkpointing through both serde and
/// the [`encode`](Self::encode)/[`decode`](Self::decode) methods.
///
/// # Examples
///
/// ```
/// use stateloom::types::NodeKind;
///
/// let router = NodeKind::Custom("router".to_string());
/// assert_eq!(router.encode(), "Custom:router");
/// assert_eq!(NodeKind::decode("Custom:router"), router);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual entry sentinel. Has no implementation; the single static edge
    /// leaving it names the first node of every run.
    Start,

    /// Virtual terminal sentinel. Reaching it ends the run successfully.
    End,

    /// Custom node identified by a user-defined string, unique per graph.
    Custom(String),
}

impl NodeKind {
    /// Encode a NodeKind into its persisted string form.
    ///
    /// - `Start` → `"Start"`
    /// - `End` → `"End"`
    /// - `Custom("X")` → `"Custom:X"`
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeKind::Start => "Start".to_string(),
            NodeKind::End => "End".to_string(),
            NodeKind::Custom(s) => format!("Custom:{s}"),
        }
    }

    /// Decode a persisted string form back into a NodeKind.
    ///
    /// Unrecognized formats fall back to `Custom(s)` for forward
    /// compatibility.
    pub fn decode(s: &str) -> Self {
        if s == "Start" {
            NodeKind::Start
        } else if s == "End" {
            NodeKind::End
        } else if let Some(rest) = s.strip_prefix("Custom:") {
            NodeKind::Custom(rest.to_string())
        } else {
            NodeKind::Custom(s.to_string())
        }
    }

    /// Returns `true` if this is the [`Start`](Self::Start) sentinel.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }

    /// Returns `true` if this is the [`End`](Self::End) sentinel.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is a custom node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

// Developer experience: allow string literals where a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "Start" => NodeKind::Start,
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}

/// Identifies a state channel.
///
/// Every run carries one value per channel; each channel has its own merge
/// strategy (see [`crate::reducers::MergeStrategy`]) and default value, so a
/// node may read any channel without structural null-checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// Append-only conversation message log.
    Message,
    /// The current query text (replace).
    Query,
    /// Free-form context bag merged shallowly from lookup results.
    Context,
    /// The current-step marker conditional edges route on (replace).
    Step,
    /// Error slot; `None` until a node or the executor records a failure.
    Error,
    /// Append-only trace log of node decisions.
    Thought,
    /// Identity/session key for the run (replace).
    Session,
}

impl ChannelType {
    /// All channels, in the deterministic order reducers are applied.
    pub const ALL: [ChannelType; 7] = [
        ChannelType::Message,
        ChannelType::Query,
        ChannelType::Context,
        ChannelType::Step,
        ChannelType::Error,
        ChannelType::Thought,
        ChannelType::Session,
    ];
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Query => write!(f, "query"),
            Self::Context => write!(f, "context"),
            Self::Step => write!(f, "step"),
            Self::Error => write!(f, "error"),
            Self::Thought => write!(f, "thought"),
            Self::Session => write!(f, "session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodekind_encode_decode_roundtrip() {
        for kind in [
            NodeKind::Start,
            NodeKind::End,
            NodeKind::Custom("router".into()),
        ] {
            assert_eq!(NodeKind::decode(&kind.encode()), kind);
        }
    }

    #[test]
    fn test_nodekind_decode_forward_compat() {
        assert_eq!(
            NodeKind::decode("Unknown"),
            NodeKind::Custom("Unknown".to_string())
        );
    }

    #[test]
    fn test_channel_order_is_stable() {
        assert_eq!(ChannelType::ALL.len(), 7);
        assert_eq!(ChannelType::ALL[0], ChannelType::Message);
        assert_eq!(ChannelType::ALL[6], ChannelType::Session);
    }
}
