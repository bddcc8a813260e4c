/*!
Persistence primitives for serializing/deserializing runtime state and
workflow instances (used by the SQLite checkpointer and any future
persistent backends).

Design goals:
- Explicit serde-friendly structs decoupled from the in-memory channel
  representations.
- Conversion logic localized in From / TryFrom impls so checkpointer
  code stays lean and declarative.

This module performs no I/O. It is pure data transformation and
(de)serialization glue.
*/

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::channels::{
    Channel, ContextChannel, ErrorChannel, MessagesChannel, QueryChannel, SessionChannel,
    StepChannel, ThoughtsChannel, errors::ErrorEvent,
};
use crate::message::Message;
use crate::runtimes::checkpointer::WorkflowInstance;
use crate::state::VersionedState;

/// Persisted form of an append channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedVecChannel<T> {
    pub version: u32,
    #[serde(default)]
    pub items: Vec<T>,
}

/// Persisted form of a replace channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedValueChannel<T> {
    pub version: u32,
    pub value: T,
}

/// Persisted form of the shallow-merged context bag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedMapChannel {
    pub version: u32,
    #[serde(default)]
    pub map: FxHashMap<String, Value>,
}

/// Complete persisted shape of the in-memory [`VersionedState`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub messages: PersistedVecChannel<Message>,
    pub query: PersistedValueChannel<String>,
    pub context: PersistedMapChannel,
    pub step: PersistedValueChannel<String>,
    pub error: PersistedValueChannel<Option<ErrorEvent>>,
    pub thoughts: PersistedVecChannel<String>,
    pub session: PersistedValueChannel<Option<String>>,
}

/// Full persisted workflow-instance record.
///
/// Timestamps are stored as RFC3339 strings to keep `chrono::DateTime` out of
/// the serialized shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedInstance {
    pub instance_id: String,
    pub state: PersistedState,
    pub current_step: u64,
    pub created_at: String,
    pub updated_at: String,
}

/// Conversion and serialization errors for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(stateloom::persistence::serde),
        help("Ensure the JSON structure matches the Persisted* types.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid timestamp '{value}' in field {field}")]
    #[diagnostic(
        code(stateloom::persistence::timestamp),
        help("Timestamps are stored as RFC3339 strings.")
    )]
    Timestamp { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

impl PersistedState {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|source| PersistenceError::Serde { source })
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|source| PersistenceError::Serde { source })
    }
}

/* ---------- VersionedState <-> PersistedState ---------- */

impl From<&VersionedState> for PersistedState {
    fn from(s: &VersionedState) -> Self {
        PersistedState {
            messages: PersistedVecChannel {
                version: s.messages.version(),
                items: s.messages.snapshot(),
            },
            query: PersistedValueChannel {
                version: s.query.version(),
                value: s.query.snapshot(),
            },
            context: PersistedMapChannel {
                version: s.context.version(),
                map: s.context.snapshot(),
            },
            step: PersistedValueChannel {
                version: s.step.version(),
                value: s.step.snapshot(),
            },
            error: PersistedValueChannel {
                version: s.error.version(),
                value: s.error.snapshot(),
            },
            thoughts: PersistedVecChannel {
                version: s.thoughts.version(),
                items: s.thoughts.snapshot(),
            },
            session: PersistedValueChannel {
                version: s.session.version(),
                value: s.session.snapshot(),
            },
        }
    }
}

impl From<PersistedState> for VersionedState {
    fn from(p: PersistedState) -> Self {
        VersionedState {
            messages: MessagesChannel::new(p.messages.items, p.messages.version),
            query: QueryChannel::new(p.query.value, p.query.version),
            context: ContextChannel::new(p.context.map, p.context.version),
            step: StepChannel::new(p.step.value, p.step.version),
            error: ErrorChannel::new(p.error.value, p.error.version),
            thoughts: ThoughtsChannel::new(p.thoughts.items, p.thoughts.version),
            session: SessionChannel::new(p.session.value, p.session.version),
        }
    }
}

/* ---------- WorkflowInstance <-> PersistedInstance ---------- */

impl From<&WorkflowInstance> for PersistedInstance {
    fn from(instance: &WorkflowInstance) -> Self {
        PersistedInstance {
            instance_id: instance.instance_id.clone(),
            state: PersistedState::from(&instance.state),
            current_step: instance.current_step,
            created_at: instance.created_at.to_rfc3339(),
            updated_at: instance.updated_at.to_rfc3339(),
        }
    }
}

impl TryFrom<PersistedInstance> for WorkflowInstance {
    type Error = PersistenceError;

    fn try_from(p: PersistedInstance) -> Result<Self> {
        Ok(WorkflowInstance {
            instance_id: p.instance_id,
            state: VersionedState::from(p.state),
            current_step: p.current_step,
            created_at: parse_rfc3339("created_at", &p.created_at)?,
            updated_at: parse_rfc3339("updated_at", &p.updated_at)?,
        })
    }
}

fn parse_rfc3339(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| PersistenceError::Timestamp {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::errors::FaultDetail;
    use serde_json::json;

    #[test]
    fn state_survives_persistence_roundtrip() {
        let mut state = VersionedState::builder()
            .with_query("what is my balance")
            .with_session("sess-9")
            .with_context_entry("balance", json!(42))
            .build();
        state.step.set("process".to_string());
        state.step.bump_version();
        state
            .error
            .set(Some(ErrorEvent::app(FaultDetail::msg("boom"))));

        let persisted = PersistedState::from(&state);
        let json_str = persisted.to_json_string().unwrap();
        let restored = VersionedState::from(PersistedState::from_json_str(&json_str).unwrap());
        assert_eq!(restored, state);
    }

    #[test]
    fn instance_timestamps_roundtrip_through_rfc3339() {
        let instance = WorkflowInstance::new("inst", VersionedState::default(), 4);
        let persisted = PersistedInstance::from(&instance);
        let restored = WorkflowInstance::try_from(persisted).unwrap();
        assert_eq!(restored.instance_id, "inst");
        assert_eq!(restored.current_step, 4);
        assert_eq!(
            restored.created_at.timestamp_millis(),
            instance.created_at.timestamp_millis()
        );
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let mut persisted =
            PersistedInstance::from(&WorkflowInstance::new("inst", VersionedState::default(), 0));
        persisted.created_at = "not a timestamp".to_string();
        let err = WorkflowInstance::try_from(persisted).expect_err("invalid timestamp");
        assert!(matches!(
            err,
            PersistenceError::Timestamp {
                field: "created_at",
                ..
            }
        ));
    }
}
