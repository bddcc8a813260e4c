//! Channel-based state storage primitives.
//!
//! A channel pairs a value with a version counter. Reducers bump the version
//! only when a merge actually changes the value, which lets persistence and
//! diagnostics detect movement cheaply.
//!
//! Three storage shapes cover every channel in the schema:
//!
//! - [`VecChannel`]: append-only collections (messages, thoughts)
//! - [`ValueChannel`]: single replaceable values (query, step, error, session)
//! - [`MapChannel`]: the shallow-merged context bag

pub mod errors;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::channels::errors::ErrorEvent;
use crate::message::Message;

/// Common accessors shared by all channel shapes.
pub trait Channel {
    /// The cloned, owned view of this channel's contents.
    type Snapshot;

    /// Clone the current contents.
    fn snapshot(&self) -> Self::Snapshot;

    /// Current version counter. Starts at 1; bumped on every change.
    fn version(&self) -> u32;

    /// Increment the version counter. Called by reducers after a change.
    fn bump_version(&mut self);
}

/// Append-only collection channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VecChannel<T> {
    items: Vec<T>,
    version: u32,
}

impl<T> VecChannel<T> {
    pub fn new(items: Vec<T>, version: u32) -> Self {
        Self { items, version }
    }

    pub fn get(&self) -> &Vec<T> {
        &self.items
    }

    pub fn get_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for VecChannel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            version: 1,
        }
    }
}

impl<T: Clone> Channel for VecChannel<T> {
    type Snapshot = Vec<T>;

    fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

/// Single-value channel with replace semantics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueChannel<T> {
    value: T,
    version: u32,
}

impl<T> ValueChannel<T> {
    pub fn new(value: T, version: u32) -> Self {
        Self { value, version }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Replace the value outright.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: Default> Default for ValueChannel<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            version: 1,
        }
    }
}

impl<T: Clone> Channel for ValueChannel<T> {
    type Snapshot = T;

    fn snapshot(&self) -> T {
        self.value.clone()
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

/// Key-value channel with shallow-merge semantics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapChannel {
    map: FxHashMap<String, Value>,
    version: u32,
}

impl Default for MapChannel {
    fn default() -> Self {
        Self {
            map: FxHashMap::default(),
            version: 1,
        }
    }
}

impl MapChannel {
    pub fn new(map: FxHashMap<String, Value>, version: u32) -> Self {
        Self { map, version }
    }

    pub fn get(&self) -> &FxHashMap<String, Value> {
        &self.map
    }

    pub fn get_mut(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.map
    }
}

impl Channel for MapChannel {
    type Snapshot = FxHashMap<String, Value>;

    fn snapshot(&self) -> FxHashMap<String, Value> {
        self.map.clone()
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

/// Conversation message log (append).
pub type MessagesChannel = VecChannel<Message>;
/// Trace log of node decisions (append).
pub type ThoughtsChannel = VecChannel<String>;
/// Current query text (replace).
pub type QueryChannel = ValueChannel<String>;
/// Current-step marker (replace).
pub type StepChannel = ValueChannel<String>;
/// Error slot (replace, default `None`).
pub type ErrorChannel = ValueChannel<Option<ErrorEvent>>;
/// Identity/session key (replace, default `None`).
pub type SessionChannel = ValueChannel<Option<String>>;
/// Free-form context bag (shallow merge).
pub type ContextChannel = MapChannel;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_channel_snapshot_is_independent() {
        let mut ch: VecChannel<String> = VecChannel::default();
        ch.get_mut().push("a".to_string());
        let snap = ch.snapshot();
        ch.get_mut().push("b".to_string());
        assert_eq!(snap, vec!["a".to_string()]);
        assert_eq!(ch.len(), 2);
    }

    #[test]
    fn value_channel_set_replaces() {
        let mut ch: ValueChannel<String> = ValueChannel::default();
        assert_eq!(ch.get(), "");
        ch.set("query".to_string());
        assert_eq!(ch.get(), "query");
        assert_eq!(ch.version(), 1);
        ch.bump_version();
        assert_eq!(ch.version(), 2);
    }

    #[test]
    fn map_channel_defaults_empty_at_version_one() {
        let ch = MapChannel::default();
        assert!(ch.get().is_empty());
        assert_eq!(ch.version(), 1);
    }
}
