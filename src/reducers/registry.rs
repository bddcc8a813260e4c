use rustc_hash::FxHashMap;
use std::sync::Arc;

use tracing::instrument;

use crate::node::NodePartial;
use crate::reducers::{
    AddMessages, AddThoughts, MapMerge, Reducer, ReducerError, ReplaceError, ReplaceQuery,
    ReplaceSession, ReplaceStep,
};
use crate::state::VersionedState;
use crate::types::ChannelType;

/// Maps each channel to its single reducer.
///
/// The default registry wires the full schema: append for messages and
/// thoughts, replace for query/step/error/session, shallow merge for the
/// context bag. Registering a second reducer for a channel is a build-time
/// configuration error.
#[derive(Clone)]
pub struct ReducerRegistry {
    reducer_map: FxHashMap<ChannelType, Arc<dyn Reducer>>,
}

impl std::fmt::Debug for ReducerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReducerRegistry")
            .field("channels", &self.reducer_map.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Checks whether a partial actually carries data for the channel, letting
/// the registry skip reducers with nothing to do.
fn channel_guard(channel: ChannelType, partial: &NodePartial) -> bool {
    match channel {
        ChannelType::Message => partial
            .messages
            .as_ref()
            .map(|v| !v.is_empty())
            .unwrap_or(false),
        ChannelType::Query => partial.query.is_some(),
        ChannelType::Context => partial
            .context
            .as_ref()
            .map(|m| !m.is_empty())
            .unwrap_or(false),
        ChannelType::Step => partial.step.is_some(),
        ChannelType::Error => partial.error.is_some(),
        ChannelType::Thought => partial
            .thoughts
            .as_ref()
            .map(|v| !v.is_empty())
            .unwrap_or(false),
        ChannelType::Session => partial.session.is_some(),
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self::with_caps(None, None)
    }
}

impl ReducerRegistry {
    /// Creates an empty registry. Most callers want [`Default`] instead.
    pub fn new() -> Self {
        Self {
            reducer_map: FxHashMap::default(),
        }
    }

    /// Full schema registry with optional retention caps on the append
    /// channels (messages and thoughts keep only their most recent `cap`
    /// entries when set).
    pub fn with_caps(messages_cap: Option<usize>, thoughts_cap: Option<usize>) -> Self {
        let mut registry = Self::new();
        registry
            .register(
                ChannelType::Message,
                Arc::new(AddMessages { cap: messages_cap }),
            )
            .and_then(|r| r.register(ChannelType::Query, Arc::new(ReplaceQuery)))
            .and_then(|r| r.register(ChannelType::Context, Arc::new(MapMerge)))
            .and_then(|r| r.register(ChannelType::Step, Arc::new(ReplaceStep)))
            .and_then(|r| r.register(ChannelType::Error, Arc::new(ReplaceError)))
            .and_then(|r| {
                r.register(
                    ChannelType::Thought,
                    Arc::new(AddThoughts { cap: thoughts_cap }),
                )
            })
            .and_then(|r| r.register(ChannelType::Session, Arc::new(ReplaceSession)))
            .expect("default schema registers each channel exactly once");
        registry
    }

    /// Registers a reducer for a channel.
    ///
    /// # Errors
    ///
    /// [`ReducerError::DuplicateChannel`] when the channel already has a
    /// reducer; each channel takes exactly one.
    pub fn register(
        &mut self,
        channel: ChannelType,
        reducer: Arc<dyn Reducer>,
    ) -> Result<&mut Self, ReducerError> {
        if self.reducer_map.contains_key(&channel) {
            return Err(ReducerError::DuplicateChannel(channel));
        }
        self.reducer_map.insert(channel, reducer);
        Ok(self)
    }

    /// Applies the reducer for one channel if the partial touches it.
    #[instrument(skip(self, state, update), err)]
    pub fn try_update(
        &self,
        channel: ChannelType,
        state: &mut VersionedState,
        update: &NodePartial,
    ) -> Result<(), ReducerError> {
        if !channel_guard(channel, update) {
            return Ok(());
        }
        match self.reducer_map.get(&channel) {
            Some(reducer) => {
                reducer.apply(state, update);
                Ok(())
            }
            None => Err(ReducerError::UnknownChannel(channel)),
        }
    }

    /// Applies a node's partial across every channel, in the fixed order of
    /// [`ChannelType::ALL`] so merges are deterministic.
    #[instrument(skip(self, state, update), err)]
    pub fn apply_all(
        &self,
        state: &mut VersionedState,
        update: &NodePartial,
    ) -> Result<(), ReducerError> {
        for channel in ChannelType::ALL {
            self.try_update(channel, state, update)?;
        }
        Ok(())
    }
}
