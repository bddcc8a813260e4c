//! State merge strategies.
//!
//! Every channel has exactly one reducer that knows how to fold a node's
//! partial update into the full state. The merge rules are named explicitly
//! by [`MergeStrategy`] so the contract stays testable in isolation from node
//! logic: appends preserve insertion order, replaces are last-writer-wins,
//! and the context bag merges shallowly key by key.

mod append;
mod map_merge;
mod registry;
mod replace;

pub use append::{AddMessages, AddThoughts};
pub use map_merge::MapMerge;
pub use registry::ReducerRegistry;
pub use replace::{ReplaceError, ReplaceQuery, ReplaceSession, ReplaceStep};

use miette::Diagnostic;
use thiserror::Error;

use crate::node::NodePartial;
use crate::state::VersionedState;
use crate::types::ChannelType;

/// How a reducer combines a channel's previous value with incoming data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// New entries are appended after existing ones, preserving order.
    Append,
    /// The incoming value replaces the previous one outright.
    Replace,
    /// Incoming keys overwrite matching keys; other keys are untouched.
    ShallowMerge,
}

/// Unified reducer trait: folds the relevant part of a [`NodePartial`] into
/// the state. `apply` is only called when the partial carries data for the
/// reducer's channel, so absence is identity by construction.
pub trait Reducer: Send + Sync {
    /// The merge rule this reducer implements.
    fn strategy(&self) -> MergeStrategy;

    /// Fold the update into the state, bumping the channel version on change.
    fn apply(&self, state: &mut VersionedState, update: &NodePartial);
}

/// Errors raised while assembling or driving the reducer registry.
#[derive(Debug, Error, Diagnostic)]
pub enum ReducerError {
    /// A second reducer was registered for a channel that already has one.
    #[error("channel '{0}' already has a registered reducer")]
    #[diagnostic(
        code(stateloom::reducers::duplicate_channel),
        help("Each channel takes exactly one reducer; remove the duplicate registration.")
    )]
    DuplicateChannel(ChannelType),

    /// An update targeted a channel with no registered reducer.
    #[error("no reducer registered for channel '{0}'")]
    #[diagnostic(code(stateloom::reducers::unknown_channel))]
    UnknownChannel(ChannelType),
}
