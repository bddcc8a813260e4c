use super::{MergeStrategy, Reducer};
use crate::channels::Channel;
use crate::node::NodePartial;
use crate::state::VersionedState;

/// Shallow-merges incoming entries into the context bag: incoming keys
/// overwrite matching keys, everything else is untouched.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MapMerge;

impl Reducer for MapMerge {
    fn strategy(&self) -> MergeStrategy {
        MergeStrategy::ShallowMerge
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(incoming) = &update.context
            && !incoming.is_empty()
        {
            let bag = state.context.get_mut();
            for (k, v) in incoming.iter() {
                bag.insert(k.clone(), v.clone());
            }
            state.context.bump_version();
        }
    }
}
