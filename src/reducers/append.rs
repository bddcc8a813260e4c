use super::{MergeStrategy, Reducer};
use crate::channels::Channel;
use crate::node::NodePartial;
use crate::state::VersionedState;

/// Appends incoming messages to the conversation log.
///
/// An optional `cap` bounds the channel: after each merge only the most
/// recent `cap` entries are kept, which protects long-lived resumed
/// instances from unbounded growth.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct AddMessages {
    pub cap: Option<usize>,
}

impl AddMessages {
    pub fn capped(cap: usize) -> Self {
        Self { cap: Some(cap) }
    }
}

impl Reducer for AddMessages {
    fn strategy(&self) -> MergeStrategy {
        MergeStrategy::Append
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(incoming) = &update.messages
            && !incoming.is_empty()
        {
            let log = state.messages.get_mut();
            log.extend(incoming.iter().cloned());
            if let Some(cap) = self.cap
                && log.len() > cap
            {
                let overflow = log.len() - cap;
                log.drain(..overflow);
            }
            state.messages.bump_version();
        }
    }
}

/// Appends incoming trace entries to the thoughts log. Same retention rule
/// as [`AddMessages`].
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct AddThoughts {
    pub cap: Option<usize>,
}

impl AddThoughts {
    pub fn capped(cap: usize) -> Self {
        Self { cap: Some(cap) }
    }
}

impl Reducer for AddThoughts {
    fn strategy(&self) -> MergeStrategy {
        MergeStrategy::Append
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(incoming) = &update.thoughts
            && !incoming.is_empty()
        {
            let log = state.thoughts.get_mut();
            log.extend(incoming.iter().cloned());
            if let Some(cap) = self.cap
                && log.len() > cap
            {
                let overflow = log.len() - cap;
                log.drain(..overflow);
            }
            state.thoughts.bump_version();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn append_preserves_insertion_order() {
        let mut state = VersionedState::default();
        let reducer = AddMessages::default();
        reducer.apply(
            &mut state,
            &NodePartial::new().with_messages(vec![Message::user("a")]),
        );
        reducer.apply(
            &mut state,
            &NodePartial::new().with_messages(vec![Message::assistant("b")]),
        );
        let contents: Vec<&str> = state
            .messages
            .get()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["a", "b"]);
        assert_eq!(state.messages.version(), 3);
    }

    #[test]
    fn cap_keeps_the_most_recent_entries() {
        let mut state = VersionedState::default();
        let reducer = AddThoughts::capped(2);
        for entry in ["one", "two", "three"] {
            reducer.apply(
                &mut state,
                &NodePartial::new().with_thoughts(vec![entry.to_string()]),
            );
        }
        assert_eq!(state.thoughts.get(), &vec!["two".to_string(), "three".to_string()]);
    }

    #[test]
    fn absent_channel_is_identity() {
        let mut state = VersionedState::default();
        AddMessages::default().apply(&mut state, &NodePartial::new());
        assert!(state.messages.is_empty());
        assert_eq!(state.messages.version(), 1);
    }
}
