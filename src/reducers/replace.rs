use super::{MergeStrategy, Reducer};
use crate::channels::Channel;
use crate::node::NodePartial;
use crate::state::VersionedState;

/// Replaces the query text.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReplaceQuery;

impl Reducer for ReplaceQuery {
    fn strategy(&self) -> MergeStrategy {
        MergeStrategy::Replace
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(query) = &update.query {
            state.query.set(query.clone());
            state.query.bump_version();
        }
    }
}

/// Replaces the current-step marker.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReplaceStep;

impl Reducer for ReplaceStep {
    fn strategy(&self) -> MergeStrategy {
        MergeStrategy::Replace
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(step) = &update.step {
            state.step.set(step.clone());
            state.step.bump_version();
        }
    }
}

/// Records an error event in the error slot, replacing any prior one.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReplaceError;

impl Reducer for ReplaceError {
    fn strategy(&self) -> MergeStrategy {
        MergeStrategy::Replace
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(event) = &update.error {
            state.error.set(Some(event.clone()));
            state.error.bump_version();
        }
    }
}

/// Replaces the identity/session key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReplaceSession;

impl Reducer for ReplaceSession {
    fn strategy(&self) -> MergeStrategy {
        MergeStrategy::Replace
    }

    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(session) = &update.session {
            state.session.set(Some(session.clone()));
            state.session.bump_version();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::errors::{ErrorEvent, FaultDetail};

    #[test]
    fn replace_is_last_writer_wins() {
        let mut state = VersionedState::default();
        ReplaceStep.apply(&mut state, &NodePartial::new().with_step("process"));
        ReplaceStep.apply(&mut state, &NodePartial::new().with_step("complete"));
        assert_eq!(state.step.get(), "complete");
        assert_eq!(state.step.version(), 3);
    }

    #[test]
    fn error_slot_holds_the_newest_event() {
        let mut state = VersionedState::default();
        ReplaceError.apply(
            &mut state,
            &NodePartial::new().with_error(ErrorEvent::app(FaultDetail::msg("first"))),
        );
        ReplaceError.apply(
            &mut state,
            &NodePartial::new().with_error(ErrorEvent::app(FaultDetail::msg("second"))),
        );
        assert_eq!(
            state.error.get().as_ref().map(|e| e.error.message.as_str()),
            Some("second")
        );
    }

    #[test]
    fn absent_value_leaves_channel_untouched() {
        let mut state = VersionedState::default();
        state.query.set("keep me".to_string());
        ReplaceQuery.apply(&mut state, &NodePartial::new());
        assert_eq!(state.query.get(), "keep me");
        assert_eq!(state.query.version(), 1);
    }
}
