//! Canned-response nodes: assistance clarification and the error handler.

use async_trait::async_trait;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::ChannelType;

use super::{STEP_COMPLETE, STEP_ERROR_HANDLED};

/// Fixed clarification shown for explicit help-seeking queries.
pub const CLARIFICATION: &str = "I can help with questions about your account or our products. \
Could you tell me a bit more about what you need?";

/// User-safe apology written by the error handler. Raw failure details stay
/// in the error channel; this text is all the user ever sees.
pub const APOLOGY: &str = "I'm sorry, something went wrong while handling your request. \
Please try again in a moment.";

/// Writes the fixed clarification response. No external collaborators.
#[derive(Debug, Clone, Default)]
pub struct AssistanceNode;

#[async_trait]
impl Node for AssistanceNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new()
            .with_thoughts(vec![ctx.trace("returned canned clarification")])
            .with_messages(vec![Message::assistant(CLARIFICATION)])
            .with_step(STEP_COMPLETE))
    }

    fn writes(&self) -> &'static [ChannelType] {
        &[ChannelType::Message, ChannelType::Step, ChannelType::Thought]
    }
}

/// Terminal-bound recovery node: replaces the visible response with the
/// apology and marks the run error-handled.
#[derive(Debug, Clone, Default)]
pub struct ErrorNode;

#[async_trait]
impl Node for ErrorNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new()
            .with_thoughts(vec![ctx.trace("converted recorded error to user apology")])
            .with_messages(vec![Message::assistant(APOLOGY)])
            .with_step(STEP_ERROR_HANDLED))
    }

    fn writes(&self) -> &'static [ChannelType] {
        &[ChannelType::Message, ChannelType::Step, ChannelType::Thought]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_node_overwrites_the_visible_response() {
        let ctx = NodeContext {
            node_id: "error_handler".to_string(),
            step: 4,
        };
        let snapshot = crate::state::VersionedState::new_with_query("q").snapshot();
        let partial = ErrorNode.run(snapshot, ctx).await.unwrap();
        assert_eq!(partial.step.as_deref(), Some(STEP_ERROR_HANDLED));
        assert_eq!(partial.messages.unwrap()[0].content, APOLOGY);
    }
}
