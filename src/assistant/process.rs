//! Model-invocation node.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::channels::errors::{ErrorEvent, FaultDetail};
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::{ChannelType, STEP_ERROR};

use super::STEP_COMPLETE;
use super::clients::ChatClient;
use super::history::BestEffortStore;

/// Prompt shape handed to the model client. `{context}` receives the
/// serialized context bag, `{query}` the raw query text.
const PROMPT_TEMPLATE: &str = "\
You are a helpful assistant.

Context:
{context}

User question:
{query}

Answer using the context above when it is relevant.";

/// Invokes the model client with the enriched state and records the answer.
///
/// When the error channel is already set an upstream node has failed; the
/// model is not invoked and the conditional edge routes on the recorded
/// error. A model failure is itself converted to state, so the run keeps
/// flowing toward recovery. After a successful answer the exchange is saved
/// to conversation history when a session key is present; that write is
/// best-effort and can never fail the node.
pub struct ProcessNode {
    client: Arc<dyn ChatClient>,
    history: BestEffortStore,
}

impl ProcessNode {
    pub fn new(client: Arc<dyn ChatClient>, history: BestEffortStore) -> Self {
        Self { client, history }
    }

    fn render_prompt(snapshot: &StateSnapshot) -> Result<String, NodeError> {
        // Sort keys so the serialized context bag is stable across runs.
        let mut entries: Vec<_> = snapshot.context.iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        let context_doc: serde_json::Map<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let context_json = serde_json::to_string_pretty(&Value::Object(context_doc))?;

        Ok(PROMPT_TEMPLATE
            .replace("{context}", &context_json)
            .replace("{query}", &snapshot.query))
    }
}

impl std::fmt::Debug for ProcessNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessNode").finish_non_exhaustive()
    }
}

#[async_trait]
impl Node for ProcessNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        if snapshot.error.is_some() {
            return Ok(NodePartial::new().with_thoughts(vec![
                ctx.trace("skipping model invocation; error already recorded"),
            ]));
        }

        let prompt = Self::render_prompt(&snapshot)?;

        match self.client.invoke(&prompt).await {
            Ok(answer) => {
                if let Some(identity) = &snapshot.session {
                    self.history
                        .record(identity, &snapshot.query, &answer, &snapshot.context)
                        .await;
                }
                Ok(NodePartial::new()
                    .with_thoughts(vec![ctx.trace("model answered; run complete")])
                    .with_messages(vec![Message::assistant(&answer)])
                    .with_step(STEP_COMPLETE))
            }
            Err(err) => Ok(NodePartial::new()
                .with_thoughts(vec![ctx.trace(format!("model invocation failed: {err}"))])
                .with_error(
                    ErrorEvent::node(ctx.node_id.clone(), ctx.step, FaultDetail::msg(err.to_string()))
                        .with_tag("model"),
                )
                .with_step(STEP_ERROR)),
        }
    }

    fn writes(&self) -> &'static [ChannelType] {
        &[
            ChannelType::Message,
            ChannelType::Step,
            ChannelType::Error,
            ChannelType::Thought,
        ]
    }
}
