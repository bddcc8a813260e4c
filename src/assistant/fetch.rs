//! Context-fetch nodes, one per external data domain.

use async_trait::async_trait;
use std::sync::Arc;

use crate::channels::errors::{ErrorEvent, FaultDetail};
use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::{ChannelType, STEP_ERROR};

use super::STEP_PROCESS;
use super::lookup::ContextLookup;

/// Calls a lookup collaborator and merges its fields into the context bag.
///
/// On success the step marker goes back to `"process"` so the process node
/// picks the enriched state up. A lookup failure never raises past the node
/// boundary; it is converted into an error-channel entry and the
/// `"error"` step marker.
pub struct ContextFetchNode {
    domain: &'static str,
    lookup: Arc<dyn ContextLookup>,
}

impl ContextFetchNode {
    pub fn new(domain: &'static str, lookup: Arc<dyn ContextLookup>) -> Self {
        Self { domain, lookup }
    }
}

impl std::fmt::Debug for ContextFetchNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextFetchNode")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Node for ContextFetchNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        match self.lookup.lookup(&snapshot.query).await {
            Ok(fields) => Ok(NodePartial::new()
                .with_thoughts(vec![ctx.trace(format!(
                    "merged {} {} field(s) into context",
                    fields.len(),
                    self.domain
                ))])
                .with_context(fields)
                .with_step(STEP_PROCESS)),
            Err(err) => Ok(NodePartial::new()
                .with_thoughts(vec![
                    ctx.trace(format!("{} lookup failed: {err}", self.domain)),
                ])
                .with_error(
                    ErrorEvent::node(ctx.node_id.clone(), ctx.step, FaultDetail::msg(err.to_string()))
                        .with_tag("lookup"),
                )
                .with_step(STEP_ERROR)),
        }
    }

    fn writes(&self) -> &'static [ChannelType] {
        &[
            ChannelType::Context,
            ChannelType::Step,
            ChannelType::Error,
            ChannelType::Thought,
        ]
    }
}
