//! Compiled, executable workflow applications.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use tracing::instrument;

use crate::graphs::ConditionalEdge;
use crate::node::{Node, NodePartial};
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::runtimes::runner::{self, RunnerError};
use crate::runtimes::{RunOptions, RuntimeConfig};
use crate::state::VersionedState;
use crate::types::NodeKind;

/// A compiled workflow graph, ready to execute.
///
/// Produced by [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile)
/// after structural validation, so every edge endpoint is known to resolve.
/// `App` is cheap to clone (nodes are shared behind `Arc`) and each
/// invocation owns its state outright, so one `App` can serve concurrent
/// runs without interference.
///
/// # Examples
///
/// ```rust,no_run
/// use stateloom::graphs::GraphBuilder;
/// use stateloom::node::{Node, NodeContext, NodeError, NodePartial};
/// use stateloom::runtimes::RunOptions;
/// use stateloom::types::NodeKind;
/// use async_trait::async_trait;
///
/// # struct MyNode;
/// # #[async_trait]
/// # impl Node for MyNode {
/// #     async fn run(&self, _: stateloom::state::StateSnapshot, _: NodeContext) -> Result<NodePartial, NodeError> {
/// #         Ok(NodePartial::default())
/// #     }
/// # }
/// #
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("process".into()), MyNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("process".into()))
///     .add_edge(NodeKind::Custom("process".into()), NodeKind::End)
///     .compile()?;
///
/// let initial = NodePartial::new().with_query("Hello");
/// let final_state = app.invoke(initial, RunOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct App {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, NodeKind>,
    conditional_edges: Vec<ConditionalEdge>,
    reducers: ReducerRegistry,
    runtime_config: RuntimeConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Internal (crate) factory to build an App while keeping nodes/edges private.
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, NodeKind>,
        conditional_edges: Vec<ConditionalEdge>,
        reducers: ReducerRegistry,
        runtime_config: RuntimeConfig,
    ) -> Self {
        App {
            nodes,
            edges,
            conditional_edges,
            reducers,
            runtime_config,
        }
    }

    /// The registered node implementations, keyed by `NodeKind`.
    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node>> {
        &self.nodes
    }

    /// The static edges: each source node's single fixed successor.
    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeKind, NodeKind> {
        &self.edges
    }

    /// The conditional edges and their output tables.
    #[must_use]
    pub fn conditional_edges(&self) -> &[ConditionalEdge] {
        &self.conditional_edges
    }

    /// The reducer registry merges are applied through.
    #[must_use]
    pub fn reducers(&self) -> &ReducerRegistry {
        &self.reducers
    }

    /// The runtime configuration this graph was built with.
    #[must_use]
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// Build the starting state for a run by merging `initial` into a
    /// default state through the reducer registry.
    ///
    /// Every channel the caller left out keeps its default, so nodes can
    /// read any channel without structural null-checks.
    pub fn seed_state(&self, initial: &NodePartial) -> Result<VersionedState, ReducerError> {
        let mut state = VersionedState::default();
        self.reducers.apply_all(&mut state, initial)?;
        Ok(state)
    }

    /// Execute the workflow to completion and return the final state.
    ///
    /// The run starts at the node `Start`'s edge names and follows edges
    /// until `End`, the step budget, or a structural fault. Node failures do
    /// not abort the run; they land in the state's error channel.
    ///
    /// For checkpointed, resumable execution use
    /// [`WorkflowRunner`](crate::runtimes::WorkflowRunner) instead.
    ///
    /// # Errors
    ///
    /// [`RunnerError`] for structural faults only: an unmapped conditional
    /// output, a reducer misconfiguration, or a missing node implementation.
    #[instrument(skip(self, initial, options), err)]
    pub async fn invoke(
        &self,
        initial: NodePartial,
        options: RunOptions,
    ) -> Result<VersionedState, RunnerError> {
        let state = self.seed_state(&initial)?;
        let outcome = runner::execute(self, state, &options).await?;
        Ok(outcome.state)
    }
}
