//! Sequential executor loop and the checkpoint-aware instance runner.
//!
//! Execution is one node at a time: run the current node, merge its partial
//! through the reducer registry, then follow the node's single outgoing edge
//! (static or conditional) to find the next node. The loop halts on
//! `NodeKind::End`, on an exhausted step budget, or on a structural fault.
//!
//! Failure containment happens here. A node that returns `Err(NodeError)` does
//! not abort the run: the executor converts it into the same error-channel
//! shape a node would have recorded itself, marks the step channel, and keeps
//! routing so the graph's recovery edges can react.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::instrument;

use crate::app::App;
use crate::channels::errors::{ErrorEvent, FaultDetail};
use crate::node::{NodeContext, NodePartial};
use crate::reducers::ReducerError;
use crate::runtimes::checkpointer::{
    Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer, WorkflowInstance,
};
use crate::runtimes::runtime_config::RunOptions;
use crate::state::VersionedState;
use crate::types::{NodeKind, STEP_ERROR};

/// Errors that abort a run outright.
///
/// Node failures never appear here; they are contained in the error channel.
/// These variants are structural: the graph or its configuration is wrong in
/// a way no recovery edge can route around.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("conditional edge from '{from}' produced unmapped output '{output}'")]
    #[diagnostic(
        code(stateloom::runner::route_unmapped),
        help("Add the output to the edge's target table; tables must cover every resolver output.")
    )]
    RouteUnmapped { from: NodeKind, output: String },

    #[error("edge target '{node}' has no registered implementation")]
    #[diagnostic(code(stateloom::runner::unknown_node))]
    UnknownNode { node: NodeKind },

    #[error("node '{node}' has no outgoing edge")]
    #[diagnostic(
        code(stateloom::runner::missing_edge),
        help("Graph compilation should have rejected this topology.")
    )]
    MissingEdge { node: NodeKind },

    #[error(transparent)]
    #[diagnostic(code(stateloom::runner::reducer))]
    Reducer(#[from] ReducerError),

    #[error(transparent)]
    #[diagnostic(code(stateloom::runner::checkpointer))]
    Checkpointer(#[from] CheckpointerError),
}

/// Outcome of driving the loop: the final state plus the number of node
/// executions it took to get there.
pub(crate) struct RunOutcome {
    pub state: VersionedState,
    pub steps: u64,
}

/// Drive `state` through `app`'s graph until End, budget exhaustion, or a
/// structural fault.
pub(crate) async fn execute(
    app: &App,
    mut state: VersionedState,
    options: &RunOptions,
) -> Result<RunOutcome, RunnerError> {
    let instance_id = app
        .runtime_config()
        .instance_id
        .clone()
        .unwrap_or_default();

    let mut current = app
        .edges()
        .get(&NodeKind::Start)
        .cloned()
        .ok_or(RunnerError::MissingEdge {
            node: NodeKind::Start,
        })?;
    let mut step: u64 = 0;

    loop {
        if current.is_end() {
            tracing::info!(instance = %instance_id, steps = step, "run reached End");
            return Ok(RunOutcome { state, steps: step });
        }

        if step >= options.max_steps {
            // Budget exhaustion halts the run but is not a hard error: the
            // caller gets the state as merged so far, with the fault recorded.
            tracing::warn!(
                instance = %instance_id,
                max_steps = options.max_steps,
                at_node = %current,
                "step budget exhausted"
            );
            let fault = NodePartial::new()
                .with_error(
                    ErrorEvent::runner(
                        instance_id.clone(),
                        step,
                        FaultDetail::msg(format!(
                            "step budget of {} exhausted at node '{current}'",
                            options.max_steps
                        )),
                    )
                    .with_tag("step_limit"),
                )
                .with_thoughts(vec![format!(
                    "[runner#{step}] halted: step budget of {} exhausted at '{current}'",
                    options.max_steps
                )]);
            app.reducers().apply_all(&mut state, &fault)?;
            return Ok(RunOutcome { state, steps: step });
        }
        step += 1;

        let node = app
            .nodes()
            .get(&current)
            .cloned()
            .ok_or_else(|| RunnerError::UnknownNode {
                node: current.clone(),
            })?;

        let snapshot = state.snapshot();
        let ctx = NodeContext {
            node_id: current.to_string(),
            step,
        };

        tracing::debug!(instance = %instance_id, node = %current, step, "executing node");
        let partial = match node.run(snapshot, ctx).await {
            Ok(partial) => partial,
            Err(node_error) => {
                // Containment: an uncaught node failure becomes an
                // error-channel entry, not a run abort.
                tracing::warn!(
                    instance = %instance_id,
                    node = %current,
                    step,
                    error = %node_error,
                    "node failed; recording error event"
                );
                NodePartial::new()
                    .with_error(ErrorEvent::node(
                        current.to_string(),
                        step,
                        FaultDetail::msg(node_error.to_string()),
                    ))
                    .with_step(STEP_ERROR)
                    .with_thoughts(vec![format!(
                        "[{current}#{step}] failed: {node_error}"
                    )])
            }
        };

        app.reducers().apply_all(&mut state, &partial)?;

        // One outgoing edge form per node, guaranteed by compilation.
        current = if let Some(edge) = app
            .conditional_edges()
            .iter()
            .find(|edge| edge.from() == &current)
        {
            let merged = state.snapshot();
            let (output, target) = edge.route(&merged);
            match target {
                Some(next) => {
                    tracing::debug!(
                        instance = %instance_id,
                        from = %current,
                        output = %output,
                        to = %next,
                        "conditional route"
                    );
                    next
                }
                None => {
                    // Unmapped output means the graph's routing contract is
                    // broken; halting beats guessing a destination.
                    return Err(RunnerError::RouteUnmapped {
                        from: current,
                        output,
                    });
                }
            }
        } else {
            app.edges()
                .get(&current)
                .cloned()
                .ok_or(RunnerError::MissingEdge { node: current })?
        };
    }
}

/// How an instance run started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceInit {
    /// No checkpoint existed; the run was seeded from the caller's input.
    Fresh,
    /// A checkpoint was found and its state used as the starting point.
    Resumed { checkpoint_step: u64 },
}

/// Result of a checkpointed instance run.
///
/// A checkpoint save failure does not discard the computed state; it is
/// reported here so the caller can decide whether losing durability matters.
pub struct InstanceReport {
    pub state: VersionedState,
    pub init: InstanceInit,
    pub checkpoint_error: Option<CheckpointerError>,
}

/// Runs workflow instances against a checkpointer so conversations survive
/// process restarts.
pub struct WorkflowRunner {
    app: App,
    checkpointer: Arc<dyn Checkpointer>,
}

impl WorkflowRunner {
    pub fn new(app: App, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self { app, checkpointer }
    }

    /// Construct a runner with a backend chosen by [`CheckpointerType`].
    ///
    /// The SQLite variant resolves its database file from the app's runtime
    /// configuration.
    pub async fn with_checkpointer_type(
        app: App,
        kind: CheckpointerType,
    ) -> Result<Self, CheckpointerError> {
        let checkpointer: Arc<dyn Checkpointer> = match kind {
            CheckpointerType::InMemory => Arc::new(InMemoryCheckpointer::new()),
            #[cfg(feature = "sqlite")]
            CheckpointerType::Sqlite => {
                let db_name = app
                    .runtime_config()
                    .sqlite_db_name
                    .clone()
                    .unwrap_or_else(|| "stateloom.db".to_string());
                let url = format!("sqlite://{db_name}?mode=rwc");
                Arc::new(super::checkpointer_sqlite::SqliteCheckpointer::connect(&url).await?)
            }
        };
        Ok(Self::new(app, checkpointer))
    }

    /// Run one instance to completion, resuming from its checkpoint when one
    /// exists and saving the merged state afterwards.
    ///
    /// `initial` seeds the state only for fresh instances; a resumed instance
    /// continues from its persisted state and `initial` is ignored.
    #[instrument(skip(self, initial, options), err)]
    pub async fn run_instance(
        &self,
        instance_id: &str,
        initial: NodePartial,
        options: &RunOptions,
    ) -> Result<InstanceReport, RunnerError> {
        let (state, init) = match self.checkpointer.load(instance_id).await? {
            Some(instance) => {
                tracing::info!(
                    instance = instance_id,
                    checkpoint_step = instance.current_step,
                    "resuming instance from checkpoint"
                );
                (
                    instance.state,
                    InstanceInit::Resumed {
                        checkpoint_step: instance.current_step,
                    },
                )
            }
            None => (self.app.seed_state(&initial)?, InstanceInit::Fresh),
        };

        let outcome = execute(&self.app, state, options).await?;

        // Durability is best-effort: a failed save must not discard the
        // computed state.
        let checkpoint_error = match self
            .checkpointer
            .save(WorkflowInstance::new(
                instance_id,
                outcome.state.clone(),
                outcome.steps,
            ))
            .await
        {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    instance = instance_id,
                    error = %err,
                    "checkpoint save failed; returning state without durability"
                );
                Some(err)
            }
        };

        Ok(InstanceReport {
            state: outcome.state,
            init,
            checkpoint_error,
        })
    }

    /// Ids of every instance the backend knows about.
    pub async fn list_instances(&self) -> Result<Vec<String>, RunnerError> {
        Ok(self.checkpointer.list_instances().await?)
    }
}
