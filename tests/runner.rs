//! Executor loop tests: budget, failure containment, structural faults,
//! and run isolation.

use async_trait::async_trait;
use std::sync::Arc;

use stateloom::graphs::{EdgeResolver, GraphBuilder};
use stateloom::message::Message;
use stateloom::node::{Node, NodeContext, NodeError, NodePartial};
use stateloom::runtimes::{RunOptions, RunnerError};
use stateloom::state::StateSnapshot;
use stateloom::types::{ChannelType, NodeKind, STEP_ERROR};

mod common;

fn custom(name: &str) -> NodeKind {
    NodeKind::Custom(name.to_string())
}

/// Writes a fixed step marker and a trace entry.
struct StepNode(&'static str);

#[async_trait]
impl Node for StepNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Ok(NodePartial::new()
            .with_step(self.0)
            .with_thoughts(vec![ctx.trace("stepped")]))
    }
}

/// Always returns an uncaught error.
struct PanickyNode;

#[async_trait]
impl Node for PanickyNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        Err(NodeError::Provider {
            provider: "stub",
            message: "boom".to_string(),
        })
    }
}

#[tokio::test]
async fn rigged_cycle_halts_within_the_budget() {
    // "spin" routes back to itself forever.
    let resolver: EdgeResolver = Arc::new(|snapshot| snapshot.step.clone());
    let app = GraphBuilder::new()
        .add_node(custom("spin"), StepNode("again"))
        .add_edge(NodeKind::Start, custom("spin"))
        .add_conditional_edge(
            custom("spin"),
            ChannelType::Step,
            resolver,
            [("again", custom("spin")), ("done", NodeKind::End)],
        )
        .compile()
        .unwrap();

    let state = app
        .invoke(NodePartial::new(), RunOptions::default().with_max_steps(4))
        .await
        .expect("budget exhaustion is not a hard error");

    let snapshot = state.snapshot();
    // Exactly max_steps node executions happened.
    assert_eq!(snapshot.thoughts.iter().filter(|t| t.contains("stepped")).count(), 4);
    let event = snapshot.error.expect("step-limit fault recorded");
    assert!(event.has_tag("step_limit"));
}

#[tokio::test]
async fn unmapped_resolver_output_is_a_structural_fault() {
    let resolver: EdgeResolver = Arc::new(|snapshot| snapshot.step.clone());
    let app = GraphBuilder::new()
        .add_node(custom("triage"), StepNode("surprise"))
        .add_edge(NodeKind::Start, custom("triage"))
        .add_conditional_edge(
            custom("triage"),
            ChannelType::Step,
            resolver,
            [("expected", NodeKind::End)],
        )
        .compile()
        .unwrap();

    let err = app
        .invoke(NodePartial::new(), RunOptions::default())
        .await
        .expect_err("non-exhaustive table must halt the run");
    assert!(matches!(
        err,
        RunnerError::RouteUnmapped { ref output, .. } if output == "surprise"
    ));
}

#[tokio::test]
async fn uncaught_node_error_lands_in_the_error_channel() {
    let app = GraphBuilder::new()
        .add_node(custom("fragile"), PanickyNode)
        .add_edge(NodeKind::Start, custom("fragile"))
        .add_edge(custom("fragile"), NodeKind::End)
        .compile()
        .unwrap();

    let state = app
        .invoke(NodePartial::new(), RunOptions::default())
        .await
        .expect("node failure must not abort the run");

    let snapshot = state.snapshot();
    assert_eq!(snapshot.step, STEP_ERROR);
    let event = snapshot.error.expect("converted error event");
    assert!(event.error.message.contains("boom"));
}

#[tokio::test]
async fn initial_partial_seeds_the_state() {
    let app = GraphBuilder::new()
        .add_node(custom("noop"), StepNode("done"))
        .add_edge(NodeKind::Start, custom("noop"))
        .add_edge(custom("noop"), NodeKind::End)
        .compile()
        .unwrap();

    let initial = NodePartial::new()
        .with_query("seeded query")
        .with_messages(vec![Message::user("seeded query")])
        .with_session("sess-7");
    let state = app.invoke(initial, RunOptions::default()).await.unwrap();

    let snapshot = state.snapshot();
    assert_eq!(snapshot.query, "seeded query");
    assert_eq!(snapshot.session.as_deref(), Some("sess-7"));
    assert_eq!(snapshot.messages.len(), 1);
}

#[tokio::test]
async fn concurrent_runs_never_share_state() {
    let app = common::stub_assistant().unwrap();

    let a = app.invoke(
        NodePartial::new()
            .with_query("What is my account balance?")
            .with_messages(vec![Message::user("What is my account balance?")]),
        RunOptions::default(),
    );
    let b = app.invoke(
        NodePartial::new()
            .with_query("Is this product in stock?")
            .with_messages(vec![Message::user("Is this product in stock?")]),
        RunOptions::default(),
    );
    let (a, b) = tokio::join!(a, b);
    let (a, b) = (a.unwrap().snapshot(), b.unwrap().snapshot());

    assert!(a.context.contains_key("userData"));
    assert!(!a.context.contains_key("productData"));
    assert!(b.context.contains_key("productData"));
    assert!(!b.context.contains_key("userData"));
    assert!(a.messages.iter().all(|m| !m.content.contains("stock")));
    assert!(b.messages.iter().all(|m| !m.content.contains("account")));
}

#[tokio::test]
async fn thoughts_grow_in_execution_order() {
    let app = common::stub_assistant().unwrap();
    let state = app
        .invoke(
            NodePartial::new().with_query("What is my account balance?"),
            RunOptions::default(),
        )
        .await
        .unwrap();

    let thoughts = state.snapshot().thoughts;
    // router ran first, then the fetch node, then process.
    let router_pos = thoughts.iter().position(|t| t.contains("[router#")).unwrap();
    let fetch_pos = thoughts
        .iter()
        .position(|t| t.contains("[user_context#"))
        .unwrap();
    let process_pos = thoughts.iter().position(|t| t.contains("[process#")).unwrap();
    assert!(router_pos < fetch_pos && fetch_pos < process_pos);
}
