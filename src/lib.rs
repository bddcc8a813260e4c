//! # Stateloom: Sequential Node-Graph Workflow Engine
//!
//! Stateloom is a framework for building stateful, resumable workflows as a
//! graph of nodes operating over a shared, reducer-merged state object. It was
//! built to drive an AI-assistant feature: a router node classifies the user's
//! query, context-fetch nodes call external lookup services, and a process
//! node invokes a language-model client, all coordinated by one sequential
//! executor loop.
//!
//! ## Core Concepts
//!
//! - **Channels**: named slots in the shared state, each with its own merge
//!   strategy (append, replace, or shallow-merge) and a default value
//! - **Nodes**: async units of work that read a [`state::StateSnapshot`] and
//!   return a [`node::NodePartial`] describing only the channels they touch
//! - **Edges**: static (one fixed successor) or conditional (a resolver
//!   evaluated against the merged state, mapped through an explicit table)
//! - **Executor**: a step-synchronous loop that merges node outputs through
//!   the reducer registry, enforces a step budget, and contains node failures
//! - **Checkpointer**: pluggable persistence for resuming long-running
//!   instances across process restarts
//!
//! ## Quick Start
//!
//! ```
//! use stateloom::graphs::GraphBuilder;
//! use stateloom::node::{Node, NodeContext, NodeError, NodePartial};
//! use stateloom::message::Message;
//! use stateloom::state::StateSnapshot;
//! use stateloom::types::NodeKind;
//! use async_trait::async_trait;
//!
//! struct GreetingNode;
//!
//! #[async_trait]
//! impl Node for GreetingNode {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         _ctx: NodeContext,
//!     ) -> Result<NodePartial, NodeError> {
//!         Ok(NodePartial::new().with_messages(vec![Message::assistant("Hello!")]))
//!     }
//! }
//!
//! # async fn example() -> miette::Result<()> {
//! use stateloom::runtimes::RunOptions;
//!
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::Custom("greet".into()), GreetingNode)
//!     .add_edge(NodeKind::Start, NodeKind::Custom("greet".into()))
//!     .add_edge(NodeKind::Custom("greet".into()), NodeKind::End)
//!     .compile()?;
//!
//! let initial = stateloom::node::NodePartial::new().with_query("hi");
//! let final_state = app.invoke(initial, RunOptions::default()).await?;
//! assert_eq!(final_state.snapshot().messages.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Tiers
//!
//! Three distinct failure paths keep runs contained:
//!
//! 1. **Node-reported errors**: a node writes the error channel and the
//!    graph's conditional edges route to a recovery node
//! 2. **Uncaught node errors**: a [`node::NodeError`] returned from a node is
//!    converted by the executor into the same error-channel shape
//! 3. **Structural faults**: an unmapped conditional-edge output or an
//!    exhausted step budget; the executor halts rather than loop or guess
//!
//! ## Module Guide
//!
//! - [`message`] - Conversation message types
//! - [`state`] - Versioned state container and snapshots
//! - [`channels`] - Channel storage primitives and error events
//! - [`reducers`] - Per-channel merge strategies and the reducer registry
//! - [`node`] - Node trait and execution primitives
//! - [`graphs`] - Graph definition, validation, and compilation
//! - [`runtimes`] - Executor loop, run options, and checkpointing
//! - [`assistant`] - The concrete assistant graph (router, fetch, process)
//! - [`telemetry`] - Tracing subscriber setup

pub mod app;
pub mod assistant;
pub mod channels;
pub mod graphs;
pub mod message;
pub mod node;
pub mod reducers;
pub mod runtimes;
pub mod state;
pub mod telemetry;
pub mod types;
