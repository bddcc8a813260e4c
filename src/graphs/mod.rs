//! Graph definition and compilation for workflow execution.
//!
//! The main entry point is [`GraphBuilder`], which constructs workflows that
//! compile into executable [`App`](crate::app::App) instances.
//!
//! # Core Concepts
//!
//! - **Nodes**: executable units of work implementing [`Node`](crate::node::Node)
//! - **Static edges**: one fixed successor per source node
//! - **Conditional edges**: a resolver over the merged state plus an explicit
//!   output-to-node table; non-exhaustive tables are caught at compile time
//!   for declared targets and at run time (as a fatal structural fault) for
//!   unmapped resolver outputs
//! - **Virtual endpoints**: `NodeKind::Start` and `NodeKind::End`
//!
//! # Conditional Routing
//!
//! ```
//! use stateloom::graphs::{EdgeResolver, GraphBuilder};
//! use stateloom::types::{ChannelType, NodeKind};
//! use std::sync::Arc;
//!
//! # struct MyNode;
//! # #[async_trait::async_trait]
//! # impl stateloom::node::Node for MyNode {
//! #     async fn run(&self, _: stateloom::state::StateSnapshot, _: stateloom::node::NodeContext) -> Result<stateloom::node::NodePartial, stateloom::node::NodeError> {
//! #         Ok(stateloom::node::NodePartial::default())
//! #     }
//! # }
//! let on_step: EdgeResolver = Arc::new(|snapshot| snapshot.step.clone());
//!
//! let app = GraphBuilder::new()
//!     .add_node(NodeKind::Custom("triage".into()), MyNode)
//!     .add_node(NodeKind::Custom("work".into()), MyNode)
//!     .add_edge(NodeKind::Start, NodeKind::Custom("triage".into()))
//!     .add_conditional_edge(
//!         NodeKind::Custom("triage".into()),
//!         ChannelType::Step,
//!         on_step,
//!         [
//!             ("work", NodeKind::Custom("work".into())),
//!             ("done", NodeKind::End),
//!         ],
//!     )
//!     .add_edge(NodeKind::Custom("work".into()), NodeKind::End)
//!     .compile()
//!     .unwrap();
//! ```

mod builder;
mod compilation;
mod edges;

pub use builder::GraphBuilder;
pub use compilation::GraphCompileError;
pub use edges::{ConditionalEdge, EdgeResolver};
