//! The concrete assistant workflow built on the engine.
//!
//! A run flows router → optional context fetch → process → End, with the
//! error handler catching any recorded failure:
//!
//! ```text
//! Start ─▶ router ──┬─ fetch_user_data ───▶ user_context ──┐
//!                   ├─ fetch_product_data ▶ product_context ┤
//!                   ├─ assistance ────────▶ assistance ─────┤
//!                   ├─ process ───────────────────────────▶ process ──┬─ complete ▶ End
//!                   └─ error ─────────────▶ error_handler ◀─── error ─┘
//!                                                │
//!                                                ▼
//!                                               End
//! ```
//!
//! The router's conditional edge reads the step marker the router itself
//! just wrote; the process node's conditional edge reads the error channel.
//! Both couplings are declared on the edges and checked at compile time.

pub mod clients;
pub mod config;
pub mod fetch;
pub mod history;
pub mod lookup;
pub mod process;
pub mod router;
pub mod support;

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::app::App;
use crate::graphs::{EdgeResolver, GraphBuilder, GraphCompileError};
use crate::types::{ChannelType, NodeKind, STEP_ERROR};

pub use clients::{ChatClient, ClientBuilder, ClientError, ProviderRegistry};
pub use config::{AssistantConfig, ConfigError};
pub use fetch::ContextFetchNode;
pub use history::{BestEffortStore, ConversationStore, HistoryError};
pub use lookup::{ContextLookup, LookupError};
pub use process::ProcessNode;
pub use router::RouterNode;
pub use support::{APOLOGY, AssistanceNode, CLARIFICATION, ErrorNode};

/// Step markers the assistant nodes write and route on.
pub const STEP_FETCH_USER_DATA: &str = "fetch_user_data";
pub const STEP_FETCH_PRODUCT_DATA: &str = "fetch_product_data";
pub const STEP_ASSISTANCE: &str = "assistance";
pub const STEP_PROCESS: &str = "process";
pub const STEP_COMPLETE: &str = "complete";
pub const STEP_ERROR_HANDLED: &str = "error_handled";

/// Node names in the assistant graph.
pub const NODE_ROUTER: &str = "router";
pub const NODE_USER_CONTEXT: &str = "user_context";
pub const NODE_PRODUCT_CONTEXT: &str = "product_context";
pub const NODE_ASSISTANCE: &str = "assistance";
pub const NODE_PROCESS: &str = "process";
pub const NODE_ERROR_HANDLER: &str = "error_handler";

/// Failures while assembling the assistant at startup.
#[derive(Debug, Error, Diagnostic)]
pub enum AssistantBuildError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphCompileError),
}

/// Wire the assistant graph around the given collaborators.
///
/// The collaborators stay behind traits so tests can substitute stubs and
/// providers can be swapped without touching node logic.
pub fn build_assistant_graph(
    client: Arc<dyn ChatClient>,
    user_lookup: Arc<dyn ContextLookup>,
    product_lookup: Arc<dyn ContextLookup>,
    history: Arc<dyn ConversationStore>,
) -> Result<App, AssistantBuildError> {
    let node = |name: &str| NodeKind::Custom(name.to_string());

    let on_step: EdgeResolver = Arc::new(|snapshot| snapshot.step.clone());
    let on_error: EdgeResolver = Arc::new(|snapshot| {
        if snapshot.error.is_some() {
            STEP_ERROR.to_string()
        } else {
            STEP_COMPLETE.to_string()
        }
    });

    let app = GraphBuilder::new()
        .add_node(node(NODE_ROUTER), RouterNode)
        .add_node(
            node(NODE_USER_CONTEXT),
            ContextFetchNode::new("user", user_lookup),
        )
        .add_node(
            node(NODE_PRODUCT_CONTEXT),
            ContextFetchNode::new("product", product_lookup),
        )
        .add_node(node(NODE_ASSISTANCE), AssistanceNode)
        .add_node(
            node(NODE_PROCESS),
            ProcessNode::new(client, BestEffortStore::new(history)),
        )
        .add_node(node(NODE_ERROR_HANDLER), ErrorNode)
        .add_edge(NodeKind::Start, node(NODE_ROUTER))
        .add_conditional_edge(
            node(NODE_ROUTER),
            ChannelType::Step,
            on_step,
            [
                (STEP_FETCH_USER_DATA, node(NODE_USER_CONTEXT)),
                (STEP_FETCH_PRODUCT_DATA, node(NODE_PRODUCT_CONTEXT)),
                (STEP_ASSISTANCE, node(NODE_ASSISTANCE)),
                (STEP_PROCESS, node(NODE_PROCESS)),
                (STEP_ERROR, node(NODE_ERROR_HANDLER)),
            ],
        )
        .add_edge(node(NODE_USER_CONTEXT), node(NODE_PROCESS))
        .add_edge(node(NODE_PRODUCT_CONTEXT), node(NODE_PROCESS))
        .add_edge(node(NODE_ASSISTANCE), node(NODE_PROCESS))
        .add_conditional_edge(
            node(NODE_PROCESS),
            ChannelType::Error,
            on_error,
            [
                (STEP_ERROR, node(NODE_ERROR_HANDLER)),
                (STEP_COMPLETE, NodeKind::End),
            ],
        )
        .add_edge(node(NODE_ERROR_HANDLER), NodeKind::End)
        .compile()?;

    Ok(app)
}

/// Build the assistant with a client selected from configuration.
///
/// Reads [`AssistantConfig::from_env`] and resolves the provider through the
/// registry, so a misspelled provider fails here, at startup, with the list
/// of registered names.
pub fn build_assistant_from_env(
    registry: &ProviderRegistry,
    user_lookup: Arc<dyn ContextLookup>,
    product_lookup: Arc<dyn ContextLookup>,
    history: Arc<dyn ConversationStore>,
) -> Result<App, AssistantBuildError> {
    let config = AssistantConfig::from_env()?;
    let client = registry.client_for(&config)?;
    build_assistant_graph(client, user_lookup, product_lookup, history)
}
