//! Builder for constructing workflow graphs with a fluent API.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::graphs::edges::{ConditionalEdge, EdgeResolver};
use crate::node::Node;
use crate::reducers::ReducerRegistry;
use crate::runtimes::RuntimeConfig;
use crate::types::{ChannelType, NodeKind};

/// Builder for workflow graphs.
///
/// Add nodes and edges, then call [`compile`](Self::compile) to validate the
/// topology and obtain an executable [`App`](crate::app::App).
///
/// # Required Configuration
///
/// - at least one node via [`add_node`](Self::add_node)
/// - exactly one static edge from `NodeKind::Start` naming the entry node
/// - every node needs exactly one outgoing edge form: a single static edge
///   or a single conditional edge
///
/// `NodeKind::Start` and `NodeKind::End` are virtual endpoints; never
/// register them with `add_node`.
///
/// # Examples
///
/// ```
/// use stateloom::graphs::GraphBuilder;
/// use stateloom::types::NodeKind;
///
/// # struct MyNode;
/// # #[async_trait::async_trait]
/// # impl stateloom::node::Node for MyNode {
/// #     async fn run(&self, _: stateloom::state::StateSnapshot, _: stateloom::node::NodeContext) -> Result<stateloom::node::NodePartial, stateloom::node::NodeError> {
/// #         Ok(stateloom::node::NodePartial::default())
/// #     }
/// # }
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("worker".into()), MyNode)
///     .add_edge(NodeKind::Start, NodeKind::Custom("worker".into()))
///     .add_edge(NodeKind::Custom("worker".into()), NodeKind::End)
///     .compile()
///     .unwrap();
/// ```
pub struct GraphBuilder {
    pub(crate) nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    pub(crate) edges: FxHashMap<NodeKind, NodeKind>,
    pub(crate) conditional_edges: Vec<ConditionalEdge>,
    pub(crate) reducers: ReducerRegistry,
    pub(crate) runtime_config: RuntimeConfig,
    // Misconfigurations recorded here surface as compile() errors.
    pub(crate) duplicate_nodes: Vec<NodeKind>,
    pub(crate) duplicate_edges: Vec<NodeKind>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a new, empty graph builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            conditional_edges: Vec::new(),
            reducers: ReducerRegistry::default(),
            runtime_config: RuntimeConfig::default(),
            duplicate_nodes: Vec::new(),
            duplicate_edges: Vec::new(),
        }
    }

    /// Adds a node to the graph.
    ///
    /// `NodeKind::Start`/`NodeKind::End` are virtual; registering them is
    /// ignored with a warning. Registering the same identifier twice is a
    /// configuration error surfaced by [`compile`](Self::compile).
    #[must_use]
    pub fn add_node(mut self, id: NodeKind, node: impl Node + 'static) -> Self {
        match id {
            NodeKind::Start | NodeKind::End => {
                tracing::warn!(
                    ?id,
                    "ignoring registration of virtual node kind (Start/End are virtual)"
                );
            }
            _ => {
                if self.nodes.insert(id.clone(), Arc::new(node)).is_some() {
                    self.duplicate_nodes.push(id);
                }
            }
        }
        self
    }

    /// Adds a static edge: `from` always proceeds to `to`.
    ///
    /// A node takes a single static edge; adding a second from the same
    /// source is a configuration error surfaced by
    /// [`compile`](Self::compile).
    #[must_use]
    pub fn add_edge(mut self, from: NodeKind, to: NodeKind) -> Self {
        if self.edges.insert(from.clone(), to).is_some() {
            self.duplicate_edges.push(from);
        }
        self
    }

    /// Adds a conditional edge: after `from` runs, `resolver` is evaluated
    /// against the merged state and its output mapped through `targets`.
    ///
    /// `reads` names the channel the resolver inspects; compilation verifies
    /// the source node declares it writes that channel.
    #[must_use]
    pub fn add_conditional_edge<K, T>(
        mut self,
        from: NodeKind,
        reads: ChannelType,
        resolver: EdgeResolver,
        targets: T,
    ) -> Self
    where
        K: Into<String>,
        T: IntoIterator<Item = (K, NodeKind)>,
    {
        self.conditional_edges
            .push(ConditionalEdge::new(from, reads, resolver, targets));
        self
    }

    /// Overrides the default reducer registry (e.g. to cap append channels).
    #[must_use]
    pub fn with_reducers(mut self, reducers: ReducerRegistry) -> Self {
        self.reducers = reducers;
        self
    }

    /// Configures runtime settings for the compiled application.
    #[must_use]
    pub fn with_runtime_config(mut self, runtime_config: RuntimeConfig) -> Self {
        self.runtime_config = runtime_config;
        self
    }
}
