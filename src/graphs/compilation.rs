//! Graph compilation and structural validation.
//!
//! Validation happens once, at build time, so the executor never has to
//! guess: every edge endpoint must be declared, conditional output tables
//! must target declared nodes, and every node must have exactly one outgoing
//! edge form. A misrouted graph fails here rather than mid-run.

use miette::Diagnostic;
use thiserror::Error;

use crate::app::App;
use crate::types::{ChannelType, NodeKind};

/// Structural errors detected while compiling a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphCompileError {
    #[error("node '{0}' was registered more than once")]
    #[diagnostic(
        code(stateloom::graphs::duplicate_node),
        help("Each NodeKind may be registered exactly once per graph.")
    )]
    DuplicateNode(NodeKind),

    #[error("node '{0}' has more than one static edge")]
    #[diagnostic(
        code(stateloom::graphs::duplicate_edge),
        help("A node takes a single static edge; use a conditional edge to branch.")
    )]
    DuplicateStaticEdge(NodeKind),

    #[error("no static edge leaves Start")]
    #[diagnostic(
        code(stateloom::graphs::missing_entry),
        help("Add exactly one edge from NodeKind::Start naming the entry node.")
    )]
    MissingEntry,

    #[error("edge references undeclared node '{node}'")]
    #[diagnostic(
        code(stateloom::graphs::unknown_node),
        help("Declare the node with add_node before wiring edges to it.")
    )]
    UnknownNode { node: NodeKind },

    #[error("conditional edge from '{from}' maps output '{output}' to undeclared node '{target}'")]
    #[diagnostic(
        code(stateloom::graphs::unknown_conditional_target),
        help("Every table entry must name a declared node or NodeKind::End.")
    )]
    UnknownConditionalTarget {
        from: NodeKind,
        output: String,
        target: NodeKind,
    },

    #[error("node '{0}' has both a static and a conditional edge")]
    #[diagnostic(
        code(stateloom::graphs::conflicting_edges),
        help("A node is the source of exactly one edge form.")
    )]
    ConflictingEdges(NodeKind),

    #[error("node '{0}' has no outgoing edge")]
    #[diagnostic(
        code(stateloom::graphs::dead_end),
        help("Every node needs a static edge, a conditional edge, or an edge to End.")
    )]
    DeadEnd(NodeKind),

    #[error(
        "conditional edge from '{from}' reads channel '{reads}' which that node does not declare writing"
    )]
    #[diagnostic(
        code(stateloom::graphs::unwritten_channel),
        help(
            "The resolver routes on data its source node never produces; add the channel to the node's writes() or fix the edge."
        )
    )]
    ResolverReadsUnwrittenChannel { from: NodeKind, reads: ChannelType },
}

impl super::builder::GraphBuilder {
    /// Compiles the graph into an executable [`App`].
    ///
    /// # Errors
    ///
    /// Any [`GraphCompileError`] variant; the first violation found is
    /// returned.
    pub fn compile(self) -> Result<App, GraphCompileError> {
        if let Some(dup) = self.duplicate_nodes.first() {
            return Err(GraphCompileError::DuplicateNode(dup.clone()));
        }
        if let Some(dup) = self.duplicate_edges.first() {
            return Err(GraphCompileError::DuplicateStaticEdge(dup.clone()));
        }

        let declared = |kind: &NodeKind| -> bool {
            match kind {
                NodeKind::Start | NodeKind::End => true,
                custom => self.nodes.contains_key(custom),
            }
        };

        // Entry: Start must have a static edge to a declared node.
        match self.edges.get(&NodeKind::Start) {
            None => return Err(GraphCompileError::MissingEntry),
            Some(target) if !declared(target) => {
                return Err(GraphCompileError::UnknownNode {
                    node: target.clone(),
                });
            }
            Some(_) => {}
        }

        // Static edges must connect declared endpoints.
        for (from, to) in &self.edges {
            if !declared(from) {
                return Err(GraphCompileError::UnknownNode { node: from.clone() });
            }
            if !declared(to) {
                return Err(GraphCompileError::UnknownNode { node: to.clone() });
            }
        }

        // Conditional edges: declared source, exhaustively declared targets,
        // and a source node that declares writing the routed channel.
        for edge in &self.conditional_edges {
            let from = edge.from();
            let Some(source) = self.nodes.get(from) else {
                return Err(GraphCompileError::UnknownNode { node: from.clone() });
            };
            if !source.writes().contains(&edge.reads()) {
                return Err(GraphCompileError::ResolverReadsUnwrittenChannel {
                    from: from.clone(),
                    reads: edge.reads(),
                });
            }
            for (output, target) in edge.targets() {
                if !declared(target) {
                    return Err(GraphCompileError::UnknownConditionalTarget {
                        from: from.clone(),
                        output: output.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        // Exactly one outgoing edge form per declared node.
        for kind in self.nodes.keys() {
            let has_static = self.edges.contains_key(kind);
            let has_conditional = self.conditional_edges.iter().any(|ce| ce.from() == kind);
            match (has_static, has_conditional) {
                (true, true) => return Err(GraphCompileError::ConflictingEdges(kind.clone())),
                (false, false) => return Err(GraphCompileError::DeadEnd(kind.clone())),
                _ => {}
            }
        }

        Ok(App::from_parts(
            self.nodes,
            self.edges,
            self.conditional_edges,
            self.reducers,
            self.runtime_config,
        ))
    }
}
