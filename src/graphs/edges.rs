//! Edge types and routing resolvers for conditional graph flow.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::state::StateSnapshot;
use crate::types::{ChannelType, NodeKind};

/// Resolver function for conditional edge routing.
///
/// Evaluated against the merged state after the source node runs; the
/// returned string is looked up in the edge's output table to find the next
/// node. An output with no table entry is a fatal structural fault at run
/// time, so resolvers and tables are written together.
///
/// # Examples
///
/// ```
/// use stateloom::graphs::EdgeResolver;
/// use std::sync::Arc;
///
/// // Route on the step marker the source node just wrote
/// let on_step: EdgeResolver = Arc::new(|snapshot| snapshot.step.clone());
///
/// // Route on whether an error has been recorded
/// let on_error: EdgeResolver = Arc::new(|snapshot| {
///     if snapshot.error.is_some() { "error".into() } else { "complete".into() }
/// });
/// ```
pub type EdgeResolver = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A conditional edge: a resolver plus an explicit output-to-node table.
///
/// The edge also names the channel its resolver reads. Compilation checks
/// that the source node declares it writes that channel, making the
/// node-to-edge coupling visible instead of implicit.
#[derive(Clone)]
pub struct ConditionalEdge {
    from: NodeKind,
    reads: ChannelType,
    resolver: EdgeResolver,
    targets: FxHashMap<String, NodeKind>,
}

impl ConditionalEdge {
    /// Creates a conditional edge.
    ///
    /// # Examples
    ///
    /// ```
    /// use stateloom::graphs::{ConditionalEdge, EdgeResolver};
    /// use stateloom::types::{ChannelType, NodeKind};
    /// use std::sync::Arc;
    ///
    /// let resolver: EdgeResolver = Arc::new(|snapshot| snapshot.step.clone());
    /// let edge = ConditionalEdge::new(
    ///     NodeKind::Custom("router".into()),
    ///     ChannelType::Step,
    ///     resolver,
    ///     [
    ///         ("process", NodeKind::Custom("process".into())),
    ///         ("complete", NodeKind::End),
    ///     ],
    /// );
    /// ```
    pub fn new<K, T>(
        from: impl Into<NodeKind>,
        reads: ChannelType,
        resolver: EdgeResolver,
        targets: T,
    ) -> Self
    where
        K: Into<String>,
        T: IntoIterator<Item = (K, NodeKind)>,
    {
        Self {
            from: from.into(),
            reads,
            resolver,
            targets: targets
                .into_iter()
                .map(|(output, node)| (output.into(), node))
                .collect(),
        }
    }

    /// The source node of this conditional edge.
    pub fn from(&self) -> &NodeKind {
        &self.from
    }

    /// The channel the resolver reads.
    pub fn reads(&self) -> ChannelType {
        self.reads
    }

    /// The output-to-node table.
    pub fn targets(&self) -> &FxHashMap<String, NodeKind> {
        &self.targets
    }

    /// Evaluate the resolver and look its output up in the table.
    ///
    /// Returns the raw resolver output together with the mapped target;
    /// `None` means the table is non-exhaustive for this output and the run
    /// must halt with a structural fault.
    pub fn route(&self, snapshot: &StateSnapshot) -> (String, Option<NodeKind>) {
        let output = (self.resolver)(snapshot);
        let target = self.targets.get(&output).cloned();
        (output, target)
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("from", &self.from)
            .field("reads", &self.reads)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}
