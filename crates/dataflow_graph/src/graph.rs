// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure: registered nodes, owned links, ordering.

use crate::evaluation::{EvaluationContext, EvaluationError, EvaluationReport};
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeArena, NodeId};
use crate::pin::{Pin, PinId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// What `connect` does with an edge that would close a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CyclePolicy {
    /// Refuse the edge
    #[default]
    Reject,
    /// Accept the edge; `sort` and `evaluate` report the cycle
    Defer,
}

/// Graph behavior settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Cycle handling on connect
    pub cycle_policy: CyclePolicy,
}

/// A dataflow graph.
///
/// The graph refers to nodes it does not own and owns the links between
/// their pins. It is the only place links are created, so every structural
/// invariant is enforced here.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Graph name
    pub name: String,
    settings: GraphSettings,
    /// Registered nodes, registration order
    nodes: IndexSet<NodeId>,
    /// Links, creation order
    links: IndexMap<LinkId, Link>,
    /// Result of the last sort, dropped on any mutation
    cached_order: Option<TopologicalOrder>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, GraphSettings::default())
    }

    /// Create a new empty graph with explicit settings
    pub fn with_settings(name: impl Into<String>, settings: GraphSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            nodes: IndexSet::new(),
            links: IndexMap::new(),
            cached_order: None,
        }
    }

    /// Current settings
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Register a node. Registering a known node is a no-op.
    pub fn register_node(&mut self, node: &Node) {
        if self.nodes.insert(node.id()) {
            tracing::debug!(node = %node.id(), label = node.label(), "registered node");
            self.invalidate();
        }
    }

    /// Unregister a node, removing every link that touches it first.
    ///
    /// Unregistering an unknown node is a no-op.
    pub fn unregister_node(&mut self, node_id: NodeId) -> Vec<Link> {
        if !self.nodes.contains(&node_id) {
            return Vec::new();
        }

        let mut removed = Vec::new();
        self.links.retain(|_, link| {
            if link.involves_node(node_id) {
                removed.push(link.clone());
                false
            } else {
                true
            }
        });
        self.nodes.shift_remove(&node_id);
        self.invalidate();

        tracing::debug!(node = %node_id, purged_links = removed.len(), "unregistered node");
        removed
    }

    /// Check if a node is registered
    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains(&node_id)
    }

    /// Registered nodes in registration order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Get the number of registered nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Link two pins given in either order.
    ///
    /// The source/sink roles are worked out from the pins' directions. On
    /// error nothing changes.
    pub fn connect(&mut self, a: &Pin, b: &Pin) -> Result<LinkId, ConnectError> {
        let (source, sink) = match (a.is_source(), b.is_source()) {
            (true, false) => (a, b),
            (false, true) => (b, a),
            _ => return Err(ConnectError::InvalidPin),
        };

        let source_node = source.owner_node();
        let sink_node = sink.owner_node();

        if source_node == sink_node {
            return Err(ConnectError::SelfLoop);
        }

        for node_id in [source_node, sink_node] {
            if !self.nodes.contains(&node_id) {
                return Err(ConnectError::UnregisteredNode(node_id));
            }
        }

        if self.settings.cycle_policy == CyclePolicy::Reject
            && self.reaches(sink_node, source_node)
        {
            return Err(ConnectError::WouldCycle);
        }

        let link = Link::new(source.id(), sink.id());
        let id = link.id();
        self.links.insert(id, link);
        self.invalidate();

        tracing::debug!(
            link = %id.0,
            source = source.name(),
            sink = sink.name(),
            "connected pins"
        );
        Ok(id)
    }

    /// Remove a link. Removing an unknown link is a no-op.
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        let removed = self.links.shift_remove(&link_id);
        if let Some(link) = &removed {
            tracing::debug!(
                link = %link_id.0,
                source = %link.source_node(),
                sink = %link.sink_node(),
                "disconnected pins"
            );
            self.invalidate();
        }
        removed
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// All links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get links leaving a specific pin
    pub fn links_from(&self, pin: PinId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.source() == pin)
    }

    /// Get links entering a specific pin
    pub fn links_into(&self, pin: PinId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.sink() == pin)
    }

    /// The link feeding a sink pin. The oldest wins when several exist.
    pub fn upstream_link(&self, pin: PinId) -> Option<&Link> {
        self.links_into(pin).next()
    }

    /// Get links touching a node
    pub fn links_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.involves_node(node_id))
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Forget all links and registered nodes
    pub fn clear(&mut self) {
        self.links.clear();
        self.nodes.clear();
        self.invalidate();
    }

    /// The order computed by the last `sort`, unless the graph changed since
    pub fn cached_order(&self) -> Option<&TopologicalOrder> {
        self.cached_order.as_ref()
    }

    /// Compute a topological order of the registered nodes (Kahn's algorithm).
    ///
    /// Ties are broken by registration order, so the result is deterministic.
    /// Nodes caught in cycles are appended after the ordered prefix, in
    /// registration order.
    pub fn sort(&mut self) -> TopologicalOrder {
        let position: HashMap<NodeId, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();

        // Distinct downstream nodes, so fan-in over several pins counts once
        let mut downstream: Vec<IndexSet<usize>> = vec![IndexSet::new(); self.nodes.len()];
        for link in self.links.values() {
            let (Some(&from), Some(&to)) =
                (position.get(&link.source_node()), position.get(&link.sink_node()))
            else {
                continue;
            };
            downstream[from].insert(to);
        }

        let mut in_degree = vec![0usize; self.nodes.len()];
        for targets in &downstream {
            for &to in targets {
                in_degree[to] += 1;
            }
        }

        let mut ready: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&index| in_degree[index] == 0)
            .collect();
        let mut emitted = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(index) = ready.pop_front() {
            emitted[index] = true;
            order.push(self.nodes[index]);

            let mut unlocked = Vec::new();
            for &to in &downstream[index] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    unlocked.push(to);
                }
            }
            unlocked.sort_unstable();
            ready.extend(unlocked);
        }

        let ordered = order.len();
        order.extend(
            emitted
                .iter()
                .enumerate()
                .filter(|(_, done)| !**done)
                .map(|(index, _)| self.nodes[index]),
        );

        let result = TopologicalOrder { nodes: order, ordered };
        if !result.is_complete() {
            tracing::warn!(
                graph = %self.name,
                cyclic = result.unordered().len(),
                "graph contains a cycle"
            );
        }
        self.cached_order = Some(result.clone());
        result
    }

    /// Sort, then evaluate every node in dependency order.
    ///
    /// A cyclic graph is not evaluated at all; the cycle is returned instead.
    /// Per-node failures do not stop the pass and are collected in the report.
    pub fn evaluate(&mut self, nodes: &mut NodeArena) -> Result<EvaluationReport, CycleError> {
        let order = self.sort().into_result()?;

        let mut ctx = EvaluationContext::new(self);
        let mut report = EvaluationReport::new(order.clone());
        for node_id in order {
            let Some(node) = nodes.get_mut(node_id) else {
                tracing::warn!(node = %node_id, "registered node no longer exists");
                report.record_failure(node_id, EvaluationError::StaleNode(node_id));
                continue;
            };
            match node.evaluate(&ctx) {
                Ok(output) => {
                    ctx.set_output(node_id, output);
                    report.record_success(node_id);
                }
                Err(error) => {
                    tracing::warn!(
                        node = %node_id,
                        label = node.label(),
                        %error,
                        "node evaluation failed"
                    );
                    report.record_failure(node_id, error);
                }
            }
        }
        report.set_outputs(ctx.into_outputs());
        Ok(report)
    }

    /// Whether `to` is reachable from `from` along existing links
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for link in self.links.values() {
            adjacency.entry(link.source_node()).or_default().push(link.sink_node());
        }

        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(node_id) = stack.pop() {
            if node_id == to {
                return true;
            }
            if !visited.insert(node_id) {
                continue;
            }
            if let Some(next) = adjacency.get(&node_id) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }

    fn invalidate(&mut self) {
        self.cached_order = None;
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Result of [`Graph::sort`]: an acyclic prefix followed by any nodes caught
/// in cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    nodes: Vec<NodeId>,
    ordered: usize,
}

impl TopologicalOrder {
    /// Every registered node: the ordered prefix, then the cyclic remainder
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The part of the order that respects every edge
    pub fn ordered(&self) -> &[NodeId] {
        &self.nodes[..self.ordered]
    }

    /// Nodes on or behind a cycle, in registration order. Not ordered.
    pub fn unordered(&self) -> &[NodeId] {
        &self.nodes[self.ordered..]
    }

    /// Whether every node was ordered
    pub fn is_complete(&self) -> bool {
        self.ordered == self.nodes.len()
    }

    /// Position of a node in the order
    pub fn position(&self, node_id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|id| *id == node_id)
    }

    /// The full order, or the cycle if there is one
    pub fn into_result(self) -> Result<Vec<NodeId>, CycleError> {
        if self.is_complete() {
            Ok(self.nodes)
        } else {
            Err(CycleError {
                nodes: self.nodes[self.ordered..].to_vec(),
            })
        }
    }
}

/// Error when creating a link
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// Missing pin, or no source/sink pairing exists
    #[error("Pins cannot be paired as source and sink")]
    InvalidPin,

    /// Both pins belong to the same node
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// The edge would close a cycle
    #[error("Link would create a cycle")]
    WouldCycle,

    /// A pin's owner is not registered with the graph
    #[error("Node not registered: {0}")]
    UnregisteredNode(NodeId),
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle through {} node(s)", nodes.len())]
pub struct CycleError {
    /// Nodes that could not be ordered, in registration order
    pub nodes: Vec<NodeId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::DomainFlow;

    fn passthrough(arena: &mut NodeArena, graph: &mut Graph, label: &str) -> NodeId {
        let mut node = Node::new(label, DomainFlow::new(0));
        node.make_input_pin(0, "in");
        node.make_output_pin(0, "out");
        graph.register_node(&node);
        arena.insert(node)
    }

    fn link(
        arena: &NodeArena,
        graph: &mut Graph,
        from: NodeId,
        to: NodeId,
    ) -> Result<LinkId, ConnectError> {
        let source = arena.pin(PinId::source(from, 0)).unwrap();
        let sink = arena.pin(PinId::sink(to, 0)).unwrap();
        graph.connect(source, sink)
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        graph.register_node(arena.get(a).unwrap());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_connect_resolves_direction() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        let b = passthrough(&mut arena, &mut graph, "b");

        let out = arena.pin(PinId::source(a, 0)).unwrap();
        let inp = arena.pin(PinId::sink(b, 0)).unwrap();
        let id = graph.connect(inp, out).unwrap();

        let link = graph.link(id).unwrap();
        assert_eq!(link.source(), PinId::source(a, 0));
        assert_eq!(link.sink(), PinId::sink(b, 0));
        assert_eq!(graph.upstream_link(PinId::sink(b, 0)).map(Link::id), Some(id));
    }

    #[test]
    fn test_connect_rejections_leave_graph_unchanged() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        let b = passthrough(&mut arena, &mut graph, "b");

        let a_out = arena.pin(PinId::source(a, 0)).unwrap();
        let a_in = arena.pin(PinId::sink(a, 0)).unwrap();
        let b_out = arena.pin(PinId::source(b, 0)).unwrap();
        let b_in = arena.pin(PinId::sink(b, 0)).unwrap();

        assert_eq!(graph.connect(a_out, b_out), Err(ConnectError::InvalidPin));
        assert_eq!(graph.connect(a_in, b_in), Err(ConnectError::InvalidPin));
        assert_eq!(graph.connect(a_out, a_in), Err(ConnectError::SelfLoop));
        assert_eq!(graph.link_count(), 0);

        graph.connect(a_out, b_in).unwrap();
        assert_eq!(graph.connect(b_out, a_in), Err(ConnectError::WouldCycle));
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_connect_requires_registration() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        let mut stranger = Node::new("stranger", DomainFlow::new(0));
        stranger.make_input_pin(0, "in");
        let stranger = arena.insert(stranger);

        let result = graph.connect(
            arena.pin(PinId::source(a, 0)).unwrap(),
            arena.pin(PinId::sink(stranger, 0)).unwrap(),
        );
        assert_eq!(result, Err(ConnectError::UnregisteredNode(stranger)));
    }

    #[test]
    fn test_disconnect_unknown_is_noop() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        let b = passthrough(&mut arena, &mut graph, "b");
        let id = link(&arena, &mut graph, a, b).unwrap();

        assert!(graph.disconnect(LinkId::new()).is_none());
        assert!(graph.disconnect(id).is_some());
        assert!(graph.disconnect(id).is_none());
        assert!(graph.links().all(|l| l.id() != id));
    }

    #[test]
    fn test_unregister_purges_links() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        let b = passthrough(&mut arena, &mut graph, "b");
        let c = passthrough(&mut arena, &mut graph, "c");
        link(&arena, &mut graph, a, b).unwrap();
        link(&arena, &mut graph, b, c).unwrap();
        link(&arena, &mut graph, a, c).unwrap();

        let removed = graph.unregister_node(b);
        assert_eq!(removed.len(), 2);
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.links_for_node(b).count(), 0);
        assert!(!graph.contains_node(b));

        assert!(graph.unregister_node(b).is_empty());
    }

    #[test]
    fn test_sort_is_stable() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let d = passthrough(&mut arena, &mut graph, "d");
        let c = passthrough(&mut arena, &mut graph, "c");
        let b = passthrough(&mut arena, &mut graph, "b");
        let a = passthrough(&mut arena, &mut graph, "a");
        link(&arena, &mut graph, a, b).unwrap();
        link(&arena, &mut graph, a, c).unwrap();
        link(&arena, &mut graph, c, d).unwrap();
        link(&arena, &mut graph, b, d).unwrap();

        let order = graph.sort();
        assert!(order.is_complete());
        // c was registered before b, so it wins the tie once a is emitted
        assert_eq!(order.nodes(), [a, c, b, d]);
        assert_eq!(graph.sort(), order);
    }

    #[test]
    fn test_fan_in_counts_distinct_upstream() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let mut source = Node::new("source", DomainFlow::new(0));
        source.make_output_pin(0, "x");
        source.make_output_pin(1, "y");
        graph.register_node(&source);
        let source = arena.insert(source);
        let mut sink = Node::new("sink", DomainFlow::new(0));
        sink.make_input_pin(0, "x");
        sink.make_input_pin(1, "y");
        graph.register_node(&sink);
        let sink = arena.insert(sink);

        for slot in 0..2 {
            graph
                .connect(
                    arena.pin(PinId::source(source, slot)).unwrap(),
                    arena.pin(PinId::sink(sink, slot)).unwrap(),
                )
                .unwrap();
        }
        assert_eq!(graph.sort().into_result().unwrap(), vec![source, sink]);
    }

    #[test]
    fn test_deferred_cycle_is_reported() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::with_settings(
            "deferred",
            GraphSettings {
                cycle_policy: CyclePolicy::Defer,
            },
        );
        let a = passthrough(&mut arena, &mut graph, "a");
        let b = passthrough(&mut arena, &mut graph, "b");
        let c = passthrough(&mut arena, &mut graph, "c");
        let d = passthrough(&mut arena, &mut graph, "d");
        link(&arena, &mut graph, a, b).unwrap();
        link(&arena, &mut graph, b, c).unwrap();
        link(&arena, &mut graph, c, b).unwrap();

        let order = graph.sort();
        assert!(!order.is_complete());
        assert_eq!(order.ordered(), [a, d]);
        assert_eq!(order.unordered(), [b, c]);

        let error = graph.evaluate(&mut arena).unwrap_err();
        assert_eq!(error.nodes, vec![b, c]);
    }

    #[test]
    fn test_cycle_skips_the_whole_pass() {
        use crate::kinds::Add;
        use crate::pin::Value;

        let mut arena = NodeArena::new();
        let mut graph = Graph::with_settings(
            "deferred",
            GraphSettings {
                cycle_policy: CyclePolicy::Defer,
            },
        );
        let mut add = Add::node("add");
        add.input_mut(Add::LHS).unwrap().set_default(Value::Int(2));
        add.input_mut(Add::RHS).unwrap().set_default(Value::Int(3));
        graph.register_node(&add);
        let add = arena.insert(add);
        let relay = passthrough(&mut arena, &mut graph, "relay");

        // add.sum -> relay -> add.lhs
        link(&arena, &mut graph, add, relay).unwrap();
        let back = link(&arena, &mut graph, relay, add).unwrap();

        assert!(graph.evaluate(&mut arena).is_err());
        let sum = arena.get(add).and_then(|n| n.kind_as::<Add>()).and_then(Add::sum);
        assert_eq!(sum, None);

        graph.disconnect(back);
        let report = graph.evaluate(&mut arena).unwrap();
        assert!(report.is_clean());
        let sum = arena.get(add).and_then(|n| n.kind_as::<Add>()).and_then(Add::sum);
        assert_eq!(sum, Some(&Value::Int(5)));
    }

    #[test]
    fn test_cached_order_invalidation() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        let b = passthrough(&mut arena, &mut graph, "b");
        assert!(graph.cached_order().is_none());

        graph.sort();
        assert!(graph.cached_order().is_some());

        let id = link(&arena, &mut graph, a, b).unwrap();
        assert!(graph.cached_order().is_none());

        graph.sort();
        graph.disconnect(id);
        assert!(graph.cached_order().is_none());

        graph.sort();
        graph.unregister_node(a);
        assert!(graph.cached_order().is_none());
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut arena = NodeArena::new();
        let mut graph = Graph::default();
        let a = passthrough(&mut arena, &mut graph, "a");
        let b = passthrough(&mut arena, &mut graph, "b");
        link(&arena, &mut graph, a, b).unwrap();

        graph.clear();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.link_count(), 0);
        assert_eq!(arena.len(), 2);
    }
}
