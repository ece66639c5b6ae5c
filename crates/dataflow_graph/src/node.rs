// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and the application-owned node arena.

use crate::evaluation::{EvaluationContext, EvaluationError, NodeInputs, NodeOutput};
use crate::pin::{Pin, PinDirection, PinId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node. Never reused, so a stale ID is a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Evaluation behavior of a node.
///
/// Implementations read upstream values through [`NodeInputs`] and return the
/// values they publish on their output slots.
pub trait NodeKind: fmt::Debug + Send {
    /// Short type name used in logs
    fn type_name(&self) -> &'static str;

    /// Evaluate the node. Runs after every node linked into it.
    fn evaluate(&mut self, inputs: &NodeInputs<'_>) -> Result<NodeOutput, EvaluationError>;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A node: a label, ordered input and output pins, and a kind.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    label: String,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
    kind: Box<dyn NodeKind>,
}

impl Node {
    /// Create a node without pins
    pub fn new(label: impl Into<String>, kind: impl NodeKind + 'static) -> Self {
        Self::from_boxed(label, Box::new(kind))
    }

    /// Create a node from an already boxed kind
    pub fn from_boxed(label: impl Into<String>, kind: Box<dyn NodeKind>) -> Self {
        Self {
            id: NodeId::new(),
            label: label.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            kind,
        }
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Rename the node
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Append an input pin
    pub fn make_input_pin(&mut self, key: usize, name: impl Into<String>) -> &mut Pin {
        let id = PinId::sink(self.id, self.inputs.len());
        self.inputs.push(Pin::new(id, key, name));
        let last = self.inputs.len() - 1;
        &mut self.inputs[last]
    }

    /// Append an output pin
    pub fn make_output_pin(&mut self, key: usize, name: impl Into<String>) -> &mut Pin {
        let id = PinId::source(self.id, self.outputs.len());
        self.outputs.push(Pin::new(id, key, name));
        let last = self.outputs.len() - 1;
        &mut self.outputs[last]
    }

    /// Input pins in insertion order
    pub fn input_pins(&self) -> &[Pin] {
        &self.inputs
    }

    /// Output pins in insertion order
    pub fn output_pins(&self) -> &[Pin] {
        &self.outputs
    }

    /// Get an input pin by slot
    pub fn input(&self, slot: usize) -> Option<&Pin> {
        self.inputs.get(slot)
    }

    /// Get a mutable input pin by slot
    pub fn input_mut(&mut self, slot: usize) -> Option<&mut Pin> {
        self.inputs.get_mut(slot)
    }

    /// Get an output pin by slot
    pub fn output(&self, slot: usize) -> Option<&Pin> {
        self.outputs.get(slot)
    }

    /// Get a pin by ID, if it belongs to this node
    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        if pin_id.node != self.id {
            return None;
        }
        match pin_id.direction {
            PinDirection::Sink => self.inputs.get(pin_id.slot),
            PinDirection::Source => self.outputs.get(pin_id.slot),
        }
    }

    /// Get all pins, inputs first
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// The node's kind
    pub fn kind(&self) -> &dyn NodeKind {
        self.kind.as_ref()
    }

    /// The node's kind, mutably
    pub fn kind_mut(&mut self) -> &mut dyn NodeKind {
        self.kind.as_mut()
    }

    /// Downcast the kind to a concrete type
    pub fn kind_as<T: NodeKind + 'static>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref::<T>()
    }

    /// Downcast the kind to a concrete type, mutably
    pub fn kind_as_mut<T: NodeKind + 'static>(&mut self) -> Option<&mut T> {
        self.kind.as_any_mut().downcast_mut::<T>()
    }

    pub(crate) fn evaluate(
        &mut self,
        ctx: &EvaluationContext<'_>,
    ) -> Result<NodeOutput, EvaluationError> {
        let inputs = NodeInputs::new(ctx, self.id, &self.inputs);
        self.kind.evaluate(&inputs)
    }
}

/// Application-owned storage for nodes.
///
/// The graph never owns nodes; it refers to them by [`NodeId`] and looks them
/// up here. Removing a node from the arena destroys it.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: IndexMap<NodeId, Node>,
}

impl NodeArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a node
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Destroy a node. Unregister it from every graph first.
    pub fn remove(&mut self, node_id: NodeId) -> Option<Node> {
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn get(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Resolve a pin ID
    pub fn pin(&self, pin_id: PinId) -> Option<&Pin> {
        self.nodes.get(&pin_id.node)?.pin(pin_id)
    }

    /// Check if a node is alive
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    /// All nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Destroy every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::DomainFlow;

    #[test]
    fn test_pins_keep_insertion_order() {
        let mut node = Node::new("n", DomainFlow::new(0));
        node.make_input_pin(10, "a");
        node.make_input_pin(5, "b");
        node.make_output_pin(1, "out");

        let names: Vec<_> = node.input_pins().iter().map(Pin::name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(node.input(1).map(Pin::key), Some(5));
        assert_eq!(node.input(1).map(Pin::id), Some(PinId::sink(node.id(), 1)));
        assert!(node.output(0).is_some_and(Pin::is_source));
        assert_eq!(node.pins().count(), 3);
    }

    #[test]
    fn test_pin_lookup_rejects_foreign_ids() {
        let mut node = Node::new("n", DomainFlow::new(0));
        node.make_output_pin(0, "out");
        assert!(node.pin(PinId::source(node.id(), 0)).is_some());
        assert!(node.pin(PinId::source(NodeId::new(), 0)).is_none());
        assert!(node.pin(PinId::sink(node.id(), 0)).is_none());
    }

    #[test]
    fn test_arena_lifecycle() {
        let mut arena = NodeArena::new();
        let mut node = Node::new("n", DomainFlow::new(3));
        node.make_output_pin(0, "out");
        let id = arena.insert(node);

        assert!(arena.contains(id));
        assert!(arena.pin(PinId::source(id, 0)).is_some());
        assert_eq!(
            arena.get(id).and_then(|n| n.kind_as::<DomainFlow>()).map(DomainFlow::payload),
            Some(3)
        );

        assert!(arena.remove(id).is_some());
        assert!(arena.get(id).is_none());
        assert!(arena.pin(PinId::source(id, 0)).is_none());
    }
}
