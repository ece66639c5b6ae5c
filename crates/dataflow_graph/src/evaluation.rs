// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation and value propagation.

use crate::graph::Graph;
use crate::node::NodeId;
use crate::pin::{Pin, Value};
use std::collections::HashMap;

/// Values a node publishes, keyed by output slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOutput {
    /// Output values by slot
    pub values: HashMap<usize, Value>,
}

impl NodeOutput {
    /// Create a new empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an output value
    pub fn set(&mut self, slot: usize, value: Value) {
        self.values.insert(slot, value);
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, slot: usize, value: Value) -> Self {
        self.set(slot, value);
        self
    }

    /// Get an output value
    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.values.get(&slot)
    }
}

/// Context for one evaluation pass
pub struct EvaluationContext<'a> {
    /// The graph being evaluated
    pub graph: &'a Graph,
    /// Outputs of nodes evaluated so far
    outputs: HashMap<NodeId, NodeOutput>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            outputs: HashMap::new(),
        }
    }

    /// Set the output for a node
    pub fn set_output(&mut self, node_id: NodeId, output: NodeOutput) {
        self.outputs.insert(node_id, output);
    }

    /// Get a node's published output
    pub fn output(&self, node_id: NodeId) -> Option<&NodeOutput> {
        self.outputs.get(&node_id)
    }

    pub(crate) fn into_outputs(self) -> HashMap<NodeId, NodeOutput> {
        self.outputs
    }
}

/// Read access to the inputs of the node being evaluated
pub struct NodeInputs<'a> {
    ctx: &'a EvaluationContext<'a>,
    node: NodeId,
    pins: &'a [Pin],
}

impl<'a> NodeInputs<'a> {
    pub(crate) fn new(ctx: &'a EvaluationContext<'a>, node: NodeId, pins: &'a [Pin]) -> Self {
        Self { ctx, node, pins }
    }

    /// ID of the node being evaluated
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Number of input pins
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Whether the node has no inputs
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Whether something is linked into the input
    pub fn is_linked(&self, slot: usize) -> bool {
        self.pins
            .get(slot)
            .is_some_and(|pin| self.ctx.graph.upstream_link(pin.id()).is_some())
    }

    /// Resolve an input value.
    ///
    /// A linked input takes whatever its upstream output published. An
    /// unlinked input falls back to the pin's preset. Otherwise the input is
    /// unresolved.
    pub fn get(&self, slot: usize) -> Result<Value, EvaluationError> {
        let unresolved = EvaluationError::UnresolvedInput {
            node: self.node,
            slot,
        };
        let pin = self.pins.get(slot).ok_or_else(|| unresolved.clone())?;

        match self.ctx.graph.upstream_link(pin.id()) {
            Some(link) => self
                .ctx
                .output(link.source_node())
                .and_then(|output| output.get(link.source().slot))
                .cloned()
                .ok_or(unresolved),
            None => pin.default_value().cloned().ok_or(unresolved),
        }
    }
}

/// Outcome of [`Graph::evaluate`]
#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    /// Evaluation order
    pub order: Vec<NodeId>,
    /// Nodes that evaluated successfully, in order
    pub evaluated: Vec<NodeId>,
    /// Nodes that failed, in order
    pub failures: Vec<(NodeId, EvaluationError)>,
    outputs: HashMap<NodeId, NodeOutput>,
}

impl EvaluationReport {
    pub(crate) fn new(order: Vec<NodeId>) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub(crate) fn record_success(&mut self, node_id: NodeId) {
        self.evaluated.push(node_id);
    }

    pub(crate) fn record_failure(&mut self, node_id: NodeId, error: EvaluationError) {
        self.failures.push((node_id, error));
    }

    pub(crate) fn set_outputs(&mut self, outputs: HashMap<NodeId, NodeOutput>) {
        self.outputs = outputs;
    }

    /// Whether every node evaluated
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Value a node published on an output slot
    pub fn output(&self, node_id: NodeId, slot: usize) -> Option<&Value> {
        self.outputs.get(&node_id)?.get(slot)
    }

    /// The failure recorded for a node, if any
    pub fn failure(&self, node_id: NodeId) -> Option<&EvaluationError> {
        self.failures
            .iter()
            .find(|(id, _)| *id == node_id)
            .map(|(_, error)| error)
    }
}

/// Error during evaluation of a single node
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// Input has no upstream value and no preset
    #[error("Unresolved input {slot} on node {node}")]
    UnresolvedInput {
        /// Node being evaluated
        node: NodeId,
        /// Input slot
        slot: usize,
    },

    /// Inputs cannot be combined
    #[error("Type mismatch on node {node}: {detail}")]
    TypeMismatch {
        /// Node being evaluated
        node: NodeId,
        /// What went wrong
        detail: String,
    },

    /// A registered node is missing from the arena
    #[error("Node no longer exists: {0}")]
    StaleNode(NodeId),

    /// Failure reported by a node kind defined outside this crate
    #[error("{0}")]
    Custom(String),
}
