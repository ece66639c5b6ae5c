// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant node: publishes a fixed value.

use crate::evaluation::{EvaluationError, NodeInputs, NodeOutput};
use crate::node::{Node, NodeKind};
use crate::pin::Value;
use std::any::Any;

/// Publishes its value on a single output
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    /// Published value
    pub value: Value,
}

impl Constant {
    /// Output slot of the value
    pub const VALUE: usize = 0;

    /// Create the kind
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Create a node with a `value` output pin
    pub fn node(label: impl Into<String>, value: Value) -> Node {
        let mut node = Node::new(label, Self::new(value));
        node.make_output_pin(Self::VALUE, "value");
        node
    }
}

impl NodeKind for Constant {
    fn type_name(&self) -> &'static str {
        "constant"
    }

    fn evaluate(&mut self, _inputs: &NodeInputs<'_>) -> Result<NodeOutput, EvaluationError> {
        Ok(NodeOutput::new().with(Self::VALUE, self.value.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
