// SPDX-License-Identifier: MIT OR Apache-2.0
//! Add node: sums two inputs.

use crate::evaluation::{EvaluationError, NodeInputs, NodeOutput};
use crate::node::{Node, NodeKind};
use crate::pin::Value;
use std::any::Any;

/// Adds `lhs` and `rhs` and publishes the result on `sum`.
///
/// The last successful result is kept so the embedding application can show
/// it without holding on to an evaluation report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Add {
    sum: Option<Value>,
}

impl Add {
    /// Input slot of the left operand
    pub const LHS: usize = 0;
    /// Input slot of the right operand
    pub const RHS: usize = 1;
    /// Output slot of the result
    pub const SUM: usize = 0;

    /// Create the kind
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with `lhs`/`rhs` inputs and a `sum` output
    pub fn node(label: impl Into<String>) -> Node {
        let mut node = Node::new(label, Self::new());
        node.make_input_pin(Self::LHS, "lhs");
        node.make_input_pin(Self::RHS, "rhs");
        node.make_output_pin(Self::SUM, "sum");
        node
    }

    /// Result of the last successful evaluation
    pub fn sum(&self) -> Option<&Value> {
        self.sum.as_ref()
    }
}

impl NodeKind for Add {
    fn type_name(&self) -> &'static str {
        "add"
    }

    fn evaluate(&mut self, inputs: &NodeInputs<'_>) -> Result<NodeOutput, EvaluationError> {
        self.sum = None;
        let lhs = inputs.get(Self::LHS)?;
        let rhs = inputs.get(Self::RHS)?;
        let sum = lhs.add(&rhs).ok_or_else(|| EvaluationError::TypeMismatch {
            node: inputs.node_id(),
            detail: format!("cannot add {} and {}", lhs.type_name(), rhs.type_name()),
        })?;

        self.sum = Some(sum.clone());
        Ok(NodeOutput::new().with(Self::SUM, sum))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
