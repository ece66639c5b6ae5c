// SPDX-License-Identifier: MIT OR Apache-2.0
//! Display-only node imported from a domain flow graph.

use crate::evaluation::{EvaluationError, NodeInputs, NodeOutput};
use crate::node::NodeKind;
use std::any::Any;

/// A node standing in for an externally loaded domain flow node.
///
/// The payload is the node's ID in the domain flow graph. Evaluation
/// publishes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainFlow {
    payload: usize,
}

impl DomainFlow {
    /// Create the kind
    pub fn new(payload: usize) -> Self {
        Self { payload }
    }

    /// ID of the node in the domain flow graph
    pub fn payload(&self) -> usize {
        self.payload
    }
}

impl NodeKind for DomainFlow {
    fn type_name(&self) -> &'static str {
        "domain_flow"
    }

    fn evaluate(&mut self, _inputs: &NodeInputs<'_>) -> Result<NodeOutput, EvaluationError> {
        Ok(NodeOutput::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
