// SPDX-License-Identifier: MIT OR Apache-2.0
//! Domain flow graph descriptors and their import into a session.
//!
//! A loader outside this crate reads a domain flow graph and produces plain
//! node and edge descriptors. Importing them builds one [`DomainFlow`] node
//! per descriptor, with pins created 1:1 from the listed type names, and
//! links every edge that the graph accepts.

use crate::graph::ConnectError;
use crate::kinds::DomainFlow;
use crate::node::{Node, NodeId};
use crate::pin::PinId;
use crate::session::GraphSession;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A node as described by the domain flow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// ID in the domain flow graph
    pub id: usize,
    /// Node name
    pub name: String,
    /// Input type names, one pin each
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Output type names, one pin each
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// An edge as described by the domain flow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDescriptor {
    /// Producing node ID
    pub source: usize,
    /// Output slot on the producing node
    pub source_slot: usize,
    /// Consuming node ID
    pub sink: usize,
    /// Input slot on the consuming node
    pub sink_slot: usize,
}

/// A whole domain flow graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowGraphDescriptor {
    /// Graph name
    #[serde(default)]
    pub name: String,
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<NodeDescriptor>,
    /// Edges
    #[serde(default)]
    pub edges: Vec<EdgeDescriptor>,
}

impl FlowGraphDescriptor {
    /// Parse a descriptor from RON text
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Write the descriptor as RON text
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

/// Why an edge was not linked
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeRejection {
    /// The edge names a node that is not in the descriptor
    #[error("Unknown node id {0}")]
    UnknownNode(usize),

    /// The edge names a slot the node does not have
    #[error("Node {node} has no slot {slot}")]
    UnknownSlot {
        /// Descriptor node ID
        node: usize,
        /// Requested slot
        slot: usize,
    },

    /// The graph refused the link
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Outcome of an import
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Descriptor node ID to created node
    pub nodes: HashMap<usize, NodeId>,
    /// Number of edges linked
    pub linked: usize,
    /// Edges that were skipped and why
    pub rejected: Vec<(EdgeDescriptor, EdgeRejection)>,
}

/// Error that aborts an import before anything changes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// Two descriptors share an ID
    #[error("Duplicate node id {0}")]
    DuplicateNode(usize),
}

impl GraphSession {
    /// Replace the session's contents with a domain flow graph
    pub fn import(
        &mut self,
        descriptor: &FlowGraphDescriptor,
    ) -> Result<ImportReport, ImportError> {
        let mut seen = HashSet::new();
        for node in &descriptor.nodes {
            if !seen.insert(node.id) {
                return Err(ImportError::DuplicateNode(node.id));
            }
        }

        self.clear();
        let mut report = ImportReport::default();

        for desc in &descriptor.nodes {
            let mut node = Node::new(desc.name.as_str(), DomainFlow::new(desc.id));
            for (slot, type_name) in desc.inputs.iter().enumerate() {
                node.make_input_pin(slot, type_name.as_str());
            }
            for (slot, type_name) in desc.outputs.iter().enumerate() {
                node.make_output_pin(slot, type_name.as_str());
            }
            report.nodes.insert(desc.id, node.id());
            self.add_node(node);
        }

        for edge in &descriptor.edges {
            match self.import_edge(&report.nodes, edge) {
                Ok(()) => report.linked += 1,
                Err(rejection) => {
                    tracing::warn!(?edge, %rejection, "skipped domain flow edge");
                    report.rejected.push((*edge, rejection));
                }
            }
        }

        tracing::info!(
            graph = %descriptor.name,
            nodes = report.nodes.len(),
            linked = report.linked,
            rejected = report.rejected.len(),
            "imported domain flow graph"
        );
        Ok(report)
    }

    fn import_edge(
        &mut self,
        ids: &HashMap<usize, NodeId>,
        edge: &EdgeDescriptor,
    ) -> Result<(), EdgeRejection> {
        let source = *ids.get(&edge.source).ok_or(EdgeRejection::UnknownNode(edge.source))?;
        let sink = *ids.get(&edge.sink).ok_or(EdgeRejection::UnknownNode(edge.sink))?;

        let source_pin = PinId::source(source, edge.source_slot);
        let sink_pin = PinId::sink(sink, edge.sink_slot);
        if self.nodes().pin(source_pin).is_none() {
            return Err(EdgeRejection::UnknownSlot {
                node: edge.source,
                slot: edge.source_slot,
            });
        }
        if self.nodes().pin(sink_pin).is_none() {
            return Err(EdgeRejection::UnknownSlot {
                node: edge.sink,
                slot: edge.sink_slot,
            });
        }

        self.connect(source_pin, sink_pin)?;
        Ok(())
    }
}
