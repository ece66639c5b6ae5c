// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::node::NodeId;
use crate::pin::PinId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link. Never reused for a different edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed edge from a source pin to a sink pin.
///
/// Only [`Graph::connect`](crate::Graph::connect) creates links, so every link
/// that exists joins a source to a sink on two different nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    id: LinkId,
    source: PinId,
    sink: PinId,
}

impl Link {
    pub(crate) fn new(source: PinId, sink: PinId) -> Self {
        Self {
            id: LinkId::new(),
            source,
            sink,
        }
    }

    /// Link ID
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Producing end
    pub fn source(&self) -> PinId {
        self.source
    }

    /// Consuming end
    pub fn sink(&self) -> PinId {
        self.sink
    }

    /// Node owning the source pin
    pub fn source_node(&self) -> NodeId {
        self.source.node
    }

    /// Node owning the sink pin
    pub fn sink_node(&self) -> NodeId {
        self.sink.node
    }

    /// Check if this link touches a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source.node == node_id || self.sink.node == node_id
    }

    /// Check if this link touches a specific pin
    pub fn involves_pin(&self, pin: PinId) -> bool {
        self.source == pin || self.sink == pin
    }
}
