// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow graph engine for the explorer.
//!
//! Nodes expose ordered input and output pins. A [`Graph`] owns the links
//! between pins, refuses links that would break its invariants, and evaluates
//! nodes in dependency order.
//!
//! ## Architecture
//!
//! - [`Node`]s are owned by the embedding application, in a [`NodeArena`]
//! - The [`Graph`] refers to registered nodes by [`NodeId`] and owns [`Link`]s
//! - [`NodeKind`] implementations decide what evaluating a node does
//! - [`GraphSession`] keeps nodes, graph and editor [`Handle`]s in sync
//! - [`FlowGraphDescriptor`]s import externally loaded domain flow graphs

pub mod descriptor;
pub mod evaluation;
pub mod graph;
pub mod handles;
pub mod kinds;
pub mod link;
pub mod node;
pub mod pin;
pub mod session;

pub use descriptor::{
    EdgeDescriptor, FlowGraphDescriptor, ImportError, ImportReport, NodeDescriptor,
};
pub use evaluation::{EvaluationError, EvaluationReport, NodeInputs, NodeOutput};
pub use graph::{ConnectError, CycleError, CyclePolicy, Graph, GraphSettings, TopologicalOrder};
pub use handles::{Handle, HandleTable};
pub use link::{Link, LinkId};
pub use node::{Node, NodeArena, NodeId, NodeKind};
pub use pin::{Pin, PinDirection, PinId, Value};
pub use session::{GraphSession, SharedSession};
