// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editing session: nodes, graph and editor handles kept in sync.

use crate::evaluation::EvaluationReport;
use crate::graph::{ConnectError, CycleError, Graph, GraphSettings, TopologicalOrder};
use crate::handles::{Handle, HandleTable};
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeArena, NodeId};
use crate::pin::{Pin, PinId};
use parking_lot::Mutex;
use std::sync::Arc;

/// A session shared between threads. The whole session sits behind one lock.
pub type SharedSession = Arc<Mutex<GraphSession>>;

/// Owns the nodes of one graph and translates editor gestures into graph
/// operations.
///
/// Every structural change goes through here so the handle table never
/// points at a removed link, node or pin.
#[derive(Debug)]
pub struct GraphSession {
    nodes: NodeArena,
    graph: Graph,
    handles: HandleTable,
}

impl Default for GraphSession {
    fn default() -> Self {
        Self::new(GraphSettings::default())
    }
}

impl GraphSession {
    /// Create an empty session
    pub fn new(settings: GraphSettings) -> Self {
        Self {
            nodes: NodeArena::new(),
            graph: Graph::with_settings("Session", settings),
            handles: HandleTable::new(),
        }
    }

    /// Wrap the session for use from several threads
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// The graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The nodes
    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    /// The handle table
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Take ownership of a node, register it and hand out handles for it
    /// and its pins
    pub fn add_node(&mut self, node: Node) -> Handle {
        self.graph.register_node(&node);
        for pin in node.pins() {
            self.handles.pin_handle(pin.id());
        }
        let id = self.nodes.insert(node);
        self.handles.node_handle(id)
    }

    /// Append an input pin to a node
    pub fn add_input_pin(&mut self, node: Handle, key: usize, name: &str) -> Option<Handle> {
        let node_id = self.handles.resolve_node(node)?;
        let pin_id = self.nodes.get_mut(node_id)?.make_input_pin(key, name).id();
        Some(self.handles.pin_handle(pin_id))
    }

    /// Append an output pin to a node
    pub fn add_output_pin(&mut self, node: Handle, key: usize, name: &str) -> Option<Handle> {
        let node_id = self.handles.resolve_node(node)?;
        let pin_id = self.nodes.get_mut(node_id)?.make_output_pin(key, name).id();
        Some(self.handles.pin_handle(pin_id))
    }

    /// Resolve a node handle
    pub fn node(&self, handle: Handle) -> Option<&Node> {
        self.nodes.get(self.handles.resolve_node(handle)?)
    }

    /// Resolve a node handle, mutably
    pub fn node_mut(&mut self, handle: Handle) -> Option<&mut Node> {
        self.nodes.get_mut(self.handles.resolve_node(handle)?)
    }

    /// Resolve a pin handle
    pub fn pin(&self, handle: Handle) -> Option<&Pin> {
        self.nodes.pin(self.handles.resolve_pin(handle)?)
    }

    /// Resolve a link handle
    pub fn link(&self, handle: Handle) -> Option<&Link> {
        self.graph.link(self.handles.resolve_link(handle)?)
    }

    /// Links with their handles, in creation order
    pub fn links(&self) -> impl Iterator<Item = (Option<Handle>, &Link)> {
        self.graph
            .links()
            .map(|link| (self.handles.find_link(link.id()), link))
    }

    /// "Create link" gesture: link two pin handles given in either order
    pub fn create_link(&mut self, a: Handle, b: Handle) -> Result<Handle, ConnectError> {
        let a = self.handles.resolve_pin(a).ok_or(ConnectError::InvalidPin)?;
        let b = self.handles.resolve_pin(b).ok_or(ConnectError::InvalidPin)?;
        let link_id = self.connect(a, b)?;
        Ok(self.handles.link_handle(link_id))
    }

    /// Link two pins by ID, given in either order
    pub fn connect(&mut self, a: PinId, b: PinId) -> Result<LinkId, ConnectError> {
        let a = self.nodes.pin(a).ok_or(ConnectError::InvalidPin)?;
        let b = self.nodes.pin(b).ok_or(ConnectError::InvalidPin)?;
        match self.graph.connect(a, b) {
            Ok(link_id) => {
                self.handles.link_handle(link_id);
                Ok(link_id)
            }
            Err(error) => {
                tracing::warn!(a = a.name(), b = b.name(), %error, "link rejected");
                Err(error)
            }
        }
    }

    /// "Delete link" gesture. Unknown handles are ignored.
    pub fn delete_link(&mut self, handle: Handle) -> Option<Link> {
        let link_id = self.handles.resolve_link(handle)?;
        self.disconnect(link_id)
    }

    /// Remove a link by ID. Unknown links are ignored.
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        self.handles.forget_link(link_id);
        self.graph.disconnect(link_id)
    }

    /// "Delete node" gesture: unregister the node, then destroy it.
    /// Unknown handles are ignored.
    pub fn delete_node(&mut self, handle: Handle) -> Option<Node> {
        let node_id = self.handles.resolve_node(handle)?;
        self.remove_node(node_id)
    }

    /// Unregister and destroy a node by ID
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        for link in self.graph.unregister_node(node_id) {
            self.handles.forget_link(link.id());
        }
        self.handles.forget_node(node_id);
        self.nodes.remove(node_id)
    }

    /// Forget everything. Handles issued so far stay dead.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.nodes.clear();
        self.handles.clear();
    }

    /// Topological order of the current graph
    pub fn sort(&mut self) -> TopologicalOrder {
        self.graph.sort()
    }

    /// Evaluate the current graph
    pub fn evaluate(&mut self) -> Result<EvaluationReport, CycleError> {
        self.graph.evaluate(&mut self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Add, Constant};
    use crate::pin::Value;

    fn arithmetic() -> (GraphSession, Handle, Handle) {
        let mut session = GraphSession::default();
        let c = session.add_node(Constant::node("C", Value::Int(5)));
        let mut add = Add::node("A");
        add.input_mut(Add::RHS).unwrap().set_default(Value::Int(3));
        let a = session.add_node(add);
        (session, c, a)
    }

    fn pin_handle(session: &GraphSession, node: Handle, pin: impl Fn(NodeId) -> PinId) -> Handle {
        let node_id = session.handles().resolve_node(node).unwrap();
        session.handles().find_pin(pin(node_id)).unwrap()
    }

    #[test]
    fn test_create_link_from_handles() {
        let (mut session, c, a) = arithmetic();
        let value = pin_handle(&session, c, |n| PinId::source(n, Constant::VALUE));
        let lhs = pin_handle(&session, a, |n| PinId::sink(n, Add::LHS));

        let link = session.create_link(lhs, value).unwrap();
        assert_eq!(session.link(link).map(Link::source), session.pin(value).map(Pin::id));

        let report = session.evaluate().unwrap();
        let a_id = session.node(a).unwrap().id();
        assert_eq!(report.output(a_id, Add::SUM), Some(&Value::Int(8)));
    }

    #[test]
    fn test_unresolved_handles_are_invalid_pins() {
        let (mut session, c, _) = arithmetic();
        let value = pin_handle(&session, c, |n| PinId::source(n, Constant::VALUE));
        let bogus = Handle::from_raw(9999).unwrap();
        assert_eq!(session.create_link(value, bogus), Err(ConnectError::InvalidPin));
        // node handles are not pin handles
        assert_eq!(session.create_link(value, c), Err(ConnectError::InvalidPin));
    }

    #[test]
    fn test_rejected_connect_in_either_order() {
        let (mut session, c, a) = arithmetic();
        let c_id = session.node(c).unwrap().id();
        let a_id = session.node(a).unwrap().id();
        let value = PinId::source(c_id, Constant::VALUE);
        let sum = PinId::source(a_id, Add::SUM);

        assert_eq!(session.connect(value, sum), Err(ConnectError::InvalidPin));
        assert_eq!(session.connect(sum, value), Err(ConnectError::InvalidPin));
        assert_eq!(session.graph().link_count(), 0);

        let lhs = PinId::sink(a_id, Add::LHS);
        assert!(session.connect(lhs, value).is_ok());
        assert_eq!(session.graph().link_count(), 1);
    }

    #[test]
    fn test_delete_link_invalidates_handle() {
        let (mut session, c, a) = arithmetic();
        let value = pin_handle(&session, c, |n| PinId::source(n, Constant::VALUE));
        let lhs = pin_handle(&session, a, |n| PinId::sink(n, Add::LHS));
        let link = session.create_link(value, lhs).unwrap();

        assert!(session.delete_link(link).is_some());
        assert!(session.link(link).is_none());
        assert!(session.delete_link(link).is_none());
        assert_eq!(session.graph().link_count(), 0);
    }

    #[test]
    fn test_delete_node_purges_links_and_handles() {
        let (mut session, c, a) = arithmetic();
        let value = pin_handle(&session, c, |n| PinId::source(n, Constant::VALUE));
        let lhs = pin_handle(&session, a, |n| PinId::sink(n, Add::LHS));
        let link = session.create_link(value, lhs).unwrap();

        assert!(session.delete_node(c).is_some());
        assert!(session.node(c).is_none());
        assert!(session.pin(value).is_none());
        assert!(session.link(link).is_none());
        assert_eq!(session.graph().node_count(), 1);
        assert_eq!(session.graph().link_count(), 0);
        assert!(session.delete_node(c).is_none());
    }

    #[test]
    fn test_pins_added_later_get_handles() {
        let mut session = GraphSession::default();
        let a = session.add_node(Add::node("A"));
        let extra = session.add_input_pin(a, 7, "extra").unwrap();
        assert_eq!(session.pin(extra).map(Pin::key), Some(7));
        assert_eq!(session.pin(extra).map(|p| p.id().slot), Some(2));
    }

    #[test]
    fn test_shared_session() {
        let shared = GraphSession::default().into_shared();
        let worker = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                shared.lock().add_node(Constant::node("C", Value::Int(1)));
            })
        };
        worker.join().unwrap();
        assert_eq!(shared.lock().graph().node_count(), 1);
    }
}
