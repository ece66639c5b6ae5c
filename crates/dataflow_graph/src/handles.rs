// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integer handles for node-link editor widgets.
//!
//! Editor widgets identify nodes, pins and links by plain integers they get
//! from the host. This table hands those integers out and maps them back to
//! typed IDs. Handles are never zero and never reused, so a handle that
//! outlived its target fails to resolve instead of aliasing something new.

use crate::link::LinkId;
use crate::node::NodeId;
use crate::pin::PinId;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroU64;

/// An opaque editor handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Wrap a raw widget handle. Zero is the widget's null handle.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Raw value to hand to the widget
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

/// One direction-pair of mappings
#[derive(Debug)]
struct BiMap<T> {
    by_handle: HashMap<Handle, T>,
    by_target: HashMap<T, Handle>,
}

impl<T> Default for BiMap<T> {
    fn default() -> Self {
        Self {
            by_handle: HashMap::new(),
            by_target: HashMap::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> BiMap<T> {
    fn insert(&mut self, handle: Handle, target: T) {
        self.by_handle.insert(handle, target);
        self.by_target.insert(target, handle);
    }

    fn remove_target(&mut self, target: &T) -> Option<Handle> {
        let handle = self.by_target.remove(target)?;
        self.by_handle.remove(&handle);
        Some(handle)
    }

    fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.by_handle.retain(|_, target| keep(target));
        self.by_target.retain(|target, _| keep(target));
    }

    fn clear(&mut self) {
        self.by_handle.clear();
        self.by_target.clear();
    }
}

/// Bidirectional handle table for nodes, pins and links
#[derive(Debug)]
pub struct HandleTable {
    next: u64,
    nodes: BiMap<NodeId>,
    pins: BiMap<PinId>,
    links: BiMap<LinkId>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            next: 1,
            nodes: BiMap::default(),
            pins: BiMap::default(),
            links: BiMap::default(),
        }
    }

    fn allocate(&mut self) -> Handle {
        let raw = self.next;
        self.next += 1;
        // next starts at 1 and only grows
        Handle(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    /// Handle for a node, allocated on first use
    pub fn node_handle(&mut self, node_id: NodeId) -> Handle {
        if let Some(handle) = self.nodes.by_target.get(&node_id) {
            return *handle;
        }
        let handle = self.allocate();
        self.nodes.insert(handle, node_id);
        handle
    }

    /// Handle for a pin, allocated on first use
    pub fn pin_handle(&mut self, pin_id: PinId) -> Handle {
        if let Some(handle) = self.pins.by_target.get(&pin_id) {
            return *handle;
        }
        let handle = self.allocate();
        self.pins.insert(handle, pin_id);
        handle
    }

    /// Handle for a link, allocated on first use
    pub fn link_handle(&mut self, link_id: LinkId) -> Handle {
        if let Some(handle) = self.links.by_target.get(&link_id) {
            return *handle;
        }
        let handle = self.allocate();
        self.links.insert(handle, link_id);
        handle
    }

    /// Existing handle of a node
    pub fn find_node(&self, node_id: NodeId) -> Option<Handle> {
        self.nodes.by_target.get(&node_id).copied()
    }

    /// Existing handle of a pin
    pub fn find_pin(&self, pin_id: PinId) -> Option<Handle> {
        self.pins.by_target.get(&pin_id).copied()
    }

    /// Existing handle of a link
    pub fn find_link(&self, link_id: LinkId) -> Option<Handle> {
        self.links.by_target.get(&link_id).copied()
    }

    /// Resolve a node handle
    pub fn resolve_node(&self, handle: Handle) -> Option<NodeId> {
        self.nodes.by_handle.get(&handle).copied()
    }

    /// Resolve a pin handle
    pub fn resolve_pin(&self, handle: Handle) -> Option<PinId> {
        self.pins.by_handle.get(&handle).copied()
    }

    /// Resolve a link handle
    pub fn resolve_link(&self, handle: Handle) -> Option<LinkId> {
        self.links.by_handle.get(&handle).copied()
    }

    /// Drop a link's handle
    pub fn forget_link(&mut self, link_id: LinkId) -> Option<Handle> {
        self.links.remove_target(&link_id)
    }

    /// Drop a node's handle and the handles of all its pins
    pub fn forget_node(&mut self, node_id: NodeId) -> Option<Handle> {
        self.pins.retain(|pin| pin.node != node_id);
        self.nodes.remove_target(&node_id)
    }

    /// Drop every handle. Handle values are still never reused.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.pins.clear();
        self.links.clear();
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.nodes.by_handle.len() + self.pins.by_handle.len() + self.links.by_handle.len()
    }

    /// Whether no handle is live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
