// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Produces a value (output pin)
    Source,
    /// Consumes a value (input pin)
    Sink,
}

/// Identity of a pin: owning node, direction and slot within that direction.
///
/// Pins are only ever appended to a node, so a slot never changes meaning for
/// the lifetime of the owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinId {
    /// Owning node
    pub node: NodeId,
    /// Source or sink
    pub direction: PinDirection,
    /// Position in the node's input or output sequence
    pub slot: usize,
}

impl PinId {
    /// Identity of an input pin
    pub fn sink(node: NodeId, slot: usize) -> Self {
        Self {
            node,
            direction: PinDirection::Sink,
            slot,
        }
    }

    /// Identity of an output pin
    pub fn source(node: NodeId, slot: usize) -> Self {
        Self {
            node,
            direction: PinDirection::Source,
            slot,
        }
    }
}

/// A pin on a node
#[derive(Debug, Clone)]
pub struct Pin {
    id: PinId,
    key: usize,
    name: String,
    default_value: Option<Value>,
}

impl Pin {
    pub(crate) fn new(id: PinId, key: usize, name: impl Into<String>) -> Self {
        Self {
            id,
            key,
            name: name.into(),
            default_value: None,
        }
    }

    /// Pin identity
    pub fn id(&self) -> PinId {
        self.id
    }

    /// The node this pin belongs to
    pub fn owner_node(&self) -> NodeId {
        self.id.node
    }

    /// Caller-chosen key, only meaningful to the owning node kind
    pub fn key(&self) -> usize {
        self.key
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pin direction
    pub fn direction(&self) -> PinDirection {
        self.id.direction
    }

    /// Whether this pin produces a value
    pub fn is_source(&self) -> bool {
        self.id.direction == PinDirection::Source
    }

    /// Whether this pin consumes a value
    pub fn is_sink(&self) -> bool {
        self.id.direction == PinDirection::Sink
    }

    /// Preset value used by an input when nothing is linked into it
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Set the preset value
    pub fn set_default(&mut self, value: Value) -> &mut Self {
        self.default_value = Some(value);
        self
    }

    /// Clear the preset value
    pub fn clear_default(&mut self) {
        self.default_value = None;
    }
}

/// Value that flows between pins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// Text
    Text(String),
}

impl Value {
    /// Name of the variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Add two values.
    ///
    /// Integers stay integers (wrapping), mixed numerics promote to float and
    /// text concatenates. Anything else is `None`.
    pub fn add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a.wrapping_add(*b))),
            (Self::Text(a), Self::Text(b)) => Some(Self::Text(format!("{a}{b}"))),
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                Some(Self::Float(self.as_f64()? + other.as_f64()?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
