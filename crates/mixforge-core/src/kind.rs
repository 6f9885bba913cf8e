//! Container-kind dispatch.
//!
//! Serialization and traversal both decide what to do with a value by its
//! shape. [`ContainerKind`] is that decision made once, as a closed set of
//! variants, from the node kind and the class's declared container protocol.

use crate::class::{ContainerProtocol, SequenceFlavor};
use crate::error::Result;
use crate::heap::{Heap, Node};
use crate::value::Value;

/// Shape of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Inline value: no children, no identity
    Scalar,
    /// Builtin mapping (including default-factory dicts)
    Dict,
    /// Builtin list
    List,
    /// Builtin tuple
    Tuple,
    /// Builtin set
    Set,
    /// Builtin frozenset
    FrozenSet,
    /// Class instance declaring the mapping protocol
    MappingObject,
    /// Class instance declaring the sequence protocol
    SequenceObject(SequenceFlavor),
    /// Class instance with attributes only
    PlainObject,
}

impl ContainerKind {
    /// Whether this is one of the builtin containers (pure data, no attributes).
    pub fn is_builtin_container(self) -> bool {
        matches!(
            self,
            Self::Dict | Self::List | Self::Tuple | Self::Set | Self::FrozenSet
        )
    }

    /// Whether values of this kind can be iterated.
    pub fn is_iterable(self) -> bool {
        !matches!(self, Self::Scalar | Self::PlainObject)
    }

    /// Whether iteration yields mapping keys (and values are reachable by key).
    pub fn is_mapping(self) -> bool {
        matches!(self, Self::Dict | Self::MappingObject)
    }

    /// Whether values of this kind are class instances.
    pub fn is_object(self) -> bool {
        matches!(
            self,
            Self::MappingObject | Self::SequenceObject(_) | Self::PlainObject
        )
    }
}

impl Heap {
    /// Shape of a value.
    pub fn kind(&self, value: &Value) -> Result<ContainerKind> {
        let id = match value {
            Value::Ref(id) => *id,
            _ => return Ok(ContainerKind::Scalar),
        };
        Ok(match self.node(id)? {
            Node::Dict(_) => ContainerKind::Dict,
            Node::List(_) => ContainerKind::List,
            Node::Tuple(_) => ContainerKind::Tuple,
            Node::Set(_) => ContainerKind::Set,
            Node::FrozenSet(_) => ContainerKind::FrozenSet,
            Node::Object(obj) => match obj.class.container() {
                Some(ContainerProtocol::Mapping) => ContainerKind::MappingObject,
                Some(ContainerProtocol::Sequence(flavor)) => ContainerKind::SequenceObject(flavor),
                None => ContainerKind::PlainObject,
            },
        })
    }
}
