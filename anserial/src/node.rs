//! In-memory node model.
//!
//! Nodes live in a [`Tree`] arena and refer to each other through [`NodeId`] indices, never
//! through owning pointers. The variant of a node is fixed by the type tag of its entity and
//! decides how children are linked into it:
//!
//! | variant     | linking behaviour                                                  |
//! |-------------|--------------------------------------------------------------------|
//! | `container` | appended to the ordered child list                                 |
//! | `map`       | alternating key / value: the key's payload indexes the value       |
//! | `string`    | each integer child contributes one code point, others are ignored  |
//! | leaves      | `symbol` and `integer` take no children                            |
//! | reserved    | inert, linking is a no-op                                          |
//!
//! Accessors that a variant does not provide return [`Error::Unsupported`].
use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::entity::{Entity, EntityType};
use crate::symbol::SymbolKey;
use crate::tree::Tree;
use crate::utils::{Error, Result};

/// Dense index of a node inside its [`Tree`], equal to the entity id on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The first entity of a stream is the root.
    pub const ROOT: NodeId = NodeId(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MapBody {
    keys: Vec<NodeId>,
    values: Vec<NodeId>,
    entries: BTreeMap<u32, NodeId>,
    // Payload of a key waiting for its value.
    pending_key: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeBody {
    Container(Vec<NodeId>),
    Map(MapBody),
    String(String),
    Leaf,
    Inert,
}

/// One materialized entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    entity: Entity,
    body: NodeBody,
}

impl Node {
    pub(crate) fn new(id: NodeId, entity: Entity) -> Self {
        let body = match entity.kind {
            EntityType::Container => NodeBody::Container(Vec::new()),
            EntityType::Map => NodeBody::Map(MapBody::default()),
            EntityType::String => NodeBody::String(String::new()),
            EntityType::Symbol | EntityType::Integer => NodeBody::Leaf,
            EntityType::Set | EntityType::Null | EntityType::Reserved => NodeBody::Inert,
        };

        Self { id, entity, body }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn kind(&self) -> EntityType {
        self.entity.kind
    }

    /// Variant-specific child linking. `child` is never this node itself; the tree filters the
    /// self-parented root out before calling this.
    pub(crate) fn link(&mut self, child: NodeId, child_entity: &Entity) {
        debug_assert_ne!(child, self.id, "a node cannot be linked into itself");

        match &mut self.body {
            NodeBody::Container(children) => children.push(child),
            NodeBody::Map(map) => match map.pending_key.take() {
                None => {
                    map.pending_key = Some(child_entity.payload);
                    map.keys.push(child);
                }
                Some(key) => {
                    map.entries.insert(key, child);
                    map.values.push(child);
                }
            },
            NodeBody::String(text) => {
                if child_entity.kind == EntityType::Integer {
                    let c = char::from_u32(child_entity.payload).unwrap_or_else(|| {
                        debug!(
                            "String node {} received invalid code point 0x{:x}, replaced with U+FFFD.",
                            self.id, child_entity.payload
                        );
                        char::REPLACEMENT_CHARACTER
                    });
                    text.push(c);
                }
            }
            NodeBody::Leaf | NodeBody::Inert => {}
        }
    }

    fn unsupported(&self, operation: &'static str) -> Error {
        Error::Unsupported {
            operation,
            kind: self.entity.kind,
        }
    }
}

/// Borrowed handle on a node of a [`Tree`], exposing the shared capability surface.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    node: &'t Node,
}

impl<'t> NodeRef<'t> {
    pub(crate) fn new(tree: &'t Tree, node: &'t Node) -> Self {
        Self { tree, node }
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn kind(&self) -> EntityType {
        self.node.entity.kind
    }

    pub fn entity(&self) -> &'t Entity {
        &self.node.entity
    }

    /// Raw payload word, whatever the variant.
    pub fn payload(&self) -> u32 {
        self.node.entity.payload
    }

    /// Parent node, or `None` for a self-parented node such as the root.
    pub fn parent(&self) -> Option<NodeRef<'t>> {
        let parent = NodeId::new(self.node.entity.parent);
        if parent == self.node.id {
            None
        } else {
            self.tree.get(parent)
        }
    }

    /// Positional child of a container.
    pub fn get_by_index(&self, index: usize) -> Result<NodeRef<'t>> {
        match &self.node.body {
            NodeBody::Container(children) => children
                .get(index)
                .map(|id| self.tree.node_ref(*id))
                .ok_or(Error::IndexOutOfRange {
                    index,
                    len: children.len(),
                }),
            _ => Err(self.node.unsupported("get_by_index")),
        }
    }

    /// Value stored in a map under a symbol name or hash. `Ok(None)` when the key is absent.
    pub fn get_by_key(&self, key: impl SymbolKey) -> Result<Option<NodeRef<'t>>> {
        match &self.node.body {
            NodeBody::Map(map) => Ok(map
                .entries
                .get(&key.symbol_hash())
                .map(|id| self.tree.node_ref(*id))),
            _ => Err(self.node.unsupported("get_by_key")),
        }
    }

    /// Text accumulated by a string node.
    pub fn as_string(&self) -> Result<&'t str> {
        match &self.node.body {
            NodeBody::String(text) => Ok(text.as_str()),
            _ => Err(self.node.unsupported("as_string")),
        }
    }

    /// Payload of an integer node, or the hash of a symbol node.
    pub fn as_uint(&self) -> Result<u32> {
        match self.node.entity.kind {
            EntityType::Integer | EntityType::Symbol => Ok(self.node.entity.payload),
            _ => Err(self.node.unsupported("as_uint")),
        }
    }

    /// Ordered children: container elements or map values. Empty for every other variant.
    pub fn child_ids(&self) -> &'t [NodeId] {
        match &self.node.body {
            NodeBody::Container(children) => children,
            NodeBody::Map(map) => &map.values,
            _ => &[],
        }
    }

    /// Ordered key nodes of a map. Empty for every other variant.
    pub fn key_ids(&self) -> &'t [NodeId] {
        match &self.node.body {
            NodeBody::Map(map) => &map.keys,
            _ => &[],
        }
    }

    pub fn children(
        &self,
    ) -> impl ExactSizeIterator<Item = NodeRef<'t>> + DoubleEndedIterator + use<'t> {
        let tree = self.tree;
        self.child_ids().iter().map(move |id| tree.node_ref(*id))
    }

    pub fn keys(
        &self,
    ) -> impl ExactSizeIterator<Item = NodeRef<'t>> + DoubleEndedIterator + use<'t> {
        let tree = self.tree;
        self.key_ids().iter().map(move |id| tree.node_ref(*id))
    }

    /// Comparison of kinds, leaf values, texts and child structure, at any depth.
    ///
    /// Ids, parents and the sentinel payloads of containers, maps and strings are ignored, so
    /// trees coming from different sessions (or from the text parser) can be compared.
    pub fn structural_eq(&self, other: &NodeRef<'_>) -> bool {
        let mut pending = vec![(*self, *other)];

        while let Some((a, b)) = pending.pop() {
            if a.kind() != b.kind() {
                return false;
            }

            let leaves_match = match a.kind() {
                EntityType::Symbol | EntityType::Integer => a.payload() == b.payload(),
                EntityType::String => a.as_string().ok() == b.as_string().ok(),
                _ => true,
            };
            if !leaves_match
                || a.child_ids().len() != b.child_ids().len()
                || a.key_ids().len() != b.key_ids().len()
            {
                return false;
            }

            // Reversed so keys, then children, are compared in stream order.
            pending.extend(a.children().zip(b.children()).rev());
            pending.extend(a.keys().zip(b.keys()).rev());
        }

        true
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.node.id)
            .field("kind", &self.node.entity.kind)
            .field("payload", &self.node.entity.payload)
            .finish()
    }
}
