use log::trace;

use crate::entity::{Entity, MAX_PARENT_ID};
use crate::node::{Node, NodeId, NodeRef};
use crate::symbol::SymbolTable;
use crate::utils::{Error, Result};

/// Deepest list nesting the text parser accepts and the printer renders in full.
///
/// Decoding has no such limit: the arena stores any depth without recursing.
pub const MAX_DEPTH: usize = 256;

/// Arena owning every node of one decode or parse session.
///
/// Nodes are appended in entity order and released together with the tree. Parent, child,
/// key and value relations are plain [`NodeId`] indices into the arena, so the root recording
/// itself as its own parent is just an index that is never enumerated as its own child.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    // Names seen by the text parser; decoded trees carry theirs in `::symtab` instead.
    symbols: SymbolTable,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node of entity 0, if any entity was materialized.
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.get(NodeId::ROOT)
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id.index()).map(|node| NodeRef::new(self, node))
    }

    // Ids stored inside nodes always point backwards into the arena.
    pub(crate) fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, &self.nodes[id.index()])
    }

    /// All nodes, in entity order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        self.nodes.iter().map(move |node| NodeRef::new(self, node))
    }

    /// Entities of all nodes, in entity order, as they would appear on the wire.
    pub fn entities(&self) -> impl ExactSizeIterator<Item = &Entity> + '_ {
        self.nodes.iter().map(Node::entity)
    }

    /// Names registered while building this tree from text.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub(crate) fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Materialize `entity` as the next node and link it into its parent.
    ///
    /// The parent must already exist, or be the new node itself (self-parent sentinel, which
    /// is not linked). On error nothing is appended.
    pub(crate) fn push(&mut self, entity: Entity) -> Result<NodeId> {
        let count = self.nodes.len() as u32;
        if count > MAX_PARENT_ID {
            return Err(Error::TooManyEntities {
                max: MAX_PARENT_ID + 1,
            });
        }
        if entity.parent > count {
            return Err(Error::ForwardReference {
                index: count,
                parent: entity.parent,
                count,
            });
        }

        let id = NodeId::new(count);
        self.nodes.push(Node::new(id, entity));

        let parent = NodeId::new(entity.parent);
        if parent != id {
            trace!("Linking {} ({}) into {}", id, entity.kind, parent);
            self.nodes[parent.index()].link(id, &entity);
        }

        Ok(id)
    }
}
