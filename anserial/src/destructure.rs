//! Declarative pattern matching against a decoded tree.
//!
//! A [`Pattern`] mirrors the shape of the expected data. Leaves must match exactly, lists
//! match containers positionally or maps as `key, value-pattern` pairs, and [`Capture`]
//! leaves extract values into a caller supplied [`CaptureSink`]:
//!
//! ```
//! use anserial::prelude::*;
//!
//! let mut ser = Serializer::new();
//! let data = ser.default_layout().unwrap();
//! ser.add_literal(data, &literal!["results", ["i-19937", 19937u32]]).unwrap();
//! let tree = Deserializer::decode(ser.as_bytes()).unwrap();
//! let doc = Document::new(tree);
//!
//! let mut captures = Captures::new();
//! let value = captures.integer();
//! let pattern = pattern![["results", ["i-19937", value]]];
//! assert!(destructure(doc.data(), &pattern, &mut captures).unwrap());
//! assert_eq!(captures.get_integer(value), Some(19937));
//! ```
//!
//! A failed match is `Ok(false)`, not an error, so that callers can try alternatives. Captures
//! written before a failure are not rolled back.
use crate::entity::EntityType;
use crate::node::{NodeId, NodeRef};
use crate::symbol::hash_symbol;
use crate::utils::Result;

/// Typed destination of an output binding. Slots are handed out by a [`Captures`] buffer (or
/// chosen freely when implementing [`CaptureSink`] directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capture {
    /// Write the payload of an integer node.
    Integer(usize),
    /// Write the text of a string node.
    String(usize),
    /// Record the matched node, whatever its type. Never fails.
    Node(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Symbol(String),
    Integer(u32),
    String(String),
    List(Vec<Pattern>),
    Capture(Capture),
}

impl Pattern {
    pub fn symbol(name: impl Into<String>) -> Self {
        Pattern::Symbol(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Pattern::String(text.into())
    }

    pub fn list(items: impl IntoIterator<Item = Pattern>) -> Self {
        Pattern::List(items.into_iter().collect())
    }

    /// A list of alternating `key, value` items, the form that matches maps.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Pattern)>) -> Self {
        Pattern::List(
            entries
                .into_iter()
                .flat_map(|(k, v)| [Pattern::Symbol(k.into()), v])
                .collect(),
        )
    }
}

impl From<&str> for Pattern {
    fn from(name: &str) -> Self {
        Pattern::Symbol(name.to_string())
    }
}

impl From<String> for Pattern {
    fn from(name: String) -> Self {
        Pattern::Symbol(name)
    }
}

impl From<u32> for Pattern {
    fn from(value: u32) -> Self {
        Pattern::Integer(value)
    }
}

impl From<Capture> for Pattern {
    fn from(capture: Capture) -> Self {
        Pattern::Capture(capture)
    }
}

impl From<Vec<Pattern>> for Pattern {
    fn from(items: Vec<Pattern>) -> Self {
        Pattern::List(items)
    }
}

/// Build a [`Pattern::List`] from nested brackets, like [`literal!`](crate::literal).
/// Braces with `"key": pattern` pairs expand to the alternating list form used for maps.
#[macro_export]
macro_rules! pattern {
    (@item [ $($item:tt),* $(,)? ]) => {
        $crate::destructure::Pattern::List(vec![$($crate::pattern!(@item $item)),*])
    };
    (@item { $($key:literal : $value:tt),* $(,)? }) => {
        $crate::destructure::Pattern::map(vec![
            $(($key, $crate::pattern!(@item $value))),*
        ])
    };
    (@item $other:expr) => {
        $crate::destructure::Pattern::from($other)
    };
    ($($item:tt),* $(,)?) => {
        $crate::destructure::Pattern::List(vec![$($crate::pattern!(@item $item)),*])
    };
}

/// Receiver of values extracted by [`Capture`] patterns.
pub trait CaptureSink {
    fn write_integer(&mut self, slot: usize, value: u32);
    fn write_string(&mut self, slot: usize, value: &str);
    fn write_node(&mut self, slot: usize, node: NodeId);
}

/// A captured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Integer(u32),
    String(String),
    Node(NodeId),
}

/// Slot buffer implementing [`CaptureSink`].
#[derive(Debug, Clone, Default)]
pub struct Captures {
    slots: Vec<Option<Captured>>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> usize {
        self.slots.push(None);
        self.slots.len() - 1
    }

    /// Reserve a slot for an integer.
    pub fn integer(&mut self) -> Capture {
        Capture::Integer(self.allocate())
    }

    /// Reserve a slot for a string.
    pub fn string(&mut self) -> Capture {
        Capture::String(self.allocate())
    }

    /// Reserve a slot for a node id.
    pub fn node(&mut self) -> Capture {
        Capture::Node(self.allocate())
    }

    pub fn get(&self, capture: Capture) -> Option<&Captured> {
        let slot = match capture {
            Capture::Integer(s) | Capture::String(s) | Capture::Node(s) => s,
        };
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_integer(&self, capture: Capture) -> Option<u32> {
        match self.get(capture) {
            Some(Captured::Integer(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, capture: Capture) -> Option<&str> {
        match self.get(capture) {
            Some(Captured::String(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_node(&self, capture: Capture) -> Option<NodeId> {
        match self.get(capture) {
            Some(Captured::Node(v)) => Some(*v),
            _ => None,
        }
    }

    /// Forget every captured value, keeping the slots.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    fn store(&mut self, slot: usize, value: Captured) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        self.slots[slot] = Some(value);
    }
}

impl CaptureSink for Captures {
    fn write_integer(&mut self, slot: usize, value: u32) {
        self.store(slot, Captured::Integer(value));
    }

    fn write_string(&mut self, slot: usize, value: &str) {
        self.store(slot, Captured::String(value.to_string()));
    }

    fn write_node(&mut self, slot: usize, node: NodeId) {
        self.store(slot, Captured::Node(node));
    }
}

/// Match `pattern` against `node`, writing captured values into `sink`.
///
/// Rules, in order:
/// - a capture never fails on a missing node; on a present node, node captures always
///   succeed, integer and string captures require an integer or string node respectively;
/// - a missing node fails any other pattern;
/// - a list against a container matches each sub-pattern with the child at the same index,
///   the container may hold more children but not fewer;
/// - a list against a map is read as `symbol, pattern` pairs; each key must be present;
/// - leaves match leaves of the same type: integers by value, symbols by hash, strings by text;
/// - anything else fails.
pub fn destructure(
    node: Option<NodeRef<'_>>,
    pattern: &Pattern,
    sink: &mut impl CaptureSink,
) -> Result<bool> {
    if let Pattern::Capture(capture) = pattern {
        return capture_into(node, *capture, sink);
    }

    let Some(node) = node else {
        return Ok(false);
    };

    match (node.kind(), pattern) {
        (EntityType::Container, Pattern::List(items)) => {
            if node.child_ids().len() < items.len() {
                return Ok(false);
            }
            for (index, item) in items.iter().enumerate() {
                if !destructure(Some(node.get_by_index(index)?), item, sink)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        (EntityType::Map, Pattern::List(items)) => {
            if items.len() % 2 != 0 {
                return Ok(false);
            }
            for pair in items.chunks_exact(2) {
                let Pattern::Symbol(key) = &pair[0] else {
                    return Ok(false);
                };
                let Some(value) = node.get_by_key(key.as_str())? else {
                    return Ok(false);
                };
                if !destructure(Some(value), &pair[1], sink)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }

        (EntityType::Integer, Pattern::Integer(expected)) => Ok(node.as_uint()? == *expected),
        (EntityType::Symbol, Pattern::Symbol(name)) => Ok(node.as_uint()? == hash_symbol(name)),
        (EntityType::String, Pattern::String(text)) => Ok(node.as_string()? == text.as_str()),

        _ => Ok(false),
    }
}

fn capture_into(
    node: Option<NodeRef<'_>>,
    capture: Capture,
    sink: &mut impl CaptureSink,
) -> Result<bool> {
    let Some(node) = node else {
        return Ok(true);
    };

    match (capture, node.kind()) {
        (Capture::Node(slot), _) => {
            sink.write_node(slot, node.id());
            Ok(true)
        }
        (Capture::Integer(slot), EntityType::Integer) => {
            sink.write_integer(slot, node.as_uint()?);
            Ok(true)
        }
        (Capture::String(slot), EntityType::String) => {
            sink.write_string(slot, node.as_string()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}
