//! Anserial: a compact, self-describing binary encoding for trees of symbols, integers and
//! strings.
//!
//! Encoding shape
//!  - A stream is a flat sequence of 8-byte big-endian records, one per entity. Word 0 holds a
//!    3-bit type tag and a 29-bit parent id, word 1 a 32-bit payload.
//!  - An entity's id is its position in the stream, and parents always precede children, so
//!    any prefix ending on a record boundary decodes to a valid (possibly incomplete) tree.
//!  - Symbols travel as 32-bit hashes; their names ride along in an optional `::symtab` map.
//!
//! Layers
//!  - [`serializer`] emits records and the canonical `::version` / `::data` / `::symtab`
//!    envelope; [`deserializer`] rebuilds a [`tree::Tree`] from them incrementally.
//!  - [`parser`] builds the same tree model from s-expression text.
//!  - [`destructure`] matches declarative patterns against a tree and captures values.
//!  - [`document`] wraps a decoded tree with envelope lookups, name resolution and printing.
//!
//! Example
//! ```
//! use anserial::prelude::*;
//!
//! let mut ser = Serializer::new();
//! let data = ser.default_layout().unwrap();
//! ser.add_literal(data, &literal!["greeting", (Literal::string("hi")), 42u32]).unwrap();
//! ser.add_symtab(0).unwrap();
//!
//! let doc = Document::decode(ser.as_bytes()).unwrap();
//! assert_eq!(doc.version(), Some(FORMAT_VERSION));
//! assert_eq!(doc.pretty_string(80), "((greeting \"hi\" 42))");
//! ```

/// Declarative pattern matching with typed captures.
pub mod destructure;
/// Incremental decoder.
pub mod deserializer;
/// Envelope-aware view over a decoded tree.
pub mod document;
/// Wire record layout and type tags.
pub mod entity;
/// In-memory nodes and their capability surface.
pub mod node;
/// S-expression front end.
pub mod parser;
/// Width-aware, colored rendering of trees.
pub mod printer;
/// Encoder and the canonical envelope.
pub mod serializer;
/// Symbol hashing and name tables.
pub mod symbol;
/// Node arena.
pub mod tree;
/// Error type shared by the crate.
pub mod utils;

pub use utils::{Error, Result};

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::deserializer::Deserializer;
    pub use crate::destructure::{Capture, CaptureSink, Captured, Captures, Pattern, destructure};
    pub use crate::document::Document;
    pub use crate::entity::{Entity, EntityType};
    pub use crate::node::{NodeId, NodeRef};
    pub use crate::parser::{parse, parse_reader};
    pub use crate::printer::PrettyNode;
    pub use crate::serializer::{FORMAT_VERSION, Literal, Serializer};
    pub use crate::symbol::{SymbolKey, SymbolTable, hash_symbol};
    pub use crate::tree::{MAX_DEPTH, Tree};
    pub use crate::utils::Error;
    pub use crate::{literal, pattern};
}
