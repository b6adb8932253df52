//! Encoder: assigns entity ids and emits wire records for an application-built tree.
//!
//! Every primitive takes the id of an already emitted parent (or the id the new entity will
//! receive, which makes it self-parented, as done for the root) and returns the id of the new
//! entity. The convenience layer builds the canonical envelope:
//!
//! ```text
//! (map ::version (map major M minor m patch p)
//!      ::data    <application payload>
//!      ::symtab  (map <hash> "<name>" ...))
//! ```
use std::io::Write;

use semver::Version;

use crate::entity::{Entity, EntityType, MAX_PARENT_ID, RECORD_SIZE, Record};
use crate::symbol::SymbolTable;
use crate::utils::{Error, Result};

mod literal;
pub use literal::Literal;

/// Generator version written into `::version`.
pub const FORMAT_VERSION: Version = Version::new(0, 1, 0);

/// Payload written for container entities.
pub const CONTAINER_PAYLOAD: u32 = 0;
/// Payload written for map entities.
pub const MAP_PAYLOAD: u32 = 0xcafe_babe;
/// Payload written for string entities.
pub const STRING_PAYLOAD: u32 = 0x0bad_f00d;

pub const VERSION_KEY: &str = "::version";
pub const DATA_KEY: &str = "::data";
pub const SYMTAB_KEY: &str = "::symtab";

/// One encode session: id counter, output records, and the names of every symbol emitted.
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    counter: u32,
    output: Vec<u8>,
    symtab: SymbolTable,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit one entity. `parent` may not exceed the id the new entity receives.
    pub fn add_entity(&mut self, kind: EntityType, parent: u32, payload: u32) -> Result<u32> {
        if self.counter > MAX_PARENT_ID {
            return Err(Error::TooManyEntities {
                max: MAX_PARENT_ID + 1,
            });
        }
        if parent > self.counter {
            return Err(Error::ForwardReference {
                index: self.counter,
                parent,
                count: self.counter,
            });
        }

        let id = self.counter;
        self.output
            .extend_from_slice(&Entity::new(kind, parent, payload)?.encode());
        self.counter += 1;
        Ok(id)
    }

    pub fn add_container(&mut self, parent: u32) -> Result<u32> {
        self.add_entity(EntityType::Container, parent, CONTAINER_PAYLOAD)
    }

    pub fn add_map(&mut self, parent: u32) -> Result<u32> {
        self.add_entity(EntityType::Map, parent, MAP_PAYLOAD)
    }

    pub fn add_integer(&mut self, parent: u32, value: u32) -> Result<u32> {
        self.add_entity(EntityType::Integer, parent, value)
    }

    /// Emit a symbol and record its name in the symbol table.
    pub fn add_symbol(&mut self, parent: u32, name: &str) -> Result<u32> {
        let id = self.add_symbol_hash(parent, crate::symbol::hash_symbol(name))?;
        self.symtab.intern(name);
        Ok(id)
    }

    /// Emit a symbol from a precomputed hash; the symbol table is left untouched.
    pub fn add_symbol_hash(&mut self, parent: u32, hash: u32) -> Result<u32> {
        self.add_entity(EntityType::Symbol, parent, hash)
    }

    /// Emit a string entity followed by one integer child per code point.
    pub fn add_string(&mut self, parent: u32, text: &str) -> Result<u32> {
        let id = self.add_entity(EntityType::String, parent, STRING_PAYLOAD)?;
        for c in text.chars() {
            self.add_integer(id, c as u32)?;
        }
        Ok(id)
    }

    /// Lower a [`Literal`] depth-first under `parent`, returning the id of its top entity.
    pub fn add_literal(&mut self, parent: u32, literal: &Literal) -> Result<u32> {
        match literal {
            Literal::Symbol(name) => self.add_symbol(parent, name),
            Literal::Integer(value) => self.add_integer(parent, *value),
            Literal::String(text) => self.add_string(parent, text),
            Literal::List(items) => {
                let id = self.add_container(parent)?;
                for item in items {
                    self.add_literal(id, item)?;
                }
                Ok(id)
            }
            Literal::Map(entries) => {
                let id = self.add_map(parent)?;
                for (key, value) in entries {
                    self.add_map_entry(id, key, value)?;
                }
                Ok(id)
            }
        }
    }

    /// Emit a `key` symbol then `value` under the map `map`, returning the value's id.
    pub fn add_map_entry(&mut self, map: u32, key: &str, value: &Literal) -> Result<u32> {
        self.add_symbol(map, key)?;
        self.add_literal(map, value)
    }

    /// Attach `::version` (a `major`/`minor`/`patch` map) to the map `parent`.
    pub fn add_version(&mut self, parent: u32) -> Result<u32> {
        let version = Literal::map([
            ("major", Literal::Integer(FORMAT_VERSION.major as u32)),
            ("minor", Literal::Integer(FORMAT_VERSION.minor as u32)),
            ("patch", Literal::Integer(FORMAT_VERSION.patch as u32)),
        ]);
        self.add_map_entry(parent, VERSION_KEY, &version)
    }

    /// Attach an empty `::data` container to the map `parent`.
    pub fn add_data(&mut self, parent: u32) -> Result<u32> {
        self.add_map_entry(parent, DATA_KEY, &Literal::List(Vec::new()))
    }

    /// Attach `::symtab`, mapping every hash emitted so far to its name, to the map `parent`.
    /// Returns the id of the symbol table map.
    pub fn add_symtab(&mut self, parent: u32) -> Result<u32> {
        self.add_symbol(parent, SYMTAB_KEY)?;
        let table = self.add_map(parent)?;

        let entries: Vec<(u32, String)> = self
            .symtab
            .iter()
            .map(|(hash, name)| (hash, name.to_string()))
            .collect();
        for (hash, name) in entries {
            self.add_symbol_hash(table, hash)?;
            self.add_string(table, &name)?;
        }

        Ok(table)
    }

    /// Start the canonical envelope: a self-parented root map holding `::version` and an empty
    /// `::data` container. Returns the id of `::data`.
    ///
    /// The root must be the first entity, so this is only valid on a fresh session.
    pub fn default_layout(&mut self) -> Result<u32> {
        let top = self.add_map(0)?;
        self.add_version(top)?;
        self.add_data(top)
    }

    /// Number of entities emitted.
    pub fn len(&self) -> usize {
        self.counter as usize
    }

    pub fn is_empty(&self) -> bool {
        self.counter == 0
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symtab
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Copy of the encoded stream.
    pub fn serialize(&self) -> Vec<u8> {
        self.output.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    pub fn records(&self) -> impl ExactSizeIterator<Item = Record> + '_ {
        self.output.chunks_exact(RECORD_SIZE).map(|raw| {
            let mut record: Record = [0; RECORD_SIZE];
            record.copy_from_slice(raw);
            record
        })
    }

    pub fn write_to(&self, mut out: impl Write) -> Result<()> {
        out.write_all(&self.output)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::hash_symbol;

    #[test]
    fn parent_must_exist() {
        let mut ser = Serializer::new();
        assert_eq!(ser.add_container(0).unwrap(), 0);
        assert!(matches!(
            ser.add_integer(2, 5),
            Err(Error::ForwardReference {
                index: 1,
                parent: 2,
                count: 1
            })
        ));
        assert_eq!(ser.len(), 1);
    }

    #[test]
    fn string_expands_to_code_points() {
        let mut ser = Serializer::new();
        ser.add_string(0, "AB").unwrap();

        let entities: Vec<Entity> = ser.records().map(|r| Entity::decode(&r)).collect();
        assert_eq!(
            entities,
            vec![
                Entity::new(EntityType::String, 0, STRING_PAYLOAD).unwrap(),
                Entity::new(EntityType::Integer, 0, 65).unwrap(),
                Entity::new(EntityType::Integer, 0, 66).unwrap(),
            ]
        );
    }

    #[test]
    fn symtab_lists_every_symbol() {
        let mut ser = Serializer::new();
        let data = ser.default_layout().unwrap();
        ser.add_symbol(data, "hello").unwrap();
        ser.add_symtab(0).unwrap();

        let names: Vec<&str> = ser.symbols().iter().map(|(_, n)| n).collect();
        for name in ["::version", "::data", "::symtab", "major", "minor", "patch", "hello"] {
            assert!(names.contains(&name), "missing {name}");
        }
        assert_eq!(ser.symbols().get(hash_symbol("hello")), Some("hello"));
    }
}
