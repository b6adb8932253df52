//! Incremental tree builder.
//!
//! A [`Deserializer`] is a decode session: it can be fed the byte stream in arbitrary chunks
//! and keeps its entity counter and node arena between calls, so any prefix of a stream that
//! ends on a record boundary yields a valid (possibly incomplete) tree.
//!
//! The session is single-writer. It has no internal locking; callers that share it must
//! serialize access themselves.
use std::io::Read;

use log::debug;
use smallvec::SmallVec;

use crate::entity::{Entity, RECORD_SIZE, Record};
use crate::node::NodeRef;
use crate::tree::Tree;
use crate::utils::{Error, Result};

/// Number of records read at once by [`Deserializer::ingest_reader`].
const READ_CHUNK_RECORDS: usize = 512;

#[derive(Debug, Clone, Default)]
pub struct Deserializer {
    tree: Tree,
    // Bytes of a record split across two ingest calls.
    partial: SmallVec<u8, RECORD_SIZE>,
}

impl Deserializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a whole buffer in one session.
    ///
    /// ```
    /// use anserial::prelude::*;
    ///
    /// let mut ser = Serializer::new();
    /// let top = ser.add_container(0).unwrap();
    /// ser.add_integer(top, 42).unwrap();
    ///
    /// let tree = Deserializer::decode(ser.as_bytes()).unwrap();
    /// let root = tree.root().unwrap();
    /// assert_eq!(root.get_by_index(0).unwrap().as_uint().unwrap(), 42);
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Tree> {
        let mut session = Self::new();
        session.ingest(bytes)?;
        Ok(session.into_tree())
    }

    /// Feed the next chunk of the stream and return the root, if any entity exists yet.
    ///
    /// Records are materialized in order. A record naming a parent that does not exist yet
    /// aborts the call with [`Error::ForwardReference`]; records linked before it stay in the
    /// tree and the rest of the chunk is dropped.
    pub fn ingest(&mut self, mut chunk: &[u8]) -> Result<Option<NodeRef<'_>>> {
        let before = self.tree.len();

        if !self.partial.is_empty() {
            let missing = (RECORD_SIZE - self.partial.len()).min(chunk.len());
            self.partial.extend_from_slice(&chunk[..missing]);
            chunk = &chunk[missing..];

            if self.partial.len() == RECORD_SIZE {
                let mut record: Record = [0; RECORD_SIZE];
                record.copy_from_slice(&self.partial);
                self.partial.clear();
                self.ingest_record(&record)?;
            }
        }

        let mut records = chunk.chunks_exact(RECORD_SIZE);
        for raw in records.by_ref() {
            let mut record: Record = [0; RECORD_SIZE];
            record.copy_from_slice(raw);
            self.ingest_record(&record)?;
        }
        self.partial.extend_from_slice(records.remainder());

        debug!(
            "Ingested {} entities ({} total, {} bytes pending).",
            self.tree.len() - before,
            self.tree.len(),
            self.partial.len()
        );

        Ok(self.tree.root())
    }

    /// Drain a reader into this session.
    pub fn ingest_reader(&mut self, mut reader: impl Read) -> Result<Option<NodeRef<'_>>> {
        let mut buffer = vec![0u8; READ_CHUNK_RECORDS * RECORD_SIZE];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            };
            self.ingest(&buffer[..read])?;
        }
        Ok(self.tree.root())
    }

    fn ingest_record(&mut self, record: &Record) -> Result<()> {
        let entity = Entity::decode(record);
        self.tree.push(entity)?;
        Ok(())
    }

    /// Number of entities materialized so far.
    pub fn entity_count(&self) -> usize {
        self.tree.len()
    }

    /// Bytes of an incomplete trailing record waiting for the next chunk.
    pub fn pending_bytes(&self) -> usize {
        self.partial.len()
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.tree.root()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// End the session, keeping the decoded tree.
    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

/// Resume a session after the entities of `tree`.
impl From<Tree> for Deserializer {
    fn from(tree: Tree) -> Self {
        Self {
            tree,
            partial: SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    fn record(kind: EntityType, parent: u32, payload: u32) -> Record {
        Entity::new(kind, parent, payload).unwrap().encode()
    }

    #[test]
    fn records_split_across_chunks() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&record(EntityType::Container, 0, 0));
        bytes.extend_from_slice(&record(EntityType::Integer, 0, 7));

        let mut session = Deserializer::new();
        session.ingest(&bytes[..5]).unwrap();
        assert_eq!(session.entity_count(), 0);
        assert_eq!(session.pending_bytes(), 5);

        session.ingest(&bytes[5..11]).unwrap();
        assert_eq!(session.entity_count(), 1);
        assert_eq!(session.pending_bytes(), 3);

        let root = session.ingest(&bytes[11..]).unwrap().unwrap();
        assert_eq!(root.children().len(), 1);
        assert_eq!(session.pending_bytes(), 0);
    }

    #[test]
    fn failed_record_keeps_previous_links() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&record(EntityType::Container, 0, 0));
        bytes.extend_from_slice(&record(EntityType::Integer, 0, 1));
        bytes.extend_from_slice(&record(EntityType::Integer, 9, 2));

        let mut session = Deserializer::new();
        let err = session.ingest(&bytes).unwrap_err();
        assert!(err.is_structural());
        assert_eq!(session.entity_count(), 2);
        assert_eq!(session.root().unwrap().children().len(), 1);
    }
}
