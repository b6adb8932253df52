//! High-level view over a decoded tree.
//!
//! A [`Document`] locates the parts of the canonical envelope (`::version`, `::data`,
//! `::symtab`) once and offers name resolution for symbol hashes. Streams that do not use the
//! envelope are still accepted: [`Document::data`] then falls back to the root.
use std::io::{self, Write};

use log::debug;
use pretty::RcDoc;
use semver::Version;
use termcolor::WriteColor;

use crate::deserializer::Deserializer;
use crate::destructure::{Captures, Pattern, destructure};
use crate::entity::EntityType;
use crate::node::{NodeId, NodeRef};
use crate::printer::{self, Style};
use crate::serializer::{DATA_KEY, SYMTAB_KEY, VERSION_KEY};
use crate::symbol::SymbolKey;
use crate::tree::Tree;
use crate::utils::Result;

#[derive(Debug, Clone, Default)]
pub struct Document {
    session: Deserializer,
    version: Option<NodeId>,
    data: Option<NodeId>,
    symtab: Option<NodeId>,
}

impl Document {
    pub fn new(tree: Tree) -> Self {
        Self::from_deserializer(Deserializer::from(tree))
    }

    pub fn from_deserializer(session: Deserializer) -> Self {
        let mut doc = Self {
            session,
            ..Self::default()
        };
        doc.refresh();
        doc
    }

    /// Decode a complete buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(Deserializer::decode(bytes)?))
    }

    /// Feed more of the stream, then locate the envelope parts again.
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<()> {
        let result = self.session.ingest(chunk).map(|_| ());
        self.refresh();
        result
    }

    /// Locate `::version`, `::data` and `::symtab` in the current tree.
    pub fn refresh(&mut self) {
        let root = self.session.root();
        let find = |key: &str| {
            root.filter(|r| r.kind() == EntityType::Map)
                .and_then(|r| r.get_by_key(key).ok().flatten())
                .map(|n| n.id())
        };

        let (version, data, symtab) = (find(VERSION_KEY), find(DATA_KEY), find(SYMTAB_KEY));
        debug!(
            "Document envelope: version={:?}, data={:?}, symtab={:?}",
            version, data, symtab
        );
        self.version = version;
        self.data = data;
        self.symtab = symtab;
    }

    pub fn tree(&self) -> &Tree {
        self.session.tree()
    }

    pub fn into_tree(self) -> Tree {
        self.session.into_tree()
    }

    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.tree().root()
    }

    /// The `::data` payload, or the root when the stream has no envelope.
    pub fn data(&self) -> Option<NodeRef<'_>> {
        match self.data {
            Some(id) => self.tree().get(id),
            None => self.root(),
        }
    }

    pub fn version_node(&self) -> Option<NodeRef<'_>> {
        self.version.and_then(|id| self.tree().get(id))
    }

    pub fn symtab(&self) -> Option<NodeRef<'_>> {
        self.symtab.and_then(|id| self.tree().get(id))
    }

    /// Generator version recorded in `::version`, if present and well formed.
    pub fn version(&self) -> Option<Version> {
        let mut captures = Captures::new();
        let (major, minor, patch) = (captures.integer(), captures.integer(), captures.integer());
        let pattern = Pattern::map([
            ("major", Pattern::Capture(major)),
            ("minor", Pattern::Capture(minor)),
            ("patch", Pattern::Capture(patch)),
        ]);

        if !destructure(self.version_node(), &pattern, &mut captures).ok()? {
            return None;
        }
        Some(Version::new(
            captures.get_integer(major)?.into(),
            captures.get_integer(minor)?.into(),
            captures.get_integer(patch)?.into(),
        ))
    }

    /// Name of a symbol: from `::symtab` first, then from the names a text parse recorded.
    pub fn lookup(&self, key: impl SymbolKey) -> Option<&str> {
        let hash = key.symbol_hash();
        self.symtab()
            .and_then(|table| table.get_by_key(hash).ok().flatten())
            .and_then(|name| name.as_string().ok())
            .or_else(|| self.tree().symbols().get(hash))
    }

    /// Annotated document of `node`, with symbol names resolved through [`Document::lookup`].
    pub fn pretty_doc(&self, node: NodeRef<'_>) -> RcDoc<'static, Style> {
        printer::to_doc(node, &|hash| self.lookup(hash).map(str::to_string))
    }

    /// Plain rendering of the data payload at `width` columns.
    pub fn pretty_string(&self, width: usize) -> String {
        match self.data() {
            Some(node) => printer::render_string(&self.pretty_doc(node), width),
            None => String::new(),
        }
    }

    /// Render the whole tree, envelope included, to a color-capable writer.
    pub fn pretty_render_to<W: WriteColor + Write>(
        &self,
        width: usize,
        out: &mut W,
    ) -> io::Result<()> {
        if let Some(root) = self.root() {
            printer::render_to(&self.pretty_doc(root), width, out)?;
        }
        writeln!(out)
    }
}

impl From<Tree> for Document {
    fn from(tree: Tree) -> Self {
        Self::new(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::{FORMAT_VERSION, Serializer};

    #[test]
    fn envelope_parts_are_found() {
        let mut ser = Serializer::new();
        let data = ser.default_layout().unwrap();
        ser.add_integer(data, 9).unwrap();
        ser.add_symtab(0).unwrap();

        let doc = Document::decode(ser.as_bytes()).unwrap();
        assert_eq!(doc.version(), Some(FORMAT_VERSION));
        assert_eq!(doc.data().unwrap().children().len(), 1);
        assert_eq!(doc.lookup("::data"), Some("::data"));
        assert_eq!(doc.lookup(0x1234_5678u32), None);
    }

    #[test]
    fn bare_container_is_its_own_data() {
        let mut ser = Serializer::new();
        ser.add_container(0).unwrap();

        let doc = Document::decode(ser.as_bytes()).unwrap();
        assert_eq!(doc.data().unwrap().id(), NodeId::ROOT);
        assert!(doc.version().is_none());
        assert!(doc.symtab().is_none());
    }
}
