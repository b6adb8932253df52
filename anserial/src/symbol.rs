//! Symbol hashing and the encode-side symbol table.
//!
//! Symbols travel on the wire as a 32-bit content hash only. The hash is *not* collision
//! free: two names with the same hash are indistinguishable once encoded, and the symbol
//! table keeps the most recently registered name for a hash. This is a property of the
//! format that readers and writers must share, not something this crate tries to repair.
use std::collections::BTreeMap;

use log::{debug, info};

/// Initial accumulator value of [`hash_symbol`].
pub const SYMBOL_HASH_SEED: u32 = 19937;

/// Hash a symbol name.
///
/// For every byte `b` of the UTF-8 name, `h = h * 129 + b` (that is `(h << 7) + h + b`)
/// with 32-bit wraparound, starting from [`SYMBOL_HASH_SEED`].
///
/// Bytes are read as unsigned. Writers that add a signed `char` hash names holding non-ASCII
/// bytes differently, so such names do not interoperate with them; ASCII names always do.
///
/// ```
/// use anserial::symbol::hash_symbol;
/// assert_eq!(hash_symbol(""), 19937);
/// assert_eq!(hash_symbol("results"), 0x0979_f273);
/// ```
pub const fn hash_symbol(name: &str) -> u32 {
    let bytes = name.as_bytes();
    let mut hash = SYMBOL_HASH_SEED;
    let mut i = 0;
    while i < bytes.len() {
        hash = (hash << 7).wrapping_add(hash).wrapping_add(bytes[i] as u32);
        i += 1;
    }
    hash
}

/// Anything that names a symbol: either its text, or an already computed hash.
///
/// Lookups by name are always lookups by hash.
pub trait SymbolKey {
    fn symbol_hash(&self) -> u32;
}

impl SymbolKey for u32 {
    fn symbol_hash(&self) -> u32 {
        *self
    }
}

impl SymbolKey for str {
    fn symbol_hash(&self) -> u32 {
        hash_symbol(self)
    }
}

impl SymbolKey for String {
    fn symbol_hash(&self) -> u32 {
        hash_symbol(self)
    }
}

impl<T: SymbolKey + ?Sized> SymbolKey for &T {
    fn symbol_hash(&self) -> u32 {
        (**self).symbol_hash()
    }
}

/// Mapping from symbol hash to the name that produced it, ordered by hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    names: BTreeMap<u32, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `name`, remember it, and return the hash.
    pub fn intern(&mut self, name: &str) -> u32 {
        let hash = hash_symbol(name);
        self.insert(hash, name);
        hash
    }

    /// Record `name` under `hash`. A previous, different name for the same hash is replaced.
    pub fn insert(&mut self, hash: u32, name: &str) {
        match self.names.get_mut(&hash) {
            Some(previous) if previous == name => {}
            Some(previous) => {
                info!(
                    "Detected a symbol hash collision on hash 0x{hash:08x}: `{previous}` is replaced by `{name}`."
                );
                *previous = name.to_string();
            }
            None => {
                debug!("New symbol `{name}` registered with hash 0x{hash:08x}.");
                self.names.insert(hash, name.to_string());
            }
        }
    }

    pub fn get(&self, key: impl SymbolKey) -> Option<&str> {
        self.names.get(&key.symbol_hash()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(hash, name)` pairs in ascending hash order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.names.iter().map(|(h, n)| (*h, n.as_str()))
    }
}
