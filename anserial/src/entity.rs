//! Fixed-size wire records.
//!
//! Every entity is serialized as 8 bytes, big-endian:
//!
//! ```text
//! word 0: [ type tag : TAG_BITS ][ parent id : 32 - TAG_BITS ]
//! word 1: [ payload : 32 ]
//! ```
//!
//! The id of an entity is implicit: the i-th record of a stream is entity `i`. The format
//! carries no end marker and no in-band negotiation of the tag width; this crate always uses
//! a 3-bit tag.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIs, EnumIter, FromRepr, IntoStaticStr};

use crate::utils::{Error, Result};

/// Width of the type tag stored in the high bits of the first word.
pub const TAG_BITS: u32 = 3;

/// Largest parent id representable next to the type tag.
pub const MAX_PARENT_ID: u32 = (1 << (32 - TAG_BITS)) - 1;

/// Size in bytes of one encoded record.
pub const RECORD_SIZE: usize = 8;

/// An encoded record.
pub type Record = [u8; RECORD_SIZE];

/// Type tag of an entity.
///
/// Tags 5 to 7 are reserved; they decode into inert nodes so that streams produced by newer
/// writers stay structurally readable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIs,
    EnumIter,
    FromRepr,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum EntityType {
    Container = 0,
    Symbol = 1,
    Integer = 2,
    String = 3,
    Map = 4,
    Set = 5,
    Null = 6,
    Reserved = 7,
}

impl EntityType {
    /// Whether this tag is one of the reserved, currently unused ones.
    pub fn is_reserved_tag(self) -> bool {
        matches!(
            self,
            EntityType::Set | EntityType::Null | EntityType::Reserved
        )
    }

    fn from_tag(tag: u32) -> Self {
        // The tag is at most TAG_BITS wide, every value has a variant.
        EntityType::from_repr(tag as u8).unwrap_or(EntityType::Reserved)
    }
}

/// One decoded (or to-be-encoded) record, without its positional id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Entity {
    pub kind: EntityType,
    pub parent: u32,
    pub payload: u32,
}

impl Entity {
    /// Fails with [`Error::ParentOutOfRange`] when `parent` does not fit next to the tag.
    pub fn new(kind: EntityType, parent: u32, payload: u32) -> Result<Self> {
        if parent > MAX_PARENT_ID {
            return Err(Error::ParentOutOfRange { parent });
        }
        Ok(Self {
            kind,
            parent,
            payload,
        })
    }

    /// Encode into the 8-byte big-endian wire form.
    pub fn encode(&self) -> Record {
        let head = ((self.kind as u32) << (32 - TAG_BITS)) | (self.parent & MAX_PARENT_ID);

        let mut out = [0u8; RECORD_SIZE];
        out[..4].copy_from_slice(&head.to_be_bytes());
        out[4..].copy_from_slice(&self.payload.to_be_bytes());
        out
    }

    /// Decode from the 8-byte big-endian wire form.
    ///
    /// This never fails on its own; whether the parent reference is valid depends on how many
    /// entities were materialized before, which is checked by the
    /// [`Deserializer`](crate::deserializer::Deserializer).
    pub fn decode(record: &Record) -> Self {
        let head = u32::from_be_bytes([record[0], record[1], record[2], record[3]]);
        let payload = u32::from_be_bytes([record[4], record[5], record[6], record[7]]);

        Self {
            kind: EntityType::from_tag(head >> (32 - TAG_BITS)),
            parent: head & MAX_PARENT_ID,
            payload,
        }
    }
}
