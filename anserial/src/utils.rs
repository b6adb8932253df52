use std::ops::Range;

use strum::EnumIs;
use thiserror::Error;

use crate::entity::EntityType;

/// Errors raised by the codec, the tree builder, the node accessors and the text parser.
///
/// Pattern-match failures are *not* errors: [`crate::destructure::destructure`] reports them
/// as `Ok(false)` so callers can try alternative patterns.
#[derive(Debug, EnumIs, Error)]
pub enum Error {
    /// An entity names a parent that has not been materialized yet.
    #[error(
        "Entity {index} references parent {parent}, but only {count} entities have been materialized. Forward references are not allowed."
    )]
    ForwardReference { index: u32, parent: u32, count: u32 },

    /// Positional access past the end of a container.
    #[error("Index {index} is out of range for a container holding {len} children.")]
    IndexOutOfRange { index: usize, len: usize },

    /// A parent id does not fit in the bits left next to the type tag.
    #[error(
        "Parent id {parent} does not fit next to a {}-bit type tag.",
        crate::entity::TAG_BITS
    )]
    ParentOutOfRange { parent: u32 },

    /// The tree cannot address more entities with the configured tag width.
    #[error(
        "The tree exceeds the maximum of {max} entities addressable with a {}-bit type tag.",
        crate::entity::TAG_BITS
    )]
    TooManyEntities { max: u32 },

    /// An accessor was invoked on a node variant that does not provide it.
    #[error("A node of type `{kind}` has no `{operation}` accessor.")]
    Unsupported {
        operation: &'static str,
        kind: EntityType,
    },

    /// The s-expression text is malformed.
    #[error("invalid syntax: line {line}: {message}")]
    Syntax {
        line: usize,
        span: Range<usize>,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error belongs to the structural class (bad parent reference, bad index,
    /// overflowing id space).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::ForwardReference { .. }
                | Error::IndexOutOfRange { .. }
                | Error::TooManyEntities { .. }
                | Error::ParentOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
