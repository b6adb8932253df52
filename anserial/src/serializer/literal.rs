#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A whole subtree described as one nested value.
///
/// Lowering to entities (see [`Serializer::add_literal`](super::Serializer::add_literal)) is
/// depth-first and keeps sibling order. Plain `&str` values are *symbols*; use
/// [`Literal::string`] for string nodes.
///
/// ```
/// use anserial::literal;
/// use anserial::serializer::Literal;
///
/// let lit = literal!["results", ["i-19937", 19937u32], ["i-2048", 2048u32]];
/// let Literal::List(items) = &lit else { unreachable!() };
/// assert_eq!(items.len(), 3);
/// assert_eq!(items[0], Literal::symbol("results"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Literal {
    Symbol(String),
    Integer(u32),
    String(String),
    /// A new container holding the lowered elements.
    List(Vec<Literal>),
    /// A new map; each key becomes a symbol entity followed by its lowered value.
    Map(Vec<(String, Literal)>),
}

impl Literal {
    pub fn symbol(name: impl Into<String>) -> Self {
        Literal::Symbol(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Literal::String(text.into())
    }

    pub fn list(items: impl IntoIterator<Item = Literal>) -> Self {
        Literal::List(items.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Literal)>) -> Self {
        Literal::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Number of entities this literal lowers to.
    pub fn entity_count(&self) -> usize {
        match self {
            Literal::Symbol(_) | Literal::Integer(_) => 1,
            Literal::String(text) => 1 + text.chars().count(),
            Literal::List(items) => 1 + items.iter().map(Literal::entity_count).sum::<usize>(),
            Literal::Map(entries) => {
                1 + entries
                    .iter()
                    .map(|(_, v)| 1 + v.entity_count())
                    .sum::<usize>()
            }
        }
    }
}

impl From<&str> for Literal {
    fn from(name: &str) -> Self {
        Literal::Symbol(name.to_string())
    }
}

impl From<String> for Literal {
    fn from(name: String) -> Self {
        Literal::Symbol(name)
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Integer(value)
    }
}

impl From<Vec<Literal>> for Literal {
    fn from(items: Vec<Literal>) -> Self {
        Literal::List(items)
    }
}

/// Build a [`Literal::List`] from nested brackets.
///
/// Bracketed groups become nested lists, braces with `"key": value` pairs become maps, and
/// any other token tree goes through `Literal::from`. Integer values need an explicit `u32`
/// type (`3u32`), and composite expressions must be parenthesized.
#[macro_export]
macro_rules! literal {
    (@item [ $($item:tt),* $(,)? ]) => {
        $crate::serializer::Literal::List(vec![$($crate::literal!(@item $item)),*])
    };
    (@item { $($key:literal : $value:tt),* $(,)? }) => {
        $crate::serializer::Literal::Map(vec![
            $((::std::string::String::from($key), $crate::literal!(@item $value))),*
        ])
    };
    (@item $other:expr) => {
        $crate::serializer::Literal::from($other)
    };
    ($($item:tt),* $(,)?) => {
        $crate::serializer::Literal::List(vec![$($crate::literal!(@item $item)),*])
    };
}
