//! Collection normalization into ordered `(Key, value)` pairs.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of an item in the original collection.
///
/// Sequence inputs produce `Index` keys; mapping inputs produce `Name` keys,
/// including names that happen to look numeric (`"234"` stays a string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Position in a sequence.
    Index(usize),
    /// Entry name in a mapping.
    Name(String),
}

impl Key {
    /// Position, if this key came from a sequence.
    pub const fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }

    /// Name, if this key came from a mapping.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Name(name) => Some(name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// An input collection normalized into ordered `(Key, value)` pairs.
///
/// The key set is unique and fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<V> {
    entries: Vec<(Key, V)>,
}

impl<V> Collection<V> {
    /// Normalize a sequence; keys are the item positions.
    pub fn sequence(values: Vec<V>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Key::Index(i), v))
                .collect(),
        }
    }

    /// Normalize a mapping given as entries in insertion order.
    ///
    /// A repeated name keeps the position of its first occurrence and the
    /// value of its last.
    pub fn keyed<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<(Key, V)> = Vec::new();
        for (name, value) in entries {
            let name = name.into();
            if let Some(&pos) = positions.get(&name) {
                out[pos].1 = value;
            } else {
                positions.insert(name.clone(), out.len());
                out.push((Key::Name(name), value));
            }
        }
        Self { entries: out }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in dispatch order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub(crate) fn into_entries(self) -> Vec<(Key, V)> {
        self.entries
    }
}

impl<V> Default for Collection<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> From<Vec<V>> for Collection<V> {
    fn from(values: Vec<V>) -> Self {
        Self::sequence(values)
    }
}

impl<V> From<BTreeMap<String, V>> for Collection<V> {
    fn from(map: BTreeMap<String, V>) -> Self {
        Self::keyed(map)
    }
}

impl<V, K: Into<String>> FromIterator<(K, V)> for Collection<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::keyed(iter)
    }
}
