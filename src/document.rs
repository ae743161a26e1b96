//! Insertion-order-preserving key→value document model.

use crate::value::Value;

/// An ordered sequence of `(key, value)` pairs. Insertion order is
/// observable and is exactly what the serializer emits / the deserializer
/// reproduces; keys are plain strings and are not required to be unique at
/// this layer (duplicates are meaningful only insofar as `spec.md` §4.3
/// step 3 describes for `_id`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderedDocument {
    pairs: Vec<(String, Value)>,
}

impl OrderedDocument {
    /// An empty document.
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// An empty document with room for `capacity` pairs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(capacity),
        }
    }

    /// Appends a `(key, value)` pair, preserving whatever duplicates the
    /// caller asks for.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// The value of the first pair matching `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether any pair is keyed `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Number of pairs, counting duplicates.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the document has no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates pairs in insertion (or, for a decoded document, wire) order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.pairs.iter()
    }

    /// The underlying pairs, consuming the document.
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.pairs
    }

    /// Borrows the underlying pairs without consuming the document.
    pub fn as_pairs(&self) -> &[(String, Value)] {
        &self.pairs
    }
}

impl From<Vec<(String, Value)>> for OrderedDocument {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Self { pairs }
    }
}

impl FromIterator<(String, Value)> for OrderedDocument {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl Extend<(String, Value)> for OrderedDocument {
    fn extend<T: IntoIterator<Item = (String, Value)>>(&mut self, iter: T) {
        self.pairs.extend(iter);
    }
}

impl IntoIterator for OrderedDocument {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

impl<'a> IntoIterator for &'a OrderedDocument {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}
