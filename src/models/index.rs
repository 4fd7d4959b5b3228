//! Secondary indices: secondary key -> set of ISBNs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

use super::book::Isbn;

/// Normalize free text for key comparison: NFC, trimmed, single spaces, lowercase.
pub fn normalize_key(raw: &str) -> String {
    let composed: String = raw.nfc().collect();
    composed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized text key for the subject and author indices
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexKey(String);

impl IndexKey {
    pub fn new(raw: &str) -> Self {
        IndexKey(normalize_key(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bucketed index. Empty buckets are never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[serde(bound(
    serialize = "K: Serialize",
    deserialize = "K: Ord + Deserialize<'de>"
))]
pub struct SecondaryIndex<K> {
    buckets: BTreeMap<K, BTreeSet<Isbn>>,
}

impl<K> Default for SecondaryIndex<K> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }
}

impl<K: Ord> SecondaryIndex<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `isbn` to the bucket for `key`, creating the bucket if needed
    pub fn insert(&mut self, key: K, isbn: Isbn) -> bool {
        self.buckets.entry(key).or_default().insert(isbn)
    }

    /// Remove `isbn` from the bucket for `key`, dropping the bucket once empty
    pub fn remove(&mut self, key: &K, isbn: Isbn) -> bool {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let removed = bucket.remove(&isbn);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        removed
    }

    pub fn get(&self, key: &K) -> Option<&BTreeSet<Isbn>> {
        self.buckets.get(key)
    }

    pub fn contains(&self, key: &K, isbn: Isbn) -> bool {
        self.buckets.get(key).is_some_and(|bucket| bucket.contains(&isbn))
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&K, &BTreeSet<Isbn>)> {
        self.buckets.iter()
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total ISBN memberships across all buckets
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(BTreeSet::len).sum()
    }
}
