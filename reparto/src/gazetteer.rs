//! Bounded, thread-safe registry of confirmed names.
//!
//! The gazetteer learns `canonical form -> label` from high-quality
//! detections and is consulted to re-find names the tagger misses later in
//! the same document ("Aldara" tagged once, missed twice).
//!
//! Once `capacity` entries exist, new names are ignored: learning stops for
//! the rest of the session rather than evicting. Re-registering an existing
//! name is always allowed and the last label wins.
//!
//! # Example
//!
//! ```rust
//! use reparto::{EntityLabel, Gazetteer};
//!
//! let gazetteer = Gazetteer::with_capacity(2);
//! gazetteer.register("Aldara", EntityLabel::Per);
//! assert_eq!(gazetteer.lookup("ALDARA"), Some(EntityLabel::Per));
//! ```

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::sync::{read, write, RwLock};
use crate::{canonical_form, EntityLabel};

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 5000;

/// Shortest canonical form accepted by [`Gazetteer::add`].
const MIN_MANUAL_LEN: usize = 3;

/// Counts reported by [`Gazetteer::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GazetteerStats {
    pub total: usize,
    pub capacity: usize,
    pub by_label: BTreeMap<EntityLabel, usize>,
}

/// Name registry shared by every stage of one extraction session.
///
/// All access goes through an internal reader/writer lock; no method calls
/// back into the gazetteer while holding it.
#[derive(Debug)]
pub struct Gazetteer {
    entries: RwLock<HashMap<String, EntityLabel>>,
    capacity: usize,
}

impl Default for Gazetteer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Gazetteer {
    /// Create an empty gazetteer with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty gazetteer holding at most `capacity` names.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Label for `word`, compared by canonical form.
    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<EntityLabel> {
        let key = canonical_form(word);
        read(&self.entries).get(&key).copied()
    }

    /// True if `word` is registered.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.lookup(word).is_some()
    }

    /// Register a name found by the pipeline.
    ///
    /// Returns `true` if the entry now exists with `label`. New names are
    /// refused once the gazetteer is full.
    pub fn register(&self, word: &str, label: EntityLabel) -> bool {
        let key = canonical_form(word);
        if key.is_empty() {
            return false;
        }
        self.insert(key, label)
    }

    /// Register a name supplied by a user or an external list.
    ///
    /// Stricter than [`register`](Self::register): canonical forms of two
    /// characters or fewer are refused.
    pub fn add(&self, word: &str, label: EntityLabel) -> bool {
        let key = canonical_form(word);
        if key.chars().count() < MIN_MANUAL_LEN {
            log::debug!("gazetteer: refusing short manual entry '{word}'");
            return false;
        }
        self.insert(key, label)
    }

    fn insert(&self, key: String, label: EntityLabel) -> bool {
        let mut entries = write(&self.entries);
        if let Some(existing) = entries.get_mut(&key) {
            *existing = label;
            return true;
        }
        if entries.len() >= self.capacity {
            log::debug!(
                "gazetteer full ({} entries), ignoring '{key}'",
                self.capacity
            );
            return false;
        }
        entries.insert(key, label);
        true
    }

    /// Register many names; returns how many were accepted.
    pub fn extend<'a, I>(&self, names: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, EntityLabel)>,
    {
        names
            .into_iter()
            .filter(|(word, label)| self.register(word, *label))
            .count()
    }

    /// Remove `word`; returns `true` if it was present.
    pub fn remove(&self, word: &str) -> bool {
        let key = canonical_form(word);
        write(&self.entries).remove(&key).is_some()
    }

    /// Remove everything.
    pub fn clear(&self) {
        write(&self.entries).clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.entries).is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once no new names will be accepted.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Total and per-label counts.
    #[must_use]
    pub fn stats(&self) -> GazetteerStats {
        let entries = read(&self.entries);
        let mut by_label = BTreeMap::new();
        for label in entries.values() {
            *by_label.entry(*label).or_insert(0) += 1;
        }
        GazetteerStats {
            total: entries.len(),
            capacity: self.capacity,
            by_label,
        }
    }

    /// Sorted copy of every entry, for callers that persist the gazetteer.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, EntityLabel)> {
        let mut out: Vec<_> = read(&self.entries)
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        out.sort();
        out
    }
}
