//! Occupied character ranges.
//!
//! The orchestrator owns one [`OccupiedRanges`] per extraction. A stage may
//! add a new entity only where nothing is occupied yet; extending an
//! existing entity goes through [`OccupiedRanges::replace`].

use crate::validator::RejectedEntity;
use crate::{spans_overlap, ExtractedEntity};

/// Set of `[start, end)` char ranges already claimed by entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupiedRanges {
    // sorted by (start, end)
    ranges: Vec<(usize, usize)>,
}

impl OccupiedRanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranges of every entity in `entities`.
    #[must_use]
    pub fn from_entities(entities: &[ExtractedEntity]) -> Self {
        let mut out = Self::new();
        for e in entities {
            out.insert(e.start(), e.end());
        }
        out
    }

    /// Claim `[start, end)`. Empty ranges are ignored.
    pub fn insert(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let pos = self.ranges.partition_point(|r| *r < (start, end));
        if self.ranges.get(pos) != Some(&(start, end)) {
            self.ranges.insert(pos, (start, end));
        }
    }

    /// Release exactly `[start, end)`; returns `true` if it was claimed.
    pub fn remove(&mut self, start: usize, end: usize) -> bool {
        match self.ranges.binary_search(&(start, end)) {
            Ok(pos) => {
                self.ranges.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Swap an entity's old range for its extended one.
    pub fn replace(&mut self, old: (usize, usize), new: (usize, usize)) {
        self.remove(old.0, old.1);
        self.insert(new.0, new.1);
    }

    /// True if `[start, end)` shares at least one char with a claimed range.
    #[must_use]
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        // only ranges starting before `end` can overlap
        let hi = self.ranges.partition_point(|r| r.0 < end);
        self.ranges[..hi].iter().any(|&(s, e)| start < e && s < end)
    }

    /// True if exactly `[start, end)` is claimed.
    #[must_use]
    pub fn contains(&self, start: usize, end: usize) -> bool {
        self.ranges.binary_search(&(start, end)).is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ranges.iter().copied()
    }
}

/// Drop entities overlapping an earlier-kept one.
///
/// Entities are visited by descending confidence, then longer first, then
/// earlier first; the survivors are returned in document order. Every
/// dropped entity comes back as rejected, naming the survivor it lost to.
#[must_use]
pub fn remove_overlaps(
    mut entities: Vec<ExtractedEntity>,
) -> (Vec<ExtractedEntity>, Vec<RejectedEntity>) {
    entities.sort_by(|a, b| {
        b.confidence()
            .total_cmp(&a.confidence())
            .then(b.len().cmp(&a.len()))
            .then(a.start().cmp(&b.start()))
    });
    let mut occupied = OccupiedRanges::new();
    let mut kept: Vec<ExtractedEntity> = Vec::with_capacity(entities.len());
    let mut dropped = Vec::new();
    for e in entities {
        if occupied.overlaps(e.start(), e.end()) {
            let winner = kept
                .iter()
                .find(|k| spans_overlap(k.start(), k.end(), e.start(), e.end()))
                .map_or("", ExtractedEntity::text);
            log::debug!("dropping {e}: overlaps '{winner}'");
            let reason = format!("overlaps '{winner}'");
            dropped.push(RejectedEntity { entity: e, reason });
            continue;
        }
        occupied.insert(e.start(), e.end());
        kept.push(e);
    }
    sort_by_position(&mut kept);
    (kept, dropped)
}

/// Document order: by start, then end, then text.
pub fn sort_by_position(entities: &mut [ExtractedEntity]) {
    entities.sort_by(|a, b| {
        a.start()
            .cmp(&b.start())
            .then(a.end().cmp(&b.end()))
            .then_with(|| a.text().cmp(b.text()))
    });
}
