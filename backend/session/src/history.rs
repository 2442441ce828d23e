use std::collections::HashSet;

use chrono::{DateTime, Utc};

use inkread_core::{Conversion, ConversionId, HISTORY_LIMIT};

/// Recent conversions, newest first, never longer than the limit.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: Vec<Conversion>,
    limit: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Conversion] {
        &self.entries
    }

    pub fn get(&self, id: &ConversionId) -> Option<&Conversion> {
        self.entries.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ConversionId) -> bool {
        self.get(id).is_some()
    }

    /// Merge a freshly listed page with what this session already knows.
    ///
    /// Entries already held win over listed ones with the same id, so a
    /// create or save that finished while the listing was in flight is kept.
    /// Rows in `deleted` were removed from the store after the listing was
    /// read and are dropped.
    pub fn merge_loaded(
        &mut self,
        rows: Vec<Conversion>,
        pinned: Option<&ConversionId>,
        deleted: &HashSet<ConversionId>,
    ) {
        let mut merged = std::mem::take(&mut self.entries);
        for row in rows {
            if deleted.contains(&row.id) {
                continue;
            }
            if !merged.iter().any(|c| c.id == row.id) {
                merged.push(row);
            }
        }
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.entries = merged;
        self.enforce_limit(pinned);
    }

    /// Put a newly created record on top.
    pub fn prepend(&mut self, record: Conversion, pinned: Option<&ConversionId>) {
        self.entries.retain(|c| c.id != record.id);
        self.entries.insert(0, record);
        self.enforce_limit(pinned);
    }

    /// Record a successful save in place.
    pub fn apply_edit(&mut self, id: &ConversionId, text: &str, updated_at: DateTime<Utc>) -> bool {
        match self.entries.iter_mut().find(|c| &c.id == id) {
            Some(entry) => {
                entry.edited_text = Some(text.to_string());
                entry.updated_at = Some(updated_at);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &ConversionId) -> Option<Conversion> {
        let index = self.entries.iter().position(|c| &c.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Drop the oldest entries over the limit, skipping the pinned one.
    fn enforce_limit(&mut self, pinned: Option<&ConversionId>) {
        while self.entries.len() > self.limit {
            let victim = self
                .entries
                .iter()
                .rposition(|c| Some(&c.id) != pinned)
                .unwrap_or(self.entries.len() - 1);
            self.entries.remove(victim);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
