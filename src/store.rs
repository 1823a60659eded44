//! Idempotent upsert target for parsed mappings.
//!
//! Real persistence lives outside this crate; `MemoryStore` implements the
//! same contract in memory for the CLI and for tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use versemap_types::{Mapping, MappingKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// Key existed; notes changed
    Updated,
    /// Key existed; nothing new
    Unchanged,
}

/// Tallies for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Something mappings can be upserted into, keyed on [`MappingKey`].
pub trait MappingSink {
    fn upsert(&mut self, mapping: Mapping) -> UpsertOutcome;

    fn upsert_batch<I>(&mut self, batch: I) -> BatchReport
    where
        I: IntoIterator<Item = Mapping>,
        Self: Sized,
    {
        let mut report = BatchReport::default();
        for m in batch {
            match self.upsert(m) {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::Updated => report.updated += 1,
                UpsertOutcome::Unchanged => report.unchanged += 1,
            }
        }
        report
    }
}

/// Insertion-ordered in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Mapping>,
    index: HashMap<MappingKey, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &MappingKey) -> Option<&Mapping> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.records
    }

    pub fn into_mappings(self) -> Vec<Mapping> {
        self.records
    }

    fn touch(record: &mut Mapping, at: DateTime<Utc>) {
        if at > record.updated_at {
            record.updated_at = at;
        }
    }
}

impl MappingSink for MemoryStore {
    fn upsert(&mut self, mapping: Mapping) -> UpsertOutcome {
        let key = mapping.key();
        match self.index.get(&key) {
            Some(&i) => {
                let record = &mut self.records[i];
                if record.merge_notes(mapping.notes.as_deref()) {
                    Self::touch(record, mapping.updated_at);
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Unchanged
                }
            }
            None => {
                self.index.insert(key, self.records.len());
                self.records.push(mapping);
                UpsertOutcome::Inserted
            }
        }
    }
}
