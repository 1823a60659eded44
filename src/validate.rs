use std::collections::{HashMap, HashSet};

use versemap_types::{Category, Mapping, MappingKey, ParseSummary, Reference};

use crate::events::{DropReason, EventSink, RowEvent};
use crate::registry::BookRegistry;

/// Final gate before mappings leave a section.
///
/// Holds the keys already released by earlier sections of the same run so
/// that repeats are recognized as updates.
#[derive(Debug)]
pub struct Validator<'r> {
    registry: &'r BookRegistry,
    released: HashSet<MappingKey>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r BookRegistry) -> Self {
        Self {
            registry,
            released: HashSet::new(),
        }
    }

    /// Check one mapping against the registry and the reference shape rules.
    pub fn check(&self, m: &Mapping) -> Result<(), (DropReason, String)> {
        if !self.registry.contains(&m.source.book) {
            return Err((
                DropReason::UnregisteredBook,
                format!("source book `{}` is not registered", m.source.book),
            ));
        }
        if let Reference::Verse(target) = &m.target {
            if !self.registry.contains(&target.book) {
                return Err((
                    DropReason::UnregisteredBook,
                    format!("target book `{}` is not registered", target.book),
                ));
            }
            if !target.is_well_formed() {
                return Err((DropReason::InvalidReference, format!("bad target {target}")));
            }
        }
        if !m.source.is_well_formed() {
            return Err((DropReason::InvalidReference, format!("bad source {}", m.source)));
        }
        debug_assert!(Category::ALL.contains(&m.category));
        Ok(())
    }

    /// Validate one resolved section. Invalid mappings are dropped and
    /// reported; same-key repeats inside the section fold their notes into
    /// the first occurrence.
    pub fn validate_section<S: EventSink>(
        &mut self,
        mappings: Vec<Mapping>,
        counts: &mut ParseSummary,
        sink: &mut S,
    ) -> Vec<Mapping> {
        let mut out: Vec<Mapping> = Vec::with_capacity(mappings.len());
        let mut index: HashMap<MappingKey, usize> = HashMap::new();

        for m in mappings {
            if let Err((reason, detail)) = self.check(&m) {
                counts.mappings_dropped_validation += 1;
                sink.record(RowEvent {
                    row: m.row,
                    reason,
                    detail,
                });
                continue;
            }

            let key = m.key();
            if let Some(&i) = index.get(&key) {
                out[i].merge_notes(m.notes.as_deref());
                counts.duplicates_merged += 1;
                continue;
            }
            if self.released.contains(&key) {
                counts.duplicate_updates += 1;
            }
            index.insert(key, out.len());
            out.push(m);
        }

        self.released.extend(index.into_keys());
        out
    }
}
