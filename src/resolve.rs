//! Merge-collapsing filter applied to one section's mappings.
//!
//! Basic sections list nearly every verse with an identity `Keep` row and
//! additionally flag the few merged verses. When a source verse has both,
//! only the merge is wanted. Expanded sections are taken as they are.
//!
//! The rule was fitted to expected output counts, not taken from a
//! versification authority. Divergences found against real files should be
//! reported rather than patched here.

use std::collections::{HashMap, HashSet};

use versemap_types::{Mapping, MappingType, SectionMode};

/// Output of [`resolve_section`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub kept: Vec<Mapping>,
    pub suppressed: usize,
}

/// Grouping key: the source verse without subverse or manuscript.
fn group_key(m: &Mapping) -> (&str, u32, u32) {
    (m.source.book.as_str(), m.source.chapter, m.source.verse)
}

/// Filter a section's mappings according to its mode. Order is preserved.
pub fn resolve_section(mode: SectionMode, mappings: Vec<Mapping>) -> Resolved {
    match mode {
        SectionMode::Expanded => Resolved {
            kept: mappings,
            suppressed: 0,
        },
        SectionMode::Basic => collapse_merges(mappings),
    }
}

/// Within each source-verse group that contains a merge, keep only the
/// merged mappings.
pub fn collapse_merges(mappings: Vec<Mapping>) -> Resolved {
    let merged_groups: HashSet<(String, u32, u32)> = mappings
        .iter()
        .filter(|m| m.mapping_type == MappingType::Merged)
        .map(|m| {
            let (book, chapter, verse) = group_key(m);
            (book.to_string(), chapter, verse)
        })
        .collect();

    if merged_groups.is_empty() {
        return Resolved {
            kept: mappings,
            suppressed: 0,
        };
    }

    let total = mappings.len();
    let kept: Vec<Mapping> = mappings
        .into_iter()
        .filter(|m| {
            let (book, chapter, verse) = group_key(m);
            m.mapping_type == MappingType::Merged
                || !merged_groups.contains(&(book.to_string(), chapter, verse))
        })
        .collect();

    Resolved {
        suppressed: total - kept.len(),
        kept,
    }
}

/// Per-type counts for a batch, for logging and tests.
pub fn type_histogram(mappings: &[Mapping]) -> HashMap<MappingType, usize> {
    let mut counts = HashMap::new();
    for m in mappings {
        *counts.entry(m.mapping_type).or_insert(0) += 1;
    }
    counts
}
