use chrono::{DateTime, Utc};
use versemap_types::{Category, Mapping, MappingType, Reference};

use crate::error::BuildError;

/// Everything known about one data row once its cells are parsed.
#[derive(Debug, Clone)]
pub struct ClassifiedRow {
    /// Line number in the document
    pub row: usize,
    pub source: Vec<Reference>,
    pub targets: Vec<Reference>,
    pub mapping_type: MappingType,
    pub category: Category,
    pub notes: Option<String>,
    pub source_tradition: String,
    pub target_tradition: String,
}

/// One mapping per target, all sharing the row's single source.
///
/// An `Absent` target always yields an `Absent`-type mapping, whatever the
/// row's type text said.
pub fn build_mappings(row: ClassifiedRow, stamp: DateTime<Utc>) -> Result<Vec<Mapping>, BuildError> {
    let source = match row.source.as_slice() {
        [Reference::Verse(v)] => v.clone(),
        [Reference::Absent] => return Err(BuildError::AbsentSource),
        other => return Err(BuildError::MultipleSources(other.len())),
    };
    if row.targets.is_empty() {
        return Err(BuildError::NoTargets);
    }

    let mappings = row
        .targets
        .into_iter()
        .map(|target| {
            let mapping_type = if target.is_absent() {
                MappingType::Absent
            } else {
                row.mapping_type
            };
            Mapping {
                source_tradition: row.source_tradition.clone(),
                target_tradition: row.target_tradition.clone(),
                source: source.clone(),
                target,
                mapping_type,
                category: row.category,
                notes: row.notes.clone(),
                row: row.row,
                created_at: stamp,
                updated_at: stamp,
            }
        })
        .collect();
    Ok(mappings)
}
