use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Verse reference ──────────────────────────────────────────────────────

/// The far end of a contiguous range, e.g. the `1:5` of `Gen.1:3-1:5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RangeEnd {
    pub chapter: u32,
    pub verse: u32,
}

/// A single resolved verse reference in some versification tradition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRef {
    /// Canonical book name from the registry, e.g. "Genesis"
    pub book: String,
    pub chapter: u32,
    /// 0 is reserved for title material (Psalm headings etc.)
    pub verse: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subverse: Option<char>,
    /// Witness tag such as "LXX" or "P46"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manuscript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<RangeEnd>,
}

impl VerseRef {
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
            subverse: None,
            manuscript: None,
            range_end: None,
        }
    }

    /// (chapter, verse) of the first verse covered.
    pub fn start(&self) -> RangeEnd {
        RangeEnd {
            chapter: self.chapter,
            verse: self.verse,
        }
    }

    /// True when the reference obeys its own shape rules.
    pub fn is_well_formed(&self) -> bool {
        let range_ok = self.range_end.is_none_or(|end| end >= self.start());
        let subverse_ok = self.subverse.is_none_or(|c| c.is_ascii_lowercase());
        range_ok && subverse_ok && !self.book.is_empty()
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)?;
        if let Some(s) = self.subverse {
            write!(f, "{s}")?;
        }
        if let Some(end) = self.range_end {
            if end.chapter == self.chapter {
                write!(f, "-{}", end.verse)?;
            } else {
                write!(f, "-{}:{}", end.chapter, end.verse)?;
            }
        }
        if let Some(ms) = &self.manuscript {
            write!(f, " ({ms})")?;
        }
        Ok(())
    }
}

/// What a reference cell token resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Reference {
    Verse(VerseRef),
    /// No corresponding verse exists in the tradition
    Absent,
}

impl Reference {
    pub fn as_verse(&self) -> Option<&VerseRef> {
        match self {
            Self::Verse(v) => Some(v),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verse(v) => v.fmt(f),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

// ── Classification enums ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingType {
    Keep,
    Merged,
    Split,
    Renumbered,
    Absent,
    Unknown,
}

impl MappingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "Keep",
            Self::Merged => "Merged",
            Self::Split => "Split",
            Self::Renumbered => "Renumbered",
            Self::Absent => "Absent",
            Self::Unknown => "Unknown",
        }
    }
}

/// How strongly a mapping should be applied by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    /// Optional
    Opt,
    /// Necessary
    Nec,
    /// Academic
    Acd,
    /// Informational
    Inf,
    #[default]
    None,
}

impl Category {
    pub const ALL: [Category; 5] = [Self::Opt, Self::Nec, Self::Acd, Self::Inf, Self::None];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opt => "Opt",
            Self::Nec => "Nec",
            Self::Acd => "Acd",
            Self::Inf => "Inf",
            Self::None => "None",
        }
    }
}

// ── Document sections ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionMode {
    /// Condensed listing: identity rows plus flagged anomalies
    Basic,
    /// Every mapping spelled out
    Expanded,
}

impl SectionMode {
    /// Read the mode from a section marker annotation, e.g. "Basic", "Condensed".
    pub fn from_annotation(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "basic" | "condensed" => Some(Self::Basic),
            "expanded" => Some(Self::Expanded),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Expanded => "Expanded",
        }
    }
}

// ── Mapping record ───────────────────────────────────────────────────────

/// One source → target correspondence between two traditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub source_tradition: String,
    pub target_tradition: String,
    pub source: VerseRef,
    pub target: Reference,
    pub mapping_type: MappingType,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Line number of the row that produced this mapping
    pub row: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mapping {
    pub fn key(&self) -> MappingKey {
        MappingKey {
            source_tradition: self.source_tradition.clone(),
            target_tradition: self.target_tradition.clone(),
            book: self.source.book.clone(),
            chapter: self.source.chapter,
            verse: self.source.verse,
            subverse: self.source.subverse,
            manuscript: self.source.manuscript.clone(),
            target: self.target.clone(),
            mapping_type: self.mapping_type,
        }
    }

    /// Fold another mapping's notes into this one. Notes are `"; "`-joined
    /// parts; only parts not already present are appended.
    /// Returns true if the notes changed.
    pub fn merge_notes(&mut self, other: Option<&str>) -> bool {
        let Some(extra) = other else {
            return false;
        };
        let mut changed = false;
        for part in extra.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            match &mut self.notes {
                Some(existing) if existing.split(';').any(|n| n.trim() == part) => {}
                Some(existing) => {
                    existing.push_str("; ");
                    existing.push_str(part);
                    changed = true;
                }
                None => {
                    self.notes = Some(part.to_string());
                    changed = true;
                }
            }
        }
        changed
    }
}

/// Identity of a stored mapping; a second mapping with the same key is an update.
///
/// The mapping type is part of the identity, so a Keep and a Merged mapping
/// between the same two verses are distinct records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MappingKey {
    pub source_tradition: String,
    pub target_tradition: String,
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub subverse: Option<char>,
    pub manuscript: Option<String>,
    pub target: Reference,
    pub mapping_type: MappingType,
}

// ── Parse summary ────────────────────────────────────────────────────────

/// Aggregate counts for one parse run, used to check expected totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseSummary {
    /// Every physical line read
    pub lines_read: usize,
    /// Data rows inside sections
    pub rows_seen: usize,
    /// Blank and comment lines
    pub skipped_lines: usize,
    /// Directives and prose outside sections
    pub header_lines: usize,
    pub rows_dropped_parse: usize,
    pub rows_dropped_validation: usize,
    pub invalid_categories: usize,
    pub mappings_built: usize,
    pub mappings_suppressed: usize,
    pub mappings_dropped_validation: usize,
    /// Same-key mappings folded together inside one section
    pub duplicates_merged: usize,
    /// Same-key mappings re-emitted after their section was released
    pub duplicate_updates: usize,
    pub mappings_emitted: usize,
    pub basic_sections: usize,
    pub expanded_sections: usize,
}

impl ParseSummary {
    pub fn rows_dropped(&self) -> usize {
        self.rows_dropped_parse + self.rows_dropped_validation
    }

    /// Add another run's counts into this one.
    pub fn absorb(&mut self, other: &ParseSummary) {
        self.lines_read += other.lines_read;
        self.rows_seen += other.rows_seen;
        self.skipped_lines += other.skipped_lines;
        self.header_lines += other.header_lines;
        self.rows_dropped_parse += other.rows_dropped_parse;
        self.rows_dropped_validation += other.rows_dropped_validation;
        self.invalid_categories += other.invalid_categories;
        self.mappings_built += other.mappings_built;
        self.mappings_suppressed += other.mappings_suppressed;
        self.mappings_dropped_validation += other.mappings_dropped_validation;
        self.duplicates_merged += other.duplicates_merged;
        self.duplicate_updates += other.duplicate_updates;
        self.mappings_emitted += other.mappings_emitted;
        self.basic_sections += other.basic_sections;
        self.expanded_sections += other.expanded_sections;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_ref_display() {
        let mut r = VerseRef::new("Genesis", 1, 2);
        assert_eq!(r.to_string(), "Genesis 1:2");
        r.subverse = Some('a');
        r.manuscript = Some("LXX".into());
        assert_eq!(r.to_string(), "Genesis 1:2a (LXX)");
    }

    #[test]
    fn test_range_display() {
        let mut r = VerseRef::new("Psalms", 3, 1);
        r.range_end = Some(RangeEnd { chapter: 3, verse: 2 });
        assert_eq!(r.to_string(), "Psalms 3:1-2");
        r.range_end = Some(RangeEnd { chapter: 4, verse: 1 });
        assert_eq!(r.to_string(), "Psalms 3:1-4:1");
    }

    #[test]
    fn test_well_formed_rejects_backwards_range() {
        let mut r = VerseRef::new("Genesis", 2, 5);
        assert!(r.is_well_formed());
        r.range_end = Some(RangeEnd { chapter: 2, verse: 4 });
        assert!(!r.is_well_formed());
        r.range_end = Some(RangeEnd { chapter: 2, verse: 5 });
        assert!(r.is_well_formed());
    }

    #[test]
    fn test_section_mode_annotation() {
        assert_eq!(SectionMode::from_annotation("Basic"), Some(SectionMode::Basic));
        assert_eq!(SectionMode::from_annotation(" condensed "), Some(SectionMode::Basic));
        assert_eq!(SectionMode::from_annotation("EXPANDED"), Some(SectionMode::Expanded));
        assert_eq!(SectionMode::from_annotation("Full"), None);
    }

    #[test]
    fn test_reference_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Reference::Absent).unwrap();
        assert_eq!(json, r#"{"kind":"Absent"}"#);
        let verse = Reference::Verse(VerseRef::new("Genesis", 1, 1));
        let json = serde_json::to_string(&verse).unwrap();
        assert!(json.starts_with(r#"{"kind":"Verse","book":"Genesis""#));
    }

    fn genesis_mapping(notes: Option<&str>) -> Mapping {
        let now = Utc::now();
        Mapping {
            source_tradition: "Hebrew".into(),
            target_tradition: "standard".into(),
            source: VerseRef::new("Genesis", 1, 2),
            target: Reference::Verse(VerseRef::new("Genesis", 1, 3)),
            mapping_type: MappingType::Merged,
            category: Category::Nec,
            notes: notes.map(str::to_string),
            row: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_merge_multi_part_notes() {
        let mut m = genesis_mapping(Some("joins; extra note"));
        assert!(!m.merge_notes(Some("joins; extra note")));
        assert!(!m.merge_notes(Some("extra note")));
        assert!(m.merge_notes(Some("extra note; LXX differs")));
        assert_eq!(m.notes.as_deref(), Some("joins; extra note; LXX differs"));
        assert!(!m.merge_notes(Some("joins; extra note; LXX differs")));
        assert!(!m.merge_notes(None));

        let mut empty = genesis_mapping(None);
        assert!(empty.merge_notes(Some("a; b")));
        assert_eq!(empty.notes.as_deref(), Some("a; b"));
    }

    #[test]
    fn test_key_distinguishes_mapping_type() {
        let merged = genesis_mapping(None);
        let mut keep = merged.clone();
        keep.mapping_type = MappingType::Keep;
        assert_ne!(merged.key(), keep.key());
    }
}
