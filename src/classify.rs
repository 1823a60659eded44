//! Row classifier: mapping type and category from free-text cells.

use versemap_types::{Category, MappingType};

/// Mapping-type keywords, checked in order against the lowercased text.
/// "merge" comes first: "MergedNext verse", "Keep (merged)" and the like
/// are all merges, which the Basic-section filter depends on.
pub const MAPPING_TYPE_KEYWORDS: &[(&str, MappingType)] = &[
    ("merge", MappingType::Merged),
    ("split", MappingType::Split),
    ("renumber", MappingType::Renumbered),
    ("absent", MappingType::Absent),
    ("missing", MappingType::Absent),
    ("empty", MappingType::Absent),
    ("keep", MappingType::Keep),
    ("identical", MappingType::Keep),
];

/// Accepted spellings per category, after normalization.
pub const CATEGORY_WORDS: &[(&str, Category)] = &[
    ("opt", Category::Opt),
    ("optional", Category::Opt),
    ("nec", Category::Nec),
    ("necessary", Category::Nec),
    ("acd", Category::Acd),
    ("academic", Category::Acd),
    ("inf", Category::Inf),
    ("info", Category::Inf),
    ("information", Category::Inf),
    ("none", Category::None),
    ("", Category::None),
];

/// The parsed tradition/category cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCell {
    /// Row-level source tradition override, e.g. "Latin" in "Latin Nec."
    pub tradition: Option<String>,
    pub category: Category,
    /// False when the text was not a known category and fell back to `None`
    pub recognized: bool,
}

/// The parsed type-and-notes cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCell {
    pub mapping_type: MappingType,
    pub notes: Option<String>,
}

/// Trim, drop trailing punctuation, lowercase.
fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim_end()
        .to_lowercase()
}

pub fn classify_mapping_type(text: &str) -> MappingType {
    let normalized = normalize(text);
    MAPPING_TYPE_KEYWORDS
        .iter()
        .find(|(kw, _)| normalized.contains(kw))
        .map_or(MappingType::Unknown, |(_, t)| *t)
}

/// `None` when the text is not a recognized category.
pub fn classify_category(text: &str) -> Option<Category> {
    let normalized = normalize(text);
    CATEGORY_WORDS
        .iter()
        .find(|(word, _)| *word == normalized)
        .map(|(_, c)| *c)
}

/// Split `"[Tradition words] Category"`. The last word is the category;
/// anything before it names the row's source tradition.
pub fn parse_category_cell(cell: &str) -> CategoryCell {
    let cell = cell.trim();
    let (tradition, category_text) = match cell.rsplit_once(char::is_whitespace) {
        Some((head, last)) => (Some(head.trim()), last),
        None => (None, cell),
    };

    let classified = classify_category(category_text);
    CategoryCell {
        tradition: tradition.filter(|t| !t.is_empty()).map(str::to_string),
        category: classified.unwrap_or_default(),
        recognized: classified.is_some(),
    }
}

/// Split `"Type text; notes"` and classify the type text.
pub fn parse_type_cell(cell: &str) -> TypeCell {
    let (type_text, notes) = match cell.split_once(';') {
        Some((t, n)) => (t, Some(n.trim())),
        None => (cell, None),
    };
    TypeCell {
        mapping_type: classify_mapping_type(type_text),
        notes: notes.filter(|n| !n.is_empty()).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_type_vocabulary() {
        assert_eq!(classify_mapping_type("Keep verse"), MappingType::Keep);
        assert_eq!(classify_mapping_type("Renumbered"), MappingType::Renumbered);
        assert_eq!(classify_mapping_type("Renumber verse."), MappingType::Renumbered);
        assert_eq!(classify_mapping_type("SplitVerse"), MappingType::Split);
        assert_eq!(classify_mapping_type("Empty verse"), MappingType::Absent);
        assert_eq!(classify_mapping_type("Missing"), MappingType::Absent);
        assert_eq!(classify_mapping_type("Psalm title"), MappingType::Unknown);
        assert_eq!(classify_mapping_type(""), MappingType::Unknown);
    }

    #[test]
    fn test_merge_substring_wins() {
        assert_eq!(classify_mapping_type("MergedNext verse"), MappingType::Merged);
        assert_eq!(classify_mapping_type("MergedPrev verse"), MappingType::Merged);
        assert_eq!(classify_mapping_type("Keep verse (merged)"), MappingType::Merged);
        assert_eq!(classify_mapping_type("  MERGE  "), MappingType::Merged);
        assert_eq!(classify_mapping_type("Split, then merged"), MappingType::Merged);
    }

    #[test]
    fn test_category_normalization() {
        assert_eq!(classify_category("Nec."), Some(Category::Nec));
        assert_eq!(classify_category(" opt "), Some(Category::Opt));
        assert_eq!(classify_category("Acd"), Some(Category::Acd));
        assert_eq!(classify_category("Inf;"), Some(Category::Inf));
        assert_eq!(classify_category("NONE"), Some(Category::None));
        assert_eq!(classify_category(""), Some(Category::None));
        assert_eq!(classify_category("Maybe"), None);
    }

    #[test]
    fn test_category_cell_with_tradition() {
        let cell = parse_category_cell("Latin Nec.");
        assert_eq!(cell.tradition.as_deref(), Some("Latin"));
        assert_eq!(cell.category, Category::Nec);
        assert!(cell.recognized);

        let cell = parse_category_cell("Old Greek  Opt");
        assert_eq!(cell.tradition.as_deref(), Some("Old Greek"));
        assert_eq!(cell.category, Category::Opt);
    }

    #[test]
    fn test_unrecognized_category_defaults_to_none() {
        let cell = parse_category_cell("Sometimes");
        assert_eq!(cell.tradition, None);
        assert_eq!(cell.category, Category::None);
        assert!(!cell.recognized);
    }

    #[test]
    fn test_type_cell_notes() {
        let cell = parse_type_cell("MergedNext verse; joins 1:3");
        assert_eq!(cell.mapping_type, MappingType::Merged);
        assert_eq!(cell.notes.as_deref(), Some("joins 1:3"));

        let cell = parse_type_cell("Keep verse;  ");
        assert_eq!(cell.mapping_type, MappingType::Keep);
        assert_eq!(cell.notes, None);
    }
}
