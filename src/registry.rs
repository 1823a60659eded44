//! Book name registry: canonical book names and their abbreviations.
//!
//! The registry is reference data. It is loaded once before parsing and
//! never changes while a parse is running. A built-in table covers the
//! 66-book protestant canon with both STEP-style three-letter codes and
//! OSIS ids; other canons are supplied as JSON.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::RegistryError;

// ── Built-in table ───────────────────────────────────────────────────

/// One canonical book and the abbreviations that resolve to it.
pub struct BookEntry {
    pub name: &'static str,
    pub abbreviations: &'static [&'static str],
}

macro_rules! books {
    ($($name:literal => [$($abbr:literal),* $(,)?]),* $(,)?) => {
        &[$(BookEntry { name: $name, abbreviations: &[$($abbr),*] }),*]
    };
}

pub static BOOKS: &[BookEntry] = books![
    // ── Old Testament ──
    "Genesis" => ["Gen"],
    "Exodus" => ["Exo", "Exod"],
    "Leviticus" => ["Lev"],
    "Numbers" => ["Num"],
    "Deuteronomy" => ["Deu", "Deut"],
    "Joshua" => ["Jos", "Josh"],
    "Judges" => ["Jdg", "Judg"],
    "Ruth" => ["Rut", "Ruth"],
    "1 Samuel" => ["1Sa", "1Sam"],
    "2 Samuel" => ["2Sa", "2Sam"],
    "1 Kings" => ["1Ki", "1Kgs"],
    "2 Kings" => ["2Ki", "2Kgs"],
    "1 Chronicles" => ["1Ch", "1Chr"],
    "2 Chronicles" => ["2Ch", "2Chr"],
    "Ezra" => ["Ezr", "Ezra"],
    "Nehemiah" => ["Neh"],
    "Esther" => ["Est", "Esth"],
    "Job" => ["Job"],
    "Psalms" => ["Psa", "Ps"],
    "Proverbs" => ["Pro", "Prov"],
    "Ecclesiastes" => ["Ecc", "Eccl"],
    "Song of Songs" => ["Sng", "Song"],
    "Isaiah" => ["Isa"],
    "Jeremiah" => ["Jer"],
    "Lamentations" => ["Lam"],
    "Ezekiel" => ["Ezk", "Ezek"],
    "Daniel" => ["Dan"],
    "Hosea" => ["Hos"],
    "Joel" => ["Jol", "Joel"],
    "Amos" => ["Amo", "Amos"],
    "Obadiah" => ["Oba", "Obad"],
    "Jonah" => ["Jon", "Jonah"],
    "Micah" => ["Mic"],
    "Nahum" => ["Nam", "Nah"],
    "Habakkuk" => ["Hab"],
    "Zephaniah" => ["Zep", "Zeph"],
    "Haggai" => ["Hag"],
    "Zechariah" => ["Zec", "Zech"],
    "Malachi" => ["Mal"],
    // ── New Testament ──
    "Matthew" => ["Mat", "Matt"],
    "Mark" => ["Mrk", "Mark"],
    "Luke" => ["Luk", "Luke"],
    "John" => ["Jhn", "John"],
    "Acts" => ["Act", "Acts"],
    "Romans" => ["Rom"],
    "1 Corinthians" => ["1Co", "1Cor"],
    "2 Corinthians" => ["2Co", "2Cor"],
    "Galatians" => ["Gal"],
    "Ephesians" => ["Eph"],
    "Philippians" => ["Php", "Phil"],
    "Colossians" => ["Col"],
    "1 Thessalonians" => ["1Th", "1Thess"],
    "2 Thessalonians" => ["2Th", "2Thess"],
    "1 Timothy" => ["1Ti", "1Tim"],
    "2 Timothy" => ["2Ti", "2Tim"],
    "Titus" => ["Tit", "Titus"],
    "Philemon" => ["Phm", "Phlm"],
    "Hebrews" => ["Heb"],
    "James" => ["Jas"],
    "1 Peter" => ["1Pe", "1Pet"],
    "2 Peter" => ["2Pe", "2Pet"],
    "1 John" => ["1Jn", "1John"],
    "2 John" => ["2Jn", "2John"],
    "3 John" => ["3Jn", "3John"],
    "Jude" => ["Jud", "Jude"],
    "Revelation" => ["Rev"],
];

// ── Runtime registry ─────────────────────────────────────────────────

/// JSON shape of an externally supplied registry entry.
#[derive(Debug, Deserialize)]
struct BookRecord {
    name: String,
    #[serde(default)]
    abbreviations: Vec<String>,
}

/// Immutable abbreviation → canonical name lookup.
#[derive(Debug, Clone, Default)]
pub struct BookRegistry {
    by_abbreviation: HashMap<String, String>,
    names: HashSet<String>,
    /// Canonical names in declaration order
    order: Vec<String>,
}

impl BookRegistry {
    /// The built-in protestant-canon table.
    pub fn builtin() -> Self {
        let entries = BOOKS.iter().map(|b| {
            (
                b.name.to_string(),
                b.abbreviations.iter().map(|a| a.to_string()).collect(),
            )
        });
        // The static table is checked by `test_builtin_has_no_clashes`.
        Self::from_entries(entries).unwrap_or_default()
    }

    /// Build from (name, abbreviations) pairs. A single-word canonical name
    /// also resolves as its own abbreviation.
    pub fn from_entries<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut registry = Self::default();
        for (name, abbreviations) in entries {
            let self_abbr = (!name.contains(char::is_whitespace)).then(|| name.clone());
            for abbr in abbreviations.into_iter().chain(self_abbr) {
                match registry.by_abbreviation.get(&abbr) {
                    Some(existing) if *existing != name => {
                        return Err(RegistryError::DuplicateAbbreviation {
                            abbreviation: abbr,
                            first: existing.clone(),
                            second: name,
                        });
                    }
                    Some(_) => {}
                    None => {
                        registry.by_abbreviation.insert(abbr, name.clone());
                    }
                }
            }
            if registry.names.insert(name.clone()) {
                registry.order.push(name);
            }
        }
        Ok(registry)
    }

    /// Load from a JSON array of `{"name": ..., "abbreviations": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let records: Vec<BookRecord> = serde_json::from_str(json)?;
        Self::from_entries(records.into_iter().map(|r| (r.name, r.abbreviations)))
    }

    /// Resolve an abbreviation (case-sensitive) to its canonical name.
    pub fn resolve(&self, abbreviation: &str) -> Option<&str> {
        self.by_abbreviation.get(abbreviation).map(String::as_str)
    }

    /// Whether `name` is a canonical book name in this registry.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Canonical names with their abbreviations, in declaration order.
    pub fn books(&self) -> Vec<(&str, Vec<&str>)> {
        self.order
            .iter()
            .map(|name| {
                let mut abbrs: Vec<&str> = self
                    .by_abbreviation
                    .iter()
                    .filter(|(_, n)| *n == name)
                    .map(|(a, _)| a.as_str())
                    .collect();
                abbrs.sort_unstable();
                (name.as_str(), abbrs)
            })
            .collect()
    }
}
