use thiserror::Error;

use versemap_types::SectionMode;

/// A single reference token could not be resolved. Row-local.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("unknown book abbreviation `{abbreviation}`")]
    UnknownBook { abbreviation: String },
    #[error("malformed reference `{token}`: {reason}")]
    MalformedReference { token: String, reason: &'static str },
}

/// A classified row could not be turned into mappings. Row-local.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("source cell is `Absent`")]
    AbsentSource,
    #[error("source cell holds {0} references, expected one")]
    MultipleSources(usize),
    #[error("target cell is empty")]
    NoTargets,
}

/// Why a data row produced no mappings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("row has {found} cells, expected at least {expected}")]
    MissingCells { found: usize, expected: usize },
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl RowError {
    /// Unknown books are validation failures; everything else is a parse failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Reference(ReferenceError::UnknownBook { .. })
        )
    }
}

/// Broken document structure. Aborts the whole parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("line {line}: section start inside an open {open:?} section")]
    NestedSection { line: usize, open: SectionMode },
    #[error("line {line}: section end without a matching start")]
    UnexpectedSectionEnd { line: usize },
    #[error("line {line}: {found:?} section end closes a {open:?} section")]
    MismatchedSectionEnd {
        line: usize,
        open: SectionMode,
        found: SectionMode,
    },
    #[error("line {line}: unknown section mode `{annotation}`")]
    UnknownSectionMode { line: usize, annotation: String },
    #[error("input ended inside the {open:?} section opened at line {opened_at}")]
    UnterminatedSection { opened_at: usize, open: SectionMode },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot parse book registry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("abbreviation `{abbreviation}` is claimed by both {first} and {second}")]
    DuplicateAbbreviation {
        abbreviation: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
