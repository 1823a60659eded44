//! Line-level reading of a mapping document.
//!
//! Expected layout:
//!
//! ```text
//! # free comments
//! @SourceTradition	Hebrew
//! @TargetTradition	NRSV
//! #DataStart(Basic)
//! Gen.1:1	Gen.1:1	Nec.	Keep verse
//! Gen.1:2	Gen.1:2 Gen.1:3	Nec.	MergedNext verse; joins the next verse
//! #DataEnd(Basic)
//! ```
//!
//! Section markers are recognised before comments, so the default comment
//! marker `#` never hides them.

use std::sync::LazyLock;

use regex::Regex;
use versemap_types::SectionMode;

use crate::builder::ClassifiedRow;
use crate::classify::{parse_category_cell, parse_type_cell};
use crate::config::ParseOptions;
use crate::context::ParserContext;
use crate::error::{RowError, StructuralError};
use crate::reference::parse_cell;
use crate::registry::BookRegistry;

/// Source, target, category, type-and-notes.
pub const MIN_CELLS: usize = 4;

static RE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#\s*Data(?P<edge>Start|End)\s*\((?P<annotation>[^)]*)\)").unwrap()
});

// ── Line classification ──────────────────────────────────────────────

/// Which side of a section a marker stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// What a single physical line is, before any state is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    Marker { edge: Edge, annotation: &'a str },
    Directive { key: &'a str, value: &'a str },
    /// Anything else: a data row inside a section, prose outside
    Text(&'a str),
}

pub fn classify_line<'a>(line: &'a str, options: &ParseOptions) -> LineKind<'a> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some(caps) = RE_MARKER.captures(line) {
        let edge = if caps["edge"].eq_ignore_ascii_case("start") {
            Edge::Start
        } else {
            Edge::End
        };
        let annotation = caps.name("annotation").map_or("", |m| m.as_str());
        return LineKind::Marker { edge, annotation };
    }
    let trimmed = line.trim_start();
    if !options.comment_marker.is_empty() && trimmed.starts_with(&options.comment_marker) {
        return LineKind::Comment;
    }
    if let Some(rest) = trimmed.strip_prefix(options.directive_prefix.as_str()) {
        if !options.directive_prefix.is_empty() {
            let rest = rest.trim();
            let (key, value) = rest
                .split_once(|c: char| c.is_whitespace() || c == '=' || c == ':')
                .unwrap_or((rest, ""));
            return LineKind::Directive {
                key,
                value: value.trim_start_matches(['=', ':']).trim(),
            };
        }
    }
    LineKind::Text(line)
}

// ── Session state machine ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    InHeader,
    InSection { mode: SectionMode, opened_at: usize },
    Complete,
    Failed,
}

impl SessionState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Apply a section marker at `line`.
    pub fn on_marker(self, edge: Edge, annotation: &str, line: usize) -> Result<Self, StructuralError> {
        let mode = SectionMode::from_annotation(annotation).ok_or_else(|| {
            StructuralError::UnknownSectionMode {
                line,
                annotation: annotation.trim().to_string(),
            }
        })?;
        match (self, edge) {
            (Self::InSection { mode: open, .. }, Edge::Start) => {
                Err(StructuralError::NestedSection { line, open })
            }
            (Self::InSection { mode: open, .. }, Edge::End) if open != mode => {
                Err(StructuralError::MismatchedSectionEnd { line, open, found: mode })
            }
            (Self::InSection { .. }, Edge::End) => Ok(Self::InHeader),
            (_, Edge::Start) => Ok(Self::InSection { mode, opened_at: line }),
            (_, Edge::End) => Err(StructuralError::UnexpectedSectionEnd { line }),
        }
    }

    /// Apply end of input.
    pub fn on_eof(self) -> Result<Self, StructuralError> {
        match self {
            Self::InSection { mode, opened_at } => Err(StructuralError::UnterminatedSection { opened_at, open: mode }),
            _ => Ok(Self::Complete),
        }
    }
}

// ── Data rows ────────────────────────────────────────────────────────

/// Apply a header directive to the context. Returns false for unknown keys.
pub fn apply_directive(key: &str, value: &str, ctx: &mut ParserContext) -> bool {
    let value = (!value.is_empty()).then(|| value.to_string());
    match key.to_ascii_lowercase().as_str() {
        "sourcetradition" | "source" => ctx.source_tradition = value,
        "targettradition" | "target" => ctx.target_tradition = value,
        _ => return false,
    }
    true
}

/// Parse the cells of one data row. Book context is updated as references
/// are read, so the target cell inherits the source's book.
pub fn parse_row(
    line: &str,
    registry: &BookRegistry,
    ctx: &mut ParserContext,
    options: &ParseOptions,
) -> Result<ClassifiedRow, RowError> {
    let cells: Vec<&str> = line.split(options.delimiter).map(str::trim).collect();
    if cells.len() < MIN_CELLS {
        return Err(RowError::MissingCells {
            found: cells.len(),
            expected: MIN_CELLS,
        });
    }

    let source = parse_cell(cells[0], registry, ctx)?;
    let targets = parse_cell(cells[1], registry, ctx)?;

    let category = parse_category_cell(cells[2]);
    if !category.recognized {
        ctx.counts.invalid_categories += 1;
        tracing::debug!(row = ctx.row_index, text = cells[2], "unrecognized category, using None");
    }
    let type_cell = parse_type_cell(cells[3]);

    let extra = cells[MIN_CELLS..].iter().copied().filter(|c| !c.is_empty());
    let notes: Vec<&str> = type_cell.notes.as_deref().into_iter().chain(extra).collect();

    Ok(ClassifiedRow {
        row: ctx.row_index,
        source,
        targets,
        mapping_type: type_cell.mapping_type,
        category: category.category,
        notes: (!notes.is_empty()).then(|| notes.join("; ")),
        source_tradition: ctx.source_tradition_for(category.tradition.as_deref(), options),
        target_tradition: ctx.target_tradition_for(options),
    })
}
