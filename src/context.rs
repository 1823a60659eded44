use versemap_types::{ParseSummary, SectionMode};

use crate::config::ParseOptions;

/// Mutable state carried forward across the rows of one document.
///
/// Created per parse and owned by the stream driving it. Rows must be fed
/// in document order because omitted books inherit `current_book`.
#[derive(Debug, Clone)]
pub struct ParserContext {
    /// Book of the last successfully parsed reference
    pub current_book: Option<String>,
    /// Mode of the open section, `None` outside sections
    pub section_mode: Option<SectionMode>,
    /// 1-based number of the line being processed
    pub row_index: usize,
    /// From an `@SourceTradition` directive
    pub source_tradition: Option<String>,
    /// From an `@TargetTradition` directive
    pub target_tradition: Option<String>,
    pub counts: ParseSummary,
}

impl ParserContext {
    pub fn new() -> Self {
        Self {
            current_book: None,
            section_mode: None,
            row_index: 0,
            source_tradition: None,
            target_tradition: None,
            counts: ParseSummary::default(),
        }
    }

    /// Source tradition for a row, most specific first.
    pub fn source_tradition_for(&self, row_override: Option<&str>, options: &ParseOptions) -> String {
        row_override
            .or(self.source_tradition.as_deref())
            .unwrap_or(&options.default_source_tradition)
            .to_string()
    }

    pub fn target_tradition_for(&self, options: &ParseOptions) -> String {
        self.target_tradition
            .as_deref()
            .unwrap_or(&options.default_target_tradition)
            .to_string()
    }
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::new()
    }
}
