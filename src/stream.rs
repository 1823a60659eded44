//! Lazy, section-at-a-time mapping stream over a document.

use std::collections::VecDeque;
use std::io::{BufRead, Lines};
use std::mem;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use versemap_types::{Mapping, ParseSummary, SectionMode};

use crate::builder::build_mappings;
use crate::config::ParseOptions;
use crate::context::ParserContext;
use crate::document::{LineKind, SessionState, apply_directive, classify_line, parse_row};
use crate::error::{Result, RowError};
use crate::events::{DropReason, EventSink, RowEvent, TracingSink};
use crate::registry::BookRegistry;
use crate::resolve::{resolve_section, type_histogram};
use crate::validate::Validator;

/// Everything a fully drained stream produced.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutput {
    pub mappings: Vec<Mapping>,
    pub summary: ParseSummary,
}

/// Iterator of validated mappings read from `R`.
///
/// Rows are buffered one section at a time: a section's mappings are
/// released only after its end marker, once the section filter and the
/// validator have run. A structural error is yielded once and ends the
/// stream.
pub struct MappingStream<'r, R, S = TracingSink> {
    lines: Lines<R>,
    registry: &'r BookRegistry,
    options: ParseOptions,
    ctx: ParserContext,
    validator: Validator<'r>,
    sink: S,
    state: SessionState,
    section: Vec<Mapping>,
    ready: VecDeque<Mapping>,
    stamp: DateTime<Utc>,
}

impl<'r, R: BufRead> MappingStream<'r, R, TracingSink> {
    pub fn new(reader: R, registry: &'r BookRegistry, options: ParseOptions) -> Self {
        Self {
            lines: reader.lines(),
            registry,
            options,
            ctx: ParserContext::new(),
            validator: Validator::new(registry),
            sink: TracingSink,
            state: SessionState::Init,
            section: Vec::new(),
            ready: VecDeque::new(),
            stamp: Utc::now(),
        }
    }
}

impl<'r, R: BufRead, S: EventSink> MappingStream<'r, R, S> {
    /// Route row events to another sink.
    pub fn with_sink<T: EventSink>(self, sink: T) -> MappingStream<'r, R, T> {
        MappingStream {
            lines: self.lines,
            registry: self.registry,
            options: self.options,
            ctx: self.ctx,
            validator: self.validator,
            sink,
            state: self.state,
            section: self.section,
            ready: self.ready,
            stamp: self.stamp,
        }
    }

    /// Fix the created/updated timestamp given to every mapping.
    pub fn with_timestamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }

    /// Counts so far; final once the stream has returned `None`.
    pub fn summary(&self) -> &ParseSummary {
        &self.ctx.counts
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drain the stream, keeping every mapping in memory.
    pub fn collect_all(mut self) -> Result<ParseOutput> {
        let mut mappings = Vec::new();
        for item in self.by_ref() {
            mappings.push(item?);
        }
        Ok(ParseOutput {
            mappings,
            summary: self.ctx.counts,
        })
    }

    /// Consume one physical line. Returns `Ok(false)` at end of input.
    fn advance(&mut self) -> Result<bool> {
        let Some(line) = self.lines.next() else {
            self.state = self.state.on_eof()?;
            self.ctx.section_mode = None;
            info!(
                lines = self.ctx.counts.lines_read,
                emitted = self.ctx.counts.mappings_emitted,
                dropped = self.ctx.counts.rows_dropped(),
                suppressed = self.ctx.counts.mappings_suppressed,
                "parse complete"
            );
            return Ok(false);
        };
        let line = line?;

        self.ctx.counts.lines_read += 1;
        self.ctx.row_index = self.ctx.counts.lines_read;
        if self.state == SessionState::Init {
            self.state = SessionState::InHeader;
        }

        match classify_line(&line, &self.options) {
            LineKind::Blank | LineKind::Comment => self.ctx.counts.skipped_lines += 1,
            LineKind::Marker { edge, annotation } => {
                let previous = self.state;
                self.state = previous.on_marker(edge, annotation, self.ctx.row_index)?;
                match (previous, self.state) {
                    (SessionState::InSection { mode, .. }, _) => self.close_section(mode),
                    (_, SessionState::InSection { mode, .. }) => self.open_section(mode),
                    _ => {}
                }
            }
            LineKind::Directive { key, value } => {
                self.ctx.counts.header_lines += 1;
                if !apply_directive(key, value, &mut self.ctx) {
                    debug!(row = self.ctx.row_index, key, "ignoring unknown directive");
                }
            }
            LineKind::Text(text) => match self.state {
                SessionState::InSection { .. } => self.process_row(text),
                _ => self.ctx.counts.header_lines += 1,
            },
        }
        Ok(true)
    }

    fn open_section(&mut self, mode: SectionMode) {
        self.ctx.section_mode = Some(mode);
        match mode {
            SectionMode::Basic => self.ctx.counts.basic_sections += 1,
            SectionMode::Expanded => self.ctx.counts.expanded_sections += 1,
        }
        debug!(row = self.ctx.row_index, mode = mode.as_str(), "section opened");
    }

    fn close_section(&mut self, mode: SectionMode) {
        let batch = mem::take(&mut self.section);
        let built = batch.len();

        let resolved = resolve_section(mode, batch);
        self.ctx.counts.mappings_suppressed += resolved.suppressed;

        let valid = self
            .validator
            .validate_section(resolved.kept, &mut self.ctx.counts, &mut self.sink);
        self.ctx.counts.mappings_emitted += valid.len();

        debug!(
            row = self.ctx.row_index,
            mode = mode.as_str(),
            built,
            suppressed = resolved.suppressed,
            released = valid.len(),
            types = ?type_histogram(&valid),
            "section closed"
        );

        self.ctx.section_mode = None;
        self.ready.extend(valid);
    }

    /// Row-local failures are folded into counters and events here; they
    /// never reach the caller. A dropped row leaves the carried book as it
    /// was before the row.
    fn process_row(&mut self, text: &str) {
        self.ctx.counts.rows_seen += 1;
        let book_before = self.ctx.current_book.clone();

        let built = parse_row(text, self.registry, &mut self.ctx, &self.options)
            .and_then(|row| build_mappings(row, self.stamp).map_err(RowError::from));

        match built {
            Ok(mappings) => {
                self.ctx.counts.mappings_built += mappings.len();
                self.section.extend(mappings);
            }
            Err(err) => {
                self.ctx.current_book = book_before;
                if err.is_validation() {
                    self.ctx.counts.rows_dropped_validation += 1;
                } else {
                    self.ctx.counts.rows_dropped_parse += 1;
                }
                self.sink.record(RowEvent {
                    row: self.ctx.row_index,
                    reason: DropReason::from(&err),
                    detail: err.to_string(),
                });
            }
        }
    }
}

impl<R: BufRead, S: EventSink> Iterator for MappingStream<'_, R, S> {
    type Item = Result<Mapping>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(m) = self.ready.pop_front() {
                return Some(Ok(m));
            }
            if self.state.is_finished() {
                return None;
            }
            match self.advance() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(err) => {
                    self.state = SessionState::Failed;
                    self.ready.clear();
                    self.section.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Parse an in-memory document.
pub fn parse_str(input: &str, registry: &BookRegistry, options: ParseOptions) -> Result<ParseOutput> {
    MappingStream::new(input.as_bytes(), registry, options).collect_all()
}
