//! Per-row diagnostics handed to an event sink.

use std::fmt;

use serde::Serialize;

use crate::error::{BuildError, ReferenceError, RowError};

/// Why a row or mapping was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DropReason {
    MissingCells,
    MalformedReference,
    UnknownBook,
    AbsentSource,
    MultipleSources,
    NoTargets,
    /// A built mapping named a book the registry does not know
    UnregisteredBook,
    /// A built mapping broke a reference shape rule
    InvalidReference,
}

impl DropReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCells => "missing-cells",
            Self::MalformedReference => "malformed-reference",
            Self::UnknownBook => "unknown-book",
            Self::AbsentSource => "absent-source",
            Self::MultipleSources => "multiple-sources",
            Self::NoTargets => "no-targets",
            Self::UnregisteredBook => "unregistered-book",
            Self::InvalidReference => "invalid-reference",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<&RowError> for DropReason {
    fn from(err: &RowError) -> Self {
        match err {
            RowError::MissingCells { .. } => Self::MissingCells,
            RowError::Reference(ReferenceError::UnknownBook { .. }) => Self::UnknownBook,
            RowError::Reference(ReferenceError::MalformedReference { .. }) => Self::MalformedReference,
            RowError::Build(BuildError::AbsentSource) => Self::AbsentSource,
            RowError::Build(BuildError::MultipleSources(_)) => Self::MultipleSources,
            RowError::Build(BuildError::NoTargets) => Self::NoTargets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowEvent {
    /// Line number of the offending row
    pub row: usize,
    pub reason: DropReason,
    pub detail: String,
}

/// Receives one event per dropped row or mapping.
pub trait EventSink {
    fn record(&mut self, event: RowEvent);
}

/// Default sink: a `tracing` warning per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: RowEvent) {
        tracing::warn!(
            row = event.row,
            reason = event.reason.code(),
            "dropped: {}",
            event.detail
        );
    }
}

impl EventSink for Vec<RowEvent> {
    fn record(&mut self, event: RowEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: RowEvent) {
        (**self).record(event);
    }
}
