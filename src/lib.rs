//! Parser for versification mapping documents.
//!
//! A document lists, section by section, how verse references in one
//! versification tradition correspond to references in another. Reading one
//! goes through these stages for every row:
//!
//! cells → references ([`reference`]) → type/category ([`classify`]) →
//! mappings ([`builder`]) → section filter ([`resolve`]) → checks
//! ([`validate`]) → [`MappingStream`].
//!
//! ```
//! use versemap::{BookRegistry, ParseOptions, parse_str};
//!
//! let doc = "#DataStart(Basic)\nGen.1:1\tGen.1:1\tNec.\tKeep verse\n#DataEnd(Basic)\n";
//! let registry = BookRegistry::builtin();
//! let out = parse_str(doc, &registry, ParseOptions::default()).unwrap();
//! assert_eq!(out.mappings.len(), 1);
//! assert_eq!(out.summary.rows_seen, 1);
//! ```

pub mod builder;
pub mod classify;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod events;
pub mod reference;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod stream;
pub mod validate;

pub use config::ParseOptions;
pub use context::ParserContext;
pub use error::{Error, Result, StructuralError};
pub use events::{DropReason, EventSink, RowEvent, TracingSink};
pub use registry::BookRegistry;
pub use resolve::resolve_section;
pub use store::{MappingSink, MemoryStore, UpsertOutcome};
pub use stream::{MappingStream, ParseOutput, parse_str};
pub use versemap_types::{
    Category, Mapping, MappingKey, MappingType, ParseSummary, RangeEnd, Reference, SectionMode, VerseRef,
};
