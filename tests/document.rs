//! End-to-end parsing through the public API.

use versemap::{
    BookRegistry, Category, DropReason, MappingSink, MappingStream, MappingType, MemoryStore, ParseOptions,
    Reference, RowEvent, UpsertOutcome, VerseRef, parse_str,
};

const DOC: &str = "\
# Sample versification table
@SourceTradition\tHebrew
@TargetTradition: English

#DataStart(Basic)
Gen.1:1\tGen.1:1\tNec.\tKeep verse
Gen.1:2\tGen.1:2\tNec.\tKeep verse
Gen.1:2\tGen.1:2 Gen.1:3\tNec.\tMergedNext verse

# stray comment inside a section
Mal.4:1\tMal.3:19\tAcd\tRenumbered verse; chapter 4 folds into 3
#DataEnd(Basic)

#DataStart(Expanded)
Gen.31:55\tAbsent\tInf.\tAbsent verse
Act.8:37\tAct.8:37\tOpt\tKeep verse
#DataEnd(Expanded)
";

fn verse(book: &str, chapter: u32, verse: u32) -> VerseRef {
    VerseRef::new(book, chapter, verse)
}

#[test]
fn keep_row_yields_one_mapping() {
    let registry = BookRegistry::builtin();
    let out = parse_str(DOC, &registry, ParseOptions::default()).unwrap();

    let gen_1_1: Vec<_> = out.mappings.iter().filter(|m| m.source == verse("Genesis", 1, 1)).collect();
    assert_eq!(gen_1_1.len(), 1);
    let m = gen_1_1[0];
    assert_eq!(m.target, Reference::Verse(verse("Genesis", 1, 1)));
    assert_eq!(m.mapping_type, MappingType::Keep);
    assert_eq!(m.category, Category::Nec);
    assert_eq!(m.source_tradition, "Hebrew");
    assert_eq!(m.target_tradition, "English");
}

#[test]
fn merge_row_fans_out_and_collapses_keep_in_basic() {
    let registry = BookRegistry::builtin();
    let out = parse_str(DOC, &registry, ParseOptions::default()).unwrap();

    let gen_1_2: Vec<_> = out.mappings.iter().filter(|m| m.source == verse("Genesis", 1, 2)).collect();
    assert_eq!(gen_1_2.len(), 2);
    assert!(gen_1_2.iter().all(|m| m.mapping_type == MappingType::Merged));
    let targets: Vec<_> = gen_1_2.iter().map(|m| m.target.clone()).collect();
    assert_eq!(
        targets,
        vec![
            Reference::Verse(verse("Genesis", 1, 2)),
            Reference::Verse(verse("Genesis", 1, 3)),
        ]
    );
    assert_eq!(out.summary.mappings_suppressed, 1);
}

#[test]
fn expanded_section_keeps_both_types() {
    let registry = BookRegistry::builtin();
    let doc = "\
#DataStart(Expanded)
Gen.1:2\tGen.1:2\tNec\tKeep verse
Gen.1:2\tGen.1:2 Gen.1:3\tNec\tMergedNext verse
#DataEnd(Expanded)
";
    let out = parse_str(doc, &registry, ParseOptions::default()).unwrap();

    let types: Vec<MappingType> = out.mappings.iter().map(|m| m.mapping_type).collect();
    assert_eq!(types, vec![MappingType::Keep, MappingType::Merged, MappingType::Merged]);
    let same_verse: Vec<MappingType> = out
        .mappings
        .iter()
        .filter(|m| m.target == Reference::Verse(verse("Genesis", 1, 2)))
        .map(|m| m.mapping_type)
        .collect();
    assert_eq!(same_verse, vec![MappingType::Keep, MappingType::Merged]);
    assert_eq!(out.summary.duplicates_merged, 0);
    assert_eq!(out.summary.mappings_suppressed, 0);
    assert_eq!(out.summary.expanded_sections, 1);
}

#[test]
fn absent_target_is_a_mapping_not_an_error() {
    let registry = BookRegistry::builtin();
    let mut events: Vec<RowEvent> = Vec::new();
    let out = MappingStream::new(DOC.as_bytes(), &registry, ParseOptions::default())
        .with_sink(&mut events)
        .collect_all()
        .unwrap();

    let m = out
        .mappings
        .iter()
        .find(|m| m.source == verse("Genesis", 31, 55))
        .unwrap();
    assert_eq!(m.mapping_type, MappingType::Absent);
    assert_eq!(m.target, Reference::Absent);
    assert_eq!(m.category, Category::Inf);
    assert!(events.iter().all(|e| e.reason != DropReason::MalformedReference));
}

#[test]
fn unknown_book_drops_exactly_one_row() {
    let registry = BookRegistry::builtin();
    let clean = parse_str(DOC, &registry, ParseOptions::default()).unwrap();

    let with_bad = DOC.replace(
        "Act.8:37\tAct.8:37\tOpt\tKeep verse\n",
        "Act.8:37\tAct.8:37\tOpt\tKeep verse\nXyz.1:1\tGen.1:1\tNec\tKeep verse\n",
    );
    let mut events: Vec<RowEvent> = Vec::new();
    let out = MappingStream::new(with_bad.as_bytes(), &registry, ParseOptions::default())
        .with_sink(&mut events)
        .collect_all()
        .unwrap();

    assert_eq!(out.mappings.len(), clean.mappings.len());
    assert_eq!(out.summary.rows_dropped(), clean.summary.rows_dropped() + 1);
    assert_eq!(out.summary.rows_dropped_validation, 1);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, DropReason::UnknownBook);
}

#[test]
fn comments_and_blanks_are_only_skipped() {
    let registry = BookRegistry::builtin();
    let out = parse_str(DOC, &registry, ParseOptions::default()).unwrap();
    let s = &out.summary;

    // 2 comments + 3 blank lines
    assert_eq!(s.skipped_lines, 5);
    assert_eq!(s.rows_dropped(), 0);
    assert_eq!(s.mappings_dropped_validation, 0);
    assert_eq!(s.invalid_categories, 0);
    assert_eq!(s.header_lines, 2);
    assert_eq!(s.rows_seen, 6);
    assert_eq!(s.basic_sections, 1);
    assert_eq!(s.expanded_sections, 1);
}

#[test]
fn notes_survive_from_type_cell() {
    let registry = BookRegistry::builtin();
    let out = parse_str(DOC, &registry, ParseOptions::default()).unwrap();
    let m = out
        .mappings
        .iter()
        .find(|m| m.source == verse("Malachi", 4, 1))
        .unwrap();
    assert_eq!(m.mapping_type, MappingType::Renumbered);
    assert_eq!(m.category, Category::Acd);
    assert_eq!(m.target, Reference::Verse(verse("Malachi", 3, 19)));
    assert_eq!(m.notes.as_deref(), Some("chapter 4 folds into 3"));
}

#[test]
fn reparse_and_upsert_is_idempotent() {
    let registry = BookRegistry::builtin();
    let mut store = MemoryStore::new();

    for _ in 0..2 {
        let stream = MappingStream::new(DOC.as_bytes(), &registry, ParseOptions::default());
        for m in stream {
            store.upsert(m.unwrap());
        }
    }
    let first_pass = parse_str(DOC, &registry, ParseOptions::default()).unwrap();
    assert_eq!(store.len(), first_pass.mappings.len());

    let outcomes: Vec<UpsertOutcome> = first_pass.mappings.into_iter().map(|m| store.upsert(m)).collect();
    assert!(outcomes.iter().all(|o| *o == UpsertOutcome::Unchanged));
}

#[test]
fn custom_delimiter_and_fallback_traditions() {
    let registry = BookRegistry::builtin();
    let options = ParseOptions {
        delimiter: '|',
        default_source_tradition: "Latin".into(),
        ..ParseOptions::default()
    };
    let doc = "#DataStart(Condensed)\nGen.1:1|Gen.1:1|Nec|Keep verse\n#DataEnd(Condensed)\n";
    let out = parse_str(doc, &registry, options).unwrap();
    assert_eq!(out.mappings.len(), 1);
    assert_eq!(out.mappings[0].source_tradition, "Latin");
    assert_eq!(out.mappings[0].target_tradition, "standard");
}

#[test]
fn multi_part_notes_are_stable_across_upserts() {
    let registry = BookRegistry::builtin();
    let doc = "\
#DataStart(Expanded)
Gen.1:2\tGen.1:2 Gen.1:3\tNec\tMergedNext verse; joins\textra note
#DataEnd(Expanded)
";
    let mut store = MemoryStore::new();
    let mut outcomes = Vec::new();
    for _ in 0..3 {
        for m in MappingStream::new(doc.as_bytes(), &registry, ParseOptions::default()) {
            outcomes.push(store.upsert(m.unwrap()));
        }
    }

    assert_eq!(
        outcomes,
        vec![
            UpsertOutcome::Inserted,
            UpsertOutcome::Inserted,
            UpsertOutcome::Unchanged,
            UpsertOutcome::Unchanged,
            UpsertOutcome::Unchanged,
            UpsertOutcome::Unchanged,
        ]
    );
    assert_eq!(store.len(), 2);
    assert!(
        store
            .mappings()
            .iter()
            .all(|m| m.notes.as_deref() == Some("joins; extra note"))
    );
}

#[test]
fn repeated_row_in_section_keeps_multi_part_notes_once() {
    let registry = BookRegistry::builtin();
    let doc = "\
#DataStart(Expanded)
Gen.1:1\tGen.1:1\tNec\tKeep verse; first; second
Gen.1:1\tGen.1:1\tNec\tKeep verse; first; second
#DataEnd(Expanded)
";
    let out = parse_str(doc, &registry, ParseOptions::default()).unwrap();
    assert_eq!(out.mappings.len(), 1);
    assert_eq!(out.summary.duplicates_merged, 1);
    assert_eq!(out.mappings[0].notes.as_deref(), Some("first; second"));
}
