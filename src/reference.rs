//! Reference tokenizer: turns a reference cell into structured references.
//!
//! Real cells look like:
//!   Gen.1:1
//!   Gen.1:2 Gen.1:3          (merge targets)
//!   Psa.51:0                 (title material)
//!   Rom.16:25-27             (range, same chapter)
//!   Gen.31:55-32:1           (range across chapters)
//!   Act.8:37a(P46)           (subverse + manuscript)
//!   Act.8:37 (P46)           (manuscript detached by whitespace)
//!   1:3                      (book carried over from the previous reference)
//!   Absent

use std::sync::LazyLock;

use regex::Regex;
use versemap_types::{RangeEnd, Reference, VerseRef};

use crate::context::ParserContext;
use crate::error::ReferenceError;
use crate::registry::BookRegistry;

// [Book Sep] Chapter Sep Verse, with Sep = "." or ":"
static RE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<book>[^.:\s]+)[.:])?(?P<chapter>[^.:\s]+)[.:](?P<verse>[^.:\s]+)$").unwrap()
});

// Verse number with optional single-letter subverse
static RE_VERSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>\d+)(?P<sub>[a-z])?$").unwrap());

// Trailing "(manuscript)"
static RE_MANUSCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<body>[^()]*)\((?P<ms>[^()]*)\)$").unwrap());

/// Parse a whole reference cell into an ordered list of references.
///
/// Tokens are whitespace-separated; a detached `(...)` group belongs to
/// the token before it. An empty cell yields an empty list.
pub fn parse_cell(
    cell: &str,
    registry: &BookRegistry,
    ctx: &mut ParserContext,
) -> Result<Vec<Reference>, ReferenceError> {
    split_tokens(cell)?
        .iter()
        .map(|token| parse_token(token, registry, ctx))
        .collect()
}

/// Parse one token. On success the context's current book becomes the
/// book of the parsed reference.
pub fn parse_token(
    token: &str,
    registry: &BookRegistry,
    ctx: &mut ParserContext,
) -> Result<Reference, ReferenceError> {
    if token.eq_ignore_ascii_case("absent") {
        return Ok(Reference::Absent);
    }

    let (body, manuscript) = split_manuscript(token)?;

    let (start_text, end_text) = match body.split_once('-') {
        Some((s, e)) => (s, Some(e)),
        None => (body, None),
    };

    let mut verse = parse_single(start_text, token, registry, ctx.current_book.as_deref())?;

    if let Some(end_text) = end_text {
        let end = parse_range_end(end_text, token, &verse, registry)?;
        if end < verse.start() {
            return Err(malformed(token, "range ends before it starts"));
        }
        verse.range_end = Some(end);
    }

    verse.manuscript = manuscript;
    ctx.current_book = Some(verse.book.clone());
    Ok(Reference::Verse(verse))
}

/// Split a cell into tokens, re-attaching detached manuscript groups.
fn split_tokens(cell: &str) -> Result<Vec<String>, ReferenceError> {
    let mut tokens: Vec<String> = Vec::new();
    let mut open_group = false;

    for word in cell.split_whitespace() {
        if open_group || word.starts_with('(') {
            let Some(last) = tokens.last_mut() else {
                return Err(malformed(cell.trim(), "manuscript without a reference"));
            };
            if open_group {
                last.push(' ');
            }
            last.push_str(word);
        } else {
            tokens.push(word.to_string());
        }

        if let Some(last) = tokens.last() {
            open_group = last.matches('(').count() > last.matches(')').count();
        }
    }

    if open_group {
        return Err(malformed(cell.trim(), "unclosed manuscript annotation"));
    }
    Ok(tokens)
}

fn split_manuscript(token: &str) -> Result<(&str, Option<String>), ReferenceError> {
    if !token.contains('(') && !token.contains(')') {
        return Ok((token, None));
    }
    let caps = RE_MANUSCRIPT
        .captures(token)
        .ok_or_else(|| malformed(token, "misplaced parenthesis"))?;
    let body = caps.name("body").map_or("", |m| m.as_str());
    let ms = caps.name("ms").map_or("", |m| m.as_str()).trim();
    if ms.is_empty() {
        return Err(malformed(token, "empty manuscript annotation"));
    }
    Ok((body, Some(ms.to_string())))
}

/// Parse `[Book Sep] Chapter Sep Verse[Subverse]`.
fn parse_single(
    text: &str,
    token: &str,
    registry: &BookRegistry,
    current_book: Option<&str>,
) -> Result<VerseRef, ReferenceError> {
    let caps = RE_REF
        .captures(text)
        .ok_or_else(|| malformed(token, "expected Book.Chapter:Verse"))?;

    let book = match caps.name("book") {
        Some(abbr) => registry
            .resolve(abbr.as_str())
            .ok_or_else(|| ReferenceError::UnknownBook {
                abbreviation: abbr.as_str().to_string(),
            })?
            .to_string(),
        None => current_book
            .ok_or_else(|| malformed(token, "no book given and none carried over"))?
            .to_string(),
    };

    let chapter = parse_number(&caps["chapter"])
        .ok_or_else(|| malformed(token, "chapter is not a non-negative integer"))?;
    let (verse, subverse) = parse_verse(&caps["verse"])
        .ok_or_else(|| malformed(token, "verse is not a non-negative integer"))?;

    Ok(VerseRef {
        book,
        chapter,
        verse,
        subverse,
        manuscript: None,
        range_end: None,
    })
}

/// The part after `-`: a full reference, `Chapter:Verse`, or a bare verse
/// in the start's chapter. Subverse letters on the end are accepted and
/// dropped.
fn parse_range_end(
    text: &str,
    token: &str,
    start: &VerseRef,
    registry: &BookRegistry,
) -> Result<RangeEnd, ReferenceError> {
    if let Some((verse, _)) = parse_verse(text) {
        return Ok(RangeEnd {
            chapter: start.chapter,
            verse,
        });
    }
    let end = parse_single(text, token, registry, Some(&start.book))?;
    if end.book != start.book {
        return Err(malformed(token, "range crosses books"));
    }
    Ok(RangeEnd {
        chapter: end.chapter,
        verse: end.verse,
    })
}

fn parse_verse(text: &str) -> Option<(u32, Option<char>)> {
    let caps = RE_VERSE.captures(text)?;
    let num = parse_number(&caps["num"])?;
    let sub = caps.name("sub").and_then(|m| m.as_str().chars().next());
    Some((num, sub))
}

fn parse_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn malformed(token: &str, reason: &'static str) -> ReferenceError {
    ReferenceError::MalformedReference {
        token: token.to_string(),
        reason,
    }
}
