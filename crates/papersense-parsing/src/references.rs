use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use papersense_core::ReferenceEntry;

use crate::ParsingError;
use crate::profile::{ReferenceConfig, StartAdjust};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4}[a-z]?)\b").unwrap());

static NAME_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Lu}[\p{L}'’\-]*\p{Ll}[\p{L}'’\-]*").unwrap());

/// Words that look like names in an author block but are not.
const NOT_SURNAMES: &[&str] = &["Eds", "Ed", "In", "And", "The", "Jr", "Inc"];

/// Collapse every whitespace run (including newlines) to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Index just past the first sentence end inside `matched`: a period that
/// follows a lowercase letter outside parentheses.
fn after_sentence_end(matched: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut prev: Option<char> = None;
    for (i, c) in matched.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '.' if depth <= 0 && prev.is_some_and(char::is_lowercase) => {
                let rest = &matched[i + 1..];
                return Some(i + 1 + (rest.len() - rest.trim_start().len()));
            }
            _ => {}
        }
        prev = Some(c);
    }
    None
}

fn entry_starts(text: &str, config: &ReferenceConfig) -> Vec<usize> {
    let mut starts: Vec<usize> = config
        .entry_start
        .find_iter(text)
        .map(|m| match config.start_adjust {
            StartAdjust::None => m.start(),
            StartAdjust::AfterSentenceEnd => match after_sentence_end(m.as_str()) {
                Some(offset) if m.start() + offset < m.end() => m.start() + offset,
                _ => m.start(),
            },
        })
        .collect();
    starts.dedup();
    starts
}

/// Parse the author surnames and year of one entry.
pub fn parse_entry(raw: &str, span: std::ops::Range<usize>) -> ReferenceEntry {
    let year_match = YEAR_RE.captures(raw).and_then(|c| c.get(1));
    let author_block = match year_match {
        Some(m) => &raw[..m.start()],
        None => raw,
    };
    let surnames: BTreeSet<String> = NAME_TOKEN_RE
        .find_iter(author_block)
        .map(|m| m.as_str().trim_end_matches(['\'', '’', '-']).to_string())
        .filter(|t| !NOT_SURNAMES.contains(&t.as_str()))
        .collect();
    ReferenceEntry {
        raw_text: raw.trim().to_string(),
        span,
        surnames,
        year: year_match.map(|m| m.as_str().to_string()),
    }
}

/// Split a bibliography block into entries.
///
/// The block is whitespace-collapsed first. Every match of the profile's
/// entry-start pattern opens an entry that runs to the next start (or the
/// end of the block); text before the first start is discarded.
pub fn split_references(
    block: &str,
    config: &ReferenceConfig,
    journal: &str,
) -> Result<Vec<ReferenceEntry>, ParsingError> {
    let text = collapse_whitespace(block);
    let starts = entry_starts(&text, config);
    if starts.is_empty() {
        return Err(ParsingError::ReferenceEntryPatternNoMatch {
            journal: journal.to_string(),
        });
    }

    let entries: Vec<ReferenceEntry> = starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            parse_entry(&text[start..end], start..end)
        })
        .filter(|e| !e.raw_text.is_empty())
        .collect();

    tracing::debug!(
        journal,
        entries = entries.len(),
        leading_discarded = starts[0],
        "split bibliography"
    );
    Ok(entries)
}
