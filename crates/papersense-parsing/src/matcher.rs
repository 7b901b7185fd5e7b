//! Matching citation mentions against bibliography entries.

use std::fmt;

use papersense_core::{CitationMention, ReferenceEntry, ReferenceRow};

use crate::profile::YearMatch;

/// Decides whether a cited surname occurs in a bibliography entry's text.
pub trait SurnameMatch: Send + Sync + fmt::Debug {
    fn matches(&self, surname: &str, raw_text: &str) -> bool;

    fn name(&self) -> &'static str;
}

/// Plain substring containment. Tolerates punctuation and diacritic noise
/// around names, at the cost of "Lee" also matching "Leeuwen".
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatch;

impl SurnameMatch for SubstringMatch {
    fn matches(&self, surname: &str, raw_text: &str) -> bool {
        raw_text.contains(surname)
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

/// The surname must occur with no letter directly before or after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeWordMatch;

impl SurnameMatch for WholeWordMatch {
    fn matches(&self, surname: &str, raw_text: &str) -> bool {
        if surname.is_empty() {
            return false;
        }
        raw_text.match_indices(surname).any(|(start, _)| {
            let before = raw_text[..start].chars().next_back();
            let after = raw_text[start + surname.len()..].chars().next();
            !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
        })
    }

    fn name(&self) -> &'static str {
        "whole-word"
    }
}

fn year_matches(year: &str, raw_text: &str, year_match: YearMatch) -> bool {
    match year_match {
        YearMatch::Bare => raw_text.contains(year),
        YearMatch::Parenthesized => raw_text.contains(&format!("({year})")),
    }
}

/// Whether `mention` refers to `entry`: the year and every surname occur
/// in the entry's raw text.
pub fn mention_matches(
    mention: &CitationMention,
    entry: &ReferenceEntry,
    year_match: YearMatch,
    surnames: &dyn SurnameMatch,
) -> bool {
    year_matches(&mention.year, &entry.raw_text, year_match)
        && mention
            .surnames
            .iter()
            .all(|s| surnames.matches(s, &entry.raw_text))
}

/// Bibliography entries and the headings of the sections that cite them.
///
/// Each heading is stored at most once per entry, in the order it was
/// first seen. Rows come out in bibliography order.
#[derive(Debug)]
pub struct ReferenceIndex<'a> {
    entries: &'a [ReferenceEntry],
    locations: Vec<Vec<String>>,
    year_match: YearMatch,
    surnames: &'a dyn SurnameMatch,
    unmatched: usize,
}

impl<'a> ReferenceIndex<'a> {
    pub fn new(
        entries: &'a [ReferenceEntry],
        year_match: YearMatch,
        surnames: &'a dyn SurnameMatch,
    ) -> Self {
        Self {
            entries,
            locations: vec![Vec::new(); entries.len()],
            year_match,
            surnames,
            unmatched: 0,
        }
    }

    /// Record `mention` against every entry it matches. Returns the number
    /// of entries matched; a mention matching nothing is dropped.
    pub fn record(&mut self, mention: &CitationMention) -> usize {
        let mut matched = 0;
        for (entry, locations) in self.entries.iter().zip(self.locations.iter_mut()) {
            if !mention_matches(mention, entry, self.year_match, self.surnames) {
                continue;
            }
            matched += 1;
            if !locations.contains(&mention.location) {
                locations.push(mention.location.clone());
            }
        }
        if matched == 0 {
            self.unmatched += 1;
            tracing::trace!(
                surnames = ?mention.surnames,
                year = %mention.year,
                location = %mention.location,
                "mention matched no bibliography entry"
            );
        }
        matched
    }

    /// Mentions recorded so far that matched no entry.
    pub fn unmatched(&self) -> usize {
        self.unmatched
    }

    /// Headings citing the entry at `index` in the bibliography.
    pub fn locations(&self, index: usize) -> &[String] {
        self.locations.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One row per cited entry, in bibliography order. Entries with the
    /// same raw text share a row.
    pub fn into_rows(self) -> Vec<ReferenceRow> {
        let mut rows: Vec<ReferenceRow> = Vec::new();
        for (entry, locations) in self.entries.iter().zip(self.locations) {
            if locations.is_empty() {
                continue;
            }
            match rows.iter_mut().find(|r| r.reference == entry.raw_text) {
                Some(row) => {
                    for location in locations {
                        if !row.sections.contains(&location) {
                            row.sections.push(location);
                        }
                    }
                }
                None => rows.push(ReferenceRow {
                    reference: entry.raw_text.clone(),
                    sections: locations,
                }),
            }
        }
        rows
    }
}
