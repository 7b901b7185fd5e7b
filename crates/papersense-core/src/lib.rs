use std::collections::BTreeSet;
use std::ops::Range;

use serde::Serialize;

pub mod backend;
pub mod config_file;
pub mod mock;

pub use backend::{BackendError, DocumentBackend, Fragment, PageSource, Rect};

/// A maximal sequence of consecutive fragments sharing font family and
/// rounded font size, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    /// Page the run started on.
    pub page_index: usize,
}

/// One bibliography entry, cut out of the collapsed bibliography text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceEntry {
    pub raw_text: String,
    /// Byte span of this entry inside the collapsed bibliography block.
    #[serde(skip)]
    pub span: Range<usize>,
    /// Capitalized author tokens found before the year.
    pub surnames: BTreeSet<String>,
    pub year: Option<String>,
}

/// An in-text citation decomposed into author surnames and a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationMention {
    pub surnames: Vec<String>,
    pub year: String,
    /// Heading of the section the mention was found in.
    pub location: String,
}

/// Why a raw citation match was not turned into a [`CitationMention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    NoYear,
    NoAuthor,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoYear => "no_year",
            SkipReason::NoAuthor => "no_author",
        }
    }
}

/// Outcome of decomposing one raw citation string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMention {
    Mention(CitationMention),
    Skip(SkipReason),
}

/// One row of the section table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRow {
    pub heading: String,
    pub text: String,
}

/// One row of the reference index: a bibliography entry and the headings
/// of the sections citing it, in first-seen order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceRow {
    pub reference: String,
    pub sections: Vec<String>,
}

impl ReferenceRow {
    /// Citing headings joined with `,` as written to the reference table.
    pub fn citing_sections(&self) -> String {
        self.sections.join(",")
    }
}

/// Counters collected while parsing one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionStats {
    /// The page source produced no fragments at all.
    pub fragment_stream_empty: bool,
    pub total_runs: usize,
    pub total_sections: usize,
    pub total_entries: usize,
    pub mentions: usize,
    pub citation_skips: usize,
    /// Mentions that matched no bibliography entry.
    pub unmatched_mentions: usize,
}

/// Result of parsing one document: the section table and the reference index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDocument {
    /// Identifier of the journal profile used.
    pub journal: String,
    pub sections: Vec<SectionRow>,
    pub references: Vec<ReferenceRow>,
    pub stats: ExtractionStats,
}

impl ParsedDocument {
    /// The document that results from a page source with no text at all.
    pub fn empty(journal: impl Into<String>) -> Self {
        Self {
            journal: journal.into(),
            sections: Vec::new(),
            references: Vec::new(),
            stats: ExtractionStats {
                fragment_stream_empty: true,
                ..Default::default()
            },
        }
    }

    pub fn section(&self, heading: &str) -> Option<&SectionRow> {
        self.sections.iter().find(|s| s.heading == heading)
    }
}
