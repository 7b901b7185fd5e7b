use std::path::Path;

use papersense_core::{
    DocumentBackend, ExtractionStats, PageSource, ParsedDocument, ParsedMention, ReferenceEntry,
    ReferenceRow,
};

use crate::citations;
use crate::matcher::{ReferenceIndex, SubstringMatch, SurnameMatch};
use crate::outline::{self, Outline};
use crate::profile::JournalProfile;
use crate::references;
use crate::tokenizer::{self, Tokens};
use crate::ParsingError;

/// The per-document pipeline for one journal profile.
///
/// Holds a [`JournalProfile`] and exposes each pipeline step as a method.
/// A parser holds no per-document state, so one instance can be shared
/// across threads and reused for any number of documents.
#[derive(Debug)]
pub struct DocumentParser {
    profile: JournalProfile,
    surnames: Box<dyn SurnameMatch>,
}

impl DocumentParser {
    /// Create a parser that matches surnames by substring containment.
    pub fn new(profile: JournalProfile) -> Self {
        Self {
            profile,
            surnames: Box::new(SubstringMatch),
        }
    }

    /// Replace the surname predicate used when matching mentions.
    pub fn with_surname_match(mut self, surnames: Box<dyn SurnameMatch>) -> Self {
        self.surnames = surnames;
        self
    }

    pub fn profile(&self) -> &JournalProfile {
        &self.profile
    }

    fn journal(&self) -> &str {
        &self.profile.id
    }

    /// Read pages and merge fragments into runs (step 1).
    pub fn tokenize(&self, source: &dyn PageSource) -> Result<Tokens, ParsingError> {
        tokenizer::tokenize(source, &self.profile.layout).map_err(|source| ParsingError::Backend {
            journal: self.journal().to_string(),
            source,
        })
    }

    /// Recover the section table (step 2).
    pub fn outline(&self, tokens: &Tokens) -> Result<Outline, ParsingError> {
        outline::build_outline(tokens, &self.profile)
    }

    /// Split the bibliography text into entries (step 3).
    pub fn split_references(&self, block: &str) -> Result<Vec<ReferenceEntry>, ParsingError> {
        references::split_references(block, &self.profile.references, self.journal())
    }

    /// Extract mentions from every non-bibliography section and match them
    /// against `entries` (step 4).
    pub fn index_citations(
        &self,
        outline: &Outline,
        entries: &[ReferenceEntry],
        stats: &mut ExtractionStats,
    ) -> Vec<ReferenceRow> {
        let mut index =
            ReferenceIndex::new(entries, self.profile.citations.year_match, self.surnames.as_ref());
        for row in outline.body() {
            let mentions =
                citations::extract_mentions(&row.text, &row.heading, &self.profile.citations);
            for parsed in mentions {
                match parsed {
                    ParsedMention::Mention(mention) => {
                        stats.mentions += 1;
                        index.record(&mention);
                    }
                    ParsedMention::Skip(reason) => {
                        stats.citation_skips += 1;
                        tracing::trace!(
                            reason = reason.as_str(),
                            section = %row.heading,
                            "skipped citation"
                        );
                    }
                }
            }
        }
        stats.unmatched_mentions = index.unmatched();
        index.into_rows()
    }

    /// Run the full pipeline on an open document.
    pub fn parse(&self, source: &dyn PageSource) -> Result<ParsedDocument, ParsingError> {
        let tokens = self.tokenize(source)?;
        if tokens.is_empty() {
            tracing::warn!(journal = self.journal(), "document produced no text fragments");
            return Ok(ParsedDocument::empty(self.journal()));
        }

        let outline = self.outline(&tokens)?;
        let entries = self.split_references(&outline.bibliography().text)?;

        let mut stats = ExtractionStats {
            total_runs: tokens.runs.len(),
            total_sections: outline.sections.len(),
            total_entries: entries.len(),
            ..Default::default()
        };
        let references = self.index_citations(&outline, &entries, &mut stats);

        tracing::debug!(
            journal = self.journal(),
            sections = stats.total_sections,
            entries = stats.total_entries,
            mentions = stats.mentions,
            skipped = stats.citation_skips,
            unmatched = stats.unmatched_mentions,
            cited = references.len(),
            "parsed document"
        );

        Ok(ParsedDocument {
            journal: self.journal().to_string(),
            sections: outline.sections,
            references,
            stats,
        })
    }

    /// Open `path` with `backend` and run the full pipeline.
    pub fn parse_path(
        &self,
        path: &Path,
        backend: &dyn DocumentBackend,
    ) -> Result<ParsedDocument, ParsingError> {
        let source = backend.open(path).map_err(|source| ParsingError::Backend {
            journal: self.journal().to_string(),
            source,
        })?;
        self.parse(source.as_ref())
    }
}
