use std::path::Path;

use thiserror::Error;

pub mod citations;
pub mod extractor;
pub mod flat;
pub mod journal;
pub mod matcher;
pub mod nested;
pub mod outline;
pub mod profile;
pub mod references;
pub mod registry;
pub mod section;
pub mod tokenizer;

pub use extractor::DocumentParser;
pub use journal::{Journal, UnknownJournal};
pub use matcher::{ReferenceIndex, SubstringMatch, SurnameMatch, WholeWordMatch};
pub use outline::{Outline, SectionTable};
pub use profile::{
    JournalProfile, JournalProfileBuilder, ListOverride, ProfileOverrides, YearMatch,
};
pub use tokenizer::{Tokens, tokenize};
// Re-export domain types from core (canonical definitions live there)
pub use papersense_core::{
    BackendError, CitationMention, DocumentBackend, ExtractionStats, PageSource, ParsedDocument,
    ReferenceEntry, ReferenceRow, SectionRow, TextRun,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("[{journal}] no headers detected: {detail}")]
    HeaderDetectionFailed { journal: String, detail: String },
    #[error("[{journal}] required section not found: {section}")]
    SectionNotFound { journal: String, section: String },
    #[error("[{journal}] no bibliography entries matched the reference pattern")]
    ReferenceEntryPatternNoMatch { journal: String },
    #[error("[{journal}] backend error: {source}")]
    Backend {
        journal: String,
        #[source]
        source: BackendError,
    },
}

impl ParsingError {
    /// Journal profile that was in use when the error occurred.
    pub fn journal(&self) -> &str {
        match self {
            ParsingError::HeaderDetectionFailed { journal, .. }
            | ParsingError::SectionNotFound { journal, .. }
            | ParsingError::ReferenceEntryPatternNoMatch { journal }
            | ParsingError::Backend { journal, .. } => journal,
        }
    }

    /// True when the failure most likely means the document was set in a
    /// different journal's template than the one selected.
    pub fn is_profile_mismatch(&self) -> bool {
        !matches!(self, ParsingError::Backend { .. })
    }
}

/// Parse a PDF file with the built-in profile for `journal`, reading pages
/// through `backend`.
///
/// Pipeline:
/// 1. Read and crop page fragments, merge them into runs
/// 2. Recover the section table
/// 3. Split the bibliography into entries
/// 4. Extract citations from every other section and index them
pub fn parse_document(
    path: &Path,
    journal: Journal,
    backend: &dyn DocumentBackend,
) -> Result<ParsedDocument, ParsingError> {
    DocumentParser::new(registry::profile(journal)).parse_path(path, backend)
}
