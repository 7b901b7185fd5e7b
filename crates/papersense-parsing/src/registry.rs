//! Built-in journal profiles.
//!
//! Each journal is typeset from a fixed template, so the fonts, crop
//! margins, heading keywords and citation grammar are constants. Profiles
//! are compiled once and cloned out on request.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::journal::Journal;
use crate::profile::{
    BibliographyLocator, CleaningRules, FlatConfig, HeaderDetection, HeaderKey, JournalProfile,
    JournalProfileBuilder, KeywordMatch, KeywordRule, KeywordsRow, NestedConfig, SliceRule,
    StartAdjust, YearMatch,
};

/// APA 7 entry start: one or more "Surname, I. I.," author blocks, then a
/// parenthesized year.
const APA_ENTRY_START: &str = r"(?:[\p{L}][\p{L}\s]+,(?:(?:\s|-)[A-Z]\.){1,3}(?:,(?: \. \. \.)?\s(?:&\s?)?)?)+ \(\d{4}[a-z]?\)";

/// Academy-of-Management style entry start: "Surname, I. ... I. 1999."
const AOM_ENTRY_START: &str = r"[A-Z][a-z]+, [A-Z]*[A-Za-z,\-’&.ˇ ]*[A-Z]{1,3}\.\s\d{4}\.";

/// INFORMS style entry start: "Surname IJ, ... (1999)".
const INFORMS_ENTRY_START: &str = r"\p{Lu}[\p{L}'’\-]+ [A-Z]{1,3}[,\s][^()]{0,250}?\(\d{4}[a-z]?\)";

const AND_AMPERSAND: &str = r"\S+ & \S+ \(\d{3,4}[a-z]?\)";
const AND_WORD: &str = r"\S+ and \S+ \(\d{3,4}[a-z]?\)";
const ONE_AUTHOR: &str = r"[A-Z]\S+ \(\d{3,4}[a-z]?\)";
const ET_AL: &str = r"[A-Z][a-z]+ et al\. \(\d{3,4}[a-z]?\)";

static PROFILES: Lazy<BTreeMap<Journal, JournalProfile>> = Lazy::new(|| {
    Journal::ALL
        .into_iter()
        .map(|journal| {
            let profile = builder(journal)
                .build()
                .unwrap_or_else(|e| panic!("built-in profile {journal} is invalid: {e}"));
            (journal, profile)
        })
        .collect()
});

fn builder(journal: Journal) -> JournalProfileBuilder {
    let base = JournalProfileBuilder::new(journal.id()).display_name(journal.display_name());
    match journal {
        Journal::OrgSci => base
            .crop(40.0, 60.0, 40.0, 40.0)
            .rounding_decimals(1)
            .nested(NestedConfig {
                override_keywords: keywords(&[
                    "Acknowledgements",
                    "References",
                    "Appendix",
                    "Endnotes",
                ]),
                anchor_depth: 2,
                slice: SliceRule::LastChildChildren { depth: 2 },
                fold_after: Some("Abstract.".to_string()),
                oversized_threshold: Some(225),
                start_at: Some("Abstract.".to_string()),
                keywords_row: Some(KeywordsRow {
                    marker: "Keywords".to_string(),
                    separator: "•".to_string(),
                }),
                ..Default::default()
            })
            .bibliography(BibliographyLocator::LastSection)
            .entry_start_regex(INFORMS_ENTRY_START)
            .add_citation_pattern(r"\([\w\s.,;&’'\-]+\s\d{3,4}[a-z]?\s?\)")
            .add_citation_pattern(ET_AL)
            .add_citation_pattern(AND_WORD)
            .add_citation_pattern(ONE_AUTHOR)
            .cleaning(CleaningRules {
                split_on_commas: true,
                ..Default::default()
            })
            .year_match(YearMatch::Parenthesized),

        Journal::AnnRev => base
            .crop(20.0, 20.0, 20.0, 30.0)
            .skip_last_pages(2)
            .rounding_decimals(2)
            .nested(NestedConfig {
                override_keywords: keywords(&["Abstract", "Keywords", "LITERATURE CITED"]),
                anchor_depth: 2,
                slice: SliceRule::MergeLastTwo,
                start_at: Some("Keywords".to_string()),
                ..Default::default()
            })
            .bibliography(BibliographyLocator::Heading("LITERATURE CITED".to_string()))
            .entry_start_regex(r"[A-Z][A-Za-z, ]+[A-Z]{1,3}\. \d{4}\.")
            .add_citation_pattern(r"\([&\w\s., ]+\s\d{3,4}[a-z]?\)")
            .add_citation_pattern(AND_AMPERSAND)
            .add_citation_pattern(ET_AL)
            .add_citation_pattern(ONE_AUTHOR)
            .cleaning(CleaningRules {
                split_on_commas: true,
                ..Default::default()
            }),

        Journal::Aom => base
            .rounding_decimals(2)
            .flat(FlatConfig {
                headers: HeaderDetection::Keys {
                    candidates: vec![vec![HeaderKey::size(9.96)], vec![HeaderKey::size(10.0)]],
                    skip_first: 1,
                },
                abstract_from_first_page: true,
                ..Default::default()
            })
            .bibliography(BibliographyLocator::Heading("REFERENCES".to_string()))
            .entry_start_regex(AOM_ENTRY_START)
            .add_citation_pattern(r"\([&\w\s.,\-; ]+\s\d{3,4}[a-z]?\)")
            .add_citation_pattern(AND_AMPERSAND)
            .add_citation_pattern(ET_AL)
            .add_citation_pattern(ONE_AUTHOR),

        Journal::Asq => base
            .rounding_decimals(2)
            .flat(FlatConfig {
                headers: HeaderDetection::Keys {
                    candidates: vec![vec![
                        HeaderKey::font("AdvPSA35F", 10.0),
                        HeaderKey::font("AdvP2A83", 10.0),
                    ]],
                    skip_first: 0,
                },
                initial_header: "Other".to_string(),
                skip_first_run: true,
                keyword_rule: KeywordRule::SplitIntoIntroduction,
                ..Default::default()
            })
            .bibliography(BibliographyLocator::Heading("REFERENCES".to_string()))
            .entry_start_regex(r"[A-Z][A-Za-z,\-’.ˇ() ]+ \d{4} ")
            .start_adjust(StartAdjust::AfterSentenceEnd)
            .add_citation_pattern(r"\([&\w\s.,\-; ]+\s\d{3,4}[a-z]?\)")
            .add_citation_pattern(AND_WORD)
            .add_citation_pattern(ET_AL)
            .add_citation_pattern(ONE_AUTHOR),

        Journal::Jom => base
            .rounding_decimals(2)
            .flat(FlatConfig {
                headers: HeaderDetection::SizeRank { ranks: vec![1, 2] },
                keyword_rule: KeywordRule::SplitIntoAbstract,
                abstract_before_acknowledgments: true,
                ..Default::default()
            })
            .bibliography(BibliographyLocator::Heading("References".to_string()))
            .entry_start_regex(AOM_ENTRY_START)
            .add_citation_pattern(r"\([&\w\p{L}\.\s,\-; ]+\s\d{3,4}[a-z]?(?::\s\d{1,4})?\)")
            .add_citation_pattern(AND_WORD)
            .add_citation_pattern(ET_AL)
            .add_citation_pattern(ONE_AUTHOR),

        Journal::Joap => base
            .rounding_decimals(2)
            .flat(FlatConfig {
                headers: HeaderDetection::Keys {
                    candidates: vec![vec![HeaderKey::font("Times-Bold", 10.0)]],
                    skip_first: 0,
                },
                keyword_rule: KeywordRule::RunThenAbstract,
                ..Default::default()
            })
            .bibliography(BibliographyLocator::Heading("References".to_string()))
            .entry_start_regex(APA_ENTRY_START)
            .add_citation_pattern(r"\([&\w\s.,\-; ]+\s\d{3,4}[a-z]?\s?\)")
            .add_citation_pattern(AND_WORD)
            .add_citation_pattern(ET_AL)
            .add_citation_pattern(ONE_AUTHOR)
            .cleaning(apa_cleaning()),

        Journal::Personnel => base
            .rounding_decimals(1)
            .nested(NestedConfig {
                override_keywords: keywords(&[
                    "acknowledgements",
                    "references",
                    "appendix",
                    "endnotes",
                ]),
                keyword_match: KeywordMatch::CaseInsensitive,
                anchor_depth: 2,
                slice: SliceRule::LastChildChildren { depth: 2 },
                drop_leading: 1,
                end_at_bibliography: true,
                ..Default::default()
            })
            .bibliography(BibliographyLocator::Heading("REFERENCES".to_string()))
            .entry_start_regex(APA_ENTRY_START)
            .add_citation_pattern(r"\([&\w\s.,\-; ]+\s\d{3,4}[a-z]?\s?\)")
            .add_citation_pattern(AND_WORD)
            .add_citation_pattern(ET_AL)
            .add_citation_pattern(ONE_AUTHOR)
            .cleaning(apa_cleaning())
            .year_match(YearMatch::Parenthesized),
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn apa_cleaning() -> CleaningRules {
    CleaningRules {
        year_paren_to_comma: true,
        strip_hyphen_space: true,
        ..Default::default()
    }
}

/// The built-in profile for `journal`.
pub fn profile(journal: Journal) -> JournalProfile {
    PROFILES[&journal].clone()
}

/// Every built-in profile, in catalogue order.
pub fn all() -> impl Iterator<Item = &'static JournalProfile> {
    PROFILES.values()
}
