//! Single-level header builder.
//!
//! Header texts are detected from font statistics first; the runs are then
//! walked once, switching the current heading whenever a run's text is a
//! header and appending everything else under the current heading.

use std::collections::HashSet;

use papersense_core::TextRun;

use crate::ParsingError;
use crate::outline::SectionTable;
use crate::profile::{FlatConfig, HeaderDetection, KeywordRule};
use crate::tokenizer::Tokens;

const ABSTRACT: &str = "Abstract";
const KEYWORDS: &str = "Keywords";
const INTRODUCTION: &str = "Introduction";
const ACKNOWLEDGMENTS: &str = "Acknowledgments";

/// Header texts in reading order, plus the font size that identified them
/// when detection was by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedHeaders {
    pub texts: Vec<String>,
    pub size: Option<f32>,
}

fn key_matches(run: &TextRun, family: Option<&str>, size: f32) -> bool {
    run.font_size == size && family.is_none_or(|f| f == run.font_family)
}

/// Find the header texts of a document.
pub fn detect_headers(tokens: &Tokens, detection: &HeaderDetection) -> DetectedHeaders {
    match detection {
        HeaderDetection::Keys {
            candidates,
            skip_first,
        } => {
            for set in candidates {
                let texts: Vec<String> = tokens
                    .runs
                    .iter()
                    .filter(|r| {
                        set.iter()
                            .any(|k| key_matches(r, k.family.as_deref(), k.size))
                    })
                    .map(|r| r.text.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                if !texts.is_empty() {
                    return DetectedHeaders {
                        texts: texts.into_iter().skip(*skip_first).collect(),
                        size: set.first().map(|k| k.size),
                    };
                }
            }
            DetectedHeaders::default()
        }
        HeaderDetection::SizeRank { ranks } => {
            let sizes = tokens.index.sizes_descending();
            let chosen: Vec<f32> = ranks.iter().filter_map(|&r| sizes.get(r).copied()).collect();
            let texts = tokens
                .runs
                .iter()
                .filter(|r| chosen.contains(&r.font_size))
                .map(|r| r.text.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            DetectedHeaders { texts, size: None }
        }
    }
}

/// Split at the first uppercase letter after the first character.
fn split_at_first_upper(text: &str) -> (&str, &str) {
    let idx = text
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    (text[..idx].trim(), text[idx..].trim())
}

/// Build the section table for a flat profile.
pub fn build_table(
    tokens: &Tokens,
    config: &FlatConfig,
    journal: &str,
) -> Result<SectionTable, ParsingError> {
    let headers = detect_headers(tokens, &config.headers);
    if headers.texts.is_empty() {
        return Err(ParsingError::HeaderDetectionFailed {
            journal: journal.to_string(),
            detail: "no runs matched the header fonts".to_string(),
        });
    }
    tracing::debug!(headers = headers.texts.len(), "detected headers");
    let header_set: HashSet<&str> = headers.texts.iter().map(String::as_str).collect();

    let mut table = SectionTable::default();

    if config.abstract_from_first_page {
        match headers
            .size
            .and_then(|size| tokens.first_page.first_text_below(size))
        {
            Some(text) => table.append(ABSTRACT, text.trim()),
            None => tracing::debug!("no first-page abstract font found"),
        }
    }

    let mut current = config.initial_header.clone();
    let mut prev: Option<&str> = None;

    for (i, run) in tokens.runs.iter().enumerate() {
        if config.skip_first_run && i == 0 {
            continue;
        }
        let text = run.text.trim();
        if text.is_empty() {
            continue;
        }

        if header_set.contains(text) {
            current = text.to_string();
            table.ensure(&current);
        } else if config.abstract_before_acknowledgments && text.starts_with(ACKNOWLEDGMENTS) {
            if let Some(p) = prev {
                table.append(ABSTRACT, p);
            }
            table.append(ACKNOWLEDGMENTS, text);
        } else {
            let after_keywords = prev.is_some_and(|p| p.starts_with(KEYWORDS));
            match config.keyword_rule {
                KeywordRule::SplitIntoIntroduction if current.starts_with("Keyword") => {
                    let (keywords, rest) = split_at_first_upper(text);
                    table.append(&current, keywords);
                    if !rest.is_empty() {
                        current = INTRODUCTION.to_string();
                        table.append(&current, rest);
                    }
                }
                KeywordRule::SplitIntoAbstract if after_keywords => {
                    let (keywords, rest) = split_at_first_upper(text);
                    table.append(KEYWORDS, keywords);
                    table.append(ABSTRACT, rest);
                    current = config.initial_header.clone();
                }
                KeywordRule::RunThenAbstract if after_keywords => {
                    table.append(KEYWORDS, text);
                    current = ABSTRACT.to_string();
                }
                _ => table.append(&current, text),
            }
        }
        prev = Some(text);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::HeaderKey;

    fn tokens(runs: &[(&str, &str, f32)]) -> Tokens {
        Tokens::new(
            runs.iter()
                .map(|(text, font, size)| TextRun {
                    text: text.to_string(),
                    font_family: font.to_string(),
                    font_size: *size,
                    page_index: 0,
                })
                .collect(),
        )
    }

    fn keys(family: Option<&str>, size: f32) -> HeaderDetection {
        HeaderDetection::Keys {
            candidates: vec![vec![HeaderKey {
                family: family.map(str::to_string),
                size,
            }]],
            skip_first: 0,
        }
    }

    fn config(headers: HeaderDetection) -> FlatConfig {
        FlatConfig {
            headers,
            ..Default::default()
        }
    }

    #[test]
    fn detection_by_key_falls_back_to_next_candidate() {
        let t = tokens(&[
            ("Title", "Bold", 14.0),
            ("METHOD", "Bold", 10.0),
            ("text", "Roman", 9.0),
        ]);
        let detection = HeaderDetection::Keys {
            candidates: vec![vec![HeaderKey::size(9.96)], vec![HeaderKey::size(10.0)]],
            skip_first: 0,
        };
        let found = detect_headers(&t, &detection);
        assert_eq!(found.texts, vec!["METHOD"]);
        assert_eq!(found.size, Some(10.0));
    }

    #[test]
    fn detection_by_key_skips_leading_headers() {
        let t = tokens(&[
            ("Author Name", "Bold", 10.0),
            ("x", "Roman", 9.0),
            ("METHOD", "Bold", 10.0),
        ]);
        let detection = HeaderDetection::Keys {
            candidates: vec![vec![HeaderKey::size(10.0)]],
            skip_first: 1,
        };
        assert_eq!(detect_headers(&t, &detection).texts, vec!["METHOD"]);
    }

    #[test]
    fn detection_by_rank_uses_distinct_sizes() {
        let t = tokens(&[
            ("Journal Title", "Bold", 16.0),
            ("Method", "Bold", 12.0),
            ("body", "Roman", 10.0),
            ("Sample", "Italic", 11.0),
            ("more", "Roman", 10.0),
        ]);
        let found = detect_headers(&t, &HeaderDetection::SizeRank { ranks: vec![1, 2] });
        assert_eq!(found.texts, vec!["Method", "Sample"]);
    }

    #[test]
    fn runs_accumulate_under_current_header() {
        let t = tokens(&[
            ("preamble", "Roman", 9.0),
            ("Method", "Bold", 10.0),
            ("first", "Roman", 9.0),
            ("second", "Italic", 9.0),
            ("REFERENCES", "Bold", 10.0),
            ("Smith, J. 1999. Title.", "Roman", 9.0),
        ]);
        let table = build_table(&t, &config(keys(Some("Bold"), 10.0)), "test").unwrap();
        let rows = table.into_rows();
        let headings: Vec<&str> = rows.iter().map(|r| r.heading.as_str()).collect();
        assert_eq!(headings, vec!["Intro", "Method", "REFERENCES"]);
        assert_eq!(rows[0].text, "preamble");
        assert_eq!(rows[1].text, "first second");
        assert_eq!(rows[2].text, "Smith, J. 1999. Title.");
    }

    #[test]
    fn no_headers_is_header_detection_failure() {
        let t = tokens(&[("only body", "Roman", 9.0)]);
        let err = build_table(&t, &config(keys(Some("Bold"), 10.0)), "joap").unwrap_err();
        assert!(matches!(
            err,
            ParsingError::HeaderDetectionFailed { ref journal, .. } if journal == "joap"
        ));
    }

    #[test]
    fn keyword_run_splits_into_introduction() {
        let t = tokens(&[
            ("Keywords:", "Bold", 10.0),
            ("trust, teams Organizations increasingly rely", "Roman", 9.0),
            ("on teams.", "Italic", 9.0),
        ]);
        let cfg = FlatConfig {
            keyword_rule: KeywordRule::SplitIntoIntroduction,
            ..config(keys(Some("Bold"), 10.0))
        };
        let table = build_table(&t, &cfg, "asq").unwrap();
        assert_eq!(table.text("Keywords:"), Some("trust, teams"));
        assert_eq!(
            table.text(INTRODUCTION),
            Some("Organizations increasingly rely on teams.")
        );
    }

    #[test]
    fn keyword_run_splits_into_abstract_then_returns_to_initial() {
        let t = tokens(&[
            ("Keywords", "Bold", 10.0),
            ("leadership; trust This article reviews", "Roman", 9.0),
            ("body text", "Italic", 9.0),
        ]);
        let cfg = FlatConfig {
            keyword_rule: KeywordRule::SplitIntoAbstract,
            ..config(keys(Some("Bold"), 10.0))
        };
        let table = build_table(&t, &cfg, "jom").unwrap();
        assert_eq!(table.text(KEYWORDS), Some("leadership; trust"));
        assert_eq!(table.text(ABSTRACT), Some("This article reviews"));
        assert_eq!(table.text("Intro"), Some("body text"));
    }

    #[test]
    fn keyword_run_then_abstract() {
        let t = tokens(&[
            ("Keywords", "Bold", 10.0),
            ("voice, silence", "Roman", 9.0),
            ("We examine voice.", "Italic", 9.0),
        ]);
        let cfg = FlatConfig {
            keyword_rule: KeywordRule::RunThenAbstract,
            ..config(keys(Some("Bold"), 10.0))
        };
        let table = build_table(&t, &cfg, "joap").unwrap();
        assert_eq!(table.text(KEYWORDS), Some("voice, silence"));
        assert_eq!(table.text(ABSTRACT), Some("We examine voice."));
    }

    #[test]
    fn acknowledgments_marks_previous_run_as_abstract() {
        let t = tokens(&[
            ("We study turnover.", "Roman", 9.0),
            ("Acknowledgments: thanks to reviewers.", "Italic", 8.0),
            ("Method", "Bold", 10.0),
        ]);
        let cfg = FlatConfig {
            abstract_before_acknowledgments: true,
            ..config(keys(Some("Bold"), 10.0))
        };
        let table = build_table(&t, &cfg, "jom").unwrap();
        assert_eq!(table.text(ABSTRACT), Some("We study turnover."));
        assert_eq!(
            table.text(ACKNOWLEDGMENTS),
            Some("Acknowledgments: thanks to reviewers.")
        );
    }

    #[test]
    fn first_page_abstract_uses_next_smaller_font() {
        let t = tokens(&[
            ("AUTHOR", "Bold", 9.96),
            ("We theorize that X.", "Roman", 9.5),
            ("Body starts", "Roman", 9.0),
            ("THEORY", "Bold", 9.96),
            ("theory text", "Roman", 9.0),
        ]);
        let cfg = FlatConfig {
            headers: HeaderDetection::Keys {
                candidates: vec![vec![HeaderKey::size(9.96)]],
                skip_first: 1,
            },
            abstract_from_first_page: true,
            ..Default::default()
        };
        let table = build_table(&t, &cfg, "aom").unwrap();
        assert_eq!(table.text(ABSTRACT), Some("We theorize that X."));
        assert_eq!(table.text("THEORY"), Some("theory text"));
    }

    #[test]
    fn split_at_first_upper_ignores_leading_capital() {
        assert_eq!(split_at_first_upper("Trust, teams Now"), ("Trust, teams", "Now"));
        assert_eq!(split_at_first_upper("all lowercase"), ("all lowercase", ""));
    }
}
