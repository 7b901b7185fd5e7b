//! In-text citation extraction.
//!
//! A journal's citation pattern finds raw citations ("(Smith, 1999; Lee &
//! Park, 2020)", "Smith et al. (1999)"). Each raw citation is cleaned,
//! split into items, and every item is decomposed into surnames and a year.

use once_cell::sync::Lazy;
use regex::Regex;

use papersense_core::{CitationMention, ParsedMention, SkipReason};

use crate::profile::{CitationConfig, CleaningRules};

static NARRATIVE_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s\((\d{4}[a-z]?)\)").unwrap());

/// Trailing page locators: "1999: 45", "1999: 45–47", "1999, p. 12".
static PAGE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?::\s*(?:pp?\.\s*)?|,\s*pp?\.\s*)\d+(?:\s*[-–]\s*\d+)?\s*$").unwrap()
});

static YEAR_AT_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s,])\(?(\d{4}[a-z]?)\)?\s*$").unwrap());

const NOISE_WORDS: &[&str] = &["See", "Also", "Cf", "In", "Quoted", "Eds", "And"];

/// Raw citation strings in `text`, in order of appearance.
pub fn find_citations<'a>(text: &'a str, config: &CitationConfig) -> Vec<&'a str> {
    config.pattern.find_iter(text).map(|m| m.as_str()).collect()
}

fn strip_lead_ins<'a>(mut item: &'a str, lead_ins: &[String]) -> &'a str {
    loop {
        item = item.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        let found = lead_ins.iter().find(|lead| {
            let Some(prefix) = item.get(..lead.len()) else {
                return false;
            };
            let rest = &item[lead.len()..];
            prefix.eq_ignore_ascii_case(lead)
                && (rest.is_empty()
                    || rest.starts_with(char::is_whitespace)
                    || lead.ends_with(['.', ',']))
        });
        match found {
            Some(lead) => item = &item[lead.len()..],
            None => return item.trim(),
        }
    }
}

/// Normalize one raw citation and split it into items, one per cited work.
pub fn clean_citation(raw: &str, rules: &CleaningRules) -> Vec<String> {
    let mut text = raw.trim().to_string();

    if rules.year_paren_to_comma {
        text = NARRATIVE_YEAR_RE.replace_all(&text, ", $1").into_owned();
    }

    if let Some(inner) = text.strip_prefix('(') {
        let inner = inner.trim_end();
        text = inner.strip_suffix(')').unwrap_or(inner).trim().to_string();
    }

    if rules.strip_hyphen_space {
        text = text.replace("- ", "");
    }
    if rules.strip_possessive {
        text = text.replace("’s", "").replace("'s", "");
    }
    if rules.and_to_ampersand {
        text = text.replace(" and ", " & ");
    }

    let mut items = Vec::new();
    for part in text.split(';') {
        if rules.split_on_commas {
            items.extend(
                part.split(',')
                    .filter(|piece| piece.chars().any(|c| c.is_ascii_digit()))
                    .map(|piece| strip_lead_ins(piece, &rules.lead_ins).to_string()),
            );
        } else {
            items.push(strip_lead_ins(part, &rules.lead_ins).to_string());
        }
    }
    items.retain(|i| !i.is_empty());
    items
}

fn surname_of(piece: &str) -> Option<String> {
    let token = piece.split_whitespace().last()?;
    let token = token
        .trim_matches(|c: char| !(c.is_alphanumeric() || c == '-' || c == '’' || c == '\''));
    let starts_upper = token.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper || NOISE_WORDS.contains(&token) {
        return None;
    }
    Some(token.to_string())
}

/// Decompose one citation item into surnames and a year.
///
/// The year is the trailing four-digit token (after dropping page
/// locators). Surnames are the last word of each comma- or
/// ampersand-separated author piece before it; with "et al." only the
/// pieces before it count.
pub fn decompose(item: &str, location: &str) -> ParsedMention {
    let item = PAGE_SUFFIX_RE.replace(item.trim(), "");
    let Some(caps) = YEAR_AT_END_RE.captures(&item) else {
        return ParsedMention::Skip(SkipReason::NoYear);
    };
    let (Some(whole), Some(year)) = (caps.get(0), caps.get(1)) else {
        return ParsedMention::Skip(SkipReason::NoYear);
    };

    let block = item[..whole.start()].trim().trim_end_matches([',', ' ']);
    let lead = match block.find("et al") {
        Some(i) => &block[..i],
        None => block,
    };
    let surnames: Vec<String> = lead.split([',', '&']).filter_map(surname_of).collect();

    if surnames.is_empty() {
        return ParsedMention::Skip(SkipReason::NoAuthor);
    }
    ParsedMention::Mention(CitationMention {
        surnames,
        year: year.as_str().to_string(),
        location: location.to_string(),
    })
}

/// Every mention (or skip) found in one section's text.
pub fn extract_mentions(text: &str, location: &str, config: &CitationConfig) -> Vec<ParsedMention> {
    let mut parsed = Vec::new();
    for raw in find_citations(text, config) {
        for item in clean_citation(raw, &config.cleaning) {
            let mention = decompose(&item, location);
            tracing::trace!(raw, item = %item, ?mention, "decomposed citation");
            parsed.push(mention);
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{DEFAULT_LEAD_INS, JournalProfileBuilder};

    fn mention(surnames: &[&str], year: &str) -> ParsedMention {
        ParsedMention::Mention(CitationMention {
            surnames: surnames.iter().map(|s| s.to_string()).collect(),
            year: year.to_string(),
            location: "Intro".to_string(),
        })
    }

    fn apa_rules() -> CleaningRules {
        CleaningRules::default()
    }

    fn decompose_all(raw: &str, rules: &CleaningRules) -> Vec<ParsedMention> {
        clean_citation(raw, rules)
            .iter()
            .map(|i| decompose(i, "Intro"))
            .collect()
    }

    #[test]
    fn single_author_parenthetical() {
        assert_eq!(
            decompose_all("(Smith, 1999)", &apa_rules()),
            vec![mention(&["Smith"], "1999")]
        );
    }

    #[test]
    fn two_authors_with_ampersand() {
        assert_eq!(
            decompose_all("(Lee & Park, 2020)", &apa_rules()),
            vec![mention(&["Lee", "Park"], "2020")]
        );
    }

    #[test]
    fn two_authors_with_and() {
        assert_eq!(
            decompose_all("Smith and Jones (1999)", &apa_rules()),
            vec![mention(&["Smith", "Jones"], "1999")]
        );
    }

    #[test]
    fn et_al_keeps_lead_author_only() {
        assert_eq!(
            decompose_all("Smith et al. (1999)", &apa_rules()),
            vec![mention(&["Smith"], "1999")]
        );
        assert_eq!(
            decompose_all("(Smith et al., 2003a)", &apa_rules()),
            vec![mention(&["Smith"], "2003a")]
        );
    }

    #[test]
    fn semicolon_separated_group_with_lead_ins() {
        assert_eq!(
            decompose_all(
                "(e.g., Smith, 1999; see also Jones, Lee, & Kim, 2004: 12)",
                &apa_rules()
            ),
            vec![
                mention(&["Smith"], "1999"),
                mention(&["Jones", "Lee", "Kim"], "2004"),
            ]
        );
    }

    #[test]
    fn comma_split_style_without_author_year_comma() {
        let rules = CleaningRules {
            split_on_commas: true,
            ..Default::default()
        };
        assert_eq!(
            decompose_all("(Smith 1999, Jones & Lee 2001; see also Park 2003)", &rules),
            vec![
                mention(&["Smith"], "1999"),
                mention(&["Jones", "Lee"], "2001"),
                mention(&["Park"], "2003"),
            ]
        );
    }

    #[test]
    fn narrative_year_rewritten_to_comma() {
        let rules = CleaningRules {
            year_paren_to_comma: true,
            ..Default::default()
        };
        assert_eq!(clean_citation("Smith and Jones (1999)", &rules), vec!["Smith & Jones, 1999"]);
    }

    #[test]
    fn possessive_and_hyphen_artifacts_removed() {
        let rules = CleaningRules {
            strip_hyphen_space: true,
            ..Default::default()
        };
        assert_eq!(
            decompose_all("Ander- son’s (2010)", &rules),
            vec![mention(&["Anderson"], "2010")]
        );
    }

    #[test]
    fn missing_year_and_missing_author_are_skips() {
        assert_eq!(
            decompose("Smith, in press", "Intro"),
            ParsedMention::Skip(SkipReason::NoYear)
        );
        assert_eq!(decompose("1999", "Intro"), ParsedMention::Skip(SkipReason::NoAuthor));
        assert_eq!(decompose("see 1999", "Intro"), ParsedMention::Skip(SkipReason::NoAuthor));
    }

    #[test]
    fn lead_ins_require_word_boundary() {
        let leads: Vec<String> = DEFAULT_LEAD_INS.iter().map(|s| s.to_string()).collect();
        assert_eq!(strip_lead_ins("Seers, 2001", &leads), "Seers, 2001");
        assert_eq!(strip_lead_ins("See Seers, 2001", &leads), "Seers, 2001");
        assert_eq!(strip_lead_ins("e.g., i.e., Smith", &leads), "Smith");
    }

    #[test]
    fn extraction_uses_profile_pattern() {
        let profile = JournalProfileBuilder::new("test")
            .add_citation_pattern(r"\([\w&.\s,\-;]+\s\d{4}[a-z]?\)")
            .add_citation_pattern(r"[A-Z][a-z]+ et al\. \(\d{4}[a-z]?\)")
            .build()
            .unwrap();
        let text = "Prior work (Smith, 1999; Lee & Park, 2020) and Kim et al. (2005) disagree.";
        let found = find_citations(text, &profile.citations);
        assert_eq!(
            found,
            vec!["(Smith, 1999; Lee & Park, 2020)", "Kim et al. (2005)"]
        );
        let mentions = extract_mentions(text, "Intro", &profile.citations);
        assert_eq!(
            mentions,
            vec![
                mention(&["Smith"], "1999"),
                mention(&["Lee", "Park"], "2020"),
                mention(&["Kim"], "2005"),
            ]
        );
    }
}
