use regex::Regex;

use papersense_core::config_file::JournalTunables;

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Phrases that introduce a citation without being part of an author name.
/// Longer phrases come first so "see also" wins over "see".
pub const DEFAULT_LEAD_INS: &[&str] = &[
    "for an exception see",
    "for a review see",
    "quoted in",
    "see also",
    "see",
    "e.g.,",
    "e.g.",
    "i.e.,",
    "i.e.",
    "cf.",
];

/// Page-margin insets in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Insets {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// How pages are read before any structure is recovered.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Margins cut from every page. `None` reads the whole page.
    pub crop: Option<Insets>,
    pub skip_first_pages: usize,
    pub skip_last_pages: usize,
    /// Decimal places font sizes are rounded to before comparison.
    pub rounding_decimals: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            crop: None,
            skip_first_pages: 0,
            skip_last_pages: 0,
            rounding_decimals: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordMatch {
    #[default]
    Exact,
    CaseInsensitive,
}

/// Which nodes of the section tree become rows of the section table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceRule {
    /// Children of the root.
    RootChildren,
    /// Follow the last child `depth` times from the root and take the
    /// children of the node reached.
    LastChildChildren { depth: usize },
    /// Children of the last two children of the root's last child, in order.
    /// Falls back to the last one alone when there is only one.
    MergeLastTwo,
}

/// Split a "Keywords" row out of the first row of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordsRow {
    pub marker: String,
    pub separator: String,
}

/// Settings for the size-hierarchy section builder.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedConfig {
    /// Headings that always open a new section under the override anchor.
    pub override_keywords: Vec<String>,
    pub keyword_match: KeywordMatch,
    /// How many last-child steps from the root locate the override anchor.
    pub anchor_depth: usize,
    pub slice: SliceRule,
    /// Fold the section following this heading into it.
    pub fold_after: Option<String>,
    /// Sections whose text exceeds this many characters are refolded into
    /// a synthetic "Introduction".
    pub oversized_threshold: Option<usize>,
    /// Drop every section before the one with this heading.
    pub start_at: Option<String>,
    /// Drop this many sections from the front after `start_at`.
    pub drop_leading: usize,
    /// Drop every section after the bibliography.
    pub end_at_bibliography: bool,
    pub keywords_row: Option<KeywordsRow>,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            override_keywords: Vec::new(),
            keyword_match: KeywordMatch::Exact,
            anchor_depth: 0,
            slice: SliceRule::RootChildren,
            fold_after: None,
            oversized_threshold: None,
            start_at: None,
            drop_leading: 0,
            end_at_bibliography: false,
            keywords_row: None,
        }
    }
}

/// A font key headers are recognised by. `family: None` matches any family.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderKey {
    pub family: Option<String>,
    pub size: f32,
}

impl HeaderKey {
    pub fn size(size: f32) -> Self {
        Self { family: None, size }
    }

    pub fn font(family: &str, size: f32) -> Self {
        Self {
            family: Some(family.to_string()),
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeaderDetection {
    /// Try each candidate set in order; the first set matching any run wins.
    /// Runs matching keys within one set are unioned. The first `skip_first`
    /// header texts are discarded.
    Keys {
        candidates: Vec<Vec<HeaderKey>>,
        skip_first: usize,
    },
    /// Distinct font sizes ranked largest first; runs at the given ranks
    /// (0 = largest) are headers.
    SizeRank { ranks: Vec<usize> },
}

/// Journal-specific handling of the run after a "Keywords" header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordRule {
    #[default]
    None,
    /// Split the run at its first uppercase letter: the head stays with the
    /// keywords, the rest opens "Introduction".
    SplitIntoIntroduction,
    /// Split the run at its first uppercase letter into "Keywords" and
    /// "Abstract", then continue in the initial header.
    SplitIntoAbstract,
    /// The whole run is keywords; continue in "Abstract".
    RunThenAbstract,
}

/// Settings for the single-level header builder.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatConfig {
    pub headers: HeaderDetection,
    /// Heading text is accumulated under before any header appears.
    pub initial_header: String,
    pub skip_first_run: bool,
    /// Take the abstract from the first-page font one step smaller than the
    /// header size.
    pub abstract_from_first_page: bool,
    pub keyword_rule: KeywordRule,
    /// A run starting with "Acknowledgments" marks the run before it as
    /// the abstract.
    pub abstract_before_acknowledgments: bool,
}

impl Default for FlatConfig {
    fn default() -> Self {
        Self {
            headers: HeaderDetection::SizeRank { ranks: vec![1] },
            initial_header: "Intro".to_string(),
            skip_first_run: false,
            abstract_from_first_page: false,
            keyword_rule: KeywordRule::None,
            abstract_before_acknowledgments: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuilderKind {
    Nested(NestedConfig),
    Flat(FlatConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BibliographyLocator {
    /// The last row of the section table.
    LastSection,
    /// The row with this (trimmed) heading.
    Heading(String),
}

impl BibliographyLocator {
    pub fn describe(&self) -> String {
        match self {
            BibliographyLocator::LastSection => "last section".to_string(),
            BibliographyLocator::Heading(h) => h.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartAdjust {
    #[default]
    None,
    /// Move an entry start past the first sentence end (a period after a
    /// lowercase letter, outside parentheses) inside the match.
    AfterSentenceEnd,
}

#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub locator: BibliographyLocator,
    pub entry_start: Regex,
    pub start_adjust: StartAdjust,
}

/// How a mention's year must appear in a bibliography entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearMatch {
    #[default]
    Bare,
    /// The entry must contain `(year)`.
    Parenthesized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleaningRules {
    /// Rewrite " and " to " & " before decomposition.
    pub and_to_ampersand: bool,
    /// Rewrite a narrative ` (1999)` to `, 1999`.
    pub year_paren_to_comma: bool,
    /// Remove "- " left over from hyphenated line breaks.
    pub strip_hyphen_space: bool,
    /// Remove possessive "’s".
    pub strip_possessive: bool,
    /// Split items on commas as well as semicolons, keeping only the
    /// pieces that contain a digit. For styles without a comma between
    /// author and year.
    pub split_on_commas: bool,
    pub lead_ins: Vec<String>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            and_to_ampersand: true,
            year_paren_to_comma: false,
            strip_hyphen_space: false,
            strip_possessive: true,
            split_on_commas: false,
            lead_ins: DEFAULT_LEAD_INS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CitationConfig {
    /// Alternation of the journal's in-text citation forms.
    pub pattern: Regex,
    pub cleaning: CleaningRules,
    pub year_match: YearMatch,
}

/// Everything that varies between journals.
#[derive(Debug, Clone)]
pub struct JournalProfile {
    pub id: String,
    pub display_name: String,
    pub layout: LayoutConfig,
    pub builder: BuilderKind,
    pub references: ReferenceConfig,
    pub citations: CitationConfig,
}

impl JournalProfile {
    /// Apply config-file tunables on top of this profile.
    pub fn apply(&mut self, overrides: &ProfileOverrides) {
        overrides.apply(self);
    }
}

/// User-tunable profile settings, usually read from the config file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileOverrides {
    pub oversized_fragment_threshold: Option<usize>,
    pub crop: Option<Insets>,
    pub skip_first_pages: Option<usize>,
    pub skip_last_pages: Option<usize>,
    pub rounding_decimals: Option<u32>,
}

impl ProfileOverrides {
    pub fn is_empty(&self) -> bool {
        *self == ProfileOverrides::default()
    }

    pub fn apply(&self, profile: &mut JournalProfile) {
        if let Some(crop) = self.crop {
            profile.layout.crop = Some(crop);
        }
        if let Some(n) = self.skip_first_pages {
            profile.layout.skip_first_pages = n;
        }
        if let Some(n) = self.skip_last_pages {
            profile.layout.skip_last_pages = n;
        }
        if let Some(d) = self.rounding_decimals {
            profile.layout.rounding_decimals = d;
        }
        if let Some(threshold) = self.oversized_fragment_threshold {
            match &mut profile.builder {
                BuilderKind::Nested(nested) => nested.oversized_threshold = Some(threshold),
                BuilderKind::Flat(_) => tracing::warn!(
                    journal = %profile.id,
                    "oversized_fragment_threshold has no effect on a flat profile"
                ),
            }
        }
    }
}

impl From<&JournalTunables> for ProfileOverrides {
    fn from(tunables: &JournalTunables) -> Self {
        Self {
            oversized_fragment_threshold: tunables.oversized_fragment_threshold,
            crop: tunables
                .crop
                .map(|[left, top, right, bottom]| Insets::new(left, top, right, bottom)),
            skip_first_pages: tunables.skip_first_pages,
            skip_last_pages: tunables.skip_last_pages,
            rounding_decimals: tunables.rounding_decimals,
        }
    }
}

/// Builder for [`JournalProfile`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone)]
pub struct JournalProfileBuilder {
    id: String,
    display_name: Option<String>,
    layout: LayoutConfig,
    builder: BuilderKind,
    locator: BibliographyLocator,
    entry_start: Option<String>,
    start_adjust: StartAdjust,
    citation_patterns: Vec<String>,
    cleaning: CleaningRules,
    lead_ins: ListOverride<String>,
    year_match: YearMatch,
}

impl JournalProfileBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: None,
            layout: LayoutConfig::default(),
            builder: BuilderKind::Nested(NestedConfig::default()),
            locator: BibliographyLocator::Heading("References".to_string()),
            entry_start: None,
            start_adjust: StartAdjust::None,
            citation_patterns: Vec::new(),
            cleaning: CleaningRules::default(),
            lead_ins: ListOverride::Default,
            year_match: YearMatch::Bare,
        }
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    // ── Layout ──

    pub fn crop(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.layout.crop = Some(Insets::new(left, top, right, bottom));
        self
    }

    pub fn skip_first_pages(mut self, n: usize) -> Self {
        self.layout.skip_first_pages = n;
        self
    }

    pub fn skip_last_pages(mut self, n: usize) -> Self {
        self.layout.skip_last_pages = n;
        self
    }

    pub fn rounding_decimals(mut self, decimals: u32) -> Self {
        self.layout.rounding_decimals = decimals;
        self
    }

    // ── Section builder ──

    pub fn nested(mut self, config: NestedConfig) -> Self {
        self.builder = BuilderKind::Nested(config);
        self
    }

    pub fn flat(mut self, config: FlatConfig) -> Self {
        self.builder = BuilderKind::Flat(config);
        self
    }

    // ── Bibliography ──

    pub fn bibliography(mut self, locator: BibliographyLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn entry_start_regex(mut self, pattern: &str) -> Self {
        self.entry_start = Some(pattern.to_string());
        self
    }

    pub fn start_adjust(mut self, adjust: StartAdjust) -> Self {
        self.start_adjust = adjust;
        self
    }

    // ── Citations ──

    pub fn add_citation_pattern(mut self, pattern: &str) -> Self {
        self.citation_patterns.push(pattern.to_string());
        self
    }

    pub fn cleaning(mut self, rules: CleaningRules) -> Self {
        self.cleaning = rules;
        self
    }

    pub fn set_lead_ins(mut self, lead_ins: Vec<String>) -> Self {
        self.lead_ins = ListOverride::Replace(lead_ins);
        self
    }

    pub fn add_lead_in(mut self, lead_in: String) -> Self {
        match &mut self.lead_ins {
            ListOverride::Extend(v) => v.push(lead_in),
            _ => self.lead_ins = ListOverride::Extend(vec![lead_in]),
        }
        self
    }

    pub fn year_match(mut self, year_match: YearMatch) -> Self {
        self.year_match = year_match;
        self
    }

    /// Compile all string patterns into regexes and produce a [`JournalProfile`].
    ///
    /// Citation patterns are joined into a single alternation, tried in the
    /// order they were added.
    pub fn build(self) -> Result<JournalProfile, regex::Error> {
        let entry_start = match &self.entry_start {
            Some(p) => Regex::new(p)?,
            None => Regex::new(r"\p{Lu}[\p{L}'’\-]+,(?:\s\p{Lu}\.)+")?,
        };

        let pattern = if self.citation_patterns.is_empty() {
            Regex::new(r"\([\w&.\s,\-;’']+\s\d{4}[a-z]?\)")?
        } else {
            for p in &self.citation_patterns {
                Regex::new(p)?;
            }
            let joined: Vec<String> = self
                .citation_patterns
                .iter()
                .map(|p| format!("(?:{p})"))
                .collect();
            Regex::new(&joined.join("|"))?
        };

        let mut cleaning = self.cleaning;
        cleaning.lead_ins = self.lead_ins.resolve(&cleaning.lead_ins);

        Ok(JournalProfile {
            display_name: self.display_name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            layout: self.layout,
            builder: self.builder,
            references: ReferenceConfig {
                locator: self.locator,
                entry_start,
                start_adjust: self.start_adjust,
            },
            citations: CitationConfig {
                pattern,
                cleaning,
                year_match: self.year_match,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let profile = JournalProfileBuilder::new("test").build().unwrap();
        assert_eq!(profile.id, "test");
        assert_eq!(profile.display_name, "test");
        assert_eq!(profile.layout, LayoutConfig::default());
        assert_eq!(
            profile.references.locator,
            BibliographyLocator::Heading("References".into())
        );
        assert!(profile.citations.pattern.is_match("(Smith, 1999)"));
    }

    #[test]
    fn builder_rejects_invalid_regex() {
        let result = JournalProfileBuilder::new("bad")
            .entry_start_regex(r"[unclosed")
            .build();
        assert!(result.is_err());

        let result = JournalProfileBuilder::new("bad")
            .add_citation_pattern(r"\(ok\)")
            .add_citation_pattern(r"(unclosed")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn citation_patterns_join_as_alternation() {
        let profile = JournalProfileBuilder::new("test")
            .add_citation_pattern(r"\(\d{4}\)")
            .add_citation_pattern(r"\[\d+\]")
            .build()
            .unwrap();
        let found: Vec<&str> = profile
            .citations
            .pattern
            .find_iter("see (1999) and [12]")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["(1999)", "[12]"]);
    }

    #[test]
    fn lead_in_overrides_resolve_against_defaults() {
        let extended = JournalProfileBuilder::new("test")
            .add_lead_in("compare".into())
            .build()
            .unwrap();
        assert!(extended.citations.cleaning.lead_ins.contains(&"see".to_string()));
        assert!(extended.citations.cleaning.lead_ins.contains(&"compare".to_string()));

        let replaced = JournalProfileBuilder::new("test")
            .set_lead_ins(vec!["only".into()])
            .build()
            .unwrap();
        assert_eq!(replaced.citations.cleaning.lead_ins, vec!["only".to_string()]);
    }

    #[test]
    fn overrides_apply_layout_and_threshold() {
        let mut profile = JournalProfileBuilder::new("test").build().unwrap();
        let overrides = ProfileOverrides::from(&JournalTunables {
            oversized_fragment_threshold: Some(100),
            crop: Some([10.0, 20.0, 30.0, 40.0]),
            skip_last_pages: Some(2),
            ..Default::default()
        });
        assert!(!overrides.is_empty());
        profile.apply(&overrides);
        assert_eq!(profile.layout.crop, Some(Insets::new(10.0, 20.0, 30.0, 40.0)));
        assert_eq!(profile.layout.skip_last_pages, 2);
        assert_eq!(profile.layout.skip_first_pages, 0);
        match &profile.builder {
            BuilderKind::Nested(n) => assert_eq!(n.oversized_threshold, Some(100)),
            BuilderKind::Flat(_) => panic!("expected nested builder"),
        }
    }

    #[test]
    fn list_override_resolve() {
        let defaults = vec![1, 2];
        assert_eq!(ListOverride::Default.resolve(&defaults), vec![1, 2]);
        assert_eq!(ListOverride::Replace(vec![3]).resolve(&defaults), vec![3]);
        assert_eq!(ListOverride::Extend(vec![3]).resolve(&defaults), vec![1, 2, 3]);
    }
}
