use papersense_core::SectionRow;

use crate::ParsingError;
use crate::profile::{BibliographyLocator, BuilderKind, JournalProfile, KeywordsRow};
use crate::tokenizer::Tokens;
use crate::{flat, nested};

/// Ordered heading → text table. Headings are unique; text appended to an
/// existing heading is joined with a space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionTable {
    rows: Vec<SectionRow>,
}

impl SectionTable {
    fn slot(&mut self, heading: &str) -> usize {
        match self.rows.iter().position(|r| r.heading == heading) {
            Some(i) => i,
            None => {
                self.rows.push(SectionRow {
                    heading: heading.to_string(),
                    text: String::new(),
                });
                self.rows.len() - 1
            }
        }
    }

    /// Make sure a row exists for `heading`.
    pub fn ensure(&mut self, heading: &str) {
        self.slot(heading);
    }

    pub fn append(&mut self, heading: &str, text: &str) {
        let slot = self.slot(heading);
        if text.is_empty() {
            return;
        }
        let row = &mut self.rows[slot].text;
        if !row.is_empty() {
            row.push(' ');
        }
        row.push_str(text);
    }

    pub fn text(&self, heading: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.heading == heading)
            .map(|r| r.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SectionRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<SectionRow> {
        self.rows
    }
}

/// The section table of a document and which row is the bibliography.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub sections: Vec<SectionRow>,
    pub bibliography: usize,
}

impl Outline {
    pub fn bibliography(&self) -> &SectionRow {
        &self.sections[self.bibliography]
    }

    /// Every row except the bibliography.
    pub fn body(&self) -> impl Iterator<Item = &SectionRow> {
        self.sections
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.bibliography)
            .map(|(_, r)| r)
    }
}

/// Read the keywords list that trails the first row and put it in a row of
/// its own at the top of the table. The first row keeps its text.
fn split_keywords_row(rows: &mut Vec<SectionRow>, rule: &KeywordsRow) {
    let Some(first) = rows.first() else {
        return;
    };
    let Some((_, after)) = first.text.split_once(rule.marker.as_str()) else {
        return;
    };
    let keywords = after
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .split(rule.separator.as_str())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    rows.insert(
        0,
        SectionRow {
            heading: rule.marker.clone(),
            text: keywords,
        },
    );
}

fn locate_bibliography(
    rows: &[SectionRow],
    locator: &BibliographyLocator,
    journal: &str,
) -> Result<usize, ParsingError> {
    let found = match locator {
        BibliographyLocator::LastSection => rows.len().checked_sub(1),
        BibliographyLocator::Heading(heading) => rows.iter().position(|r| r.heading == *heading),
    };
    found.ok_or_else(|| ParsingError::SectionNotFound {
        journal: journal.to_string(),
        section: locator.describe(),
    })
}

/// Recover the section table of a tokenized document.
pub fn build_outline(tokens: &Tokens, profile: &JournalProfile) -> Result<Outline, ParsingError> {
    let journal = profile.id.as_str();
    let rows = match &profile.builder {
        BuilderKind::Nested(config) => {
            let mut tree = nested::build_tree(&tokens.runs, config);
            let ids =
                nested::select_sections(&mut tree, config, &profile.references.locator, journal)?;
            let mut table = SectionTable::default();
            for id in ids {
                table.append(tree.heading(id).trim(), &tree.body_contents(id));
            }
            let mut rows = table.into_rows();
            if let Some(rule) = &config.keywords_row {
                split_keywords_row(&mut rows, rule);
            }
            rows
        }
        BuilderKind::Flat(config) => flat::build_table(tokens, config, journal)?.into_rows(),
    };

    let bibliography = locate_bibliography(&rows, &profile.references.locator, journal)?;
    tracing::debug!(
        journal,
        sections = rows.len(),
        bibliography = %rows[bibliography].heading,
        "built outline"
    );
    Ok(Outline {
        sections: rows,
        bibliography,
    })
}
