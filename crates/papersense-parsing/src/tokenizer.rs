use std::collections::HashMap;

use papersense_core::{BackendError, PageSource, TextRun};

use crate::profile::LayoutConfig;

/// Round a font size to `decimals` places.
pub fn round_size(size: f32, decimals: u32) -> f32 {
    let factor = 10f32.powi(decimals as i32);
    (size * factor).round() / factor
}

/// Strip a PDF subset prefix (`ABCDEF+Times-Roman` -> `Times-Roman`).
pub fn normalize_font(family: &str) -> &str {
    match family.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => family,
    }
}

/// `(font family, rounded size)` pair runs are grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub family: String,
    size_bits: u32,
}

impl FontKey {
    pub fn new(family: &str, size: f32) -> Self {
        Self {
            family: family.to_string(),
            size_bits: size.to_bits(),
        }
    }

    pub fn size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

/// Texts of every run grouped by font key, groups in order of first
/// appearance and texts in reading order.
#[derive(Debug, Clone, Default)]
pub struct FontIndex {
    groups: Vec<(FontKey, Vec<String>)>,
    lookup: HashMap<FontKey, usize>,
}

impl FontIndex {
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a TextRun>) -> Self {
        let mut index = FontIndex::default();
        for run in runs {
            let key = FontKey::new(&run.font_family, run.font_size);
            let slot = match index.lookup.get(&key) {
                Some(&slot) => slot,
                None => {
                    index.groups.push((key.clone(), Vec::new()));
                    index.lookup.insert(key, index.groups.len() - 1);
                    index.groups.len() - 1
                }
            };
            index.groups[slot].1.push(run.text.clone());
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn texts(&self, key: &FontKey) -> &[String] {
        self.lookup
            .get(key)
            .map(|&slot| self.groups[slot].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &FontKey> {
        self.groups.iter().map(|(k, _)| k)
    }

    /// Distinct sizes, largest first.
    pub fn sizes_descending(&self) -> Vec<f32> {
        let mut sizes: Vec<f32> = self.keys().map(FontKey::size).collect();
        sizes.sort_by(|a, b| b.total_cmp(a));
        sizes.dedup();
        sizes
    }

    /// First text of the group sorting immediately below the first group of
    /// `size` when groups are ordered by ascending size.
    pub fn first_text_below(&self, size: f32) -> Option<&str> {
        let mut ordered: Vec<&(FontKey, Vec<String>)> = self.groups.iter().collect();
        ordered.sort_by(|a, b| a.0.size().total_cmp(&b.0.size()));
        let pos = ordered.iter().position(|(k, _)| k.size() == size)?;
        let (_, texts) = ordered.get(pos.checked_sub(1)?)?;
        texts.first().map(String::as_str)
    }
}

/// Output of [`tokenize`]: the run list plus side indexes over it.
#[derive(Debug, Clone, Default)]
pub struct Tokens {
    pub runs: Vec<TextRun>,
    pub index: FontIndex,
    /// Index over the runs that start on the first page read.
    pub first_page: FontIndex,
}

impl Tokens {
    pub fn new(runs: Vec<TextRun>) -> Self {
        let index = FontIndex::from_runs(&runs);
        let first_page = match runs.first() {
            Some(first) => {
                FontIndex::from_runs(runs.iter().filter(|r| r.page_index == first.page_index))
            }
            None => FontIndex::default(),
        };
        Self {
            runs,
            index,
            first_page,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Read every included page of `source` and merge consecutive fragments
/// that share font family and rounded size into runs.
///
/// Runs may continue across page boundaries. Font sizes are rounded to
/// `layout.rounding_decimals` before comparison and are stored rounded.
pub fn tokenize(source: &dyn PageSource, layout: &LayoutConfig) -> Result<Tokens, BackendError> {
    let page_count = source.page_count();
    let end = page_count.saturating_sub(layout.skip_last_pages);
    let mut runs: Vec<TextRun> = Vec::new();
    let mut fragment_count = 0usize;

    for page_index in layout.skip_first_pages..end {
        let clip = match layout.crop {
            Some(c) => Some(
                source
                    .page_bounds(page_index)?
                    .inset(c.left, c.top, c.right, c.bottom),
            ),
            None => None,
        };

        for fragment in source.fragments(page_index, clip)? {
            if fragment.text.is_empty() {
                continue;
            }
            fragment_count += 1;
            let size = round_size(fragment.font_size, layout.rounding_decimals);
            let family = normalize_font(&fragment.font_family);

            match runs.last_mut() {
                Some(last) if last.font_family == family && last.font_size == size => {
                    last.text.push(' ');
                    last.text.push_str(&fragment.text);
                }
                _ => runs.push(TextRun {
                    text: fragment.text,
                    font_family: family.to_string(),
                    font_size: size,
                    page_index,
                }),
            }
        }
    }

    tracing::debug!(
        pages = page_count,
        fragments = fragment_count,
        runs = runs.len(),
        "tokenized document"
    );
    Ok(Tokens::new(runs))
}
