//! In-memory page source for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{BackendError, Fragment, PageSource, Rect};

/// US Letter in points.
pub const LETTER: Rect = Rect {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// A page of a [`MockPages`] document.
#[derive(Debug, Clone)]
pub struct MockPage {
    pub bounds: Rect,
    pub fragments: Vec<Fragment>,
}

/// A hand-rolled [`PageSource`] backed by fragments held in memory.
///
/// Fragments added through [`MockPages::page`] are laid out top to bottom
/// in the middle of a letter-sized page, so they survive any reasonable
/// crop. Use [`MockPages::page_with`] to control bounding boxes directly.
#[derive(Debug, Default)]
pub struct MockPages {
    pages: Vec<MockPage>,
    fragment_calls: AtomicUsize,
}

impl MockPages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page holding `(text, font_family, font_size)` fragments.
    pub fn page(mut self, fragments: &[(&str, &str, f32)]) -> Self {
        let fragments = fragments
            .iter()
            .enumerate()
            .map(|(i, (text, font, size))| {
                let top = 100.0 + 14.0 * i as f32;
                fragment(text, font, *size, Rect::new(72.0, top, 540.0, top + 12.0))
            })
            .collect();
        self.pages.push(MockPage {
            bounds: LETTER,
            fragments,
        });
        self
    }

    /// Append a page with explicit bounds and fragments.
    pub fn page_with(mut self, bounds: Rect, fragments: Vec<Fragment>) -> Self {
        self.pages.push(MockPage { bounds, fragments });
        self
    }

    /// Number of times [`PageSource::fragments`] was called.
    pub fn fragment_calls(&self) -> usize {
        self.fragment_calls.load(Ordering::SeqCst)
    }
}

/// Build a single fragment.
pub fn fragment(text: &str, font: &str, size: f32, bbox: Rect) -> Fragment {
    Fragment {
        text: text.to_string(),
        font_family: font.to_string(),
        font_size: size,
        bbox,
    }
}

impl PageSource for MockPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_bounds(&self, page_index: usize) -> Result<Rect, BackendError> {
        self.pages
            .get(page_index)
            .map(|p| p.bounds)
            .ok_or(BackendError::PageOutOfRange {
                index: page_index,
                count: self.pages.len(),
            })
    }

    fn fragments(
        &self,
        page_index: usize,
        clip: Option<Rect>,
    ) -> Result<Vec<Fragment>, BackendError> {
        self.fragment_calls.fetch_add(1, Ordering::SeqCst);
        let page = self
            .pages
            .get(page_index)
            .ok_or(BackendError::PageOutOfRange {
                index: page_index,
                count: self.pages.len(),
            })?;
        Ok(page
            .fragments
            .iter()
            .filter(|f| clip.is_none_or(|c| c.contains_rect(&f.bbox)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_filters_by_containment() {
        let pages = MockPages::new().page_with(
            LETTER,
            vec![
                fragment("Running head", "Times", 8.0, Rect::new(72.0, 20.0, 300.0, 30.0)),
                fragment("Body", "Times", 10.0, Rect::new(72.0, 300.0, 300.0, 312.0)),
            ],
        );
        let clip = LETTER.inset(40.0, 60.0, 40.0, 40.0);
        let frags = pages.fragments(0, Some(clip)).unwrap();
        assert_eq!(frags.len(), 1);
        assert_eq!(frags[0].text, "Body");
        assert_eq!(pages.fragments(0, None).unwrap().len(), 2);
        assert_eq!(pages.fragment_calls(), 2);
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let pages = MockPages::new().page(&[("x", "Times", 10.0)]);
        assert!(matches!(
            pages.page_bounds(3),
            Err(BackendError::PageOutOfRange { index: 3, count: 1 })
        ));
    }
}
