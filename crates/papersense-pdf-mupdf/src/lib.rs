use std::path::Path;

use mupdf::{Document, Page};
use serde::Deserialize;

use papersense_core::{BackendError, DocumentBackend, Fragment, PageSource, Rect};

/// MuPDF-based implementation of [`DocumentBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the parsing crates do not transitively
/// depend on it.
///
/// Fragments are reported per text line, with the line's font name, size
/// and bounding box as MuPDF's structured-text JSON describes them.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBackend for MupdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>, BackendError> {
        Ok(Box::new(MupdfDocument::open(path)?))
    }
}

/// An open PDF.
pub struct MupdfDocument {
    document: Document,
    page_count: usize,
}

impl MupdfDocument {
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = usize::try_from(page_count).unwrap_or(0);

        tracing::debug!(path = %path.display(), pages = page_count, "opened PDF");
        Ok(Self {
            document,
            page_count,
        })
    }

    fn page(&self, page_index: usize) -> Result<Page, BackendError> {
        let out_of_range = || BackendError::PageOutOfRange {
            index: page_index,
            count: self.page_count,
        };
        if page_index >= self.page_count {
            return Err(out_of_range());
        }
        let index = i32::try_from(page_index).map_err(|_| out_of_range())?;
        self.document
            .load_page(index)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))
    }
}

impl PageSource for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_bounds(&self, page_index: usize) -> Result<Rect, BackendError> {
        let bounds = self
            .page(page_index)?
            .bounds()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        Ok(Rect::new(bounds.x0, bounds.y0, bounds.x1, bounds.y1))
    }

    fn fragments(
        &self,
        page_index: usize,
        clip: Option<Rect>,
    ) -> Result<Vec<Fragment>, BackendError> {
        let json = self
            .page(page_index)?
            .stext_page_as_json_from_page(1.0)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        fragments_from_stext(&json, clip)
    }
}

// Structured-text JSON as emitted by MuPDF. Image blocks carry no lines.

#[derive(Debug, Deserialize)]
struct StextPage {
    #[serde(default)]
    blocks: Vec<StextBlock>,
}

#[derive(Debug, Deserialize)]
struct StextBlock {
    #[serde(default)]
    lines: Vec<StextLine>,
}

#[derive(Debug, Deserialize)]
struct StextLine {
    bbox: StextBox,
    font: StextFont,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct StextBox {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

#[derive(Debug, Deserialize)]
struct StextFont {
    #[serde(default)]
    name: String,
    size: f32,
}

/// Convert one page of structured-text JSON into fragments, keeping only
/// lines whose box lies inside `clip`.
pub fn fragments_from_stext(json: &str, clip: Option<Rect>) -> Result<Vec<Fragment>, BackendError> {
    let page: StextPage = serde_json::from_str(json)
        .map_err(|e| BackendError::ExtractionError(format!("malformed structured text: {e}")))?;

    Ok(page
        .blocks
        .into_iter()
        .flat_map(|block| block.lines)
        .map(|line| Fragment {
            text: line.text,
            font_family: line.font.name,
            font_size: line.font.size,
            bbox: Rect::new(
                line.bbox.x,
                line.bbox.y,
                line.bbox.x + line.bbox.w,
                line.bbox.y + line.bbox.h,
            ),
        })
        .filter(|f| clip.is_none_or(|c| c.contains_rect(&f.bbox)))
        .collect())
}
