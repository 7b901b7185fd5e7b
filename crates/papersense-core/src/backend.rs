use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Axis-aligned rectangle in page coordinates (origin top-left, y grows down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Shrink the rectangle by the given insets. Insets larger than the
    /// rectangle collapse it to zero width/height rather than inverting it.
    pub fn inset(&self, left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        let x0 = self.x0 + left;
        let y0 = self.y0 + top;
        Rect {
            x0,
            y0,
            x1: (self.x1 - right).max(x0),
            y1: (self.y1 - bottom).max(y0),
        }
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}

/// The smallest unit of styled text a page source reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub bbox: Rect,
}

/// Per-document access to positioned, styled text.
///
/// Implementors only report what is on the page; run merging, section
/// detection and citation matching live in `papersense_parsing`.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn page_bounds(&self, page_index: usize) -> Result<Rect, BackendError>;

    /// Fragments of one page in reading order. When `clip` is given, only
    /// fragments whose bounding box lies inside it are returned.
    fn fragments(&self, page_index: usize, clip: Option<Rect>)
    -> Result<Vec<Fragment>, BackendError>;
}

/// Opens documents as [`PageSource`]s.
///
/// Backends are stateless openers so they can be shared across worker
/// threads; the returned source is owned by a single task.
pub trait DocumentBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PageSource>, BackendError>;
}
