//! Fragment model: the geometric and logical units the pipeline passes around.
//!
//! Everything here is created fresh per conversion, owned by exactly one page
//! computation, and handed to the caller's serializer at the end. Nothing is
//! shared across pages, which is what lets [`crate::convert::reconstruct`]
//! fan pages out to a worker pool without locks.

use serde::{Deserialize, Serialize};

/// A single positioned run of text extracted from a source page.
///
/// `x`/`y` are the baseline origin in page-space units; `height` approximates
/// the font size. All fragments of one page share one coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub page_index: u32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
            page_index: 0,
        }
    }

    /// Builder-style page assignment.
    pub fn on_page(mut self, page_index: u32) -> Self {
        self.page_index = page_index;
        self
    }

    /// Right edge of the fragment (`x + width`).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// True when every coordinate is finite and the height is positive.
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.height > 0.0
    }
}

/// All fragments of one source page, in producer order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageFragments {
    pub page_index: u32,
    pub fragments: Vec<TextFragment>,
}

impl PageFragments {
    pub fn new(page_index: u32, fragments: Vec<TextFragment>) -> Self {
        Self {
            page_index,
            fragments,
        }
    }

    /// Group a flat fragment list by `page_index`, ascending.
    pub fn group(fragments: Vec<TextFragment>) -> Vec<PageFragments> {
        let mut pages: std::collections::BTreeMap<u32, Vec<TextFragment>> =
            std::collections::BTreeMap::new();
        for fragment in fragments {
            pages.entry(fragment.page_index).or_default().push(fragment);
        }
        pages
            .into_iter()
            .map(|(page_index, fragments)| PageFragments {
                page_index,
                fragments,
            })
            .collect()
    }
}

/// Fragments judged to share one horizontal text band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Representative y of the band: the y of the first fragment that opened it.
    pub y_band: f64,
    /// Fragments on this band, sorted by ascending `x`.
    pub fragments: Vec<TextFragment>,
}

impl Line {
    /// Largest fragment height on the line.
    pub fn max_height(&self) -> f64 {
        self.fragments
            .iter()
            .map(|f| f.height)
            .fold(0.0, f64::max)
    }

    /// Leftmost x on the line, or 0 for an empty line.
    pub fn left(&self) -> f64 {
        self.fragments.first().map(|f| f.x).unwrap_or(0.0)
    }

    /// Fragment text joined with single spaces.
    pub fn text(&self) -> String {
        crate::pipeline::normalize::join_fragments(&self.fragments)
    }
}

/// Heading/paragraph classification of a [`Block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Heading,
    Paragraph,
}

/// One or more merged lines classified as a heading or a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub lines: Vec<Line>,
    /// Fragments joined with a single space, lines with a single `\n`.
    pub text: String,
    /// Present only on placeholder blocks standing in for a failed page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl Block {
    /// An empty paragraph carrying a diagnostic note.
    pub fn placeholder(note: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            lines: Vec::new(),
            text: String::new(),
            diagnostic: Some(note.into()),
        }
    }

    pub fn is_heading(&self) -> bool {
        self.kind == BlockKind::Heading
    }
}

/// A reconstructed table. Rows are NOT padded to equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub rows: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            diagnostic: None,
        }
    }

    /// An empty grid carrying a diagnostic note.
    pub fn placeholder(note: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            diagnostic: Some(note.into()),
        }
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_rectangular(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().all(|r| r.len() == width)
    }

    /// A copy with every row right-padded with empty cells to
    /// [`Grid::column_count`]. Detection never pads on its own.
    pub fn padded(&self) -> Grid {
        let width = self.column_count();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row.resize(width, String::new());
                row
            })
            .collect();
        Grid {
            rows,
            diagnostic: self.diagnostic.clone(),
        }
    }
}

/// One output page cut from a tall raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSlice {
    /// Where this slice starts on the source surface.
    pub source_y_offset: f64,
    /// How much source height this slice covers.
    pub source_height: f64,
    /// Width of the fixed output page.
    pub target_width: f64,
    /// Height of the fixed output page.
    pub target_height: f64,
}

impl PageSlice {
    /// Source y where this slice ends (exclusive).
    pub fn source_end(&self) -> f64 {
        self.source_y_offset + self.source_height
    }

    /// Height the slice occupies on its output page after scaling to
    /// `target_width`. Equals `target_height` for every slice but a short
    /// final one.
    pub fn scaled_content_height(&self, source_width: f64) -> f64 {
        self.source_height * (self.target_width / source_width)
    }
}
