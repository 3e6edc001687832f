//! Output types: the assembled [`Document`] plus per-page reports and stats.
//!
//! A document body holds exactly one kind of unit (blocks, grids or page
//! slices) depending on the conversion target, with
//! [`Element::PageBoundary`] markers between consecutive source pages so the
//! serializer can decide whether to start a new target page, sheet or slide.

use crate::config::ConversionTarget;
use crate::error::{DocStructError, PageError, PageWarning};
use crate::model::{Block, Grid, PageSlice};
use serde::{Deserialize, Serialize};

/// One entry of a document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element<T> {
    /// A block, grid or page slice.
    Unit(T),
    /// Separates the units of one source page from the next.
    PageBoundary {
        /// Index of the page whose units follow this marker.
        page_index: u32,
    },
}

impl<T> Element<T> {
    pub fn unit(&self) -> Option<&T> {
        match self {
            Element::Unit(u) => Some(u),
            Element::PageBoundary { .. } => None,
        }
    }
}

/// Document body, one variant per conversion target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", content = "elements", rename_all = "lowercase")]
pub enum Body {
    Prose(Vec<Element<Block>>),
    Tabular(Vec<Element<Grid>>),
    Paginated(Vec<Element<PageSlice>>),
}

/// The outcome of one page before assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOutcome<T> {
    pub page_index: u32,
    pub units: Vec<T>,
    pub fragment_count: usize,
    pub line_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PageWarning>,
}

impl<T> PageOutcome<T> {
    /// A successful outcome with no warnings.
    pub fn ok(page_index: u32, units: Vec<T>) -> Self {
        Self {
            page_index,
            units,
            fragment_count: 0,
            line_count: 0,
            error: None,
            warnings: Vec::new(),
        }
    }
}

/// Input to [`crate::pipeline::assemble::assemble`]: per-page outcomes of a
/// single conversion target.
#[derive(Debug, Clone, PartialEq)]
pub enum Units {
    Prose(Vec<PageOutcome<Block>>),
    Tabular(Vec<PageOutcome<Grid>>),
    Paginated(Vec<PageOutcome<PageSlice>>),
}

/// Per-page status surfaced alongside the assembled content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub page_index: u32,
    pub fragment_count: usize,
    pub line_count: usize,
    pub unit_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PageWarning>,
}

impl PageReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self.error, Some(PageError::EmptyInput { .. }))
    }
}

/// The assembled output, ready for an external serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub body: Body,
    /// One report per source page, in page order.
    pub pages: Vec<PageReport>,
}

impl Document {
    pub fn target(&self) -> ConversionTarget {
        match self.body {
            Body::Prose(_) => ConversionTarget::Prose,
            Body::Tabular(_) => ConversionTarget::Tabular,
            Body::Paginated(_) => ConversionTarget::Paginated,
        }
    }

    /// All blocks in order (empty unless the body is prose).
    pub fn blocks(&self) -> Vec<&Block> {
        match &self.body {
            Body::Prose(els) => els.iter().filter_map(Element::unit).collect(),
            _ => Vec::new(),
        }
    }

    /// All grids in order (empty unless the body is tabular).
    pub fn grids(&self) -> Vec<&Grid> {
        match &self.body {
            Body::Tabular(els) => els.iter().filter_map(Element::unit).collect(),
            _ => Vec::new(),
        }
    }

    /// All page slices in order (empty unless the body is paginated).
    pub fn slices(&self) -> Vec<&PageSlice> {
        match &self.body {
            Body::Paginated(els) => els.iter().filter_map(Element::unit).collect(),
            _ => Vec::new(),
        }
    }

    /// Number of page-boundary markers in the body.
    pub fn boundary_count(&self) -> usize {
        fn count<T>(els: &[Element<T>]) -> usize {
            els.iter()
                .filter(|e| matches!(e, Element::PageBoundary { .. }))
                .count()
        }
        match &self.body {
            Body::Prose(els) => count(els),
            Body::Tabular(els) => count(els),
            Body::Paginated(els) => count(els),
        }
    }

    /// Split the document back into per-page outcomes.
    ///
    /// Assembling the result again reproduces this document exactly.
    pub fn to_units(&self) -> Units {
        match &self.body {
            Body::Prose(els) => Units::Prose(split_pages(els, &self.pages)),
            Body::Tabular(els) => Units::Tabular(split_pages(els, &self.pages)),
            Body::Paginated(els) => Units::Paginated(split_pages(els, &self.pages)),
        }
    }
}

fn split_pages<T: Clone>(elements: &[Element<T>], reports: &[PageReport]) -> Vec<PageOutcome<T>> {
    let mut segments: Vec<Vec<T>> = Vec::with_capacity(reports.len());
    let mut current: Vec<T> = Vec::new();
    for element in elements {
        match element {
            Element::Unit(u) => current.push(u.clone()),
            Element::PageBoundary { .. } => segments.push(std::mem::take(&mut current)),
        }
    }
    if !reports.is_empty() {
        segments.push(current);
    }

    reports
        .iter()
        .zip(segments)
        .map(|(report, units)| PageOutcome {
            page_index: report.page_index,
            units,
            fragment_count: report.fragment_count,
            line_count: report.line_count,
            error: report.error.clone(),
            warnings: report.warnings.clone(),
        })
        .collect()
}

/// Aggregate statistics for a reconstruction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub empty_pages: usize,
    pub failed_pages: usize,
    pub warning_count: usize,
    pub total_fragments: usize,
    pub total_lines: usize,
    pub total_units: usize,
    pub duration_ms: u64,
}

impl ReconstructionStats {
    /// Derive counts from a document's page reports.
    pub fn from_document(doc: &Document, duration_ms: u64) -> Self {
        let pages = &doc.pages;
        Self {
            total_pages: pages.len(),
            processed_pages: pages.iter().filter(|p| p.is_ok()).count(),
            empty_pages: pages.iter().filter(|p| p.is_empty_input()).count(),
            failed_pages: pages
                .iter()
                .filter(|p| !p.is_ok() && !p.is_empty_input())
                .count(),
            warning_count: pages.iter().map(|p| p.warnings.len()).sum(),
            total_fragments: pages.iter().map(|p| p.fragment_count).sum(),
            total_lines: pages.iter().map(|p| p.line_count).sum(),
            total_units: pages.iter().map(|p| p.unit_count).sum(),
            duration_ms,
        }
    }
}

/// Result of a reconstruction run: the document plus run statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionOutput {
    pub document: Document,
    pub stats: ReconstructionStats,
}

impl ReconstructionOutput {
    /// Treat any failed page as an error. Empty pages are not failures.
    pub fn into_result(self) -> Result<Self, DocStructError> {
        if self.stats.failed_pages > 0 {
            return Err(DocStructError::PartialFailure {
                success: self.stats.total_pages - self.stats.failed_pages,
                failed: self.stats.failed_pages,
                total: self.stats.total_pages,
            });
        }
        Ok(self)
    }
}
