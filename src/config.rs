//! Configuration types for structure reconstruction and pagination.
//!
//! All tunable behaviour is controlled through [`ReconstructionConfig`],
//! built via its [`ReconstructionConfigBuilder`]. The clustering constants
//! live together in a [`LayoutProfile`] so a caller can swap in a profile
//! tuned for a particular kind of document (e.g. [`LayoutProfile::dense_table`])
//! without touching any algorithm.

use crate::error::DocStructError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clustering thresholds, all in page-space units or ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutProfile {
    /// Max vertical distance between two fragments on the same line. Default: 3.0.
    pub line_tolerance: f64,

    /// A line is a heading when a fragment exceeds the page mean height times
    /// this factor. Default: 1.3.
    pub heading_factor: f64,

    /// A new block starts when a line gap exceeds the running median gap times
    /// this multiplier. Default: 1.8.
    pub paragraph_gap_multiplier: f64,

    /// Horizontal gap above which adjacent fragments fall into separate
    /// table cells. Default: 20.0.
    pub column_gap_threshold: f64,

    /// Max/min fragment height ratio above which a page is flagged as having
    /// an inconsistent coordinate space. Default: 12.0.
    pub max_height_ratio: f64,
}

impl Default for LayoutProfile {
    fn default() -> Self {
        Self {
            line_tolerance: 3.0,
            heading_factor: crate::pipeline::blocks::HEADING_FACTOR,
            paragraph_gap_multiplier: crate::pipeline::blocks::PARAGRAPH_GAP_MULTIPLIER,
            column_gap_threshold: crate::pipeline::grid::COLUMN_GAP_THRESHOLD,
            max_height_ratio: 12.0,
        }
    }
}

impl LayoutProfile {
    /// Tightly packed tables: narrow gutters, small line pitch.
    pub fn dense_table() -> Self {
        Self {
            line_tolerance: 2.0,
            column_gap_threshold: 8.0,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), DocStructError> {
        let positive = [
            ("line_tolerance", self.line_tolerance),
            ("heading_factor", self.heading_factor),
            ("paragraph_gap_multiplier", self.paragraph_gap_multiplier),
            ("max_height_ratio", self.max_height_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DocStructError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(self.column_gap_threshold.is_finite() && self.column_gap_threshold >= 0.0) {
            return Err(DocStructError::InvalidConfig(format!(
                "column_gap_threshold must be ≥ 0, got {}",
                self.column_gap_threshold
            )));
        }
        Ok(())
    }
}

/// Configuration for a reconstruction run.
///
/// # Example
/// ```rust
/// use docstruct::{ConversionTarget, ReconstructionConfig};
///
/// let config = ReconstructionConfig::builder()
///     .target(ConversionTarget::Tabular)
///     .column_gap_threshold(12.0)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Clustering thresholds.
    pub profile: LayoutProfile,

    /// What the fragments should be reconstructed into. Default: [`ConversionTarget::Prose`].
    pub target: ConversionTarget,

    /// Axis orientation of the fragment producer. Default: [`YAxis::Up`].
    pub y_axis: YAxis,

    /// Output page size used by the paginator. Default: A4 in points.
    pub page_size: PageSize,

    /// Max pages processed at once. Default: available cores.
    ///
    /// A page's clustering is CPU-bound and independent of every other page,
    /// so the pool is sized to the machine rather than to any I/O limit.
    pub concurrency: usize,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Optional per-page progress events.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            profile: LayoutProfile::default(),
            target: ConversionTarget::default(),
            y_axis: YAxis::default(),
            page_size: PageSize::default(),
            concurrency: default_concurrency(),
            pages: PageSelection::default(),
            progress_callback: None,
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl fmt::Debug for ReconstructionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconstructionConfig")
            .field("profile", &self.profile)
            .field("target", &self.target)
            .field("y_axis", &self.y_axis)
            .field("page_size", &self.page_size)
            .field("concurrency", &self.concurrency)
            .field("pages", &self.pages)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ReconstructionConfig {
    /// Create a new builder for `ReconstructionConfig`.
    pub fn builder() -> ReconstructionConfigBuilder {
        ReconstructionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReconstructionConfig`].
#[derive(Debug)]
pub struct ReconstructionConfigBuilder {
    config: ReconstructionConfig,
}

impl ReconstructionConfigBuilder {
    pub fn profile(mut self, profile: LayoutProfile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn line_tolerance(mut self, v: f64) -> Self {
        self.config.profile.line_tolerance = v;
        self
    }

    pub fn heading_factor(mut self, v: f64) -> Self {
        self.config.profile.heading_factor = v;
        self
    }

    pub fn paragraph_gap_multiplier(mut self, v: f64) -> Self {
        self.config.profile.paragraph_gap_multiplier = v;
        self
    }

    pub fn column_gap_threshold(mut self, v: f64) -> Self {
        self.config.profile.column_gap_threshold = v;
        self
    }

    pub fn max_height_ratio(mut self, v: f64) -> Self {
        self.config.profile.max_height_ratio = v;
        self
    }

    pub fn target(mut self, target: ConversionTarget) -> Self {
        self.config.target = target;
        self
    }

    pub fn y_axis(mut self, axis: YAxis) -> Self {
        self.config.y_axis = axis;
        self
    }

    pub fn page_size(mut self, width: f64, height: f64) -> Self {
        self.config.page_size = PageSize { width, height };
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReconstructionConfig, DocStructError> {
        let c = &self.config;
        c.profile.validate()?;
        if !c.page_size.is_valid() {
            return Err(DocStructError::InvalidConfig(format!(
                "page size must be positive and finite, got {}x{}",
                c.page_size.width, c.page_size.height
            )));
        }
        if c.concurrency == 0 {
            return Err(DocStructError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a conversion reconstructs; picks the consumer of the Line Builder's
/// output (or the paginator for raster input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionTarget {
    /// Headings and paragraphs, for word-processor style targets. (default)
    #[default]
    Prose,
    /// Rows and cells, for spreadsheet and delimited-text targets.
    Tabular,
    /// Fixed-size pages cut from a tall raster surface.
    Paginated,
}

/// Direction in which y grows on the source page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YAxis {
    /// PDF-style: y grows upward, the top line has the largest y. (default)
    #[default]
    Up,
    /// Screen-style: y grows downward, the top line has the smallest y.
    Down,
}

/// Output page size in target units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for PageSize {
    /// A4 portrait in points.
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
        }
    }
}

impl PageSize {
    pub(crate) fn is_valid(&self) -> bool {
        self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0
    }
}

/// Specifies which source pages to process, by 1-indexed page number
/// (`page_index + 1`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page.
    Single(u32),
    /// A contiguous inclusive range.
    Range(u32, u32),
    /// Specific pages.
    Set(Vec<u32>),
}

impl PageSelection {
    /// Whether the page with 0-based `page_index` is selected.
    pub fn selects(&self, page_index: u32) -> bool {
        let page_num = page_index.saturating_add(1);
        match self {
            PageSelection::All => true,
            PageSelection::Single(p) => *p == page_num,
            PageSelection::Range(start, end) => (*start..=*end).contains(&page_num),
            PageSelection::Set(pages) => pages.contains(&page_num),
        }
    }
}
