//! Error types for the docstruct library.
//!
//! Three types reflect three distinct failure modes:
//!
//! * [`DocStructError`]: **Fatal** for the call that returned it: invalid
//!   target page dimensions handed to the paginator, an unreadable fragment
//!   file, a rejected configuration. Returned as `Err(DocStructError)`.
//!
//! * [`PageError`]: **Non-fatal**: a single page produced nothing usable
//!   (no fragments, or its worker died) while every sibling page is fine.
//!   Stored in [`crate::output::PageReport`] so callers can report partial
//!   success instead of losing the whole document to one bad page.
//!
//! * [`PageWarning`]: not an error at all: the page was processed with
//!   best-effort thresholds, but its input looked suspicious.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docstruct library.
#[derive(Debug, Error)]
pub enum DocStructError {
    // ── Geometry errors ───────────────────────────────────────────────────
    /// The paginator was given a non-positive (or non-finite) target page size.
    #[error("Invalid target page dimensions {width}x{height}: both must be positive and finite")]
    InvalidTargetDimensions { width: f64, height: f64 },

    /// The paginator was given a surface whose width cannot be scaled.
    #[error("Invalid source surface width {width}: must be positive and finite")]
    InvalidSourceDimensions { width: f64 },

    /// The surface would need more pages than the paginator will emit,
    /// usually because the source width is tiny relative to the page width.
    #[error("Surface of height {source_height} needs more than {limit} pages of {px_per_page} source units each")]
    TooManyPages {
        source_height: f64,
        px_per_page: f64,
        limit: usize,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Fragment file was not found at the given path.
    #[error("Fragment file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Fragment file exists but is not a JSON array of fragments.
    #[error("Invalid fragment file '{path}': {detail}")]
    InvalidFragments { path: PathBuf, detail: String },

    /// Raster surface could not be decoded.
    #[error("Failed to decode raster surface '{path}': {detail}")]
    InvalidSurface { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::ReconstructionOutput::into_result`] when
    /// the caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed during reconstruction")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// A [`PageError::EmptyInput`] page contributes no units. A
/// [`PageError::TaskFailed`] page contributes exactly one placeholder (an
/// empty block or grid carrying a diagnostic note) so the failure stays
/// visible in the document body.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page had no fragments, or the surface had zero height.
    #[error("Page {page}: empty input")]
    EmptyInput { page: u32 },

    /// The page worker panicked or was cancelled.
    #[error("Page {page}: worker failed: {detail}")]
    TaskFailed { page: u32, detail: String },
}

/// A best-effort warning attached to a processed page.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PageWarning {
    /// Fragment heights on one page disagree so wildly that they probably do
    /// not share a coordinate space. Thresholds derived from the page mean
    /// may be unreliable.
    InconsistentCoordinateSpace {
        page: u32,
        min_height: f64,
        max_height: f64,
        ratio: f64,
    },
    /// At least one fragment has a non-finite coordinate or a non-positive height.
    DegenerateGeometry { page: u32, count: usize },
}

impl std::fmt::Display for PageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageWarning::InconsistentCoordinateSpace {
                page,
                min_height,
                max_height,
                ratio,
            } => write!(
                f,
                "Page {page}: inconsistent coordinate space (heights {min_height}..{max_height}, ratio {ratio:.1})"
            ),
            PageWarning::DegenerateGeometry { page, count } => write!(
                f,
                "Page {page}: {count} fragment(s) with non-finite coordinates or non-positive height"
            ),
        }
    }
}
