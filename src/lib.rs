//! # docstruct
//!
//! Reconstruct logical document structure from positioned text fragments,
//! and cut tall rendered surfaces into fixed-size pages.
//!
//! ## Why this crate?
//!
//! PDF text extractors hand back a bag of positioned runs: no lines, no
//! paragraphs, no notion of which run is a heading. Before that text can be
//! re-emitted as a word-processor document, a spreadsheet or a slide deck,
//! the runs have to be grouped back into the units a reader sees. This crate
//! does that grouping with purely geometric heuristics, page by page, and
//! leaves parsing and serialisation to the caller.
//!
//! ## Pipeline Overview
//!
//! ```text
//! fragments (per page)
//!  │
//!  ├─ 1. Lines     cluster fragments into horizontal bands
//!  ├─ 2a. Blocks   headings vs paragraphs, split on large vertical gaps
//!  ├─ 2b. Grid     rows of cells, split on large horizontal gaps
//!  └─ 3. Assemble  page-ordered units + page-boundary markers
//!
//! surface ── Paginate ── fixed-size PageSlices (optionally cropped images)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docstruct::{reconstruct_file, ReconstructionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReconstructionConfig::default();
//!     let output = reconstruct_file("fragments.json", &config).await?;
//!     for block in output.document.blocks() {
//!         println!("{:?}: {}", block.kind, block.text);
//!     }
//!     eprintln!("{} pages, {} blocks", output.stats.total_pages, output.stats.total_units);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docstruct` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docstruct = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionTarget, LayoutProfile, PageSelection, PageSize, ReconstructionConfig,
    ReconstructionConfigBuilder, YAxis,
};
pub use convert::{
    load_fragments, load_surface, paginate_surfaces, parse_fragments, process_page, reconstruct,
    reconstruct_blocking, reconstruct_file, reconstruct_to_file, reconstruct_units,
    reconstruct_units_blocking, write_atomic, PageUnit,
    SurfaceExtent,
};
pub use error::{DocStructError, PageError, PageWarning};
pub use model::{Block, BlockKind, Grid, Line, PageFragments, PageSlice, TextFragment};
pub use output::{
    Body, Document, Element, PageOutcome, PageReport, ReconstructionOutput, ReconstructionStats,
    Units,
};
pub use pipeline::assemble::assemble;
pub use pipeline::blocks::classify;
pub use pipeline::grid::detect_grid;
pub use pipeline::lines::build_lines;
pub use pipeline::paginate::paginate;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{reconstruct_stream, PageStream};
