//! Eager (whole-document) entry points.
//!
//! Every page is independent: its fragments are clustered into lines, then
//! read as blocks or as a grid, without looking at any other page. Pages are
//! therefore fanned out to a bounded worker pool ([`reconstruct`]) or run
//! one after another ([`reconstruct_blocking`]); both produce the same
//! [`crate::output::Document`] because the assembler restores page order.
//!
//! A page that has no fragments, or whose worker dies, is recorded in its
//! [`crate::output::PageReport`] and never aborts its siblings.

use crate::config::{ConversionTarget, LayoutProfile, ReconstructionConfig, YAxis};
use crate::error::{DocStructError, PageError};
use crate::model::{Block, Grid, Line, PageFragments, PageSlice, TextFragment};
use crate::output::{PageOutcome, ReconstructionOutput, ReconstructionStats, Units};
use crate::pipeline::{assemble, blocks, grid, lines, paginate};
use crate::progress::ProgressCallback;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

// ── Per-page units ───────────────────────────────────────────────────────

/// A logical unit a page's lines can be reconstructed into.
pub trait PageUnit: Sized + Send + 'static {
    /// Turn a page's lines into units.
    fn from_lines(lines: &[Line], profile: &LayoutProfile) -> Vec<Self>;

    /// Stand-in unit for a page whose worker failed.
    fn placeholder(note: &str) -> Self;

    /// Wrap per-page outcomes for the assembler.
    fn into_units(pages: Vec<PageOutcome<Self>>) -> Units;
}

impl PageUnit for Block {
    fn from_lines(lines: &[Line], profile: &LayoutProfile) -> Vec<Self> {
        blocks::classify_with(lines, profile.heading_factor, profile.paragraph_gap_multiplier)
    }

    fn placeholder(note: &str) -> Self {
        Block::placeholder(note)
    }

    fn into_units(pages: Vec<PageOutcome<Self>>) -> Units {
        Units::Prose(pages)
    }
}

impl PageUnit for Grid {
    fn from_lines(lines: &[Line], profile: &LayoutProfile) -> Vec<Self> {
        vec![grid::detect_grid(lines, profile.column_gap_threshold)]
    }

    fn placeholder(note: &str) -> Self {
        Grid::placeholder(note)
    }

    fn into_units(pages: Vec<PageOutcome<Self>>) -> Units {
        Units::Tabular(pages)
    }
}

/// Reconstruct one page. Pure and synchronous.
///
/// An empty page yields no units and an [`PageError::EmptyInput`] status.
pub fn process_page<T: PageUnit>(
    page: PageFragments,
    profile: &LayoutProfile,
    axis: YAxis,
) -> PageOutcome<T> {
    let page_index = page.page_index;
    let fragment_count = page.fragments.len();

    if page.fragments.is_empty() {
        debug!("Page {}: no fragments", page_index + 1);
        return PageOutcome {
            page_index,
            units: Vec::new(),
            fragment_count: 0,
            line_count: 0,
            error: Some(PageError::EmptyInput { page: page_index }),
            warnings: Vec::new(),
        };
    }

    let warnings =
        blocks::check_coordinate_space(page_index, &page.fragments, profile.max_height_ratio);
    for w in &warnings {
        warn!("{}", w);
    }

    let lines = lines::build_lines_oriented(&page.fragments, profile.line_tolerance, axis);
    let units = T::from_lines(&lines, profile);
    debug!(
        "Page {}: {} fragments → {} lines → {} units",
        page_index + 1,
        fragment_count,
        lines.len(),
        units.len()
    );

    PageOutcome {
        page_index,
        units,
        fragment_count,
        line_count: lines.len(),
        error: None,
        warnings,
    }
}

fn failed_outcome<T: PageUnit>(
    page_index: u32,
    fragment_count: usize,
    detail: String,
) -> PageOutcome<T> {
    let error = PageError::TaskFailed {
        page: page_index,
        detail,
    };
    warn!("{}", error);
    PageOutcome {
        page_index,
        units: vec![T::placeholder(&error.to_string())],
        fragment_count,
        line_count: 0,
        error: Some(error),
        warnings: Vec::new(),
    }
}

/// Run one page on the blocking pool, converting a worker panic into a
/// failed outcome.
pub(crate) async fn run_page<T: PageUnit>(
    page: PageFragments,
    profile: LayoutProfile,
    axis: YAxis,
) -> PageOutcome<T> {
    let page_index = page.page_index;
    let fragment_count = page.fragments.len();
    match tokio::task::spawn_blocking(move || process_page::<T>(page, &profile, axis)).await {
        Ok(outcome) => outcome,
        Err(e) => failed_outcome(page_index, fragment_count, e.to_string()),
    }
}

fn report_progress<T>(cb: &Option<ProgressCallback>, outcome: &PageOutcome<T>, total: usize) {
    if let Some(cb) = cb {
        let page_num = outcome.page_index as usize + 1;
        match &outcome.error {
            None => cb.on_page_complete(page_num, total, outcome.units.len()),
            Some(e) => cb.on_page_error(page_num, total, &e.to_string()),
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────────

/// Reconstruct the selected pages concurrently.
///
/// Pages run on tokio's blocking pool, at most `config.concurrency` at once.
/// The returned document is in page order regardless of completion order.
///
/// # Errors
/// [`DocStructError::InvalidConfig`] when `config.target` is
/// [`ConversionTarget::Paginated`]; pagination takes surfaces, not
/// fragments (see [`paginate_surfaces`]).
pub async fn reconstruct(
    pages: Vec<PageFragments>,
    config: &ReconstructionConfig,
) -> Result<ReconstructionOutput, DocStructError> {
    match config.target {
        ConversionTarget::Prose => Ok(reconstruct_units::<Block>(pages, config).await),
        ConversionTarget::Tabular => Ok(reconstruct_units::<Grid>(pages, config).await),
        ConversionTarget::Paginated => Err(paginated_target_error()),
    }
}

/// Sequential, runtime-free equivalent of [`reconstruct`].
pub fn reconstruct_blocking(
    pages: Vec<PageFragments>,
    config: &ReconstructionConfig,
) -> Result<ReconstructionOutput, DocStructError> {
    match config.target {
        ConversionTarget::Prose => Ok(reconstruct_units_blocking::<Block>(pages, config)),
        ConversionTarget::Tabular => Ok(reconstruct_units_blocking::<Grid>(pages, config)),
        ConversionTarget::Paginated => Err(paginated_target_error()),
    }
}

fn paginated_target_error() -> DocStructError {
    DocStructError::InvalidConfig(
        "the paginated target slices raster surfaces; use paginate_surfaces".into(),
    )
}

fn select(pages: Vec<PageFragments>, config: &ReconstructionConfig) -> Vec<PageFragments> {
    pages
        .into_iter()
        .filter(|p| config.pages.selects(p.page_index))
        .collect()
}

/// Reconstruct the selected pages concurrently into units of type `T`,
/// ignoring `config.target`.
///
/// A page whose worker panics is reported as [`PageError::TaskFailed`] and
/// contributes one [`PageUnit::placeholder`]; other pages are unaffected.
pub async fn reconstruct_units<T: PageUnit>(
    pages: Vec<PageFragments>,
    config: &ReconstructionConfig,
) -> ReconstructionOutput {
    let start = Instant::now();
    let pages = select(pages, config);
    let total = pages.len();
    info!(
        "Starting reconstruction: {} pages, target {:?}, concurrency {}",
        total, config.target, config.concurrency
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    let profile = config.profile;
    let axis = config.y_axis;
    let outcomes: Vec<PageOutcome<T>> = stream::iter(pages.into_iter().map(|page| {
        let cb = config.progress_callback.clone();
        async move {
            if let Some(ref cb) = cb {
                cb.on_page_start(page.page_index as usize + 1, total);
            }
            let outcome = run_page::<T>(page, profile, axis).await;
            report_progress(&cb, &outcome, total);
            outcome
        }
    }))
    .buffer_unordered(config.concurrency.max(1))
    .collect()
    .await;

    finish(T::into_units(outcomes), start, config)
}

/// Sequential, runtime-free equivalent of [`reconstruct_units`].
pub fn reconstruct_units_blocking<T: PageUnit>(
    pages: Vec<PageFragments>,
    config: &ReconstructionConfig,
) -> ReconstructionOutput {
    let start = Instant::now();
    let pages = select(pages, config);
    let total = pages.len();
    info!(
        "Starting sequential reconstruction: {} pages, target {:?}",
        total, config.target
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    let outcomes: Vec<PageOutcome<T>> = pages
        .into_iter()
        .map(|page| {
            let page_index = page.page_index;
            let fragment_count = page.fragments.len();
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_start(page_index as usize + 1, total);
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                process_page::<T>(page, &config.profile, config.y_axis)
            }))
            .unwrap_or_else(|panic| {
                failed_outcome(page_index, fragment_count, panic_message(panic.as_ref()))
            });
            report_progress(&config.progress_callback, &outcome, total);
            outcome
        })
        .collect();

    finish(T::into_units(outcomes), start, config)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "page worker panicked".to_string())
}

fn finish(units: Units, start: Instant, config: &ReconstructionConfig) -> ReconstructionOutput {
    let document = assemble::assemble(units);
    let stats = ReconstructionStats::from_document(&document, start.elapsed().as_millis() as u64);

    info!(
        "Reconstruction complete: {}/{} pages ({} empty, {} failed, {} warnings), {}ms",
        stats.processed_pages,
        stats.total_pages,
        stats.empty_pages,
        stats.failed_pages,
        stats.warning_count,
        stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(stats.total_pages, stats.processed_pages);
    }

    ReconstructionOutput { document, stats }
}

// ── Pagination ───────────────────────────────────────────────────────────

/// Extent of one rendered surface handed over by a raster producer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceExtent {
    pub index: u32,
    pub width: f64,
    pub height: f64,
}

/// Paginate several surfaces onto `config.page_size` pages.
///
/// A zero-height surface contributes no slices and an
/// [`PageError::EmptyInput`] status; a surface with an unusable width
/// fails alone.
///
/// # Errors
/// [`DocStructError::InvalidTargetDimensions`] when the configured page size
/// is not positive; no surface is paginated in that case.
pub fn paginate_surfaces(
    surfaces: &[SurfaceExtent],
    config: &ReconstructionConfig,
) -> Result<ReconstructionOutput, DocStructError> {
    let start = Instant::now();
    let page = config.page_size;
    if !page.is_valid() {
        return Err(DocStructError::InvalidTargetDimensions {
            width: page.width,
            height: page.height,
        });
    }
    info!(
        "Paginating {} surfaces onto {}x{} pages",
        surfaces.len(),
        page.width,
        page.height
    );

    let mut outcomes: Vec<PageOutcome<PageSlice>> = Vec::with_capacity(surfaces.len());
    for surface in surfaces {
        let mut outcome = PageOutcome::ok(surface.index, Vec::new());
        match paginate::paginate(surface.height, surface.width, page.width, page.height) {
            Ok(slices) if slices.is_empty() => {
                outcome.error = Some(PageError::EmptyInput {
                    page: surface.index,
                });
            }
            Ok(slices) => outcome.units = slices,
            Err(e) => {
                warn!("Surface {}: {}", surface.index, e);
                outcome.error = Some(PageError::TaskFailed {
                    page: surface.index,
                    detail: e.to_string(),
                });
            }
        }
        outcomes.push(outcome);
    }

    Ok(finish(Units::Paginated(outcomes), start, config))
}

// ── File helpers ─────────────────────────────────────────────────────────

/// Read a JSON array of [`TextFragment`]s and group it by page.
pub async fn load_fragments(path: impl AsRef<Path>) -> Result<Vec<PageFragments>, DocStructError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocStructError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => DocStructError::InvalidFragments {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })?;
    parse_fragments(&raw).map_err(|e| DocStructError::InvalidFragments {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Parse a JSON array of fragments and group it by page.
pub fn parse_fragments(json: &str) -> Result<Vec<PageFragments>, serde_json::Error> {
    let fragments: Vec<TextFragment> = serde_json::from_str(json)?;
    Ok(PageFragments::group(fragments))
}

/// Load a fragment file and reconstruct it.
pub async fn reconstruct_file(
    path: impl AsRef<Path>,
    config: &ReconstructionConfig,
) -> Result<ReconstructionOutput, DocStructError> {
    let pages = load_fragments(path).await?;
    reconstruct(pages, config).await
}

/// Reconstruct a fragment file and write the output as pretty JSON.
///
/// The write is atomic: a temp file in the destination directory is
/// persisted over `output_path` only once fully written.
pub async fn reconstruct_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ReconstructionConfig,
) -> Result<ReconstructionStats, DocStructError> {
    let output = reconstruct_file(input_path, config).await?;
    let path = output_path.as_ref().to_path_buf();
    let json = serde_json::to_vec_pretty(&output)
        .map_err(|e| DocStructError::Internal(format!("serialise output: {e}")))?;

    tokio::task::spawn_blocking(move || write_atomic(&path, &json))
        .await
        .map_err(|e| DocStructError::Internal(format!("Write task panicked: {e}")))??;

    Ok(output.stats)
}

/// Write `bytes` to `path` via a temp file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocStructError> {
    let write_err = |source: std::io::Error| DocStructError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Decode a raster surface image from disk.
pub fn load_surface(path: impl AsRef<Path>) -> Result<image::DynamicImage, DocStructError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DocStructError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    image::open(path).map_err(|e| DocStructError::InvalidSurface {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: u32, rows: &[(f64, f64)]) -> PageFragments {
        PageFragments::new(
            index,
            rows.iter()
                .map(|&(y, h)| TextFragment::new(format!("p{index} y{y}"), 0.0, y, 40.0, h).on_page(index))
                .collect(),
        )
    }

    #[test]
    fn empty_page_reports_empty_input() {
        let out: PageOutcome<Block> =
            process_page(PageFragments::new(4, Vec::new()), &LayoutProfile::default(), YAxis::Up);
        assert!(out.units.is_empty());
        assert_eq!(out.error, Some(PageError::EmptyInput { page: 4 }));
    }

    #[test]
    fn grid_page_yields_one_grid() {
        let out: PageOutcome<Grid> = process_page(
            page(0, &[(100.0, 10.0), (80.0, 10.0)]),
            &LayoutProfile::default(),
            YAxis::Up,
        );
        assert_eq!(out.units.len(), 1);
        assert_eq!(out.units[0].rows.len(), 2);
        assert_eq!(out.line_count, 2);
        assert_eq!(out.fragment_count, 2);
    }

    #[test]
    fn sequential_isolates_empty_pages() {
        let config = ReconstructionConfig::default();
        let output = reconstruct_blocking(
            vec![
                page(0, &[(100.0, 20.0), (70.0, 10.0)]),
                PageFragments::new(1, Vec::new()),
                page(2, &[(50.0, 10.0)]),
            ],
            &config,
        )
        .unwrap();
        assert_eq!(output.stats.total_pages, 3);
        assert_eq!(output.stats.processed_pages, 2);
        assert_eq!(output.stats.empty_pages, 1);
        assert_eq!(output.stats.failed_pages, 0);
        assert_eq!(output.document.blocks().len(), 3);
        assert_eq!(output.document.boundary_count(), 2);
        assert!(output.into_result().is_ok());
    }

    #[test]
    fn paginated_target_is_rejected_for_fragments() {
        let config = ReconstructionConfig::builder()
            .target(ConversionTarget::Paginated)
            .build()
            .unwrap();
        assert!(matches!(
            reconstruct_blocking(vec![page(0, &[(1.0, 1.0)])], &config),
            Err(DocStructError::InvalidConfig(_))
        ));
    }

    #[test]
    fn surfaces_isolate_bad_width() {
        let config = ReconstructionConfig::builder()
            .page_size(500.0, 700.0)
            .build()
            .unwrap();
        let output = paginate_surfaces(
            &[
                SurfaceExtent { index: 0, width: 1000.0, height: 2500.0 },
                SurfaceExtent { index: 1, width: 0.0, height: 100.0 },
                SurfaceExtent { index: 2, width: 1000.0, height: 0.0 },
            ],
            &config,
        )
        .unwrap();
        assert_eq!(output.document.slices().len(), 2);
        assert_eq!(output.stats.failed_pages, 1);
        assert_eq!(output.stats.empty_pages, 1);
        assert!(output.into_result().is_err());
    }

    #[test]
    fn surfaces_reject_bad_page_size() {
        let mut config = ReconstructionConfig::default();
        config.page_size.height = 0.0;
        let err = paginate_surfaces(
            &[SurfaceExtent { index: 0, width: 10.0, height: 10.0 }],
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, DocStructError::InvalidTargetDimensions { .. }));
    }

    #[test]
    fn parse_groups_pages() {
        let pages = parse_fragments(
            r#"[{"text":"b","x":0,"y":1,"page_index":1},{"text":"a","x":0,"y":1}]"#,
        )
        .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].fragments[0].text, "a");
    }

    #[test]
    fn atomic_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_atomic(&path, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }
}
