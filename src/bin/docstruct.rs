//! CLI binary for docstruct.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReconstructionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docstruct::pipeline::{encode, raster};
use docstruct::{
    load_surface, paginate_surfaces, reconstruct_file, reconstruct_to_file, write_atomic, Block,
    Body, BlockKind, ConversionProgressCallback, ConversionTarget, Element, Grid, LayoutProfile,
    PageSelection, ProgressCallback, ReconstructionConfig, SurfaceExtent, YAxis,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
/// Pages may complete out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Reconstructing");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reconstructing {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, unit_count: usize) {
        let secs = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{unit_count:>4} units")),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(error),
            dim(&format!("{secs:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} pages reconstructed", green("✔"), bold(&success_count.to_string()));
        } else {
            eprintln!(
                "{} {}/{} pages reconstructed  ({} empty or failed)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Headings and paragraphs as JSON (stdout)
  docstruct reconstruct fragments.json

  # Plain-text rendition of the blocks
  docstruct reconstruct fragments.json --format text

  # Tables with a tighter column gap, pages 2-4, written to a file
  docstruct reconstruct fragments.json --target tabular --dense-table --pages 2-4 -o tables.json

  # Slice a 1000x2500 surface onto 500x700 pages
  docstruct paginate --source-width 1000 --source-height 2500 --page-width 500 --page-height 700

  # Slice a rendered image and write page PNGs
  docstruct paginate --image flow.png --out-dir pages/

INPUT FORMAT:
  A JSON array of fragments:
    [{"text": "Title", "x": 72, "y": 760, "width": 120, "height": 18, "page_index": 0}, ...]
  width, height and page_index default to 0.
"#;

/// Rebuild document structure from positioned text fragments.
#[derive(Parser, Debug)]
#[command(
    name = "docstruct",
    version,
    about = "Rebuild headings, paragraphs and tables from positioned text fragments",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCSTRUCT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCSTRUCT_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "DOCSTRUCT_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconstruct blocks or grids from a fragment file.
    Reconstruct(ReconstructArgs),
    /// Cut a tall surface into fixed-size pages.
    Paginate(PaginateArgs),
}

#[derive(Args, Debug)]
struct ReconstructArgs {
    /// JSON file holding an array of text fragments.
    input: PathBuf,

    /// Write JSON output to this file instead of stdout.
    #[arg(short, long, env = "DOCSTRUCT_OUTPUT")]
    output: Option<PathBuf>,

    /// What to reconstruct.
    #[arg(long, env = "DOCSTRUCT_TARGET", value_enum, default_value = "prose")]
    target: TargetArg,

    /// stdout format.
    #[arg(long, value_enum, default_value = "json")]
    format: FormatArg,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "DOCSTRUCT_PAGES", default_value = "all")]
    pages: String,

    /// Max pages processed at once. Default: available cores.
    #[arg(short, long, env = "DOCSTRUCT_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Start from the dense-table profile (tighter line and column gaps).
    #[arg(long)]
    dense_table: bool,

    /// Fragment y grows downward (screen coordinates).
    #[arg(long)]
    y_down: bool,

    /// Max vertical distance for two fragments to share a line.
    #[arg(long, env = "DOCSTRUCT_LINE_TOLERANCE")]
    line_tolerance: Option<f64>,

    /// Heading threshold as a multiple of the page's mean fragment height.
    #[arg(long, env = "DOCSTRUCT_HEADING_FACTOR")]
    heading_factor: Option<f64>,

    /// Paragraph break threshold as a multiple of the median line gap.
    #[arg(long, env = "DOCSTRUCT_GAP_MULTIPLIER")]
    gap_multiplier: Option<f64>,

    /// Horizontal gap that separates two table cells.
    #[arg(long, env = "DOCSTRUCT_COLUMN_GAP")]
    column_gap: Option<f64>,
}

#[derive(Args, Debug)]
struct PaginateArgs {
    /// Rendered surface image to slice.
    #[arg(long, conflicts_with_all = ["source_width", "source_height"])]
    image: Option<PathBuf>,

    /// Surface width, when only the extent is known.
    #[arg(long, requires = "source_height")]
    source_width: Option<f64>,

    /// Surface height, when only the extent is known.
    #[arg(long, requires = "source_width")]
    source_height: Option<f64>,

    /// Target page width.
    #[arg(long, env = "DOCSTRUCT_PAGE_WIDTH", default_value_t = 595.0)]
    page_width: f64,

    /// Target page height.
    #[arg(long, env = "DOCSTRUCT_PAGE_HEIGHT", default_value_t = 842.0)]
    page_height: f64,

    /// Scale page images to this pixel width (0 keeps the surface width).
    #[arg(long, default_value_t = 0)]
    px_width: u32,

    /// Write one PNG per page into this directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Embed base64 PNG page images in the JSON output.
    #[arg(long)]
    embed: bool,

    /// Write JSON output to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum TargetArg {
    Prose,
    Tabular,
}

impl From<TargetArg> for ConversionTarget {
    fn from(v: TargetArg) -> Self {
        match v {
            TargetArg::Prose => ConversionTarget::Prose,
            TargetArg::Tabular => ConversionTarget::Tabular,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
enum FormatArg {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose is given.
    let show_progress = !cli.quiet
        && !cli.no_progress
        && matches!(cli.command, Command::Reconstruct(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Reconstruct(ref args) => {
            let progress: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
            } else {
                None
            };
            run_reconstruct(args, progress, cli.quiet).await
        }
        Command::Paginate(ref args) => run_paginate(args, cli.quiet),
    }
}

async fn run_reconstruct(
    args: &ReconstructArgs,
    progress: Option<ProgressCallback>,
    quiet: bool,
) -> Result<()> {
    let config = build_config(args, progress)?;

    if let Some(ref output_path) = args.output {
        let stats = reconstruct_to_file(&args.input, output_path, &config)
            .await
            .context("Reconstruction failed")?;
        if !quiet {
            eprintln!(
                "{}  {}/{} pages  {} units  {}ms  →  {}",
                if stats.failed_pages == 0 { green("✔") } else { cyan("⚠") },
                stats.processed_pages,
                stats.total_pages,
                stats.total_units,
                stats.duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
        return Ok(());
    }

    let output = reconstruct_file(&args.input, &config)
        .await
        .context("Reconstruction failed")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        FormatArg::Json => {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
        }
        FormatArg::Text => {
            handle
                .write_all(render_text(&output.document.body).as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if !quiet {
        eprintln!(
            "{}",
            dim(&format!(
                "{} fragments → {} lines → {} units  ({} warnings)  {}ms",
                output.stats.total_fragments,
                output.stats.total_lines,
                output.stats.total_units,
                output.stats.warning_count,
                output.stats.duration_ms
            ))
        );
    }
    Ok(())
}

/// Map CLI args to `ReconstructionConfig`.
fn build_config(
    args: &ReconstructArgs,
    progress: Option<ProgressCallback>,
) -> Result<ReconstructionConfig> {
    let profile = if args.dense_table {
        LayoutProfile::dense_table()
    } else {
        LayoutProfile::default()
    };

    let mut builder = ReconstructionConfig::builder()
        .profile(profile)
        .target(args.target.into())
        .y_axis(if args.y_down { YAxis::Down } else { YAxis::Up })
        .pages(parse_pages(&args.pages)?);

    if let Some(n) = args.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(v) = args.line_tolerance {
        builder = builder.line_tolerance(v);
    }
    if let Some(v) = args.heading_factor {
        builder = builder.heading_factor(v);
    }
    if let Some(v) = args.gap_multiplier {
        builder = builder.paragraph_gap_multiplier(v);
    }
    if let Some(v) = args.column_gap {
        builder = builder.column_gap_threshold(v);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Plain-text rendition: headings prefixed with `#`, grid cells tab-separated,
/// form feeds between pages.
fn render_text(body: &Body) -> String {
    fn block_text(b: &Block) -> String {
        match b.kind {
            BlockKind::Heading => format!("# {}\n\n", b.text),
            BlockKind::Paragraph => format!("{}\n\n", b.text),
        }
    }
    fn grid_text(g: &Grid) -> String {
        let mut s: String = g.rows.iter().map(|r| r.join("\t") + "\n").collect();
        s.push('\n');
        s
    }
    fn render<T>(els: &[Element<T>], f: fn(&T) -> String) -> String {
        els.iter()
            .map(|e| match e {
                Element::Unit(u) => f(u),
                Element::PageBoundary { .. } => "\u{000C}\n".to_string(),
            })
            .collect()
    }

    match body {
        Body::Prose(els) => render(els, block_text),
        Body::Tabular(els) => render(els, grid_text),
        Body::Paginated(_) => String::new(),
    }
}

fn run_paginate(args: &PaginateArgs, quiet: bool) -> Result<()> {
    let json = if let Some(ref image_path) = args.image {
        paginate_image_file(args, image_path, quiet)?
    } else {
        let (Some(width), Some(height)) = (args.source_width, args.source_height) else {
            anyhow::bail!("Either --image or both --source-width and --source-height are required");
        };
        let config = ReconstructionConfig::builder()
            .target(ConversionTarget::Paginated)
            .page_size(args.page_width, args.page_height)
            .build()
            .context("Invalid configuration")?;
        let output = paginate_surfaces(&[SurfaceExtent { index: 0, width, height }], &config)
            .context("Pagination failed")?;
        if !quiet {
            eprintln!("{} {} pages", green("✔"), output.stats.total_units);
        }
        serde_json::to_value(&output).context("Failed to serialise output")?
    };

    let text = serde_json::to_string_pretty(&json).context("Failed to serialise output")?;
    match args.output {
        Some(ref path) => write_atomic(path, text.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{text}"),
    }
    Ok(())
}

fn paginate_image_file(args: &PaginateArgs, path: &Path, quiet: bool) -> Result<serde_json::Value> {
    let surface = load_surface(path).context("Failed to load surface")?;
    let pages = raster::paginate_image(&surface, args.page_width, args.page_height, args.px_width)
        .context("Pagination failed")?;

    if let Some(ref dir) = args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut slices = Vec::with_capacity(pages.len());
    let mut embedded = Vec::new();
    for (i, (slice, img)) in pages.iter().enumerate() {
        let page_num = i + 1;
        if let Some(ref dir) = args.out_dir {
            let out = dir.join(format!("page-{page_num:03}.png"));
            let png = encode::encode_png(img).context("Failed to encode page image")?;
            write_atomic(&out, &png).with_context(|| format!("Failed to write {}", out.display()))?;
        }
        if args.embed {
            embedded.push(encode::encode_page(page_num, img).context("Failed to encode page image")?);
        }
        slices.push(*slice);
    }

    if !quiet {
        eprintln!(
            "{} {} pages from {}",
            green("✔"),
            slices.len(),
            bold(&path.display().to_string())
        );
    }

    let mut value = serde_json::json!({ "slices": slices });
    if args.embed {
        value["images"] = serde_json::to_value(&embedded).context("Failed to serialise images")?;
    }
    Ok(value)
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: u32 = start.trim().parse().context("Invalid start page in range")?;
        let end: u32 = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<u32> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<u32>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }
        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: u32 = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}
