//! Streaming reconstruction API: emit pages as they complete.
//!
//! Unlike the eager [`crate::convert::reconstruct`], which returns only after
//! every page finished, [`reconstruct_stream`] yields one
//! [`PageOutcome`] per page as soon as its worker is done. Pages arrive in
//! completion order; collect them and pass them through
//! [`crate::pipeline::assemble::assemble`] (via [`PageUnit::into_units`]) to
//! get the same document the eager API returns.
//!
//! The unit type picks the reading: `reconstruct_stream::<Block>` for prose,
//! `reconstruct_stream::<Grid>` for tables. `config.target` is not consulted.
//!
//! [`Block`]: crate::model::Block
//! [`Grid`]: crate::model::Grid

use crate::config::ReconstructionConfig;
use crate::convert::{run_page, PageUnit};
use crate::model::PageFragments;
use crate::output::PageOutcome;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-page outcomes.
pub type PageStream<T> = Pin<Box<dyn Stream<Item = PageOutcome<T>> + Send>>;

/// Reconstruct pages, streaming each outcome as it is ready.
///
/// Must be polled inside a tokio runtime; pages run on the blocking pool,
/// at most `config.concurrency` at once.
///
/// # Example
/// ```rust,no_run
/// use docstruct::{reconstruct_stream, Block, PageFragments, ReconstructionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let pages: Vec<PageFragments> = Vec::new();
/// let config = ReconstructionConfig::default();
/// let mut stream = reconstruct_stream::<Block>(pages, &config);
/// while let Some(page) = stream.next().await {
///     match page.error {
///         None => println!("Page {}: {} blocks", page.page_index + 1, page.units.len()),
///         Some(e) => eprintln!("{e}"),
///     }
/// }
/// # }
/// ```
pub fn reconstruct_stream<T: PageUnit>(
    pages: Vec<PageFragments>,
    config: &ReconstructionConfig,
) -> PageStream<T> {
    let profile = config.profile;
    let axis = config.y_axis;
    let selection = config.pages.clone();
    let selected: Vec<PageFragments> = pages
        .into_iter()
        .filter(|p| selection.selects(p.page_index))
        .collect();
    info!("Starting streaming reconstruction: {} pages", selected.len());

    let s = stream::iter(
        selected
            .into_iter()
            .map(move |page| run_page::<T>(page, profile, axis)),
    )
    .buffer_unordered(config.concurrency.max(1));

    Box::pin(s)
}
