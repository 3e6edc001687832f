//! Per-page progress events.
//!
//! A run reports `on_conversion_start`, then one `on_page_start` and exactly
//! one of `on_page_complete` / `on_page_error` per selected page, then
//! `on_conversion_complete`. Attach a callback with
//! [`crate::config::ReconstructionConfigBuilder::progress_callback`].
//!
//! ```rust
//! use docstruct::{ConversionProgressCallback, ReconstructionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! #[derive(Default)]
//! struct EmptyPages(AtomicUsize);
//!
//! impl ConversionProgressCallback for EmptyPages {
//!     fn on_page_error(&self, page_num: usize, _total_pages: usize, error: &str) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!         eprintln!("skipped page {page_num}: {error}");
//!     }
//! }
//!
//! let config = ReconstructionConfig::builder()
//!     .progress_callback(Arc::new(EmptyPages::default()))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Receiver for reconstruction and pagination progress.
///
/// Page numbers are 1-based. Under [`crate::reconstruct`] the page events
/// arrive from worker completion, so they interleave in any page order;
/// [`crate::reconstruct_blocking`] emits them strictly in page order. Every
/// method is a no-op unless overridden.
pub trait ConversionProgressCallback: Send + Sync {
    /// `total_pages` is the number of pages left after page selection.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// A page was handed to a worker.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// `unit_count` counts the blocks, grids or slices the page contributed.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, unit_count: usize) {
        let _ = (page_num, total_pages, unit_count);
    }

    /// The page had no input or its worker failed; `error` is the
    /// [`crate::PageError`] display text.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// `success_count` excludes empty and failed pages.
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// Ignores every event.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Shared callback handle as stored in [`crate::config::ReconstructionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconstructionConfig;
    use crate::convert::reconstruct_blocking;
    use crate::model::{PageFragments, TextFragment};
    use std::sync::Mutex;

    #[derive(Default)]
    struct EventLog(Mutex<Vec<String>>);

    impl EventLog {
        fn push(&self, event: String) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl ConversionProgressCallback for EventLog {
        fn on_conversion_start(&self, total_pages: usize) {
            self.push(format!("start {total_pages}"));
        }

        fn on_page_start(&self, page_num: usize, total_pages: usize) {
            self.push(format!("page {page_num}/{total_pages}"));
        }

        fn on_page_complete(&self, page_num: usize, _total_pages: usize, unit_count: usize) {
            self.push(format!("done {page_num} ({unit_count})"));
        }

        fn on_page_error(&self, page_num: usize, _total_pages: usize, _error: &str) {
            self.push(format!("error {page_num}"));
        }

        fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
            self.push(format!("complete {success_count}/{total_pages}"));
        }
    }

    fn one_line_page(page_index: u32) -> PageFragments {
        let fragment = TextFragment::new("Body text", 72.0, 700.0, 60.0, 10.0).on_page(page_index);
        PageFragments::new(page_index, vec![fragment])
    }

    #[test]
    fn sequential_run_reports_events_in_page_order() {
        let log = Arc::new(EventLog::default());
        let config = ReconstructionConfig::builder()
            .progress_callback(log.clone())
            .build()
            .unwrap();
        let pages = vec![
            one_line_page(0),
            PageFragments::new(1, Vec::new()),
            one_line_page(2),
        ];

        let output = reconstruct_blocking(pages, &config).unwrap();
        assert_eq!(output.stats.empty_pages, 1);

        let events = log.0.lock().unwrap().clone();
        assert_eq!(
            events,
            [
                "start 3",
                "page 1/3",
                "done 1 (1)",
                "page 2/3",
                "error 2",
                "page 3/3",
                "done 3 (1)",
                "complete 2/3",
            ]
        );
        let errors = events.iter().filter(|e| e.starts_with("error")).count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn noop_callback_accepts_a_full_run() {
        let config = ReconstructionConfig::builder()
            .progress_callback(Arc::new(NoopProgressCallback))
            .build()
            .unwrap();
        let output = reconstruct_blocking(vec![one_line_page(0)], &config).unwrap();
        assert_eq!(output.stats.processed_pages, 1);
    }
}
