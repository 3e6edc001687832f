//! Document Assembler: order per-page outcomes into one [`Document`].
//!
//! Pages may finish in any order on the worker pool. Assembly stable-sorts
//! them by page index (so input already in page order is kept as is), lays
//! each page's units out in their original order, and puts a
//! [`Element::PageBoundary`] between consecutive pages. Each page also yields
//! a [`PageReport`] so the caller can report partial success.

use crate::output::{Body, Document, Element, PageOutcome, PageReport, Units};
use tracing::debug;

/// Assemble per-page outcomes into a document.
pub fn assemble(units: Units) -> Document {
    let document = match units {
        Units::Prose(pages) => {
            let (elements, reports) = interleave(pages);
            Document {
                body: Body::Prose(elements),
                pages: reports,
            }
        }
        Units::Tabular(pages) => {
            let (elements, reports) = interleave(pages);
            Document {
                body: Body::Tabular(elements),
                pages: reports,
            }
        }
        Units::Paginated(pages) => {
            let (elements, reports) = interleave(pages);
            Document {
                body: Body::Paginated(elements),
                pages: reports,
            }
        }
    };

    debug!(
        "Assembled {:?} document: {} pages, {} boundaries",
        document.target(),
        document.pages.len(),
        document.boundary_count()
    );
    document
}

fn interleave<T>(mut pages: Vec<PageOutcome<T>>) -> (Vec<Element<T>>, Vec<PageReport>) {
    pages.sort_by_key(|p| p.page_index);

    let mut elements = Vec::with_capacity(pages.iter().map(|p| p.units.len() + 1).sum());
    let mut reports = Vec::with_capacity(pages.len());

    for (i, page) in pages.into_iter().enumerate() {
        if i > 0 {
            elements.push(Element::PageBoundary {
                page_index: page.page_index,
            });
        }
        reports.push(PageReport {
            page_index: page.page_index,
            fragment_count: page.fragment_count,
            line_count: page.line_count,
            unit_count: page.units.len(),
            error: page.error,
            warnings: page.warnings,
        });
        elements.extend(page.units.into_iter().map(Element::Unit));
    }

    (elements, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;
    use crate::model::{Block, BlockKind, Grid, PageSlice};

    fn block(text: &str) -> Block {
        Block {
            kind: BlockKind::Paragraph,
            lines: Vec::new(),
            text: text.to_string(),
            diagnostic: None,
        }
    }

    #[test]
    fn pages_sorted_and_separated() {
        let doc = assemble(Units::Prose(vec![
            PageOutcome::ok(2, vec![block("c")]),
            PageOutcome::ok(0, vec![block("a1"), block("a2")]),
            PageOutcome::ok(1, vec![block("b")]),
        ]));

        let texts: Vec<&str> = doc.blocks().iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, ["a1", "a2", "b", "c"]);
        assert_eq!(doc.boundary_count(), 2);
        match &doc.body {
            Body::Prose(els) => {
                assert_eq!(els[2], Element::PageBoundary { page_index: 1 });
                assert_eq!(els[4], Element::PageBoundary { page_index: 2 });
            }
            other => panic!("unexpected body {other:?}"),
        }
        let idx: Vec<u32> = doc.pages.iter().map(|p| p.page_index).collect();
        assert_eq!(idx, [0, 1, 2]);
    }

    #[test]
    fn single_page_has_no_boundary() {
        let doc = assemble(Units::Tabular(vec![PageOutcome::ok(
            0,
            vec![Grid::new(vec![vec!["x".into()]])],
        )]));
        assert_eq!(doc.boundary_count(), 0);
        assert_eq!(doc.grids().len(), 1);
    }

    #[test]
    fn empty_input_gives_empty_document() {
        let doc = assemble(Units::Paginated(Vec::new()));
        assert!(doc.slices().is_empty());
        assert!(doc.pages.is_empty());
        assert_eq!(doc.to_units(), Units::Paginated(Vec::new()));
    }

    #[test]
    fn reassembly_is_identity() {
        let mut failed = PageOutcome::ok(1, vec![Block::placeholder("worker failed")]);
        failed.error = Some(PageError::TaskFailed {
            page: 1,
            detail: "panic".into(),
        });
        let slice = PageSlice {
            source_y_offset: 0.0,
            source_height: 10.0,
            target_width: 5.0,
            target_height: 5.0,
        };

        let prose = assemble(Units::Prose(vec![
            PageOutcome::ok(0, vec![block("a")]),
            failed,
            PageOutcome::ok(3, vec![block("b"), block("c")]),
        ]));
        assert_eq!(assemble(prose.to_units()), prose);

        let paged = assemble(Units::Paginated(vec![
            PageOutcome::ok(0, vec![slice, slice]),
            PageOutcome::ok(1, Vec::new()),
            PageOutcome::ok(2, vec![slice]),
        ]));
        let again = assemble(paged.to_units());
        assert_eq!(again, paged);
        assert_eq!(
            serde_json::to_string(&again).unwrap(),
            serde_json::to_string(&paged).unwrap()
        );
    }
}
