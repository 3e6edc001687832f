//! Block Classifier: merge lines into headings and paragraphs.
//!
//! Both thresholds are relative to the page itself:
//!
//! * a line is a heading when any of its fragments is taller than the page's
//!   mean fragment height times `heading_factor`, so a document rendered at
//!   twice the size classifies identically;
//! * a new block starts when the gap to the previous line exceeds the median
//!   of the gaps seen so far on the page times `gap_multiplier`, which adapts
//!   to single- vs double-spaced text without a fixed constant.

use crate::error::PageWarning;
use crate::model::{Block, BlockKind, Line, TextFragment};
use tracing::debug;

/// Default heading threshold relative to the page mean height.
pub const HEADING_FACTOR: f64 = 1.3;

/// Default paragraph-break threshold relative to the running median line gap.
pub const PARAGRAPH_GAP_MULTIPLIER: f64 = 1.8;

/// Classify lines with the default factors.
pub fn classify(lines: &[Line]) -> Vec<Block> {
    classify_with(lines, HEADING_FACTOR, PARAGRAPH_GAP_MULTIPLIER)
}

/// Classify lines (already in top-to-bottom order) into blocks.
pub fn classify_with(lines: &[Line], heading_factor: f64, gap_multiplier: f64) -> Vec<Block> {
    let kinds = line_kinds(lines, heading_factor);

    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Vec<Line> = Vec::new();
    let mut current_kind = BlockKind::Paragraph;
    let mut gaps: Vec<f64> = Vec::new();
    let mut prev_y: Option<f64> = None;

    for (line, kind) in lines.iter().zip(kinds) {
        let gap = prev_y.map(|y| (y - line.y_band).abs());

        let starts_block = match gap {
            // First line of the page has no predecessor.
            None => true,
            Some(g) => {
                kind != current_kind
                    || median(&gaps).is_some_and(|m| g > m * gap_multiplier)
            }
        };

        if starts_block && !current.is_empty() {
            blocks.push(finish_block(current_kind, std::mem::take(&mut current)));
        }
        if starts_block {
            current_kind = kind;
        }
        current.push(line.clone());

        if let Some(g) = gap {
            gaps.push(g);
        }
        prev_y = Some(line.y_band);
    }

    if !current.is_empty() {
        blocks.push(finish_block(current_kind, current));
    }

    debug!(
        "Classified {} lines into {} blocks ({} headings)",
        lines.len(),
        blocks.len(),
        blocks.iter().filter(|b| b.is_heading()).count()
    );

    blocks
}

/// Heading/paragraph kind of every line, in input order.
pub fn line_kinds(lines: &[Line], heading_factor: f64) -> Vec<BlockKind> {
    let threshold = mean_fragment_height(lines).map(|mean| mean * heading_factor);

    lines
        .iter()
        .map(|line| match threshold {
            Some(t) if line.fragments.iter().any(|f| f.height > t) => BlockKind::Heading,
            _ => BlockKind::Paragraph,
        })
        .collect()
}

/// Mean height over every fragment with a finite height, or `None` if there
/// are none.
pub fn mean_fragment_height(lines: &[Line]) -> Option<f64> {
    let (sum, count) = lines
        .iter()
        .flat_map(|l| l.fragments.iter())
        .filter(|f| f.height.is_finite())
        .fold((0.0, 0usize), |(sum, count), f| (sum + f.height, count + 1));

    (count > 0).then(|| sum / count as f64)
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

fn finish_block(kind: BlockKind, lines: Vec<Line>) -> Block {
    let text = lines
        .iter()
        .map(Line::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Block {
        kind,
        lines,
        text,
        diagnostic: None,
    }
}

/// Heuristic check that a page's fragments share one coordinate space.
///
/// Never fatal: the caller attaches the returned warnings to the page and
/// classifies anyway.
pub fn check_coordinate_space(
    page: u32,
    fragments: &[TextFragment],
    max_height_ratio: f64,
) -> Vec<PageWarning> {
    let mut warnings = Vec::new();

    let degenerate = fragments.iter().filter(|f| !f.is_well_formed()).count();
    if degenerate > 0 {
        warnings.push(PageWarning::DegenerateGeometry {
            page,
            count: degenerate,
        });
    }

    let (min, max) = fragments
        .iter()
        .filter(|f| f.is_well_formed())
        .fold((f64::INFINITY, 0.0_f64), |(min, max), f| {
            (min.min(f.height), max.max(f.height))
        });

    if min.is_finite() && min > 0.0 {
        let ratio = max / min;
        if ratio > max_height_ratio {
            warnings.push(PageWarning::InconsistentCoordinateSpace {
                page,
                min_height: min,
                max_height: max,
                ratio,
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::lines::build_lines;

    fn frag(text: &str, y: f64, h: f64) -> TextFragment {
        TextFragment::new(text, 0.0, y, 50.0, h)
    }

    #[test]
    fn uniform_heights_merge_into_one_paragraph() {
        let lines = build_lines(
            &[
                frag("Title", 100.0, 10.0),
                frag("Body line one", 80.0, 10.0),
                frag("Body line two", 65.0, 10.0),
            ],
            3.0,
        );
        let blocks = classify(&lines);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].lines.len(), 3);
        assert_eq!(blocks[0].text, "Title\nBody line one\nBody line two");
    }

    #[test]
    fn tall_first_line_is_heading() {
        let lines = build_lines(
            &[frag("BIG TITLE", 100.0, 20.0), frag("Normal body text", 70.0, 10.0)],
            3.0,
        );
        let blocks = classify(&lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Heading);
        assert_eq!(blocks[0].text, "BIG TITLE");
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn large_gap_splits_paragraphs() {
        // gaps: 12, 12, 40 (> 1.8 * 12), 12
        let lines = build_lines(
            &[
                frag("a", 200.0, 10.0),
                frag("b", 188.0, 10.0),
                frag("c", 176.0, 10.0),
                frag("d", 136.0, 10.0),
                frag("e", 124.0, 10.0),
            ],
            3.0,
        );
        let blocks = classify(&lines);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "a\nb\nc");
        assert_eq!(blocks[1].text, "d\ne");
    }

    #[test]
    fn second_line_never_gap_breaks() {
        // Only one gap observed: there is no median to compare against yet.
        let lines = build_lines(&[frag("a", 500.0, 10.0), frag("b", 100.0, 10.0)], 3.0);
        assert_eq!(classify(&lines).len(), 1);
    }

    #[test]
    fn heading_classification_is_scale_invariant() {
        let base = [(100.0, 24.0), (80.0, 10.0), (65.0, 11.0), (50.0, 16.0)];
        let kinds_at = |k: f64| {
            let frags: Vec<_> = base.iter().map(|&(y, h)| frag("t", y, h * k)).collect();
            line_kinds(&build_lines(&frags, 3.0), HEADING_FACTOR)
        };
        let reference = kinds_at(1.0);
        for k in [0.25, 0.5, 2.0, 7.0] {
            assert_eq!(kinds_at(k), reference, "scale {k}");
        }
    }

    #[test]
    fn empty_lines_give_no_blocks() {
        assert!(classify(&[]).is_empty());
    }

    #[test]
    fn coordinate_space_warnings() {
        let ok = [frag("a", 0.0, 10.0), frag("b", 0.0, 30.0)];
        assert!(check_coordinate_space(0, &ok, 12.0).is_empty());

        let wild = [frag("a", 0.0, 1.0), frag("b", 0.0, 400.0)];
        let w = check_coordinate_space(4, &wild, 12.0);
        assert!(matches!(
            w.as_slice(),
            [PageWarning::InconsistentCoordinateSpace { page: 4, .. }]
        ));

        let broken = [frag("a", f64::NAN, 10.0), frag("b", 0.0, 10.0)];
        let w = check_coordinate_space(1, &broken, 12.0);
        assert_eq!(w, vec![PageWarning::DegenerateGeometry { page: 1, count: 1 }]);
    }
}
