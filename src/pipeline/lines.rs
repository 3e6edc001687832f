//! Line Builder: cluster a page's fragments into horizontal text bands.
//!
//! A fragment joins the first existing band whose representative y lies
//! within `tolerance` of its own y; otherwise it opens a new band. The band
//! keeps the y of the fragment that opened it, so a long line made of many
//! slightly drifting runs cannot creep into the next line.
//!
//! The clustering is a plain fold over the input slice. No state outlives
//! one call.

use crate::config::YAxis;
use crate::model::{Line, TextFragment};
use tracing::debug;

/// Cluster fragments into lines, PDF-style axis (larger y is higher on the
/// page, so lines come back in descending y).
///
/// Total over any input: an empty slice gives an empty result.
pub fn build_lines(fragments: &[TextFragment], tolerance: f64) -> Vec<Line> {
    build_lines_oriented(fragments, tolerance, YAxis::Up)
}

/// Cluster fragments into lines, returning them in top-to-bottom reading
/// order for the given axis orientation.
pub fn build_lines_oriented(fragments: &[TextFragment], tolerance: f64, axis: YAxis) -> Vec<Line> {
    let tolerance = tolerance.max(0.0);

    let mut lines = fragments
        .iter()
        .fold(Vec::<Line>::new(), |mut lines, fragment| {
            match lines
                .iter_mut()
                .find(|line| (line.y_band - fragment.y).abs() <= tolerance)
            {
                Some(line) => line.fragments.push(fragment.clone()),
                None => lines.push(Line {
                    y_band: fragment.y,
                    fragments: vec![fragment.clone()],
                }),
            }
            lines
        });

    for line in &mut lines {
        line.fragments.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    match axis {
        YAxis::Up => lines.sort_by(|a, b| b.y_band.total_cmp(&a.y_band)),
        YAxis::Down => lines.sort_by(|a, b| a.y_band.total_cmp(&b.y_band)),
    }

    debug!(
        "Clustered {} fragments into {} lines (tolerance {})",
        fragments.len(),
        lines.len(),
        tolerance
    );

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, x: f64, y: f64) -> TextFragment {
        TextFragment::new(text, x, y, 10.0, 10.0)
    }

    #[test]
    fn empty_input_gives_no_lines() {
        assert!(build_lines(&[], 3.0).is_empty());
    }

    #[test]
    fn single_fragment_is_a_line() {
        let lines = build_lines(&[frag("solo", 4.0, 50.0)], 3.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].y_band, 50.0);
        assert_eq!(lines[0].fragments.len(), 1);
    }

    #[test]
    fn three_bands_top_to_bottom() {
        let frags = vec![
            frag("Body line two", 0.0, 65.0),
            frag("Title", 0.0, 100.0),
            frag("Body line one", 0.0, 80.0),
        ];
        let lines = build_lines(&frags, 3.0);
        let ys: Vec<f64> = lines.iter().map(|l| l.y_band).collect();
        assert_eq!(ys, vec![100.0, 80.0, 65.0]);
    }

    #[test]
    fn fragments_sorted_left_to_right_within_line() {
        let frags = vec![
            frag("world", 60.0, 100.0),
            frag("Hello", 0.0, 101.0),
            frag("big", 30.0, 99.0),
        ];
        let lines = build_lines(&frags, 3.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Hello big world");
    }

    #[test]
    fn band_keeps_first_fragment_y() {
        // 102.5 joins the band at 100; 105 is 5 away from the band's y and
        // must not be pulled in by the 102.5 neighbour.
        let frags = vec![frag("a", 0.0, 100.0), frag("b", 10.0, 102.5), frag("c", 20.0, 105.0)];
        let lines = build_lines(&frags, 3.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].y_band, 105.0);
        assert_eq!(lines[1].y_band, 100.0);
        assert_eq!(lines[1].fragments.len(), 2);
    }

    #[test]
    fn duplicates_are_retained() {
        let frags = vec![frag("x", 5.0, 10.0), frag("x", 5.0, 10.0)];
        let lines = build_lines(&frags, 3.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].fragments.len(), 2);
    }

    #[test]
    fn screen_axis_sorts_ascending() {
        let frags = vec![frag("bottom", 0.0, 300.0), frag("top", 0.0, 20.0)];
        let lines = build_lines_oriented(&frags, 3.0, YAxis::Down);
        assert_eq!(lines[0].text(), "top");
        assert_eq!(lines[1].text(), "bottom");
    }

    #[test]
    fn every_fragment_lands_in_exactly_one_line() {
        let frags: Vec<TextFragment> = (0..40)
            .map(|i| frag(&format!("f{i}"), (i * 7 % 50) as f64, (i % 9) as f64 * 2.2))
            .collect();
        let lines = build_lines(&frags, 3.0);
        let mut seen: Vec<String> = lines
            .iter()
            .flat_map(|l| l.fragments.iter().map(|f| f.text.clone()))
            .collect();
        seen.sort();
        let mut expected: Vec<String> = frags.iter().map(|f| f.text.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);
        for line in &lines {
            for f in &line.fragments {
                assert!((f.y - line.y_band).abs() <= 3.0);
            }
        }
    }
}
