//! Paginator: cut one tall raster surface into fixed-size output pages.
//!
//! Once the surface is scaled uniformly to `target_width`, exactly
//! `px_per_page = (source_width / target_width) * target_height` units of
//! source height fill one output page. Slices are laid end to end from
//! offset 0; the last one takes only the remainder.
//!
//! Offsets are computed as `i * px_per_page` rather than by accumulation, so
//! rounding error does not grow with the page count, and the final slice is
//! defined as `source_height - offset`, which makes the heights sum to the
//! source height. A remainder within rounding error of zero is folded into
//! the previous page instead of becoming a page of its own.

use crate::error::DocStructError;
use crate::model::PageSlice;
use tracing::debug;

/// Upper bound on slices emitted for one surface.
pub const MAX_PAGES: usize = 1_000_000;

/// Trailing remainder, relative to the source height, that is treated as
/// rounding error rather than a page of its own.
const SLIVER: f64 = 1e-9;

/// Source height that maps onto one output page.
pub fn px_per_page(source_width: f64, target_width: f64, target_height: f64) -> f64 {
    (source_width / target_width) * target_height
}

/// Slice a surface of `source_height` x `source_width` into pages of
/// `target_width` x `target_height`.
///
/// # Errors
/// * [`DocStructError::InvalidTargetDimensions`] when either target
///   dimension is non-positive or non-finite.
/// * [`DocStructError::InvalidSourceDimensions`] when the source width is
///   non-positive or non-finite.
/// * [`DocStructError::TooManyPages`] when the surface would need more than
///   [`MAX_PAGES`] slices.
///
/// A zero-height (or non-finite height) surface yields an empty result.
pub fn paginate(
    source_height: f64,
    source_width: f64,
    target_width: f64,
    target_height: f64,
) -> Result<Vec<PageSlice>, DocStructError> {
    if !(target_width > 0.0 && target_width.is_finite())
        || !(target_height > 0.0 && target_height.is_finite())
    {
        return Err(DocStructError::InvalidTargetDimensions {
            width: target_width,
            height: target_height,
        });
    }
    if !(source_width > 0.0 && source_width.is_finite()) {
        return Err(DocStructError::InvalidSourceDimensions {
            width: source_width,
        });
    }
    if !(source_height > 0.0 && source_height.is_finite()) {
        debug!("Empty surface (height {}), no pages", source_height);
        return Ok(Vec::new());
    }

    let step = px_per_page(source_width, target_width, target_height);
    let pages = (source_height / step).ceil();
    if !(step > 0.0) || !(pages <= MAX_PAGES as f64) {
        return Err(DocStructError::TooManyPages {
            source_height,
            px_per_page: step,
            limit: MAX_PAGES,
        });
    }
    let mut count = (pages as usize).max(1);
    // A whole number of pages can divide to n + ε; drop the sliver page.
    while count > 1 && source_height - (count - 1) as f64 * step <= source_height * SLIVER {
        count -= 1;
    }

    let slices: Vec<PageSlice> = (0..count)
        .map(|i| {
            let offset = if i == 0 { 0.0 } else { i as f64 * step };
            let height = if i + 1 == count {
                source_height - offset
            } else {
                step
            };
            PageSlice {
                source_y_offset: offset,
                source_height: height,
                target_width,
                target_height,
            }
        })
        .collect();

    debug!(
        "Paginated {}x{} surface into {} pages ({} source units per page)",
        source_width,
        source_height,
        slices.len(),
        step
    );

    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(slices: &[PageSlice]) -> f64 {
        slices.iter().map(|s| s.source_height).sum()
    }

    #[test]
    fn two_pages_with_remainder() {
        let slices = paginate(2500.0, 1000.0, 500.0, 700.0).unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].source_y_offset, 0.0);
        assert_eq!(slices[0].source_height, 1400.0);
        assert_eq!(slices[1].source_y_offset, 1400.0);
        assert_eq!(slices[1].source_height, 1100.0);
        assert_eq!(total(&slices), 2500.0);
    }

    #[test]
    fn exactly_one_page() {
        let slices = paginate(1400.0, 1000.0, 500.0, 700.0).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].source_height, 1400.0);
    }

    #[test]
    fn shorter_than_one_page() {
        let slices = paginate(300.0, 1000.0, 500.0, 700.0).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].source_height, 300.0);
        assert_eq!(slices[0].target_height, 700.0);
    }

    #[test]
    fn slices_are_contiguous_and_exact() {
        for &(h, w, tw, th) in &[
            (10_000.0, 1240.0, 595.0, 842.0),
            (333.3, 17.0, 3.0, 5.0),
            (98_765.4321, 800.0, 210.0, 297.0),
        ] {
            let slices = paginate(h, w, tw, th).unwrap();
            let step = px_per_page(w, tw, th);
            assert_eq!(slices.len(), (h / step).ceil() as usize);
            assert!((total(&slices) - h).abs() < 1e-6 * h);
            for pair in slices.windows(2) {
                assert!((pair[0].source_end() - pair[1].source_y_offset).abs() < 1e-9 * h);
            }
            assert!(slices.iter().all(|s| s.source_height > 0.0));
        }
    }

    #[test]
    fn non_positive_target_is_rejected() {
        assert!(matches!(
            paginate(100.0, 100.0, 0.0, 700.0),
            Err(DocStructError::InvalidTargetDimensions { .. })
        ));
        assert!(matches!(
            paginate(100.0, 100.0, 500.0, -1.0),
            Err(DocStructError::InvalidTargetDimensions { .. })
        ));
        assert!(matches!(
            paginate(100.0, 100.0, f64::NAN, 700.0),
            Err(DocStructError::InvalidTargetDimensions { .. })
        ));
    }

    #[test]
    fn non_positive_source_width_is_rejected() {
        assert!(matches!(
            paginate(100.0, 0.0, 500.0, 700.0),
            Err(DocStructError::InvalidSourceDimensions { .. })
        ));
    }

    #[test]
    fn whole_page_multiples_have_no_sliver_page() {
        // 114 / 50 * 50 rounds just below 114.
        let slices = paginate(114.0, 114.0, 50.0, 50.0).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].source_height, 114.0);
    }

    #[test]
    fn exact_multiples_give_exactly_n_positive_slices() {
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move || {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (seed >> 11) as f64 / (1u64 << 53) as f64
        };
        for _ in 0..20_000 {
            let source_width = 1.0 + next() * 3000.0;
            let target_width = 1.0 + next() * 1000.0;
            let target_height = 1.0 + next() * 1500.0;
            let n = 1 + (next() * 60.0) as usize;
            let step = px_per_page(source_width, target_width, target_height);
            let h = step * n as f64;

            let slices = paginate(h, source_width, target_width, target_height).unwrap();
            assert_eq!(slices.len(), n, "h = {h}, step = {step}");
            assert!(slices.iter().all(|s| s.source_height > h * SLIVER));
            assert!((total(&slices) - h).abs() <= 1e-9 * h);
        }
    }

    #[test]
    fn vanishing_page_step_is_rejected_without_panicking() {
        let result = std::panic::catch_unwind(|| paginate(1.0, 1e-300, 1e300, 1.0));
        assert!(matches!(
            result,
            Ok(Err(DocStructError::TooManyPages { limit: MAX_PAGES, .. }))
        ));
        assert!(matches!(
            paginate(1e12, 1.0, 1000.0, 1.0),
            Err(DocStructError::TooManyPages { .. })
        ));
    }

    #[test]
    fn unbounded_page_step_gives_one_page() {
        let slices = paginate(50.0, 1e300, 1e-300, 1.0).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].source_y_offset, 0.0);
        assert_eq!(slices[0].source_height, 50.0);
    }

    #[test]
    fn zero_height_surface_is_empty() {
        assert!(paginate(0.0, 1000.0, 500.0, 700.0).unwrap().is_empty());
    }
}
