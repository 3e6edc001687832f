//! Cut a materialised raster surface into page images.
//!
//! The whole flow has to be rendered to one canvas before it can be sliced,
//! because the paginator needs the total height up front. Memory therefore
//! grows with document length; callers rendering very long flows should cap
//! the surface width before handing it over.
//!
//! Slice boundaries are rounded to whole pixel rows with the same rounding
//! on both sides of every boundary, so adjacent page images share no rows
//! and skip none.

use crate::error::DocStructError;
use crate::model::PageSlice;
use crate::pipeline::paginate::paginate;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

/// Crop `surface` along each slice and scale every piece to
/// `target_px_width` pixels wide (aspect ratio preserved).
///
/// Slices are interpreted in surface pixel units. A `target_px_width` of 0
/// keeps the surface's own width.
pub fn slice_surface(
    surface: &DynamicImage,
    slices: &[PageSlice],
    target_px_width: u32,
) -> Vec<DynamicImage> {
    let (width, height) = surface.dimensions();

    slices
        .iter()
        .map(|slice| {
            let y0 = pixel_row(slice.source_y_offset, height);
            let y1 = pixel_row(slice.source_end(), height);
            let piece = surface.crop_imm(0, y0, width, y1.saturating_sub(y0));

            if target_px_width == 0 || target_px_width == width || piece.height() == 0 {
                return piece;
            }
            let scaled_height = ((piece.height() as f64 * target_px_width as f64 / width as f64)
                .round() as u32)
                .max(1);
            piece.resize_exact(target_px_width, scaled_height, FilterType::Triangle)
        })
        .collect()
}

/// Paginate a surface image for pages of `page_width` x `page_height` and
/// cut it in one step.
pub fn paginate_image(
    surface: &DynamicImage,
    page_width: f64,
    page_height: f64,
    target_px_width: u32,
) -> Result<Vec<(PageSlice, DynamicImage)>, DocStructError> {
    let (width, height) = surface.dimensions();
    let slices = paginate(height as f64, width as f64, page_width, page_height)?;
    let images = slice_surface(surface, &slices, target_px_width);
    debug!(
        "Cut {}x{} surface into {} page images",
        width,
        height,
        images.len()
    );
    Ok(slices.into_iter().zip(images).collect())
}

fn pixel_row(y: f64, height: u32) -> u32 {
    (y.round().max(0.0) as u32).min(height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn striped(width: u32, height: u32) -> DynamicImage {
        // Each row's red channel encodes its index mod 256.
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |_, y| {
            Rgba([(y % 256) as u8, 0, 0, 255])
        }))
    }

    #[test]
    fn pieces_cover_every_row_once() {
        let surface = striped(10, 2500);
        let pages = paginate_image(&surface, 5.0, 7.0, 0).unwrap();
        // px_per_page = (10 / 5) * 7 = 14 rows
        assert_eq!(pages.len(), 179);
        let rows: u32 = pages.iter().map(|(_, img)| img.height()).sum();
        assert_eq!(rows, 2500);
    }

    #[test]
    fn fractional_boundaries_do_not_overlap() {
        let surface = striped(3, 100);
        // px_per_page = (3 / 2) * 7 = 10.5 rows
        let pages = paginate_image(&surface, 2.0, 7.0, 0).unwrap();
        let rows: u32 = pages.iter().map(|(_, img)| img.height()).sum();
        assert_eq!(rows, 100);
        let first = &pages[1].1;
        // Second page starts at row round(10.5) = 11 (round half away from zero).
        assert_eq!(first.get_pixel(0, 0)[0], 11);
    }

    #[test]
    fn pieces_scale_to_target_width() {
        let surface = striped(100, 300);
        let pages = paginate_image(&surface, 50.0, 100.0, 50).unwrap();
        // px_per_page = 200 → pages of 200 and 100 rows, halved.
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].1.dimensions(), (50, 100));
        assert_eq!(pages[1].1.dimensions(), (50, 50));
    }

    #[test]
    fn whole_page_surface_has_no_empty_image() {
        // (114 / 50) * 50 is a hair under 114 rows in floating point.
        let surface = striped(114, 114);
        let pages = paginate_image(&surface, 50.0, 50.0, 0).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].1.height(), 114);
        assert!(pages.iter().all(|(_, img)| img.height() > 0));
    }

    #[test]
    fn invalid_page_size_propagates() {
        let surface = striped(10, 10);
        assert!(paginate_image(&surface, 0.0, 7.0, 0).is_err());
    }
}
