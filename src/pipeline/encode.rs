//! Image encoding: page image → base64 PNG for embedding in JSON output.
//!
//! PNG is lossless, so text on a sliced page keeps its crisp edges; a page
//! image embedded this way can be decoded back to exactly the pixels the
//! paginator cut.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// A page image ready to ship inside a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedPage {
    /// 1-indexed page number.
    pub page_num: usize,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
    /// Base64 (standard alphabet) PNG bytes.
    pub data: String,
}

/// Encode raw PNG bytes for an image.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode a page image as a base64 PNG.
pub fn encode_page(page_num: usize, img: &DynamicImage) -> Result<EncodedPage, image::ImageError> {
    let b64 = STANDARD.encode(encode_png(img)?);
    debug!("Encoded page {} → {} bytes base64", page_num, b64.len());

    let (width, height) = img.dimensions();
    Ok(EncodedPage {
        page_num,
        width,
        height,
        mime_type: "image/png".to_string(),
        data: b64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 4, Rgba([255, 0, 0, 255])));
        let page = encode_page(2, &img).expect("encode should succeed");
        assert_eq!(page.mime_type, "image/png");
        assert_eq!((page.width, page.height), (10, 4));
        let decoded = STANDARD.decode(&page.data).expect("valid base64");
        assert_eq!(&decoded[1..4], b"PNG");
    }
}
