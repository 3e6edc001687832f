//! Pipeline stages for structure reconstruction and pagination.
//!
//! Each submodule implements exactly one transformation step, and every
//! step is a pure function over in-memory data: no I/O, no awaiting, no
//! state shared between pages.
//!
//! ## Data Flow
//!
//! ```text
//! fragments ──▶ lines ──┬──▶ blocks ──┐
//!                       └──▶ grid   ──┼──▶ assemble ──▶ Document
//! surface   ──▶ paginate ──▶ raster ──┘
//! ```
//!
//! 1. [`lines`]: cluster fragments into horizontal bands
//! 2. [`blocks`]: classify lines into headings and paragraphs
//! 3. [`grid`]: read lines as table rows (alternative to `blocks`)
//! 4. [`paginate`]: cut a tall surface into fixed-size page slices
//! 5. [`raster`]: crop a materialised surface image along the slices
//! 6. [`assemble`]: order per-page results into the final document
//!
//! [`normalize`] cleans fragment text whenever it is joined; [`encode`]
//! turns page images into base64 PNG for JSON output.

pub mod assemble;
pub mod blocks;
pub mod encode;
pub mod grid;
pub mod lines;
pub mod normalize;
pub mod paginate;
pub mod raster;
