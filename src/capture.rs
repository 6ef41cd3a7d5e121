//! Raster capture: turn one tall screenshot into a paged PDF.
//!
//! The image is scaled to the full page width and cut into horizontal
//! bands one page tall. Each band becomes its own image on its own page,
//! so nothing is drawn off-page.

use image::imageops;
use image::RgbaImage;
use tracing::debug;

use crate::error::FormsError;
use crate::image_loader;
use crate::layout::{LayoutDocument, RenderedForm, PAGE_HEIGHT, PAGE_WIDTH};
use crate::pdf::PdfWriter;

/// Pixel rows per page band, and the band count, for an image of the given
/// size scaled to page width.
pub fn band_layout(width_px: u32, height_px: u32) -> (u32, usize) {
    let mm_per_px = PAGE_WIDTH / width_px as f64;
    let rows_per_page = ((PAGE_HEIGHT / mm_per_px).floor() as u32).max(1);
    let bands = height_px.div_ceil(rows_per_page) as usize;
    (rows_per_page, bands)
}

/// Lay a raster out over as many A4 pages as its scaled height needs.
pub fn paginate(image: &RgbaImage) -> Result<LayoutDocument, FormsError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(FormsError::CaptureError("captured image is empty".to_string()));
    }

    let mm_per_px = PAGE_WIDTH / width as f64;
    let (rows_per_page, bands) = band_layout(width, height);
    debug!(width, height, rows_per_page, bands, "paginating capture");

    let mut doc = LayoutDocument::empty();
    for band in 0..bands {
        let top = band as u32 * rows_per_page;
        let rows = rows_per_page.min(height - top);
        let slice = imageops::crop_imm(image, 0, top, width, rows).to_image();

        doc.add_page();
        doc.image(
            image_loader::from_rgba(&slice),
            0.0,
            0.0,
            PAGE_WIDTH,
            rows as f64 * mm_per_px,
        );
    }
    Ok(doc)
}

/// Decode an encoded raster (PNG or JPEG) and render it as a paged PDF.
pub fn capture_to_pdf(bytes: &[u8], file_name: &str) -> Result<RenderedForm, FormsError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| FormsError::CaptureError(format!("unreadable capture: {}", e)))?
        .to_rgba8();
    let doc = paginate(&image)?;
    Ok(RenderedForm {
        file_name: file_name.to_string(),
        bytes: PdfWriter::new().write(&doc),
        page_count: doc.page_count(),
    })
}
