//! Raster → single-page PDF.
//!
//! The report region is captured at [`PDF_SUPERSAMPLE`]× and embedded as one
//! image on a page that is A4 wide and as tall as the raster's aspect ratio
//! requires. Long reports produce one long page; nothing is paginated.

use image::RgbImage;
use printpdf::{Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, RawImage, RawImageData, RawImageFormat, XObjectTransform};
use tracing::{debug, info, warn};

use crate::contract::RenderTarget;

pub const PDF_SUPERSAMPLE: u32 = 2;
pub const PAGE_WIDTH_MM: f32 = 210.0;

/// Page size in millimetres for a raster of `width` × `height` pixels.
pub fn page_size_mm(width: u32, height: u32) -> (f32, f32) {
    (PAGE_WIDTH_MM, PAGE_WIDTH_MM * height as f32 / width as f32)
}

/// Captures `target` and builds the PDF. `None` when there is nothing to capture.
pub fn render_pdf(target: &dyn RenderTarget, title: &str) -> Option<Vec<u8>> {
    let Some(raster) = target.capture(PDF_SUPERSAMPLE) else {
        warn!("No render target available; skipping PDF export");
        return None;
    };
    if raster.width() == 0 || raster.height() == 0 {
        warn!("Render target captured an empty raster; skipping PDF export");
        return None;
    }
    Some(raster_to_pdf(&raster, title))
}

pub fn raster_to_pdf(raster: &RgbImage, title: &str) -> Vec<u8> {
    let (width_mm, height_mm) = page_size_mm(raster.width(), raster.height());
    debug!(
        px_width = raster.width(),
        px_height = raster.height(),
        width_mm,
        height_mm,
        "Placing report raster on page"
    );

    let mut doc = PdfDocument::new(title);
    let image = RawImage {
        pixels: RawImageData::U8(raster.as_raw().clone()),
        width: raster.width() as usize,
        height: raster.height() as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };
    let image_id = doc.add_image(&image);

    // DPI at which the raster spans exactly the page width.
    let dpi = raster.width() as f32 * 25.4 / width_mm;
    let ops = vec![Op::UseXobject {
        id: image_id,
        transform: XObjectTransform {
            dpi: Some(dpi),
            ..Default::default()
        },
    }];
    let page = PdfPage::new(Mm(width_mm), Mm(height_mm), ops);

    let mut warnings = Vec::new();
    let bytes = doc
        .with_pages(vec![page])
        .save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!(count = warnings.len(), "PDF serialization produced warnings");
    }
    info!(size = bytes.len(), "Generated PDF");
    bytes
}
