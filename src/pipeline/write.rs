//! Output writing: per-page image files and the merged multi-page PDF.
//!
//! Page images are written with the `image` crate in the configured format.
//! The merged document embeds each sheet as a JPEG-compressed image XObject
//! (`DCTDecode`) on its own PDF page via `lopdf` — no rasterising round-trip,
//! the sheet pixels go straight into the document. Pages are sized in points
//! assuming the sheets were composed at 300 DPI, so the printed cards come
//! out at physical size.

use crate::config::PageFormat;
use crate::error::DeckSheetError;
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolution the sheets are composed at; fixes the PDF page size in points.
const SHEET_DPI: f32 = 300.0;

/// JPEG quality for sheets embedded in the merged PDF.
const PDF_JPEG_QUALITY: u8 = 92;

fn guard_overwrite(path: &Path, overwrite: bool) -> Result<(), DeckSheetError> {
    if path.exists() && !overwrite {
        return Err(DeckSheetError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Write each sheet as `<prefix><NN>.<ext>`, 1-indexed and zero-padded.
///
/// # Errors
/// [`DeckSheetError::OutputExists`] when a target exists and `overwrite` is
/// off; [`DeckSheetError::Write`] on encoding or filesystem failure.
pub fn write_page_images(
    pages: &[RgbaImage],
    prefix: &str,
    format: PageFormat,
    overwrite: bool,
) -> Result<Vec<PathBuf>, DeckSheetError> {
    let mut paths = Vec::with_capacity(pages.len());

    for (idx, page) in pages.iter().enumerate() {
        let path = PathBuf::from(format!("{prefix}{:02}.{}", idx + 1, format.extension()));
        guard_overwrite(&path, overwrite)?;

        let result = match format {
            PageFormat::Png => page.save_with_format(&path, image::ImageFormat::Png),
            PageFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb: RgbImage = page.convert();
                rgb.save_with_format(&path, image::ImageFormat::Jpeg)
            }
        };
        result.map_err(|e| DeckSheetError::Write {
            path: path.clone(),
            source: std::io::Error::other(e.to_string()),
        })?;

        debug!("Wrote page {} → {}", idx + 1, path.display());
        paths.push(path);
    }

    info!("Wrote {} page image(s)", paths.len());
    Ok(paths)
}

/// Assemble all sheets into one multi-page PDF at `path`.
///
/// # Errors
/// [`DeckSheetError::OutputExists`] / [`DeckSheetError::Write`] as for page
/// images; [`DeckSheetError::Internal`] when a sheet cannot be JPEG-encoded.
pub fn write_merged_pdf(
    pages: &[RgbaImage],
    path: &Path,
    overwrite: bool,
) -> Result<(), DeckSheetError> {
    guard_overwrite(path, overwrite)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for (idx, page) in pages.iter().enumerate() {
        let rgb: RgbImage = page.convert();
        let (px_w, px_h) = rgb.dimensions();

        let mut jpeg = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, PDF_JPEG_QUALITY))
            .map_err(|e| {
                DeckSheetError::Internal(format!("JPEG encoding of sheet {}: {e}", idx + 1))
            })?;

        let mut image_dict = Dictionary::new();
        image_dict.set("Type", Object::Name(b"XObject".to_vec()));
        image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
        image_dict.set("Width", Object::Integer(px_w as i64));
        image_dict.set("Height", Object::Integer(px_h as i64));
        image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        image_dict.set("BitsPerComponent", Object::Integer(8));
        image_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

        // Already DCT-compressed; re-deflating it would only waste space.
        let mut image_stream = Stream::new(image_dict, jpeg);
        image_stream.allows_compression = false;
        let image_id = doc.add_object(Object::Stream(image_stream));

        let pt_w = px_w as f32 * 72.0 / SHEET_DPI;
        let pt_h = px_h as f32 * 72.0 / SHEET_DPI;

        let content = format!("q\n{pt_w:.2} 0 0 {pt_h:.2} 0 0 cm\n/Im0 Do\nQ");
        let content_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            content.into_bytes(),
        )));

        let mut xobjects = Dictionary::new();
        xobjects.set("Im0", Object::Reference(image_id));
        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(pt_w),
                Object::Real(pt_h),
            ]),
        );
        page_dict.set("Contents", Object::Reference(content_id));
        page_dict.set("Resources", Object::Dictionary(resources));

        let page_id = doc.add_object(Object::Dictionary(page_dict));
        kids.push(Object::Reference(page_id));
    }

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.compress();
    doc.save(path).map_err(|e| DeckSheetError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other(e.to_string()),
    })?;

    info!("Wrote merged PDF with {} page(s) → {}", pages.len(), path.display());
    Ok(())
}
