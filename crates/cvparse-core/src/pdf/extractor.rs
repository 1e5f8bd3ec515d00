//! PDF text and page image extraction using lopdf and pdf-extract.

use std::panic::{self, AssertUnwindSafe};

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::Result;
use crate::error::PdfError;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes, decrypting empty-password documents.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads the raw bytes, so hand it the decrypted copy
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    /// Number of pages in the loaded document.
    pub fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    /// Text of all pages, in page order.
    ///
    /// pdf-extract panics on some malformed fonts that lopdf loads without
    /// complaint; the panic is caught and reported as a text extraction error.
    pub fn extract_text(&self) -> Result<String> {
        self.loaded()?;
        let data = &self.raw_data;
        match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data))) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(PdfError::TextExtraction(e.to_string())),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown cause".to_string());
                warn!("pdf-extract panicked: {}", reason);
                Err(PdfError::TextExtraction(format!("pdf-extract panicked: {}", reason)))
            }
        }
    }

    /// Decode the image XObjects placed on a page.
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.loaded()?;
        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        let Some(resources) = page_resources(doc, *page_id) else {
            return Ok(images);
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(images);
        };
        if let Ok((_, Object::Dictionary(xobjects))) = doc.dereference(xobjects) {
            for (name, reference) in xobjects.iter() {
                let Ok((_, object)) = doc.dereference(reference) else {
                    continue;
                };
                match decode_image_xobject(doc, object) {
                    Some(img) => images.push(img),
                    None => trace!(
                        "Skipped XObject {} on page {}",
                        String::from_utf8_lossy(name),
                        page
                    ),
                }
            }
        }

        trace!("Decoded {} images on page {}", images.len(), page);
        Ok(images)
    }

    /// Page images for OCR, in page order.
    ///
    /// Every decodable image with at least one side of `min_dimension` pixels
    /// is kept, in the order the page lists them, so scans tiled into strips
    /// are read in full. Pages without a usable image contribute nothing.
    /// `max_pages` of 0 means all pages.
    pub fn render_pages(&self, max_pages: usize, min_dimension: u32) -> Result<Vec<DynamicImage>> {
        let page_count = self.loaded()?.get_pages().len() as u32;
        let limit = if max_pages == 0 {
            page_count
        } else {
            page_count.min(max_pages as u32)
        };

        let mut rendered = Vec::new();
        for page in 1..=limit {
            let before = rendered.len();
            rendered.extend(
                self.page_images(page)?
                    .into_iter()
                    .filter(|img| img.width() >= min_dimension || img.height() >= min_dimension),
            );
            debug!("Page {}: {} images for OCR", page, rendered.len() - before);
        }

        Ok(rendered)
    }

    fn loaded(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Resources dictionary of a page, following `Parent` inheritance.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(node)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = node.get(b"Resources") {
        if let Ok((_, Object::Dictionary(dict))) = doc.dereference(resources) {
            return Some(dict.clone());
        }
    }

    match node.get(b"Parent") {
        Ok(Object::Reference(parent)) => page_resources(doc, *parent),
        _ => None,
    }
}

fn first_name(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(items) => items.first().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

fn decode_image_xobject(doc: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    match dict.get(b"Filter").ok().and_then(first_name) {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter on {}x{} image", width, height);
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Reference(r) => doc.get_object(*r).ok().and_then(first_name),
            other => first_name(other),
        })
        .unwrap_or(b"DeviceRGB");

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let pixels = (width as usize) * (height as usize);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode {}x{} image: colorspace={}, {} bytes",
                width,
                height,
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    use crate::pdf::fixtures::{self, Page};

    fn loaded(bytes: &[u8]) -> PdfExtractor {
        let mut extractor = PdfExtractor::new();
        extractor.load(bytes).unwrap();
        extractor
    }

    /// Three pages: the first two inherit an RGB image and a tiny gray image
    /// from the page tree root, the third has its own JPEG and gray image.
    fn scanned_pdf() -> Vec<u8> {
        let mut doc = fixtures::new_doc();
        let rgb = doc.add_object(fixtures::raw_image(40, 30, false));
        let tiny = doc.add_object(fixtures::raw_image(8, 8, true));
        let jpeg = doc.add_object(fixtures::jpeg_image(32, 24));
        let gray = doc.add_object(fixtures::raw_image(24, 24, true));

        let root_resources = dictionary! {
            "XObject" => dictionary! { "Im1" => rgb, "Im2" => tiny },
        };
        let own = Page {
            lines: vec![],
            resources: Some(dictionary! {
                "XObject" => dictionary! { "Im3" => jpeg, "Im4" => gray },
            }),
        };
        let pages = vec![Page::default(), Page::default(), own];
        fixtures::save(fixtures::build(doc, pages, root_resources))
    }

    fn sizes(images: &[DynamicImage]) -> Vec<(u32, u32)> {
        images.iter().map(|img| (img.width(), img.height())).collect()
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_unloaded_extractor_errors() {
        let extractor = PdfExtractor::new();
        assert!(extractor.extract_text().is_err());
        assert!(extractor.render_pages(0, 0).is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(matches!(
            extractor.load(b"%PDF-nonsense"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_text_follows_page_order() {
        let bytes = fixtures::text_pdf(&[&["Jane Doe"], &["Senior Engineer"], &["Rust Go"]]);
        let extractor = loaded(&bytes);
        assert_eq!(extractor.page_count(), 3);

        let text = extractor.extract_text().unwrap();
        let first = text.find("Jane Doe").unwrap();
        let second = text.find("Senior Engineer").unwrap();
        let third = text.find("Rust Go").unwrap();
        assert!(first < second && second < third, "out of order: {:?}", text);
    }

    #[test]
    fn test_empty_password_is_decrypted() {
        let doc = fixtures::build(
            fixtures::new_doc(),
            vec![Page::text(&["Encrypted resume"])],
            lopdf::Dictionary::new(),
        );
        let bytes = fixtures::encrypt_empty_password(doc);
        assert!(Document::load_mem(&bytes).unwrap().is_encrypted());

        let extractor = loaded(&bytes);
        assert!(extractor.extract_text().unwrap().contains("Encrypted resume"));
    }

    #[test]
    fn test_extract_text_survives_pdf_extract_panic() {
        let extractor = loaded(&fixtures::broken_font_pdf());
        match extractor.extract_text() {
            Err(PdfError::TextExtraction(reason)) => {
                assert!(reason.contains("panicked"), "unexpected reason: {}", reason)
            }
            other => panic!("expected a text extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_page_images_inherit_root_resources() {
        let extractor = loaded(&scanned_pdf());
        assert_eq!(sizes(&extractor.page_images(1).unwrap()), vec![(40, 30), (8, 8)]);
        assert_eq!(sizes(&extractor.page_images(2).unwrap()), vec![(40, 30), (8, 8)]);
        assert_eq!(sizes(&extractor.page_images(3).unwrap()), vec![(32, 24), (24, 24)]);
        assert!(matches!(extractor.page_images(4), Err(PdfError::InvalidPage(4))));
    }

    #[test]
    fn test_decodes_rgb_gray_and_jpeg() {
        let extractor = loaded(&scanned_pdf());
        let page1 = extractor.page_images(1).unwrap();
        assert!(page1[0].as_rgb8().is_some());
        assert!(page1[1].as_luma8().is_some());

        let page3 = extractor.page_images(3).unwrap();
        assert_eq!(page3[0].color(), image::ColorType::Rgb8);
        assert!(page3[1].as_luma8().is_some());
    }

    #[test]
    fn test_render_pages_keeps_every_qualifying_image() {
        let extractor = loaded(&scanned_pdf());

        let all = extractor.render_pages(0, 0).unwrap();
        assert_eq!(all.len(), 6);

        let large = extractor.render_pages(0, 20).unwrap();
        assert_eq!(sizes(&large), vec![(40, 30), (40, 30), (32, 24), (24, 24)]);

        let first_page = extractor.render_pages(1, 20).unwrap();
        assert_eq!(sizes(&first_page), vec![(40, 30)]);
    }

    #[test]
    fn test_render_pages_without_images_is_empty() {
        let extractor = loaded(&fixtures::text_pdf(&[&["Jane Doe"]]));
        assert!(extractor.render_pages(0, 0).unwrap().is_empty());
    }
}
