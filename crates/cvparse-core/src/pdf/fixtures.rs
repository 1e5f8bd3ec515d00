//! Small PDFs built in memory for tests.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Page description for [`build`].
#[derive(Default)]
pub struct Page {
    /// Lines drawn in Courier, top to bottom.
    pub lines: Vec<&'static str>,
    /// Own resources; `None` inherits from the page tree root.
    pub resources: Option<Dictionary>,
}

impl Page {
    pub fn text(lines: &[&'static str]) -> Self {
        Self {
            lines: lines.to_vec(),
            resources: None,
        }
    }
}

fn courier(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    })
}

fn content(lines: &[&'static str]) -> Vec<u8> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }.encode().unwrap()
}

pub fn new_doc() -> Document {
    Document::with_version("1.5")
}

/// Finish `doc` with a page tree whose root carries `root_resources`.
///
/// A Courier font named `F1` is added to the root resources unless they
/// already define `Font`.
pub fn build(mut doc: Document, pages: Vec<Page>, mut root_resources: Dictionary) -> Document {
    let pages_id = doc.new_object_id();

    if !root_resources.has(b"Font") {
        let font_id = courier(&mut doc);
        root_resources.set("Font", dictionary! { "F1" => font_id });
    }

    let mut kids = Vec::new();
    for page in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content(&page.lines)));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if let Some(resources) = page.resources {
            page_dict.set("Resources", resources);
        }
        kids.push(doc.add_object(page_dict).into());
    }

    let count = kids.len() as i64;
    let root = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => root_resources,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(root));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Text-only document, one page per entry.
pub fn text_pdf(pages: &[&[&'static str]]) -> Vec<u8> {
    let pages = pages.iter().map(|lines| Page::text(lines)).collect();
    save(build(new_doc(), pages, Dictionary::new()))
}

pub fn save(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Encrypt every stream with the standard RC4 handler and an empty user
/// password. RC4 is symmetric, so lopdf's decryption routine encrypts too.
pub fn encrypt_empty_password(mut doc: Document) -> Vec<u8> {
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 4,
        "R" => 4,
        "Length" => 128,
        "O" => Object::string_literal(vec![0u8; 32]),
        "P" => -4,
        "CF" => dictionary! {
            "StdCF" => dictionary! { "CFM" => "V2", "Length" => 16 },
        },
        "StmF" => "StdCF",
        "StrF" => "StdCF",
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let file_id = Object::string_literal(b"cvparse-fixture!".to_vec());
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    let key = lopdf::encryption::get_encryption_key(&doc, "", false).unwrap();
    for (&id, object) in doc.objects.iter_mut() {
        if let Object::Stream(stream) = object {
            let sealed = lopdf::encryption::decrypt_object(&key, id, &Object::Stream(stream.clone()), false)
                .unwrap();
            stream.set_content(sealed);
        }
    }
    save(doc)
}

/// One-page document whose Type0 font lacks `DescendantFonts`.
pub fn broken_font_pdf() -> Vec<u8> {
    let mut doc = new_doc();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "Broken",
        "Encoding" => "Identity-H",
    });
    let resources = dictionary! { "Font" => dictionary! { "F1" => font_id } };
    save(build(doc, vec![Page::text(&["Jane Doe"])], resources))
}

/// Raw 8-bit image XObject.
pub fn raw_image(width: u32, height: u32, gray: bool) -> Stream {
    let channels = if gray { 1 } else { 3 };
    let pixels = vec![128u8; (width * height * channels) as usize];
    let color_space = if gray { "DeviceGray" } else { "DeviceRGB" };
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        },
        pixels,
    )
}

/// JPEG image XObject.
pub fn jpeg_image(width: u32, height: u32) -> Stream {
    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])))
        .write_to(&mut std::io::Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .unwrap();
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
}
