//! Output document assembly
//!
//! `PdfBuilder` owns a lopdf `Document` and turns finished canvases into
//! pages, sharing font, image and graphics-state objects between them.
//! The writer never stamps dates or random IDs, so identical input
//! produces identical bytes.

use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::path::Path;

use super::canvas::{Canvas, ImageHandle, font_resource_name};
use super::fonts::StandardFont;
use crate::types::Result;

/// Page size and the inset of the trim line from the media edge, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBoxes {
    pub width: f32,
    pub height: f32,
    pub bleed: f32,
}

impl PageBoxes {
    pub fn new(width: f32, height: f32, bleed: f32) -> Self {
        Self {
            width,
            height,
            bleed,
        }
    }

    fn media_box(&self) -> Object {
        rect_array(0.0, 0.0, self.width, self.height)
    }

    fn trim_box(&self) -> Object {
        rect_array(
            self.bleed,
            self.bleed,
            self.width - self.bleed,
            self.height - self.bleed,
        )
    }
}

fn rect_array(llx: f32, lly: f32, urx: f32, ury: f32) -> Object {
    Object::Array(vec![
        Object::Real(llx),
        Object::Real(lly),
        Object::Real(urx),
        Object::Real(ury),
    ])
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_refs: Vec<Object>,
    fonts: BTreeMap<StandardFont, ObjectId>,
    gstates: BTreeMap<u16, ObjectId>,
    jpeg_quality: u8,
    info: Option<(String, String)>,
}

impl PdfBuilder {
    pub fn new(jpeg_quality: u8) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_refs: Vec::new(),
            fonts: BTreeMap::new(),
            gstates: BTreeMap::new(),
            jpeg_quality,
            info: None,
        }
    }

    /// Title and author for the document information dictionary
    pub fn set_info(&mut self, title: &str, author: &str) {
        self.info = Some((title.to_string(), author.to_string()));
    }

    pub fn page_count(&self) -> usize {
        self.page_refs.len()
    }

    /// Embed an RGB raster as a JPEG image XObject
    pub fn add_image(&mut self, img: &RgbImage) -> Result<ImageHandle> {
        let mut jpeg = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality);
        img.write_with_encoder(encoder)?;

        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(img.width() as i64)),
            ("Height", Object::Integer(img.height() as i64)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        let id = self
            .doc
            .add_object(Stream::new(dict, jpeg).with_compression(false));

        Ok(ImageHandle {
            id,
            width_px: img.width(),
            height_px: img.height(),
        })
    }

    fn font_id(&mut self, font: StandardFont) -> ObjectId {
        if let Some(&id) = self.fonts.get(&font) {
            return id;
        }
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(font.base_name().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]);
        let id = self.doc.add_object(dict);
        self.fonts.insert(font, id);
        id
    }

    fn gstate_id(&mut self, permille: u16) -> ObjectId {
        if let Some(&id) = self.gstates.get(&permille) {
            return id;
        }
        let alpha = permille as f32 / 1000.0;
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"ExtGState".to_vec())),
            ("ca", Object::Real(alpha)),
            ("CA", Object::Real(alpha)),
        ]);
        let id = self.doc.add_object(dict);
        self.gstates.insert(permille, id);
        id
    }

    /// Append a finished canvas as the next page
    pub fn add_page(&mut self, canvas: Canvas, boxes: PageBoxes) -> Result<ObjectId> {
        let mut resources = Dictionary::new();

        if !canvas.fonts.is_empty() {
            let mut fonts = Dictionary::new();
            for &font in &canvas.fonts {
                let id = self.font_id(font);
                fonts.set(font_resource_name(font), Object::Reference(id));
            }
            resources.set("Font", Object::Dictionary(fonts));
        }

        if !canvas.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, &id) in &canvas.images {
                xobjects.set(name.as_bytes(), Object::Reference(id));
            }
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        if !canvas.alphas.is_empty() {
            let mut gstates = Dictionary::new();
            for (name, &permille) in &canvas.alphas {
                let id = self.gstate_id(permille);
                gstates.set(name.as_bytes(), Object::Reference(id));
            }
            resources.set("ExtGState", Object::Dictionary(gstates));
        }

        let content = Content {
            operations: canvas.into_operations(),
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let media_box = boxes.media_box();
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            ("MediaBox", media_box.clone()),
            ("BleedBox", media_box),
            ("TrimBox", boxes.trim_box()),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        let page_id = self.doc.add_object(page);
        self.page_refs.push(Object::Reference(page_id));
        Ok(page_id)
    }

    /// Close the page tree and catalog
    pub fn finish(mut self) -> Document {
        let count = self.page_refs.len() as i64;
        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(self.page_refs)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", catalog_id);

        if let Some((title, author)) = self.info {
            let info_id = self.doc.add_object(Dictionary::from_iter(vec![
                ("Title", text_string(&title)),
                ("Author", text_string(&author)),
                ("Producer", text_string("kdp-layout")),
            ]));
            self.doc.trailer.set("Info", info_id);
        }

        self.doc
    }

    /// Finish and write the document through the temp directory
    pub fn save(self, temp_dir: &Path, path: &Path) -> Result<()> {
        let mut doc = self.finish();
        save_document(&mut doc, temp_dir, path)
    }
}

/// Serialize a document and move it into place.
///
/// The bytes go to a uniquely named file in `temp_dir` first, so readers
/// of `path` see either the old file or the complete new one.
pub fn save_document(doc: &mut Document, temp_dir: &Path, path: &Path) -> Result<()> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    write_atomic(&bytes, temp_dir, path)
}

pub(crate) fn write_atomic(bytes: &[u8], temp_dir: &Path, path: &Path) -> Result<()> {
    std::fs::create_dir_all(temp_dir)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let temp_path = temp_dir.join(format!("{}.{}.tmp", stem, uuid::Uuid::new_v4().simple()));
    std::fs::write(&temp_path, bytes)?;

    if let Err(e) = std::fs::rename(&temp_path, path) {
        // Different filesystem; copy instead
        log::debug!("rename into {} failed ({}), copying", path.display(), e);
        let copied = std::fs::copy(&temp_path, path);
        let _ = std::fs::remove_file(&temp_path);
        copied?;
    }
    Ok(())
}
