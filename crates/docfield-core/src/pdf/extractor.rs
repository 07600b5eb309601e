//! Page image extraction from scanned PDFs using lopdf.

use std::fs;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PageSource, Result};
use crate::error::PdfError;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Extracts the scan image of each page of a PDF.
pub struct PdfPageExtractor {
    document: Option<Document>,
}

impl PdfPageExtractor {
    /// Create an extractor with no document loaded.
    pub fn new() -> Self {
        Self { document: None }
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    /// Read and load the PDF at `path`.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Ok(Self::from_bytes(&data)?)
    }

    /// Load a PDF from bytes, replacing any loaded document.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document()?
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Decodable images referenced by the page's XObject resources.
    pub fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let mut images = Vec::new();

        if let Some(Object::Dictionary(resources)) = inherited_attribute(doc, page_id, b"Resources") {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = decode_image_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    /// Page size in points from the (possibly inherited) MediaBox.
    pub fn page_size_points(&self, page: u32) -> Result<Option<(f32, f32)>> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let Some(Object::Array(media_box)) = inherited_attribute(doc, page_id, b"MediaBox") else {
            return Ok(None);
        };

        let coords: Vec<f32> = media_box.iter().filter_map(|o| o.as_float().ok()).collect();
        if coords.len() != 4 {
            return Ok(None);
        }

        let width = (coords[2] - coords[0]).abs();
        let height = (coords[3] - coords[1]).abs();
        if width == 0.0 || height == 0.0 {
            return Ok(None);
        }
        Ok(Some((width, height)))
    }
}

impl Default for PdfPageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for PdfPageExtractor {
    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    /// The largest image on the page, scaled to the page size at `dpi`.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let scan = self
            .extract_images(page)?
            .into_iter()
            .max_by_key(|img| img.width() as u64 * img.height() as u64)
            .ok_or_else(|| PdfError::ImageExtraction(format!("no decodable image on page {}", page)))?;

        let Some((width_pt, height_pt)) = self.page_size_points(page)? else {
            return Ok(scan);
        };

        let target_width = (width_pt / POINTS_PER_INCH * dpi as f32).round().max(1.0) as u32;
        let target_height = (height_pt / POINTS_PER_INCH * dpi as f32).round().max(1.0) as u32;

        if scan.dimensions() == (target_width, target_height) {
            return Ok(scan);
        }

        trace!(
            "Scaling page {} scan {}x{} -> {}x{} ({} DPI)",
            page,
            scan.width(),
            scan.height(),
            target_width,
            target_height,
            dpi
        );
        Ok(scan.resize_exact(target_width, target_height, FilterType::CatmullRom))
    }
}

/// Look up `key` on a page tree node, walking up through `Parent` links.
fn inherited_attribute(doc: &Document, node_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = node_id;
    // Page trees are shallow; bound the walk in case of reference cycles.
    for _ in 0..32 {
        let Ok(Object::Dictionary(dict)) = doc.get_object(current) else {
            return None;
        };

        if let Ok(value) = dict.get(key) {
            return doc.dereference(value).ok().map(|(_, obj)| obj.clone());
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => return None,
        }
    }
    None
}

fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict: &Dictionary = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg).ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    decode_raw(&data, width, height, color_space, bits)
}

fn decode_raw(data: &[u8], width: u32, height: u32, color_space: &[u8], bits: i64) -> Option<DynamicImage> {
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let pixels = (width as usize).checked_mul(height as usize)?;
    let rgb_len = pixels.checked_mul(3)?;

    let rgb: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => data[..rgb_len].to_vec(),
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            data[..pixels].iter().flat_map(|&g| [g, g, g]).collect()
        }
        _ => {
            trace!(
                "Could not decode image: data_len={}, colorspace={}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            return None;
        }
    };

    ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
}
