//! PDF Document wrapper

use crate::text::{
    encode_win_ansi, generate_rect_operators, generate_text_operators, hex_string, RectStyle,
    StandardFont, TextRun,
};
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;

/// Maximum depth when following `Parent` links for inherited attributes
const MAX_INHERITANCE_DEPTH: usize = 10;

/// Page size in points (equal to pixels at scale 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Page box corners as read from the MediaBox
#[derive(Debug, Clone, Copy, PartialEq)]
struct PageBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl PageBox {
    fn size(&self) -> PageSize {
        PageSize {
            width: (self.x2 - self.x1).abs(),
            height: (self.y2 - self.y1).abs(),
        }
    }

    /// Convert a top-left based point to PDF user space
    fn to_pdf(self, x: f64, y_from_top: f64) -> (f64, f64) {
        let left = self.x1.min(self.x2);
        let top = self.y1.max(self.y2);
        (left + x, top - y_from_top)
    }
}

/// PDF Document wrapper providing high-level operations
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: BTreeMap<usize, Vec<u8>>,
    /// Fonts referenced by buffered content (page number -> fonts)
    page_fonts: BTreeMap<usize, BTreeSet<StandardFont>>,
    /// Font dictionaries already added to the document
    font_objects: HashMap<StandardFont, ObjectId>,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            page_content_buffer: BTreeMap::new(),
            page_fonts: BTreeMap::new(),
            font_objects: HashMap::new(),
        }
    }

    /// Open a PDF document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Create a document with a single blank page
    ///
    /// # Arguments
    /// * `width` - Page width in points
    /// * `height` - Page height in points
    pub fn blank(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidPageSize(width, height));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let contents_id = doc.add_object(Object::Stream(Stream::new(Dictionary::new(), vec![])));

        let mut page_dict = Dictionary::new();
        page_dict.set(b"Type", Object::Name(b"Page".to_vec()));
        page_dict.set(b"Parent", Object::Reference(pages_id));
        page_dict.set(
            b"MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ]),
        );
        page_dict.set(b"Resources", Object::Dictionary(Dictionary::new()));
        page_dict.set(b"Contents", Object::Reference(contents_id));
        let page_id = doc.add_object(Object::Dictionary(page_dict));

        let mut pages_dict = Dictionary::new();
        pages_dict.set(b"Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set(b"Kids", Object::Array(vec![Object::Reference(page_id)]));
        pages_dict.set(b"Count", Object::Integer(1));
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set(b"Type", Object::Name(b"Catalog".to_vec()));
        catalog.set(b"Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        Ok(Self::from_document(doc))
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get the size of a page in points
    ///
    /// Reads the MediaBox (or CropBox), following the parent chain when the
    /// page inherits it. Pages without any box are treated as A4.
    pub fn page_size(&self, page: usize) -> Result<PageSize> {
        Ok(self.page_box(page)?.size())
    }

    /// Stamp a line of text on a page
    ///
    /// Empty text is skipped.
    pub fn insert_text(&mut self, page: usize, run: &TextRun<'_>) -> Result<()> {
        let page_box = self.page_box(page)?;
        if run.text.is_empty() {
            return Ok(());
        }

        let (x, y) = page_box.to_pdf(run.x, run.y);
        let text_hex = hex_string(&encode_win_ansi(run.text));
        let operators =
            generate_text_operators(&text_hex, x, y, run.font, run.font_size, run.color);

        self.page_fonts.entry(page).or_default().insert(run.font);
        self.buffer_content(page, &operators);
        Ok(())
    }

    /// Stroke a rectangle on a page
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    /// * `x` - Left edge in points
    /// * `y` - Top edge in points, from the top of the page
    /// * `width` - Width in points
    /// * `height` - Height in points
    /// * `style` - Stroke color and width
    pub fn draw_rect(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        style: RectStyle,
    ) -> Result<()> {
        let page_box = self.page_box(page)?;
        let (pdf_x, pdf_top) = page_box.to_pdf(x, y);
        let operators = generate_rect_operators(pdf_x, pdf_top - height, width, height, style);
        self.buffer_content(page, &operators);
        Ok(())
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush_content_buffers()?;
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        if page == 0 {
            return Err(PdfError::InvalidPage(page, pages.len()));
        }
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    fn page_box(&self, page: usize) -> Result<PageBox> {
        let page_id = self.page_id(page)?;
        let media_box = match self.inherited_attribute(page_id, &[b"MediaBox", b"CropBox"])? {
            Some(obj) => self.resolve(&obj)?,
            None => {
                // Fallback: assume A4 page size
                return Ok(PageBox {
                    x1: 0.0,
                    y1: 0.0,
                    x2: 595.28,
                    y2: 841.89,
                });
            }
        };

        let values = media_box
            .as_array()
            .map_err(|_| PdfError::ParseError("MediaBox is not an array".to_string()))?;
        if values.len() < 4 {
            return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
        }

        Ok(PageBox {
            x1: number(&values[0], "x1")?,
            y1: number(&values[1], "y1")?,
            x2: number(&values[2], "x2")?,
            y2: number(&values[3], "y2")?,
        })
    }

    /// Look up the first of `keys` on a page, following the parent chain
    fn inherited_attribute(&self, page_id: ObjectId, keys: &[&[u8]]) -> Result<Option<Object>> {
        let mut current_id = page_id;

        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self
                .inner
                .get_object(current_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Object is not a dictionary".to_string()))?;

            for key in keys {
                if let Ok(value) = dict.get(key) {
                    return Ok(Some(value.clone()));
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => current_id = *parent_id,
                _ => break,
            }
        }

        Ok(None)
    }

    /// Follow a single indirect reference
    fn resolve(&self, obj: &Object) -> Result<Object> {
        match obj {
            Object::Reference(id) => Ok(self.inner.get_object(*id)?.clone()),
            other => Ok(other.clone()),
        }
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers = std::mem::take(&mut self.page_content_buffer);
        let page_fonts = std::mem::take(&mut self.page_fonts);

        for (page, content) in buffers {
            if content.is_empty() {
                continue;
            }
            if let Some(fonts) = page_fonts.get(&page) {
                self.add_fonts_to_page_resources(page, fonts)?;
            }
            self.append_to_content_stream(page, &content)?;
        }

        Ok(())
    }

    fn font_object(&mut self, font: StandardFont) -> ObjectId {
        if let Some(id) = self.font_objects.get(&font) {
            return *id;
        }

        let mut dict = Dictionary::new();
        dict.set(b"Type", Object::Name(b"Font".to_vec()));
        dict.set(b"Subtype", Object::Name(b"Type1".to_vec()));
        dict.set(b"BaseFont", Object::Name(font.base_font().as_bytes().to_vec()));
        dict.set(b"Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let id = self.inner.add_object(Object::Dictionary(dict));
        self.font_objects.insert(font, id);
        id
    }

    /// Register fonts in a page's Resources dictionary
    ///
    /// Inherited or referenced resources are copied onto the page so the
    /// existing entries stay visible.
    fn add_fonts_to_page_resources(
        &mut self,
        page: usize,
        fonts: &BTreeSet<StandardFont>,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let mut resources = match self.inherited_attribute(page_id, &[b"Resources"])? {
            Some(obj) => match self.resolve(&obj)? {
                Object::Dictionary(dict) => dict,
                _ => Dictionary::new(),
            },
            None => Dictionary::new(),
        };

        let mut font_dict = match resources.get(b"Font") {
            Ok(obj) => match self.resolve(obj)? {
                Object::Dictionary(dict) => dict,
                _ => Dictionary::new(),
            },
            Err(_) => Dictionary::new(),
        };

        for font in fonts {
            let font_id = self.font_object(*font);
            font_dict.set(font.resource_name().as_bytes(), Object::Reference(font_id));
        }
        resources.set(b"Font", Object::Dictionary(font_dict));

        let mut page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .clone();
        page_dict.set(b"Resources", Object::Dictionary(resources));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// The existing content is wrapped in `q`/`Q` so graphics state left over
    /// by the original page cannot shift the overlay. The original streams are
    /// referenced as they are, the overlay goes into a new compressed stream.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;
        let mut page_dict = self
            .inner
            .get_object(page_id)?
            .as_dict()
            .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
            .clone();

        let existing: Vec<Object> = match page_dict.get(b"Contents") {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Reference(id)) => match self.inner.get_object(*id)? {
                Object::Array(arr) => arr.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Stream(stream)) => {
                let id = self.inner.add_object(Object::Stream(stream.clone()));
                vec![Object::Reference(id)]
            }
            _ => Vec::new(),
        };

        let save_state = self
            .inner
            .add_object(Object::Stream(Stream::new(Dictionary::new(), b"q\n".to_vec())));

        let mut overlay = b"\nQ\n".to_vec();
        overlay.extend_from_slice(content);
        let overlay_id = self.inner.add_object(Object::Stream(compressed_stream(&overlay)?));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(save_state));
        contents.extend(existing);
        contents.push(Object::Reference(overlay_id));

        page_dict.set(b"Contents", Object::Array(contents));
        self.inner.objects.insert(page_id, page_dict.into());

        Ok(())
    }
}

/// Build a FlateDecode stream
fn compressed_stream(data: &[u8]) -> Result<Stream> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;

    let mut dict = Dictionary::new();
    dict.set(b"Filter", Object::Name(b"FlateDecode".to_vec()));
    dict.set(b"Length", Object::Integer(compressed.len() as i64));
    Ok(Stream::new(dict, compressed))
}

fn number(obj: &Object, name: &str) -> Result<f64> {
    obj.as_f32()
        .map(|v| v as f64)
        .ok()
        .or_else(|| obj.as_i64().ok().map(|v| v as f64))
        .ok_or_else(|| PdfError::ParseError(format!("Invalid MediaBox {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn test_blank_document_has_one_page() {
        let doc = PdfDocument::blank(600.0, 850.0).unwrap();
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_blank_page_size() {
        let doc = PdfDocument::blank(612.0, 792.0).unwrap();
        let size = doc.page_size(1).unwrap();
        assert_eq!(size, PageSize { width: 612.0, height: 792.0 });
    }

    #[test]
    fn test_blank_rejects_invalid_size() {
        assert!(matches!(
            PdfDocument::blank(0.0, 100.0),
            Err(PdfError::InvalidPageSize(_, _))
        ));
        assert!(PdfDocument::blank(100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_page_box_conversion() {
        let page_box = PageBox {
            x1: 10.0,
            y1: 20.0,
            x2: 610.0,
            y2: 820.0,
        };
        assert_eq!(page_box.to_pdf(0.0, 0.0), (10.0, 820.0));
        assert_eq!(page_box.to_pdf(50.0, 100.0), (60.0, 720.0));
        assert_eq!(page_box.size(), PageSize { width: 600.0, height: 800.0 });
    }

    #[test]
    fn test_invalid_page() {
        let mut doc = PdfDocument::blank(600.0, 850.0).unwrap();
        assert!(matches!(doc.page_size(0), Err(PdfError::InvalidPage(0, 1))));
        let run = TextRun {
            text: "x",
            x: 0.0,
            y: 0.0,
            font: StandardFont::Helvetica,
            font_size: 12.0,
            color: Color::black(),
        };
        assert!(matches!(
            doc.insert_text(2, &run),
            Err(PdfError::InvalidPage(2, 1))
        ));
    }

    #[test]
    fn test_empty_text_is_not_buffered() {
        let mut doc = PdfDocument::blank(600.0, 850.0).unwrap();
        let run = TextRun {
            text: "",
            x: 0.0,
            y: 0.0,
            font: StandardFont::Helvetica,
            font_size: 12.0,
            color: Color::black(),
        };
        doc.insert_text(1, &run).unwrap();
        assert!(doc.page_content_buffer.is_empty());
        assert!(doc.page_fonts.is_empty());
    }

    #[test]
    fn test_compressed_stream_round_trip() {
        let stream = compressed_stream(b"BT ET").unwrap();
        assert_eq!(stream.decompressed_content().unwrap(), b"BT ET".to_vec());
    }
}
