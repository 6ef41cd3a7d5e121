//! # PDF Serializer
//!
//! Turns a [`LayoutDocument`] into PDF 1.7 bytes. Only what the forms draw
//! is supported: the two standard Helvetica faces, hairline strokes and
//! raster images.
//!
//! Layout coordinates are millimetres from the top-left corner with text
//! `y` on the baseline. PDF user space is points from the bottom-left, so
//! every coordinate goes through [`PageSpace`] on its way out.
//!
//! ```text
//! %PDF-1.7
//! 1 0 obj  Catalog
//! 2 0 obj  Pages
//! 3 0 obj  Helvetica (+ Helvetica-Bold when used)
//! ...      per page: image XObjects, content stream, Page
//! n 0 obj  Info
//! xref / trailer / %%EOF
//! ```

use std::fmt::Write as _;
use std::io::Write as _;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::{winansi_byte, StandardFont, MISSING_GLYPH, PT_PER_MM};
use crate::image_loader::{EmbeddedImage, ImageData};
use crate::layout::{DrawCommand, LayoutDocument, LayoutPage, Metadata, LINE_WIDTH};

const PRODUCER: &str = concat!("tcc-forms ", env!("CARGO_PKG_VERSION"));
const CATALOG: usize = 1;
const PAGE_TREE: usize = 2;
const DEFLATE_LEVEL: u8 = 6;

#[derive(Debug, Default)]
pub struct PdfWriter;

/// Object bodies indexed by object number. Slot 0 is the free-list head
/// and never written.
struct ObjectTable {
    bodies: Vec<Vec<u8>>,
}

impl ObjectTable {
    fn new() -> Self {
        ObjectTable {
            bodies: vec![Vec::new(); PAGE_TREE + 1],
        }
    }

    fn add(&mut self, body: impl Into<Vec<u8>>) -> usize {
        self.bodies.push(body.into());
        self.bodies.len() - 1
    }

    fn add_stream(&mut self, dict_entries: &str, data: &[u8]) -> usize {
        let mut body = Vec::with_capacity(data.len() + dict_entries.len() + 40);
        let _ = write!(body, "<< {} /Length {} >>\nstream\n", dict_entries, data.len());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.add(body)
    }

    fn add_deflated(&mut self, dict_entries: &str, data: &[u8]) -> usize {
        let packed = compress_to_vec_zlib(data, DEFLATE_LEVEL);
        self.add_stream(&format!("{} /Filter /FlateDecode", dict_entries), &packed)
    }

    fn set(&mut self, id: usize, body: impl Into<Vec<u8>>) {
        self.bodies[id] = body.into();
    }

    fn into_file(self, info: usize) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n");

        let mut offsets = Vec::with_capacity(self.bodies.len());
        for (id, body) in self.bodies.iter().enumerate().skip(1) {
            offsets.push(out.len());
            let _ = write!(out, "{} 0 obj\n", id);
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", self.bodies.len());
        for offset in offsets {
            let _ = write!(out, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            out,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.bodies.len(),
            CATALOG,
            info,
            xref_at
        );
        out
    }
}

/// Millimetre-to-point conversion for one page.
#[derive(Clone, Copy)]
struct PageSpace {
    height_mm: f64,
}

impl PageSpace {
    fn x(&self, mm: f64) -> f64 {
        mm * PT_PER_MM
    }

    fn y(&self, mm: f64) -> f64 {
        (self.height_mm - mm) * PT_PER_MM
    }

    fn len(&self, mm: f64) -> f64 {
        mm * PT_PER_MM
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, document: &LayoutDocument) -> Vec<u8> {
        let mut objects = ObjectTable::new();

        let fonts: Vec<(StandardFont, usize)> = StandardFont::ALL
            .into_iter()
            .filter(|f| *f == StandardFont::Helvetica || uses_font(document, *f))
            .map(|f| {
                let dict = format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    f.pdf_name()
                );
                (f, objects.add(dict))
            })
            .collect();
        let font_resources = fonts
            .iter()
            .map(|(f, id)| format!("/{} {} 0 R", f.resource_name(), id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut next_image = 0;
        let mut kids = Vec::with_capacity(document.pages.len());
        for page in &document.pages {
            let (content, images) = page_content(page, &mut objects, &mut next_image);
            let contents = objects.add_deflated("", content.as_bytes());

            let mut resources = format!("/Font << {} >>", font_resources);
            if !images.is_empty() {
                let _ = write!(resources, " /XObject << {} >>", images.join(" "));
            }
            let space = PageSpace {
                height_mm: page.height,
            };
            kids.push(objects.add(format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] /Contents {} 0 R /Resources << {} >> >>",
                PAGE_TREE,
                space.len(page.width),
                space.len(page.height),
                contents,
                resources
            )));
        }

        objects.set(CATALOG, format!("<< /Type /Catalog /Pages {} 0 R >>", PAGE_TREE));
        objects.set(
            PAGE_TREE,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.iter().map(|id| format!("{} 0 R", id)).collect::<Vec<_>>().join(" "),
                kids.len()
            ),
        );
        let info = objects.add(info_dict(&document.metadata));
        objects.into_file(info)
    }
}

fn uses_font(document: &LayoutDocument, font: StandardFont) -> bool {
    document.pages.iter().any(|page| {
        page.elements
            .iter()
            .any(|el| matches!(el, DrawCommand::Text { font: f, .. } if *f == font))
    })
}

fn info_dict(metadata: &Metadata) -> String {
    let mut info = String::from("<<");
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            let _ = write!(info, " /{} ({})", key, pdf_string(value));
        }
    }
    let _ = write!(info, " /Producer ({}) /Creator (tcc-forms) >>", PRODUCER);
    info
}

/// Content stream for one page. Images are written as XObjects as they are
/// met; the returned names go into the page's resource dictionary.
fn page_content(
    page: &LayoutPage,
    objects: &mut ObjectTable,
    next_image: &mut usize,
) -> (String, Vec<String>) {
    let space = PageSpace {
        height_mm: page.height,
    };
    let mut ops = String::new();
    let mut images = Vec::new();
    let _ = writeln!(ops, "0 g 0 G {:.2} w", space.len(LINE_WIDTH));

    for element in &page.elements {
        match element {
            DrawCommand::Text {
                x,
                y,
                text,
                font,
                font_size,
            } => {
                let _ = writeln!(
                    ops,
                    "BT /{} {:.2} Tf {:.2} {:.2} Td ({}) Tj ET",
                    font.resource_name(),
                    font_size,
                    space.x(*x),
                    space.y(*y),
                    pdf_string(text)
                );
            }
            DrawCommand::Line { x1, y1, x2, y2 } => {
                let _ = writeln!(
                    ops,
                    "{:.2} {:.2} m {:.2} {:.2} l S",
                    space.x(*x1),
                    space.y(*y1),
                    space.x(*x2),
                    space.y(*y2)
                );
            }
            DrawCommand::Rect {
                x,
                y,
                width,
                height,
            } => {
                let _ = writeln!(
                    ops,
                    "{:.2} {:.2} {:.2} {:.2} re S",
                    space.x(*x),
                    space.y(y + height),
                    space.len(*width),
                    space.len(*height)
                );
            }
            DrawCommand::Image {
                x,
                y,
                width,
                height,
                image,
            } => {
                let name = format!("Im{}", *next_image);
                *next_image += 1;
                let id = write_image(objects, image);
                images.push(format!("/{} {} 0 R", name, id));
                let _ = writeln!(
                    ops,
                    "q {:.4} 0 0 {:.4} {:.2} {:.2} cm /{} Do Q",
                    space.len(*width),
                    space.len(*height),
                    space.x(*x),
                    space.y(y + height),
                    name
                );
            }
        }
    }
    (ops, images)
}

/// Write an image XObject, plus its soft mask when it has one. Returns the
/// object number of the image itself.
fn write_image(objects: &mut ObjectTable, image: &EmbeddedImage) -> usize {
    let size = format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /BitsPerComponent 8",
        image.width, image.height
    );
    match &image.data {
        ImageData::Dct { bytes, color_space } => objects.add_stream(
            &format!(
                "{} /ColorSpace {} /Filter /DCTDecode",
                size,
                color_space.pdf_name()
            ),
            bytes,
        ),
        ImageData::Raw { rgb, alpha } => {
            let smask = alpha
                .as_deref()
                .map(|alpha| {
                    let id = objects.add_deflated(&format!("{} /ColorSpace /DeviceGray", size), alpha);
                    format!(" /SMask {} 0 R", id)
                })
                .unwrap_or_default();
            objects.add_deflated(&format!("{} /ColorSpace /DeviceRGB{}", size, smask), rgb)
        }
    }
}

/// Body of a PDF literal string in WinAnsiEncoding. Bytes outside printable
/// ASCII are octal-escaped; characters with no WinAnsi code become `?`.
fn pdf_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match winansi_byte(ch).unwrap_or(MISSING_GLYPH as u8) {
            b @ (b'\\' | b'(' | b')') => {
                out.push('\\');
                out.push(b as char);
            }
            b @ 0x20..=0x7E => out.push(b as char),
            b => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}
