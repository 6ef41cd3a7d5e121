//! # Signature Capture
//!
//! A signature is always a PNG on a fixed 400×150 transparent canvas,
//! carried around as a data URI. It is produced either by stroking the
//! pointer paths the signer drew, or by fitting an uploaded picture into
//! the canvas. Both end in the same `rasterize` call.

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::error::FormsError;
use crate::image_loader::png_data_uri;

pub const CANVAS_WIDTH: u32 = 400;
pub const CANVAS_HEIGHT: u32 = 150;
pub const STROKE_WIDTH: f32 = 2.0;

/// A pointer position in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One pen-down to pen-up movement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PenStroke {
    pub points: Vec<Point>,
}

impl PenStroke {
    pub fn new(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            points: points.into_iter().map(|(x, y)| Point { x, y }).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum SignatureSource {
    /// Freehand strokes drawn on the canvas.
    Drawn(Vec<PenStroke>),
    /// An image file (PNG or JPEG bytes).
    Uploaded(Vec<u8>),
}

impl SignatureSource {
    /// Produce the signature raster as a `data:image/png;base64,...` URI.
    pub fn rasterize(&self) -> Result<String, FormsError> {
        let png = match self {
            SignatureSource::Drawn(strokes) => draw_strokes(strokes)?,
            SignatureSource::Uploaded(bytes) => encode_png(&fit_upload(bytes)?)?,
        };
        Ok(png_data_uri(&png))
    }
}

fn draw_strokes(strokes: &[PenStroke]) -> Result<Vec<u8>, FormsError> {
    if strokes.iter().all(|s| s.points.is_empty()) {
        return Err(FormsError::CaptureError("signature is empty".to_string()));
    }

    let mut pixmap = Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT)
        .ok_or_else(|| FormsError::CaptureError("could not allocate canvas".to_string()))?;

    let mut paint = Paint::default();
    paint.set_color(Color::BLACK);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: STROKE_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for pen in strokes {
        match pen.points.as_slice() {
            [] => {}
            // A tap leaves a dot the size of the pen.
            [p] => {
                if let Some(dot) = PathBuilder::from_circle(p.x, p.y, STROKE_WIDTH / 2.0) {
                    pixmap.fill_path(
                        &dot,
                        &paint,
                        tiny_skia::FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            [first, rest @ ..] => {
                let mut pb = PathBuilder::new();
                pb.move_to(first.x, first.y);
                for p in rest {
                    pb.line_to(p.x, p.y);
                }
                if let Some(path) = pb.finish() {
                    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                }
            }
        }
    }

    pixmap
        .encode_png()
        .map_err(|e| FormsError::CaptureError(format!("PNG encode failed: {}", e)))
}

/// Scale an uploaded picture to fit the canvas, keeping its aspect ratio,
/// and centre it on a transparent background.
fn fit_upload(bytes: &[u8]) -> Result<RgbaImage, FormsError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| FormsError::ImageError(format!("unreadable signature image: {}", e)))?
        .to_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(FormsError::ImageError("signature image has no pixels".to_string()));
    }

    let (draw_w, draw_h) = fit_within(img.width(), img.height(), CANVAS_WIDTH, CANVAS_HEIGHT);
    let scaled = imageops::resize(&img, draw_w, draw_h, FilterType::Triangle);

    let mut canvas = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    let x = (CANVAS_WIDTH - draw_w) / 2;
    let y = (CANVAS_HEIGHT - draw_h) / 2;
    imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);
    Ok(canvas)
}

/// Largest size with the source aspect ratio that fits the box.
fn fit_within(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    let aspect = src_w as f64 / src_h as f64;
    if aspect > box_w as f64 / box_h as f64 {
        let h = (box_w as f64 / aspect).round().max(1.0) as u32;
        (box_w, h.min(box_h))
    } else {
        let w = (box_h as f64 * aspect).round().max(1.0) as u32;
        (w.min(box_w), box_h)
    }
}

pub(crate) fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, FormsError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)
        .map_err(|e| FormsError::CaptureError(format!("PNG encode failed: {}", e)))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::{load_data_uri, ImageData};

    #[test]
    fn test_drawn_signature_is_canvas_sized_png() {
        let source = SignatureSource::Drawn(vec![
            PenStroke::new([(10.0, 75.0), (120.0, 40.0), (200.0, 110.0)]),
            PenStroke::new([(300.0, 70.0)]),
        ]);
        let uri = source.rasterize().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let loaded = load_data_uri(&uri).unwrap();
        assert_eq!((loaded.width, loaded.height), (CANVAS_WIDTH, CANVAS_HEIGHT));
        match loaded.data {
            // Ink on a transparent canvas.
            ImageData::Raw { alpha: Some(alpha), .. } => {
                assert!(alpha.iter().any(|a| *a > 0));
                assert!(alpha.iter().any(|a| *a == 0));
            }
            other => panic!("expected decoded PNG with alpha, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_drawing_is_rejected() {
        let result = SignatureSource::Drawn(vec![PenStroke::default()]).rasterize();
        assert!(matches!(result, Err(FormsError::CaptureError(_))));
    }

    #[test]
    fn test_upload_is_fitted_and_centred() {
        // 100×100 opaque square: fits to 150×150, centred horizontally.
        let square = RgbaImage::from_pixel(100, 100, image::Rgba([0, 0, 255, 255]));
        let uri = SignatureSource::Uploaded(encode_png(&square).unwrap())
            .rasterize()
            .unwrap();
        let loaded = load_data_uri(&uri).unwrap();
        assert_eq!((loaded.width, loaded.height), (CANVAS_WIDTH, CANVAS_HEIGHT));
        let ImageData::Raw { alpha: Some(alpha), .. } = loaded.data else {
            panic!("expected transparent margins");
        };
        let at = |x: u32, y: u32| alpha[(y * CANVAS_WIDTH + x) as usize];
        assert_eq!(at(0, 75), 0);
        assert_eq!(at(200, 75), 255);
        assert_eq!(at(399, 75), 0);
    }

    #[test]
    fn test_garbage_upload_is_an_image_error() {
        let result = SignatureSource::Uploaded(b"not an image".to_vec()).rasterize();
        assert!(matches!(result, Err(FormsError::ImageError(_))));
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(800, 150, 400, 150), (400, 75));
        assert_eq!(fit_within(100, 100, 400, 150), (150, 150));
        assert_eq!(fit_within(400, 150, 400, 150), (400, 150));
    }
}
