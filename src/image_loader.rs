//! Images bound for the PDF: signature data URIs and capture bands.
//!
//! JPEG is embedded as-is with DCTDecode. Anything else is decoded and split
//! into an RGB plane and an optional alpha plane, the latter becoming an
//! SMask. Drawn signatures are mostly transparent, so the alpha plane is
//! the common case.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, ImageDecoder, ImageFormat, RgbaImage};

use crate::error::FormsError;

/// Prefix a value must carry to be treated as an embeddable image.
pub const DATA_URI_PREFIX: &str = "data:image/";

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub data: ImageData,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Untouched JPEG stream.
    Dct { bytes: Vec<u8>, color_space: ColorSpace },
    /// Three bytes per pixel, plus one alpha byte per pixel unless the
    /// image is fully opaque.
    Raw { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "/DeviceRGB",
            ColorSpace::DeviceGray => "/DeviceGray",
        }
    }
}

pub fn is_image_data_uri(value: &str) -> bool {
    value.starts_with(DATA_URI_PREFIX)
}

/// Decode a `data:image/<type>;base64,<payload>` value.
pub fn load_data_uri(uri: &str) -> Result<EmbeddedImage, FormsError> {
    let payload = uri
        .strip_prefix(DATA_URI_PREFIX)
        .and_then(|rest| rest.split_once(','))
        .map(|(_, payload)| payload)
        .ok_or_else(|| FormsError::ImageError("not a base64 image data URI".to_string()))?;
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| FormsError::ImageError(format!("bad base64 payload: {}", e)))?;
    decode_image_bytes(&bytes)
}

/// Wrap encoded PNG bytes as a data URI.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("{}png;base64,{}", DATA_URI_PREFIX, BASE64.encode(png))
}

/// Sniff the format and prepare the bytes for embedding. Only JPEG and PNG
/// are accepted.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<EmbeddedImage, FormsError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => passthrough_jpeg(bytes),
        Ok(ImageFormat::Png) => {
            let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
                .map_err(|e| FormsError::ImageError(format!("corrupt PNG: {}", e)))?;
            Ok(from_rgba(&img.to_rgba8()))
        }
        Ok(other) => Err(FormsError::ImageError(format!(
            "{:?} images are not supported, use PNG or JPEG",
            other
        ))),
        Err(_) => Err(FormsError::ImageError("unrecognized image data".to_string())),
    }
}

/// Read the JPEG header only; the pixels are left to the PDF viewer.
fn passthrough_jpeg(bytes: &[u8]) -> Result<EmbeddedImage, FormsError> {
    let decoder = JpegDecoder::new(Cursor::new(bytes))
        .map_err(|e| FormsError::ImageError(format!("corrupt JPEG: {}", e)))?;
    let (width, height) = decoder.dimensions();
    let color_space = match decoder.color_type() {
        ColorType::L8 | ColorType::L16 => ColorSpace::DeviceGray,
        _ => ColorSpace::DeviceRGB,
    };
    Ok(EmbeddedImage {
        data: ImageData::Dct {
            bytes: bytes.to_vec(),
            color_space,
        },
        width,
        height,
    })
}

/// Split an RGBA buffer into its colour and alpha planes.
pub fn from_rgba(rgba: &RgbaImage) -> EmbeddedImage {
    let (rgb, alpha): (Vec<[u8; 3]>, Vec<u8>) = rgba
        .pixels()
        .map(|p| ([p[0], p[1], p[2]], p[3]))
        .unzip();
    let opaque = alpha.iter().all(|a| *a == u8::MAX);

    EmbeddedImage {
        data: ImageData::Raw {
            rgb: rgb.concat(),
            alpha: (!opaque).then_some(alpha),
        },
        width: rgba.width(),
        height: rgba.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::encode_png;

    #[test]
    fn test_rejects_non_image_values() {
        assert!(!is_image_data_uri("https://example.com/assinatura.png"));
        assert!(load_data_uri("https://example.com/assinatura.png").is_err());
        assert!(load_data_uri("data:image/png;base64").is_err());
        assert!(load_data_uri("data:image/png;base64,%%%").is_err());
    }

    #[test]
    fn test_rejects_unknown_and_truncated_bytes() {
        assert!(decode_image_bytes(b"GIF89a").is_err());
        assert!(decode_image_bytes(&[]).is_err());

        let png = encode_png(&RgbaImage::new(8, 8)).unwrap();
        assert!(decode_image_bytes(&png[..png.len() / 2]).is_err());
    }

    #[test]
    fn test_translucent_png_keeps_alpha_plane() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 0, 0]));
        let loaded = load_data_uri(&png_data_uri(&encode_png(&img).unwrap())).unwrap();
        assert_eq!((loaded.width, loaded.height), (2, 1));
        assert_eq!(
            loaded.data,
            ImageData::Raw {
                rgb: vec![10, 20, 30, 0, 0, 0],
                alpha: Some(vec![255, 0]),
            }
        );
    }

    #[test]
    fn test_opaque_raster_drops_alpha_plane() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([200, 200, 200, 255]));
        let embedded = from_rgba(&img);
        match embedded.data {
            ImageData::Raw { rgb, alpha } => {
                assert_eq!(rgb.len(), 3 * 2 * 3);
                assert!(alpha.is_none());
            }
            other => panic!("expected raw planes, got {:?}", other),
        }
    }

    #[test]
    fn test_jpeg_signature_is_passed_through() {
        let img = image::GrayImage::from_pixel(40, 15, image::Luma([30]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new(&mut jpeg)
            .encode(img.as_raw(), 40, 15, ColorType::L8)
            .unwrap();

        let uri = format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg));
        let loaded = load_data_uri(&uri).unwrap();
        assert_eq!((loaded.width, loaded.height), (40, 15));
        assert_eq!(
            loaded.data,
            ImageData::Dct {
                bytes: jpeg,
                color_space: ColorSpace::DeviceGray,
            }
        );
    }
}
