//! # Raster Image Loading
//!
//! Resolves an image item's source string to pixels. Sources may be a
//! `data:image/...;base64,` URI, an explicit file path, or bare base64.
//! JPEG and PNG are recognised by their magic bytes and decoded to RGBA so
//! every surface receives the same pixel layout.

use std::io::Cursor;

use serde::Serialize;

/// A decoded raster image. The native size is the pixel size; painting
/// scales it onto the item's device rectangle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterImage {
    pub width_px: u32,
    pub height_px: u32,
    pub format: RasterFormat,
    /// width * height * 4 bytes (RGBA).
    #[serde(skip)]
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RasterFormat {
    Jpeg,
    Png,
    Raw,
}

impl RasterImage {
    /// Wrap already-decoded RGBA pixels.
    pub fn from_rgba(width_px: u32, height_px: u32, rgba: Vec<u8>) -> Self {
        Self {
            width_px,
            height_px,
            format: RasterFormat::Raw,
            rgba,
        }
    }

    /// True if the image has no area; such images cannot be scaled.
    pub fn is_null(&self) -> bool {
        self.width_px == 0 || self.height_px == 0
    }
}

/// Load an image from a source string.
///
/// Supported `src` formats:
/// - `data:image/...;base64,...` data URI
/// - File path starting with `/`, `./` or `../`
/// - Raw base64-encoded image data
pub fn load_image(src: &str) -> Result<RasterImage, String> {
    let raw_bytes = read_source_bytes(src)?;
    decode_image_bytes(&raw_bytes)
}

/// Resolve the source string to raw image bytes.
fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    if let Some(rest) = src.strip_prefix("data:image/") {
        let comma_pos = rest
            .find(',')
            .ok_or_else(|| "Invalid data URI: missing comma".to_string())?;
        return base64_decode(&rest[comma_pos + 1..]);
    }

    // Base64 contains '/', so only explicit path prefixes count as paths
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src).map_err(|e| format!("Failed to read image file '{}': {}", src, e));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| format!("Base64 decode error: {}", e))
}

/// Detect image format from magic bytes and decode accordingly.
pub fn decode_image_bytes(data: &[u8]) -> Result<RasterImage, String> {
    if data.len() < 4 {
        return Err("Image data too short".to_string());
    }

    let format = if is_jpeg(data) {
        RasterFormat::Jpeg
    } else if is_png(data) {
        RasterFormat::Png
    } else {
        return Err("Unsupported image format (expected JPEG or PNG)".to_string());
    };

    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("{:?} format detection error: {}", format, e))?;
    let img = reader
        .decode()
        .map_err(|e| format!("Failed to decode {:?}: {}", format, e))?;

    let rgba = img.to_rgba8();
    Ok(RasterImage {
        width_px: rgba.width(),
        height_px: rgba.height(),
        format,
        rgba: rgba.into_raw(),
    })
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |_, _| image::Rgba([255, 0, 0, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    #[test]
    fn test_magic_bytes() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(load_image("data:image/png;base64").is_err());
    }

    #[test]
    fn test_unsupported_format() {
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
        assert!(decode_image_bytes(&[0x00, 0x01, 0x02, 0x03, 0x04]).is_err());
    }

    #[test]
    fn test_decode_png_dimensions() {
        let loaded = decode_image_bytes(&encode_png(3, 2)).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (3, 2));
        assert_eq!(loaded.format, RasterFormat::Png);
        assert_eq!(loaded.rgba.len(), 3 * 2 * 4);
        assert_eq!(&loaded.rgba[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_jpeg() {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8).unwrap();

        let loaded = decode_image_bytes(&buf).unwrap();
        assert_eq!(loaded.format, RasterFormat::Jpeg);
        assert_eq!((loaded.width_px, loaded.height_px), (2, 2));
    }

    #[test]
    fn test_base64_sources() {
        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD.encode(encode_png(1, 1));

        let from_uri = load_image(&format!("data:image/png;base64,{}", b64)).unwrap();
        assert_eq!(from_uri.width_px, 1);

        let from_bare = load_image(&b64).unwrap();
        assert_eq!(from_bare.height_px, 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_image("./definitely/not/here.png").unwrap_err();
        assert!(err.contains("Failed to read image file"));
    }

    #[test]
    fn test_null_image() {
        assert!(RasterImage::from_rgba(0, 10, vec![]).is_null());
        assert!(!RasterImage::from_rgba(1, 1, vec![0; 4]).is_null());
    }
}
