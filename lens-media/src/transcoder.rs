use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};

pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// A derived JPEG preview.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

impl Thumbnail {
    pub fn content_type(&self) -> &'static str {
        THUMBNAIL_CONTENT_TYPE
    }
}

/// Bytes in, thumbnail bytes out. Implementations hold no mutable state so
/// one instance can serve concurrent uploads and retries.
pub trait Transcoder: Send + Sync {
    /// Fails with `UnsupportedImage` when `bytes` cannot be decoded.
    fn make_thumbnail(&self, bytes: &[u8]) -> MediaResult<Thumbnail>;
}

/// Max-fit resize to a bounded longest edge, re-encoded as JPEG.
#[derive(Debug, Clone, Copy)]
pub struct JpegThumbnailer {
    max_edge: u32,
    quality: u8,
}

impl Default for JpegThumbnailer {
    fn default() -> Self {
        Self::from_config(&MediaConfig::default())
    }
}

impl JpegThumbnailer {
    pub fn new(max_edge: u32, quality: u8) -> Self {
        Self {
            max_edge: max_edge.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.thumbnail_max_edge_px, config.thumbnail_quality)
    }
}

/// Target size with the longer edge capped at `max_edge`. Never upscales.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_edge {
        return (width, height);
    }
    let scale = |edge: u32| -> u32 {
        let scaled = (u64::from(edge) * u64::from(max_edge) + u64::from(longer) / 2) / u64::from(longer);
        (scaled as u32).max(1)
    };
    if width >= height {
        (max_edge, scale(height))
    } else {
        (scale(width), max_edge)
    }
}

impl Transcoder for JpegThumbnailer {
    fn make_thumbnail(&self, bytes: &[u8]) -> MediaResult<Thumbnail> {
        let source = image::load_from_memory(bytes).map_err(|e| MediaError::UnsupportedImage(e.to_string()))?;
        let (src_width, src_height) = source.dimensions();
        let (width, height) = fit_within(src_width, src_height, self.max_edge);

        let resized = if (width, height) == (src_width, src_height) {
            source
        } else {
            source.resize_exact(width, height, FilterType::Lanczos3)
        };

        // JPEG has no alpha channel
        let rgb = resized.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode_image(&rgb)
            .map_err(|e| MediaError::UnsupportedImage(format!("jpeg encode failed: {e}")))?;

        Ok(Thumbnail {
            bytes: Bytes::from(out),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 128, 200]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, format)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn fit_keeps_aspect_ratio() {
        assert_eq!(fit_within(1200, 800, 600), (600, 400));
        assert_eq!(fit_within(800, 1200, 600), (400, 600));
        assert_eq!(fit_within(6000, 1, 600), (600, 1));
        assert_eq!(fit_within(300, 200, 600), (300, 200));
        assert_eq!(fit_within(600, 600, 600), (600, 600));
    }

    #[test]
    fn large_png_becomes_bounded_jpeg() {
        let thumb = JpegThumbnailer::default()
            .make_thumbnail(&encoded(1200, 900, ImageFormat::Png))
            .unwrap();

        assert_eq!(thumb.content_type(), "image/jpeg");
        let decoded = image::load_from_memory(&thumb.bytes).unwrap();
        assert_eq!(image::guess_format(&thumb.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(decoded.dimensions(), (600, 450));
    }

    #[test]
    fn small_gif_is_not_upscaled() {
        let thumb = JpegThumbnailer::default()
            .make_thumbnail(&encoded(120, 80, ImageFormat::Gif))
            .unwrap();

        let decoded = image::load_from_memory(&thumb.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (120, 80));
        assert_eq!((thumb.width, thumb.height), (120, 80));
    }

    #[test]
    fn garbage_is_unsupported() {
        let err = JpegThumbnailer::default()
            .make_thumbnail(b"definitely not an image")
            .unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedImage(_)));
    }

    #[test]
    fn same_input_same_output() {
        let input = encoded(700, 300, ImageFormat::Png);
        let thumbnailer = JpegThumbnailer::new(200, 70);
        let a = thumbnailer.make_thumbnail(&input).unwrap();
        let b = thumbnailer.make_thumbnail(&input).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!((a.width, a.height), (200, 86));
    }
}
