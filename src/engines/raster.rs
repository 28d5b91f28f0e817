//! Image re-encoding.
//!
//! Input pixels are decoded once and re-encoded for the target container:
//! RGB for JPEG, RGBA for PNG, WebP and GIF so transparency survives whenever
//! the target can carry it.

use std::io::Cursor;

use async_trait::async_trait;
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader,
    codecs::{gif::GifEncoder, jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder},
};
use tracing::debug;

use super::run_blocking;
use crate::{
    error::EngineError, formats::Category, formats::FormatType, traits::Engine,
    types::TransformRequest,
};

/// Re-encodes JPEG, PNG, WebP and GIF images.
#[derive(Debug, Clone)]
pub struct ImageEngine {
    jpeg_quality: u8,
}

impl ImageEngine {
    pub fn new(jpeg_quality: u8) -> Self {
        ImageEngine {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }
}

#[async_trait]
impl Engine for ImageEngine {
    fn category(&self) -> Category {
        Category::Image
    }

    fn name(&self) -> &'static str {
        "image"
    }

    async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError> {
        let quality = self.jpeg_quality;
        run_blocking(move || {
            let image = decode(&request.bytes, request.input)?;
            debug!(
                width = image.width(),
                height = image.height(),
                output = %request.output,
                "re-encoding image"
            );
            encode(&image, request.output, quality)
        })
        .await
    }
}

fn container(format: FormatType) -> Option<ImageFormat> {
    match format {
        FormatType::Jpeg => Some(ImageFormat::Jpeg),
        FormatType::Png => Some(ImageFormat::Png),
        FormatType::Webp => Some(ImageFormat::WebP),
        FormatType::Gif => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// Decodes `bytes`, trusting magic bytes over the declared format.
pub fn decode(bytes: &[u8], declared: FormatType) -> Result<DynamicImage, EngineError> {
    if let Ok(reader) = ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        if reader.format().is_some() {
            return Ok(reader.decode()?);
        }
    }
    let format = container(declared)
        .ok_or_else(|| EngineError::invalid_input(format!("`{declared}` is not an image")))?;
    Ok(image::load_from_memory_with_format(bytes, format)?)
}

/// Encodes `image` as `target`.
pub fn encode(image: &DynamicImage, target: FormatType, jpeg_quality: u8) -> Result<Vec<u8>, EngineError> {
    let mut buffer = Vec::new();
    match target {
        FormatType::Jpeg => {
            let rgb = image.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
            encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
        }
        FormatType::Png => {
            let rgba = image.to_rgba8();
            PngEncoder::new(&mut buffer).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        FormatType::Webp => {
            let rgba = image.to_rgba8();
            WebPEncoder::new_lossless(&mut buffer).encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        FormatType::Gif => {
            let rgba = image.to_rgba8();
            // the GIF trailer is written when the encoder drops
            let mut encoder = GifEncoder::new(&mut buffer);
            encoder.encode(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)?;
        }
        other => {
            return Err(EngineError::Unsupported(format!(
                "cannot encode an image as `{other}`"
            )));
        }
    }
    Ok(buffer)
}
