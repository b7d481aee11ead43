use ab_glyph::{FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

use crate::services::storage::StorageError;

/// Distance between the caption and the image edges, in pixels.
const MARGIN: u32 = 20;
const SHADOW_OFFSET: i32 = 2;
const JPEG_QUALITY: u8 = 90;

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Renders a fixed caption at the bottom-right corner of result images.
pub struct Watermarker {
    font: FontVec,
    text: String,
}

impl Watermarker {
    pub fn new(font_data: Vec<u8>, text: &str) -> Result<Self, WatermarkError> {
        let font = FontVec::try_from_vec(font_data).map_err(|_| WatermarkError::Font)?;
        Ok(Self {
            font,
            text: text.to_string(),
        })
    }

    pub fn from_font_file(path: &Path, text: &str) -> Result<Self, WatermarkError> {
        let data = std::fs::read(path)?;
        Self::new(data, text)
    }

    /// Draw the caption onto `img`.
    pub fn apply(&self, img: DynamicImage) -> RgbaImage {
        let mut canvas = img.to_rgba8();
        let (width, height) = canvas.dimensions();

        let scale = PxScale::from(caption_scale(height));
        let (text_w, text_h) = text_size(scale, &self.font, &self.text);
        let (x, y) = caption_origin((width, height), (text_w, text_h), MARGIN);

        draw_text_mut(
            &mut canvas,
            SHADOW_COLOR,
            x + SHADOW_OFFSET,
            y + SHADOW_OFFSET,
            scale,
            &self.font,
            &self.text,
        );
        draw_text_mut(&mut canvas, TEXT_COLOR, x, y, scale, &self.font, &self.text);

        canvas
    }

    /// Decode `source`, draw the caption and re-encode as JPEG.
    pub fn render_jpeg(&self, source: &[u8]) -> Result<Vec<u8>, WatermarkError> {
        let img = image::load_from_memory(source)?;
        let rgb = DynamicImage::ImageRgba8(self.apply(img)).to_rgb8();

        let mut out = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))?;
        Ok(out)
    }
}

/// Caption height scales with the image, within readable bounds.
pub fn caption_scale(image_height: u32) -> f32 {
    (image_height as f32 / 25.0).clamp(14.0, 96.0)
}

/// Top-left corner for a caption of `text` size anchored bottom-right with `margin`.
pub fn caption_origin(image: (u32, u32), text: (u32, u32), margin: u32) -> (i32, i32) {
    let x = image.0 as i64 - text.0 as i64 - margin as i64;
    let y = image.1 as i64 - text.1 as i64 - margin as i64;
    (x.max(0) as i32, y.max(0) as i32)
}

#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("Watermark font could not be parsed")]
    Font,

    #[error("Watermark I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Result download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Watermark task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
