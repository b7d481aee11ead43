//! Test fixtures: generated images and canned upstream payloads

#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;

pub const API_KEY: &str = "test-api-key";
pub const BOT_TOKEN: &str = "123456:test-token";
pub const CHAT_ID: &str = "4242";
pub const PUBLIC_BASE_URL: &str = "http://tryon.test";

/// Solid-colour PNG of the given size.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 120, 80, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    buffer
}

/// DejaVu Sans, shipped with the tests so the watermark always has a font.
pub fn watermark_font() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}
