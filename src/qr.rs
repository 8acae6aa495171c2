//! QR code rendering for share links.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops, imageops::FilterType, DynamicImage, ImageBuffer, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

/// Edge length of the downloadable, print-quality image.
pub const PRINT_SIZE: u32 = 900;

type GrayImage = ImageBuffer<Luma<u8>, Vec<u8>>;

fn render(payload: &str) -> anyhow::Result<GrayImage> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
        .map_err(|e| anyhow::anyhow!("cannot encode {} bytes as QR code: {}", payload.len(), e))?;
    Ok(code.render::<Luma<u8>>().build())
}

fn encode_png(img: GrayImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// PNG at the renderer's default module size, for inline previews.
pub fn preview_png(payload: &str) -> anyhow::Result<Vec<u8>> {
    encode_png(render(payload)?)
}

/// PNG scaled to exactly `size`×`size`. Nearest-neighbour keeps module edges sharp.
pub fn png_with_size(payload: &str, size: u32) -> anyhow::Result<Vec<u8>> {
    let img = render(payload)?;
    let scaled = imageops::resize(&img, size, size, FilterType::Nearest);
    encode_png(scaled)
}

pub fn print_png(payload: &str) -> anyhow::Result<Vec<u8>> {
    png_with_size(payload, PRINT_SIZE)
}

/// `data:` URI embedding [`preview_png`].
pub fn preview_data_uri(payload: &str) -> anyhow::Result<String> {
    let png = preview_png(payload)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
