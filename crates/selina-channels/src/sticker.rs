//! Image conversions for stickers and the account's profile picture.

use image::{imageops, DynamicImage, ImageFormat, RgbaImage};
use selina_core::error::SelinaError;

/// Stickers are square WebP images of this size.
pub const STICKER_SIZE: u32 = 512;

/// Fit an image inside a transparent 512x512 canvas and encode it as WebP.
pub fn to_sticker(image_bytes: &[u8]) -> Result<Vec<u8>, SelinaError> {
    let source = image::load_from_memory(image_bytes)
        .map_err(|e| SelinaError::Validation(format!("unsupported image: {e}")))?;

    let fitted = source.resize(STICKER_SIZE, STICKER_SIZE, imageops::FilterType::Lanczos3);
    let mut canvas = RgbaImage::new(STICKER_SIZE, STICKER_SIZE);
    let x = (STICKER_SIZE - fitted.width()) / 2;
    let y = (STICKER_SIZE - fitted.height()) / 2;
    imageops::overlay(&mut canvas, &fitted.to_rgba8(), x as i64, y as i64);

    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut buf, ImageFormat::WebP)
        .map_err(|e| SelinaError::Connection(format!("WebP encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Profile pictures are square JPEGs of this size.
pub const PROFILE_PICTURE_SIZE: u32 = 640;

/// Center-crop an image to a square and encode it as a 640x640 JPEG.
pub fn to_profile_picture(image_bytes: &[u8]) -> Result<Vec<u8>, SelinaError> {
    let source = image::load_from_memory(image_bytes)
        .map_err(|e| SelinaError::Validation(format!("unsupported image: {e}")))?;

    let side = source.width().min(source.height());
    let x = (source.width() - side) / 2;
    let y = (source.height() - side) / 2;
    let square = source.crop_imm(x, y, side, side).resize_exact(
        PROFILE_PICTURE_SIZE,
        PROFILE_PICTURE_SIZE,
        imageops::FilterType::Lanczos3,
    );

    let mut buf = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(square.to_rgb8())
        .write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|e| SelinaError::Connection(format!("JPEG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}
