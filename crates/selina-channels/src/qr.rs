//! QR code rendering for the setup page.

use base64::Engine;
use image::{ImageBuffer, Luma};
use qrcode::{Color, EcLevel, QrCode};
use selina_core::error::SelinaError;

const MODULE_SIZE: u32 = 10;
const QUIET_ZONE: u32 = 2;

/// Render a QR payload as PNG bytes.
pub fn generate_qr_png(qr_data: &str) -> Result<Vec<u8>, SelinaError> {
    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| SelinaError::Connection(format!("QR generation failed: {e}")))?;

    let modules = code.width() as u32;
    let img_size = (modules + QUIET_ZONE * 2) * MODULE_SIZE;

    let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let (cx, cy) = (x / MODULE_SIZE, y / MODULE_SIZE);
        if cx < QUIET_ZONE || cy < QUIET_ZONE {
            return Luma([255u8]);
        }
        let (mx, my) = (cx - QUIET_ZONE, cy - QUIET_ZONE);
        if mx >= modules || my >= modules {
            return Luma([255u8]);
        }
        match code[(mx as usize, my as usize)] {
            Color::Dark => Luma([0u8]),
            Color::Light => Luma([255u8]),
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| SelinaError::Connection(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Render a QR payload as a `data:image/png;base64,...` URL.
pub fn qr_data_url(qr_data: &str) -> Result<String, SelinaError> {
    let png = generate_qr_png(qr_data)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}
