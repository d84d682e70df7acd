//! # selina-channels
//!
//! WhatsApp transport for Selina plus the imaging helpers around it.

pub mod qr;
pub mod sticker;
pub mod whatsapp;

pub use qr::qr_data_url;
pub use sticker::{to_profile_picture, to_sticker};
pub use whatsapp::{WhatsAppConnection, WhatsAppConnectionFactory};
