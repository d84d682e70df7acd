use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An incoming chat message delivered by a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform message id (needed to react to it).
    pub id: String,
    /// Conversation the message arrived in; replies go here.
    pub chat_id: String,
    /// Platform-specific sender id.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Text body or media caption. Empty for bare media.
    pub text: String,
    /// Sent by the bot's own account.
    #[serde(default)]
    pub from_me: bool,
    /// Whether this message comes from a group chat.
    #[serde(default)]
    pub is_group: bool,
    pub timestamp: DateTime<Utc>,
    /// Media attached to the message, already downloaded.
    #[serde(default)]
    pub attachment: Option<Media>,
}

impl InboundMessage {
    /// Plain text message, handy for building events.
    pub fn text(chat_id: &str, text: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender_id: chat_id.to_string(),
            sender_name: None,
            text: text.to_string(),
            from_me: false,
            is_group: false,
            timestamp: Utc::now(),
            attachment: None,
        }
    }
}

/// A conversation known to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: String,
    pub name: Option<String>,
    pub is_group: bool,
}

/// Binary media, inbound or outbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub mimetype: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub caption: Option<String>,
}

impl Media {
    pub fn image(data: Vec<u8>, caption: Option<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            mimetype: "image/jpeg".into(),
            data,
            caption,
        }
    }

    pub fn video(data: Vec<u8>, caption: Option<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            mimetype: "video/mp4".into(),
            data,
            caption,
        }
    }

    pub fn sticker(data: Vec<u8>) -> Self {
        Self {
            kind: MediaKind::Sticker,
            mimetype: "image/webp".into(),
            data,
            caption: None,
        }
    }
}

/// Supported media kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Sticker,
    Document,
}
