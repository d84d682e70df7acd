//! Incoming WhatsApp message handling: echo filtering, unwrapping and media download.

use super::chats::remember_chat;
use super::SharedState;
use chrono::Utc;
use selina_core::message::{ChatRef, InboundMessage, Media};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use whatsapp_rust::client::Client;

/// Turn a raw message event into an [`InboundMessage`].
///
/// Returns `None` for our own echoes and for messages with neither text nor
/// a usable image.
pub(super) async fn handle_whatsapp_message(
    msg: waproto::whatsapp::Message,
    info: wacore::types::message::MessageInfo,
    client: &Arc<Client>,
    state: &SharedState,
    session_dir: &Path,
) -> Option<InboundMessage> {
    let is_group = info.source.is_group;
    let chat_id = info.source.chat.to_string();
    let msg_id = info.id.clone();

    debug!(
        "WA msg: is_group={is_group}, is_from_me={}, chat={chat_id}",
        info.source.is_from_me
    );

    if state.sent_ids.lock().await.remove(&msg_id) {
        debug!("skipping own echo: {msg_id}");
        return None;
    }

    let push_name = (!info.push_name.is_empty()).then(|| info.push_name.clone());

    remember_chat(
        state,
        session_dir,
        ChatRef {
            id: chat_id.clone(),
            name: if is_group { None } else { push_name.clone() },
            is_group,
        },
    )
    .await;

    // Unwrap nested wrappers (device_sent, ephemeral, view_once).
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(&msg);

    let mut text = inner
        .conversation
        .as_deref()
        .or_else(|| {
            inner
                .extended_text_message
                .as_ref()
                .and_then(|e| e.text.as_deref())
        })
        .unwrap_or("")
        .to_string();

    let mut attachment = None;
    if let Some(ref img) = inner.image_message {
        text = img.caption.clone().unwrap_or_default();
        match client.download(img.as_ref()).await {
            Ok(bytes) => {
                let mut media = Media::image(bytes, img.caption.clone());
                if let Some(mimetype) = img.mimetype.clone() {
                    media.mimetype = mimetype;
                }
                attachment = Some(media);
            }
            Err(e) => warn!("whatsapp image download failed: {e}"),
        }
    }

    if text.is_empty() && attachment.is_none() {
        return None;
    }

    Some(InboundMessage {
        id: msg_id,
        chat_id,
        sender_id: info.source.sender.to_string(),
        sender_name: push_name,
        text,
        from_me: info.source.is_from_me,
        is_group,
        timestamp: Utc::now(),
        attachment,
    })
}
