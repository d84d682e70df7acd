//! Connection trait implementation for WhatsApp.

use super::chats::load_chats;
use crate::sticker::to_profile_picture;
use super::send::{retry_send, split_message, MAX_MESSAGE_LEN};
use super::WhatsAppConnection;
use async_trait::async_trait;
use selina_core::{
    error::SelinaError,
    message::{ChatRef, InboundMessage, Media, MediaKind},
    traits::{Connection, ConnectionEvent},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use wacore_binary::builder::NodeBuilder;
use wacore_binary::jid::{Jid, SERVER_JID};
use wacore_binary::node::NodeContent;
use waproto::whatsapp::message::{
    AudioMessage, DocumentMessage, ImageMessage, ReactionMessage, StickerMessage, VideoMessage,
};
use whatsapp_rust::client::Client;
use whatsapp_rust::download::MediaType;
use whatsapp_rust::request::InfoQuery;

impl WhatsAppConnection {
    async fn client(&self) -> Result<Arc<Client>, SelinaError> {
        self.state
            .client
            .lock()
            .await
            .clone()
            .ok_or_else(|| SelinaError::Connection("whatsapp client not connected".into()))
    }

    /// Send and remember the id so the echo is ignored.
    async fn send_tracked(
        &self,
        client: &Client,
        jid: &Jid,
        msg: waproto::whatsapp::Message,
    ) -> Result<(), SelinaError> {
        let msg_id = retry_send(client, jid, msg).await?;
        self.state.sent_ids.lock().await.insert(msg_id);
        Ok(())
    }
}

fn parse_jid(jid_str: &str) -> Result<Jid, SelinaError> {
    jid_str
        .parse()
        .map_err(|e| SelinaError::Connection(format!("invalid whatsapp JID '{jid_str}': {e}")))
}

#[async_trait]
impl Connection for WhatsAppConnection {
    async fn connect(&self, events: mpsc::Sender<ConnectionEvent>) -> Result<(), SelinaError> {
        match load_chats(&self.session_dir).await {
            Ok(chats) => *self.state.chats.lock().await = chats,
            Err(e) => warn!("[{}] ignoring unreadable chat list: {e}", self.bot_id),
        }
        *self.state.events.lock().await = Some(events);
        self.start_bot(None).await?;
        info!("[{}] WhatsApp connection started", self.bot_id);
        Ok(())
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SelinaError> {
        let client = self.client().await?;
        let jid = parse_jid(chat_id)?;

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let msg = waproto::whatsapp::Message {
                conversation: Some(chunk.to_string()),
                ..Default::default()
            };
            self.send_tracked(&client, &jid, msg).await?;
        }
        Ok(())
    }

    async fn send_media(&self, chat_id: &str, media: Media) -> Result<(), SelinaError> {
        let client = self.client().await?;
        let jid = parse_jid(chat_id)?;

        let media_type = match media.kind {
            MediaKind::Image | MediaKind::Sticker => MediaType::Image,
            MediaKind::Video => MediaType::Video,
            MediaKind::Audio => MediaType::Audio,
            MediaKind::Document => MediaType::Document,
        };
        let upload = client
            .upload(media.data, media_type)
            .await
            .map_err(|e| SelinaError::Connection(format!("whatsapp media upload failed: {e}")))?;

        let mimetype = Some(media.mimetype);
        let caption = media.caption;
        let msg = match media.kind {
            MediaKind::Image => waproto::whatsapp::Message {
                image_message: Some(Box::new(ImageMessage {
                    mimetype,
                    caption,
                    url: Some(upload.url),
                    direct_path: Some(upload.direct_path),
                    media_key: Some(upload.media_key),
                    file_enc_sha256: Some(upload.file_enc_sha256),
                    file_sha256: Some(upload.file_sha256),
                    file_length: Some(upload.file_length),
                    ..Default::default()
                })),
                ..Default::default()
            },
            MediaKind::Video => waproto::whatsapp::Message {
                video_message: Some(Box::new(VideoMessage {
                    mimetype,
                    caption,
                    url: Some(upload.url),
                    direct_path: Some(upload.direct_path),
                    media_key: Some(upload.media_key),
                    file_enc_sha256: Some(upload.file_enc_sha256),
                    file_sha256: Some(upload.file_sha256),
                    file_length: Some(upload.file_length),
                    ..Default::default()
                })),
                ..Default::default()
            },
            MediaKind::Sticker => waproto::whatsapp::Message {
                sticker_message: Some(Box::new(StickerMessage {
                    mimetype,
                    url: Some(upload.url),
                    direct_path: Some(upload.direct_path),
                    media_key: Some(upload.media_key),
                    file_enc_sha256: Some(upload.file_enc_sha256),
                    file_sha256: Some(upload.file_sha256),
                    file_length: Some(upload.file_length),
                    ..Default::default()
                })),
                ..Default::default()
            },
            MediaKind::Audio => waproto::whatsapp::Message {
                audio_message: Some(Box::new(AudioMessage {
                    mimetype,
                    url: Some(upload.url),
                    direct_path: Some(upload.direct_path),
                    media_key: Some(upload.media_key),
                    file_enc_sha256: Some(upload.file_enc_sha256),
                    file_sha256: Some(upload.file_sha256),
                    file_length: Some(upload.file_length),
                    ..Default::default()
                })),
                ..Default::default()
            },
            MediaKind::Document => waproto::whatsapp::Message {
                document_message: Some(Box::new(DocumentMessage {
                    mimetype,
                    caption,
                    url: Some(upload.url),
                    direct_path: Some(upload.direct_path),
                    media_key: Some(upload.media_key),
                    file_enc_sha256: Some(upload.file_enc_sha256),
                    file_sha256: Some(upload.file_sha256),
                    file_length: Some(upload.file_length),
                    ..Default::default()
                })),
                ..Default::default()
            },
        };

        self.send_tracked(&client, &jid, msg).await
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), SelinaError> {
        let client = self.client().await?;
        let jid = parse_jid(chat_id)?;
        client
            .chatstate()
            .send_composing(&jid)
            .await
            .map_err(|e| SelinaError::Connection(format!("typing indicator failed: {e}")))
    }

    async fn react(&self, message: &InboundMessage, emoji: &str) -> Result<(), SelinaError> {
        let client = self.client().await?;
        let jid = parse_jid(&message.chat_id)?;

        let key = waproto::whatsapp::MessageKey {
            remote_jid: Some(message.chat_id.clone()),
            from_me: Some(message.from_me),
            id: Some(message.id.clone()),
            participant: message.is_group.then(|| message.sender_id.clone()),
            ..Default::default()
        };
        let msg = waproto::whatsapp::Message {
            reaction_message: Some(ReactionMessage {
                key: Some(key),
                text: Some(emoji.to_string()),
                sender_timestamp_ms: Some(chrono::Utc::now().timestamp_millis()),
                ..Default::default()
            }),
            ..Default::default()
        };
        self.send_tracked(&client, &jid, msg).await
    }

    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, SelinaError> {
        let phone = if phone_number.is_empty() {
            self.phone_number.as_str()
        } else {
            phone_number
        };
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();

        let (tx, rx) = oneshot::channel();
        *self.state.pairing_waiter.lock().await = Some(tx);
        self.start_bot(Some(&digits)).await?;

        match tokio::time::timeout(self.pairing_timeout, rx).await {
            Ok(Ok(code)) => Ok(code),
            Ok(Err(_)) => Err(SelinaError::Connection(
                "pairing code request was cancelled".into(),
            )),
            Err(_) => {
                self.state.pairing_waiter.lock().await.take();
                Err(SelinaError::Connection(format!(
                    "no pairing code within {}s",
                    self.pairing_timeout.as_secs()
                )))
            }
        }
    }

    async fn chats(&self) -> Result<Vec<ChatRef>, SelinaError> {
        let mut chats: Vec<ChatRef> = self.state.chats.lock().await.values().cloned().collect();
        chats.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(chats)
    }

    async fn set_profile_picture(&self, image: &[u8]) -> Result<(), SelinaError> {
        let image = image.to_vec();
        let jpeg = tokio::task::spawn_blocking(move || to_profile_picture(&image))
            .await
            .map_err(|e| SelinaError::Connection(format!("image conversion task failed: {e}")))??;

        let client = self.client().await?;
        let picture = NodeBuilder::new("picture")
            .attr("type", "image")
            .bytes(jpeg)
            .build();
        let query = InfoQuery::set(
            "w:profile:picture",
            Jid::new("", SERVER_JID),
            Some(NodeContent::Nodes(vec![picture])),
        );
        client
            .send_iq(query)
            .await
            .map_err(|e| SelinaError::Connection(format!("profile picture update failed: {e}")))?;
        info!("[{}] profile picture updated", self.bot_id);
        Ok(())
    }

    async fn destroy(&self) -> Result<(), SelinaError> {
        *self.state.events.lock().await = None;
        self.state.pairing_waiter.lock().await.take();
        self.stop_bot().await;
        info!("[{}] WhatsApp connection destroyed", self.bot_id);
        Ok(())
    }
}
