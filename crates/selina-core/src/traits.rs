use crate::{
    error::SelinaError,
    message::{ChatRef, InboundMessage, Media},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Lifecycle and traffic events emitted by a connection.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Raw QR payload to be rendered for the user to scan.
    Qr(String),
    /// Phone-pairing code produced by the transport.
    PairingCode(String),
    Authenticated,
    /// Fully logged in and able to send.
    Ready,
    AuthFailure(String),
    Disconnected(String),
    Message(InboundMessage),
}

/// One linked WhatsApp account.
///
/// Implementations push [`ConnectionEvent`]s into the sender handed to
/// [`Connection::connect`] for as long as the connection lives.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Bring the connection up. Returns once the client is started, not once it is ready.
    async fn connect(&self, events: mpsc::Sender<ConnectionEvent>) -> Result<(), SelinaError>;

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SelinaError>;

    async fn send_media(&self, chat_id: &str, media: Media) -> Result<(), SelinaError>;

    /// Show the typing indicator in a chat.
    async fn send_typing(&self, _chat_id: &str) -> Result<(), SelinaError> {
        Ok(())
    }

    /// React to a message with an emoji.
    async fn react(&self, message: &InboundMessage, emoji: &str) -> Result<(), SelinaError>;

    /// Ask the transport for a phone-pairing code for `phone_number`.
    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, SelinaError>;

    /// Conversations known to this account.
    async fn chats(&self) -> Result<Vec<ChatRef>, SelinaError>;

    async fn set_profile_picture(&self, image: &[u8]) -> Result<(), SelinaError>;

    /// Tear the connection down. Stops event delivery.
    async fn destroy(&self) -> Result<(), SelinaError>;
}

/// Builds connections for bots.
pub trait ConnectionFactory: Send + Sync {
    fn create(&self, bot_id: &str, phone_number: &str) -> Arc<dyn Connection>;
}
