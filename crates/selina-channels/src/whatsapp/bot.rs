//! Bot lifecycle: building, running and stopping the WhatsApp bot.

use super::events::handle_whatsapp_message;
use super::WhatsAppConnection;
use selina_core::{error::SelinaError, traits::ConnectionEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust::pair_code::PairCodeOptions;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

impl WhatsAppConnection {
    /// Build a WhatsApp bot with the event handler and run it in the background.
    ///
    /// With `pair_phone` set the bot links through a phone-pairing code
    /// instead of a QR code. Any bot already running for this connection is
    /// stopped first.
    pub(super) async fn start_bot(&self, pair_phone: Option<&str>) -> Result<(), SelinaError> {
        self.stop_bot().await;

        tokio::fs::create_dir_all(&self.session_dir)
            .await
            .map_err(|e| SelinaError::Connection(format!("failed to create session dir: {e}")))?;
        let db_path = self.session_db_path();

        info!("[{}] WhatsApp bot building (session: {})", self.bot_id, db_path.display());

        let backend = Arc::new(
            SqliteStore::new(&db_path.to_string_lossy())
                .await
                .map_err(|e| SelinaError::Connection(format!("whatsapp store init failed: {e}")))?,
        );

        let state = self.state.clone();
        let bot_id = self.bot_id.clone();
        let session_dir = self.session_dir.clone();

        let mut builder = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some(self.device_name.clone()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, client| {
                let state = state.clone();
                let bot_id = bot_id.clone();
                let session_dir = session_dir.clone();
                async move {
                    let forward = match event {
                        Event::PairingQrCode { code, .. } => {
                            info!("[{bot_id}] WhatsApp QR code generated");
                            debug!("[{bot_id}] QR data: {code}");
                            Some(ConnectionEvent::Qr(code))
                        }
                        Event::PairingCode { code, .. } => {
                            info!("[{bot_id}] WhatsApp pairing code generated");
                            if let Some(waiter) = state.pairing_waiter.lock().await.take() {
                                let _ = waiter.send(code.clone());
                            }
                            Some(ConnectionEvent::PairingCode(code))
                        }
                        Event::PairSuccess(_) => {
                            info!("[{bot_id}] WhatsApp pairing successful");
                            Some(ConnectionEvent::Authenticated)
                        }
                        Event::Connected(_) => {
                            info!("[{bot_id}] WhatsApp connected");
                            *state.client.lock().await = Some(client);
                            Some(ConnectionEvent::Ready)
                        }
                        Event::Disconnected(_) => {
                            warn!("[{bot_id}] WhatsApp disconnected");
                            *state.client.lock().await = None;
                            Some(ConnectionEvent::Disconnected("connection closed".into()))
                        }
                        Event::LoggedOut(_) => {
                            warn!("[{bot_id}] WhatsApp logged out, session invalidated");
                            *state.client.lock().await = None;
                            Some(ConnectionEvent::AuthFailure(
                                "session logged out or rejected".into(),
                            ))
                        }
                        Event::StreamError(err) => {
                            warn!("[{bot_id}] WhatsApp stream error: {err:?}");
                            None
                        }
                        Event::Message(msg, info) => {
                            handle_whatsapp_message(*msg, info, &client, &state, &session_dir)
                                .await
                                .map(ConnectionEvent::Message)
                        }
                        _ => None,
                    };

                    if let Some(event) = forward {
                        let sender = state.events.lock().await.clone();
                        if let Some(sender) = sender {
                            if sender.send(event).await.is_err() {
                                debug!("[{bot_id}] event receiver dropped");
                            }
                        }
                    }
                }
            });

        if let Some(phone) = pair_phone {
            info!("[{}] pair-code flow enabled", self.bot_id);
            builder = builder.with_pair_code(PairCodeOptions {
                phone_number: phone.to_string(),
                ..Default::default()
            });
        }

        let mut bot = builder
            .build()
            .await
            .map_err(|e| SelinaError::Connection(format!("whatsapp bot build failed: {e}")))?;

        *self.state.client.lock().await = Some(bot.client());

        let handle = bot
            .run()
            .await
            .map_err(|e| SelinaError::Connection(format!("whatsapp bot run failed: {e}")))?;
        *self.state.run_handle.lock().await = Some(handle);

        info!("[{}] WhatsApp bot started", self.bot_id);
        Ok(())
    }

    /// Abort the running bot, if any.
    pub(super) async fn stop_bot(&self) {
        if let Some(handle) = self.state.run_handle.lock().await.take() {
            handle.abort();
            debug!("[{}] WhatsApp bot task aborted", self.bot_id);
        }
        *self.state.client.lock().await = None;
    }
}
