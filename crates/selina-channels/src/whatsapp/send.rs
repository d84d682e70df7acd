//! Message sending utilities: chunking and retry logic.

use selina_core::error::SelinaError;
use tracing::{error, warn};
use wacore_binary::jid::Jid;
use whatsapp_rust::client::Client;

/// Pause after each failed delivery before trying again.
pub(super) const RETRY_DELAYS_MS: [u64; 2] = [500, 1000];

/// Longest text sent as a single message.
pub(super) const MAX_MESSAGE_LEN: usize = 4096;

/// Deliver one message and return the server-assigned message id.
pub(super) async fn retry_send(
    client: &Client,
    jid: &Jid,
    msg: waproto::whatsapp::Message,
) -> Result<String, SelinaError> {
    with_retries(&jid.to_string(), || client.send_message(jid.clone(), msg.clone())).await
}

/// Run `send` until it succeeds, sleeping `RETRY_DELAYS_MS` between tries.
/// One more attempt than there are pauses.
pub(super) async fn with_retries<T, E, F, Fut>(target: &str, mut send: F) -> Result<T, SelinaError>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let attempts = RETRY_DELAYS_MS.len() + 1;
    let mut attempt = 0;
    loop {
        let err = match send().await {
            Ok(out) => return Ok(out),
            Err(e) => e,
        };
        attempt += 1;
        let Some(&pause) = RETRY_DELAYS_MS.get(attempt - 1) else {
            error!("send to {target} failed ({attempt}/{attempts}), giving up: {err}");
            return Err(SelinaError::Connection(format!(
                "send to {target} failed after {attempts} attempts: {err}"
            )));
        };
        warn!("send to {target} failed ({attempt}/{attempts}), next try in {pause}ms: {err}");
        tokio::time::sleep(std::time::Duration::from_millis(pause)).await;
    }
}

/// Split text into chunks of at most `max_len` bytes, preferring newline
/// boundaries and never cutting inside a UTF-8 character.
pub(super) fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            end += text[start..].chars().next().map_or(1, char::len_utf8);
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
