//! Conversations seen on an account, persisted next to the session database.
//!
//! The protocol has no "list chats" call, so the broadcast audience is built
//! from inbound traffic and kept in `chats.json`.

use super::SharedState;
use selina_core::{error::SelinaError, message::ChatRef};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

const CHATS_FILE: &str = "chats.json";

pub(super) async fn load_chats(session_dir: &Path) -> Result<HashMap<String, ChatRef>, SelinaError> {
    let path = session_dir.join(CHATS_FILE);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    let list: Vec<ChatRef> = serde_json::from_str(&content)?;
    Ok(list.into_iter().map(|c| (c.id.clone(), c)).collect())
}

pub(super) async fn save_chats(
    session_dir: &Path,
    chats: &HashMap<String, ChatRef>,
) -> Result<(), SelinaError> {
    let mut list: Vec<&ChatRef> = chats.values().collect();
    list.sort_by(|a, b| a.id.cmp(&b.id));
    let json = serde_json::to_string_pretty(&list)?;
    tokio::fs::create_dir_all(session_dir).await?;
    tokio::fs::write(session_dir.join(CHATS_FILE), json).await?;
    Ok(())
}

/// Record a chat, persisting only when something changed.
pub(super) async fn remember_chat(state: &SharedState, session_dir: &Path, chat: ChatRef) {
    let mut chats = state.chats.lock().await;
    if let Some(known) = chats.get(&chat.id) {
        if known == &chat || (chat.name.is_none() && known.is_group == chat.is_group) {
            return;
        }
    }
    chats.insert(chat.id.clone(), chat);
    if let Err(e) = save_chats(session_dir, &chats).await {
        warn!("failed to persist known chats: {e}");
    }
}
