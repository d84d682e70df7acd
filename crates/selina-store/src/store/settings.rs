//! Per-bot settings.

use super::{decode, encode, Store};
use selina_core::{
    error::SelinaError,
    models::{Settings, SettingsPatch},
};
use serde_json::json;
use tracing::debug;

impl Store {
    /// Settings for a bot, persisting defaults on first access.
    pub async fn settings_for(&self, bot_id: &str) -> Result<Settings, SelinaError> {
        let defaults = encode(&Settings::defaults_for(bot_id))?;
        let (record, created) = self
            .inner
            .settings
            .find_or_insert(&json!({ "botId": bot_id }), defaults)
            .await?;
        if created {
            debug!("created default settings for bot {bot_id}");
        }
        decode(record)
    }

    /// Apply a partial update, creating the record with defaults first if absent.
    pub async fn update_settings(
        &self,
        bot_id: &str,
        patch: &SettingsPatch,
    ) -> Result<Settings, SelinaError> {
        let current = self.settings_for(bot_id).await?;
        let partial = encode(patch)?;
        let empty = partial.as_object().map(|o| o.is_empty()).unwrap_or(true);
        if empty {
            return Ok(current);
        }
        self.inner
            .settings
            .update(&json!({ "botId": bot_id }), &partial)
            .await?;
        self.settings_for(bot_id).await
    }

    pub async fn delete_settings(&self, bot_id: &str) -> Result<(), SelinaError> {
        self.inner
            .settings
            .delete(&json!({ "botId": bot_id }))
            .await?;
        Ok(())
    }
}
