//! Bot records.

use super::{decode, decode_all, encode, Store};
use selina_core::{
    error::SelinaError,
    models::{BotRecord, BotStatus},
};
use serde_json::{json, Value};

impl Store {
    pub async fn insert_bot(&self, bot: &BotRecord) -> Result<BotRecord, SelinaError> {
        let value = self.inner.bots.insert(encode(bot)?).await?;
        decode(value)
    }

    pub async fn get_bot(&self, id: &str) -> Result<Option<BotRecord>, SelinaError> {
        self.inner
            .bots
            .find_one(&json!({ "id": id }))
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn bots_for_user(&self, user_id: &str) -> Result<Vec<BotRecord>, SelinaError> {
        decode_all(self.inner.bots.find(&json!({ "userId": user_id })).await?)
    }

    pub async fn bots_with_status(&self, status: BotStatus) -> Result<Vec<BotRecord>, SelinaError> {
        decode_all(
            self.inner
                .bots
                .find(&json!({ "status": status.as_str() }))
                .await?,
        )
    }

    pub async fn list_bots(&self) -> Result<Vec<BotRecord>, SelinaError> {
        decode_all(self.inner.bots.all().await?)
    }

    /// Shallow-merge `partial` (camelCase keys) into the bot record.
    pub async fn update_bot(&self, id: &str, partial: Value) -> Result<bool, SelinaError> {
        self.inner.bots.update(&json!({ "id": id }), &partial).await
    }

    /// Set `status`, merging any extra lifecycle fields.
    pub async fn set_bot_status(
        &self,
        id: &str,
        status: BotStatus,
        extra: Value,
    ) -> Result<bool, SelinaError> {
        let mut partial = json!({ "status": status.as_str() });
        if let (Some(p), Some(e)) = (partial.as_object_mut(), extra.as_object()) {
            for (k, v) in e {
                p.insert(k.clone(), v.clone());
            }
        }
        self.update_bot(id, partial).await
    }

    /// Delete a bot record. Returns the removed record, if any.
    pub async fn delete_bot(&self, id: &str) -> Result<Option<BotRecord>, SelinaError> {
        let Some(bot) = self.get_bot(id).await? else {
            return Ok(None);
        };
        self.inner.bots.delete(&json!({ "id": id })).await?;
        Ok(Some(bot))
    }
}
