//! Accounts.

use super::{decode, decode_all, encode, Store};
use selina_core::{error::SelinaError, models::User};
use serde_json::{json, Value};

impl Store {
    pub async fn insert_user(&self, user: &User) -> Result<User, SelinaError> {
        let value = self.inner.users.insert(encode(user)?).await?;
        decode(value)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, SelinaError> {
        self.inner
            .users
            .find_one(&json!({ "id": id }))
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, SelinaError> {
        self.inner
            .users
            .find_one(&json!({ "email": email }))
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn update_user(&self, id: &str, partial: Value) -> Result<bool, SelinaError> {
        self.inner.users.update(&json!({ "id": id }), &partial).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, SelinaError> {
        decode_all(self.inner.users.all().await?)
    }

    /// Bump `totalBots` and mark the free bot as used.
    pub async fn record_bot_created(&self, user_id: &str) -> Result<bool, SelinaError> {
        let bumped = self
            .inner
            .users
            .modify(&json!({ "id": user_id }), |user| {
                user["totalBots"] = json!(total_bots(user) + 1);
                user["freeBotUsed"] = json!(true);
            })
            .await?;
        Ok(bumped.is_some())
    }

    /// Claim one bot slot for a user, checking `limit` and bumping the
    /// counters in a single locked step.
    pub async fn reserve_bot_slot(&self, user_id: &str, limit: u32) -> Result<BotSlot, SelinaError> {
        let slot = self
            .inner
            .users
            .modify(&json!({ "id": user_id }), |user| {
                if total_bots(user) >= u64::from(limit) {
                    return BotSlot::LimitReached;
                }
                let is_free = !user["freeBotUsed"].as_bool().unwrap_or(false);
                user["totalBots"] = json!(total_bots(user) + 1);
                user["freeBotUsed"] = json!(true);
                BotSlot::Reserved { is_free }
            })
            .await?;
        Ok(slot.unwrap_or(BotSlot::UnknownUser))
    }

    /// Decrement `totalBots`, never below zero.
    pub async fn record_bot_deleted(&self, user_id: &str) -> Result<bool, SelinaError> {
        let found = self
            .inner
            .users
            .modify(&json!({ "id": user_id }), |user| {
                user["totalBots"] = json!(total_bots(user).saturating_sub(1));
            })
            .await?;
        Ok(found.is_some())
    }
}

/// Outcome of [`Store::reserve_bot_slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotSlot {
    Reserved { is_free: bool },
    LimitReached,
    UnknownUser,
}

fn total_bots(user: &Value) -> u64 {
    user["totalBots"].as_u64().unwrap_or(0)
}
