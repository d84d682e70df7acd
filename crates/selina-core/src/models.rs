//! Persisted domain records. JSON keys are camelCase.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default reaction set, in display order.
pub const DEFAULT_REACTIONS: [&str; 6] = ["❤️", "💞", "😊", "🔥", "👍", "⭐"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub role: Role,
    pub free_bot_used: bool,
    pub total_bots: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::User,
            free_bot_used: false,
            total_bots: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Pending,
    Authenticated,
    Active,
    Failed,
    Disconnected,
}

impl BotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotStatus::Pending => "pending",
            BotStatus::Authenticated => "authenticated",
            BotStatus::Active => "active",
            BotStatus::Failed => "failed",
            BotStatus::Disconnected => "disconnected",
        }
    }
}

/// One WhatsApp bot owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRecord {
    pub id: String,
    pub user_id: String,
    pub phone_number: String,
    pub status: BotStatus,
    pub is_free: bool,
    pub qr_code: Option<String>,
    pub pairing_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairing_generated_at: Option<DateTime<Utc>>,
}

/// `now` plus `days`, saturating at the latest representable instant.
fn expiry(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl BotRecord {
    pub fn new(user_id: &str, phone_number: &str, is_free: bool, lifetime_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            phone_number: phone_number.to_string(),
            status: BotStatus::Pending,
            is_free,
            qr_code: None,
            pairing_code: None,
            created_at: now,
            expires_at: expiry(now, lifetime_days),
            error: None,
            connected_at: None,
            disconnected_at: None,
            pairing_phone_number: None,
            pairing_generated_at: None,
        }
    }
}

/// Per-bot behavior toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub bot_id: String,
    pub auto_react: bool,
    pub react_to_commands: bool,
    pub reactions: Vec<String>,
    pub auto_join_channel: bool,
    pub welcome_message: bool,
    pub anti_spam: bool,
    pub created_at: DateTime<Utc>,
}

impl Settings {
    pub fn defaults_for(bot_id: &str) -> Self {
        Self {
            bot_id: bot_id.to_string(),
            auto_react: false,
            react_to_commands: true,
            reactions: DEFAULT_REACTIONS.iter().map(|s| s.to_string()).collect(),
            auto_join_channel: true,
            welcome_message: true,
            anti_spam: true,
            created_at: Utc::now(),
        }
    }
}

/// Partial settings update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_react: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub react_to_commands: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_join_channel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_spam: Option<bool>,
}

/// Append-only log of admin broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastEntry {
    pub id: String,
    pub message: String,
    pub sent_to: u64,
    pub created_at: DateTime<Utc>,
}

impl BroadcastEntry {
    pub fn new(message: &str, sent_to: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            sent_to,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_record_uses_camel_case_keys() {
        let bot = BotRecord::new("u1", "15551234567", true, 30);
        let v = serde_json::to_value(&bot).unwrap();
        assert_eq!(v["userId"], "u1");
        assert_eq!(v["status"], "pending");
        assert_eq!(v["isFree"], true);
        assert!(v["qrCode"].is_null());
        assert!(v.get("connectedAt").is_none());
        assert_eq!((bot.expires_at - bot.created_at).num_days(), 30);
    }

    #[test]
    fn test_bot_record_huge_lifetime_saturates() {
        let bot = BotRecord::new("u1", "15551234567", true, i64::MAX);
        assert_eq!(bot.expires_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_settings_defaults() {
        let s = Settings::defaults_for("b1");
        assert!(!s.auto_react);
        assert!(s.react_to_commands);
        assert!(s.auto_join_channel);
        assert_eq!(s.reactions.len(), 6);
        assert_eq!(s.reactions[0], "❤️");
    }

    #[test]
    fn test_settings_patch_skips_absent_fields() {
        let patch = SettingsPatch {
            auto_react: Some(true),
            ..Default::default()
        };
        let v = serde_json::to_value(&patch).unwrap();
        assert_eq!(v, serde_json::json!({"autoReact": true}));
    }
}
