use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Third-party endpoints and per-call timeouts used by the chat commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_google_url")]
    pub google_url: String,
    #[serde(default = "default_popcat_url")]
    pub popcat_url: String,
    #[serde(default = "default_simsimi_url")]
    pub simsimi_url: String,
    #[serde(default = "default_hercai_url")]
    pub hercai_url: String,
    #[serde(default = "default_tiktok_url")]
    pub tiktok_url: String,
    #[serde(default = "default_instagram_url")]
    pub instagram_url: String,
    #[serde(default = "default_facebook_url")]
    pub facebook_url: String,
    #[serde(default = "default_spotify_url")]
    pub spotify_url: String,
    #[serde(default = "default_apkpure_url")]
    pub apkpure_url: String,
    /// Base URL of the text-to-image / movie lookup API.
    #[serde(default = "default_infinity_url")]
    pub infinity_url: String,
    /// Bearer token for `infinity_url`. Empty = send no Authorization header.
    #[serde(default)]
    pub infinity_api_key: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_joke_url")]
    pub joke_url: String,
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
    #[serde(default = "default_translate_url")]
    pub translate_url: String,
    /// Timeout for search, scraping, joke and quote calls.
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
    /// Shared budget for the whole AI fallback chain.
    #[serde(default = "default_ai_budget")]
    pub ai_budget_secs: u64,
    /// Timeout for video and other large downloads.
    #[serde(default = "default_media_timeout")]
    pub media_timeout_secs: u64,
    /// Timeout for generated images and avatars.
    #[serde(default = "default_image_timeout")]
    pub image_timeout_secs: u64,
    /// Timeout for resolver and lookup APIs.
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            google_url: default_google_url(),
            popcat_url: default_popcat_url(),
            simsimi_url: default_simsimi_url(),
            hercai_url: default_hercai_url(),
            tiktok_url: default_tiktok_url(),
            instagram_url: default_instagram_url(),
            facebook_url: default_facebook_url(),
            spotify_url: default_spotify_url(),
            apkpure_url: default_apkpure_url(),
            infinity_url: default_infinity_url(),
            infinity_api_key: String::new(),
            weather_url: default_weather_url(),
            joke_url: default_joke_url(),
            quote_url: default_quote_url(),
            translate_url: default_translate_url(),
            search_timeout_secs: default_search_timeout(),
            ai_budget_secs: default_ai_budget(),
            media_timeout_secs: default_media_timeout(),
            image_timeout_secs: default_image_timeout(),
            lookup_timeout_secs: default_lookup_timeout(),
        }
    }
}
