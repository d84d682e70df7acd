//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "Queen Selina".to_string()
}

pub fn default_data_dir() -> String {
    "~/.selina".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_api_port() -> u16 {
    3000
}

pub fn default_max_bots_per_user() -> u32 {
    50
}

pub fn default_bot_lifetime_days() -> i64 {
    30
}

pub fn default_prefix() -> String {
    ".".to_string()
}

pub fn default_version() -> String {
    "4.0.0".to_string()
}

pub fn default_profile_picture_url() -> String {
    "https://i.imgur.com/rm1qWjR.jpeg".to_string()
}

pub fn default_broadcast_delay_secs() -> u64 {
    3
}

pub fn default_pairing_timeout_secs() -> u64 {
    30
}

pub fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

pub fn default_google_url() -> String {
    "https://www.google.com/search".to_string()
}

pub fn default_popcat_url() -> String {
    "https://api.popcat.xyz/chatbot".to_string()
}

pub fn default_simsimi_url() -> String {
    "https://api.simsimi.vn/v1/simtalk".to_string()
}

pub fn default_hercai_url() -> String {
    "https://hercai.onrender.com/v3/hercai".to_string()
}

pub fn default_tiktok_url() -> String {
    "https://api.tiklydown.eu.org/api/download".to_string()
}

pub fn default_instagram_url() -> String {
    "https://api.instantdown.tech/download".to_string()
}

pub fn default_facebook_url() -> String {
    "https://api.fdownloader.net/api/facebook".to_string()
}

pub fn default_spotify_url() -> String {
    "https://api.spotifydown.com/download".to_string()
}

pub fn default_apkpure_url() -> String {
    "https://apkpure.com".to_string()
}

pub fn default_infinity_url() -> String {
    "https://api.infinityapi.org".to_string()
}

pub fn default_weather_url() -> String {
    "https://wttr.in".to_string()
}

pub fn default_joke_url() -> String {
    "https://official-joke-api.appspot.com/random_joke".to_string()
}

pub fn default_quote_url() -> String {
    "https://api.quotable.io/random".to_string()
}

pub fn default_translate_url() -> String {
    "https://translate.googleapis.com/translate_a/single".to_string()
}

pub fn default_search_timeout() -> u64 {
    10
}

pub fn default_ai_budget() -> u64 {
    30
}

pub fn default_media_timeout() -> u64 {
    60
}

pub fn default_image_timeout() -> u64 {
    30
}

pub fn default_lookup_timeout() -> u64 {
    15
}
