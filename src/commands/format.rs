//! Reply text builders.

use selina_core::{config::BotConfig, models::Settings};
use selina_services::{
    downloader::{ApkHit, FacebookLinks, MediaFireFile, SpotifyTrack},
    fun::{Joke, Quote, Weather},
    media::{MovieInfo, YtsMovie},
    search::SearchResult,
};
use serde_json::Value;
use std::time::Duration;

pub fn menu(bot_name: &str, prefix: &str) -> String {
    let p = prefix;
    format!(
        "👑 *{name}* 💞\n\n\
         *🔍 SEARCH & AI*\n\
         {p}google <query> - Google search\n\
         {p}ai <message> - Chat with AI\n\
         {p}translate <lang> <text> - Translate\n\n\
         *📥 DOWNLOADERS*\n\
         {p}tiktok <url> - TikTok video\n\
         {p}instagram <url> - Instagram\n\
         {p}facebook <url> - Facebook\n\
         {p}spotify <url> - Spotify track\n\
         {p}apk <name> - APK download\n\
         {p}mediafire <url> - MediaFire file\n\
         {p}download <url> - Auto-detect link\n\n\
         *🎨 MEDIA & FUN*\n\
         {p}c2i <text> - Text to Image\n\
         {p}sticker - Make sticker\n\
         {p}weather <city> - Weather\n\
         {p}joke - Random joke\n\
         {p}quote - Inspiration\n\n\
         *🎬 MOVIES*\n\
         {p}yts <query> - Search movies\n\
         {p}movie <url> - Movie details\n\n\
         *ℹ️ INFO*\n\
         {p}menu - This menu\n\
         {p}settings - Bot settings\n\
         {p}alive - Check status\n\
         {p}owner - Developer info\n\n\
         💞 _{name} - Your WhatsApp Bot_",
        name = bot_name.to_uppercase(),
    )
}

pub fn settings(s: &Settings) -> String {
    format!(
        "⚙️ *BOT SETTINGS*\n\n\
         *Auto React:* {}\n\
         *React to Commands:* {}\n\
         *Auto Join Channel:* {}\n\n\
         💡 Change settings on dashboard\n\
         ⚠️ Auto-react off by default (ban protection)",
        on_off(s.auto_react),
        on_off(s.react_to_commands),
        on_off(s.auto_join_channel),
    )
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "✅ ON"
    } else {
        "❌ OFF"
    }
}

pub fn alive(bot_name: &str, uptime: Duration, version: &str) -> String {
    let secs = uptime.as_secs();
    format!(
        "👑 *{}* 💞\n\n\
         ✅ *Status:* Online\n\
         ⏱️ *Uptime:* {}h {}m\n\
         🤖 *Version:* {version}\n\n\
         _Bot is running perfectly!_",
        bot_name.to_uppercase(),
        secs / 3600,
        (secs % 3600) / 60,
    )
}

pub fn owner(bot_name: &str, bot: &BotConfig) -> String {
    format!(
        "👨‍💻 *DEVELOPER INFO*\n\n\
         *Name:* {}\n\
         *Contact:* {}\n\
         *Email:* {}\n\n\
         *Bot:* {bot_name} 💞\n\
         *Version:* {}",
        or_na(&bot.owner_name),
        or_na(&bot.owner_contact),
        or_na(&bot.owner_email),
        bot.version,
    )
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() {
        "N/A"
    } else {
        s
    }
}

/// Render a loosely typed JSON scalar; strings lose their quotes.
fn scalar(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => "N/A".to_string(),
    }
}

pub fn google(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }
    let mut out = format!("🔍 *Google Search*\n\n*Query:* {query}\n\n");
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("{}. *{}*\n{}\n\n", i + 1, r.title, r.link));
    }
    out.trim_end().to_string()
}

pub fn ai(answer: &str) -> String {
    format!("🤖 *AI:*\n\n{answer}")
}

pub fn facebook(links: &FacebookLinks) -> String {
    let na = || "N/A".to_string();
    format!(
        "📘 *Links:*\n\n*HD:* {}\n*SD:* {}",
        links.hd.clone().unwrap_or_else(na),
        links.sd.clone().unwrap_or_else(na),
    )
}

pub fn spotify(track: &SpotifyTrack) -> String {
    format!(
        "🎧 *{}*\n*Artist:* {}\n\n{}",
        track.title.as_deref().unwrap_or("Spotify track"),
        track.artist.as_deref().unwrap_or("Unknown"),
        track.link,
    )
}

pub fn apk(hit: &ApkHit) -> String {
    format!("📦 *{}*\n\n{}", hit.name, hit.url)
}

pub fn mediafire(file: &MediaFireFile) -> String {
    format!(
        "📁 *{}*\n*Size:* {}\n\n{}",
        or_na(&file.filename),
        or_na(&file.size),
        file.download,
    )
}

pub fn yts(movies: &[YtsMovie]) -> String {
    if movies.is_empty() {
        return "❌ No results found.".to_string();
    }
    let mut out = String::from("🎬 *YTS Search*\n\n");
    for (i, m) in movies.iter().enumerate() {
        out.push_str(&format!(
            "{}. *{}* ({})\n⭐ {}/10\n{}\n\n",
            i + 1,
            m.title,
            scalar(m.year.as_ref()),
            scalar(m.rating.as_ref()),
            m.url,
        ));
    }
    out.trim_end().to_string()
}

pub fn movie(info: &MovieInfo) -> String {
    format!(
        "🎬 *{}*\n\n*Year:* {}\n*Genre:* {}\n*Rating:* {}",
        info.title.as_deref().unwrap_or("Movie"),
        scalar(info.year.as_ref()),
        info.genre.as_deref().unwrap_or("N/A"),
        scalar(info.rating.as_ref()),
    )
}

pub fn weather(city: &str, w: &Weather) -> String {
    format!(
        "🌤️ *{city}*\n\n*Temp:* {}°C\n*Feels:* {}°C\n*Humidity:* {}%",
        w.temp_c, w.feels_like_c, w.humidity,
    )
}

pub fn joke(j: &Joke) -> String {
    format!("😂 {}\n\n{}", j.setup, j.punchline)
}

pub fn quote(q: &Quote) -> String {
    format!("💭 \"{}\"\n\n- {}", q.content, q.author)
}

pub fn translation(target: &str, text: &str) -> String {
    format!("🌐 *Translation ({target})*\n\n{text}")
}
