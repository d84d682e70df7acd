//! Media link resolvers for social platforms, APKPure and MediaFire.

use reqwest::Url;
use scraper::Html;
use selina_core::error::SelinaError;
use serde::Deserialize;

use crate::http::{get_json, get_text, selector, Services};

/// Platforms the generic download command can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    TikTok,
    Instagram,
    Facebook,
    Spotify,
    MediaFire,
}

/// Guess the platform from a URL's host.
pub fn detect_platform(url: &str) -> Option<Platform> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let is = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

    if is("tiktok.com") {
        Some(Platform::TikTok)
    } else if is("instagram.com") {
        Some(Platform::Instagram)
    } else if is("facebook.com") || is("fb.watch") {
        Some(Platform::Facebook)
    } else if is("spotify.com") {
        Some(Platform::Spotify)
    } else if is("mediafire.com") {
        Some(Platform::MediaFire)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct TikTokVideo {
    pub video: String,
    pub music: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InstagramMedia {
    pub url: String,
    pub thumbnail: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FacebookLinks {
    pub hd: Option<String>,
    pub sd: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SpotifyTrack {
    pub link: String,
    pub title: Option<String>,
    pub artist: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApkHit {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaFireFile {
    pub download: String,
    pub filename: String,
    pub size: String,
}

// --- Serde types ---

#[derive(Deserialize)]
struct TikTokResponse {
    video: Option<TikTokVideoField>,
    music: Option<TikTokMusicField>,
    title: Option<String>,
    author: Option<TikTokAuthorField>,
}

#[derive(Deserialize)]
struct TikTokVideoField {
    #[serde(rename = "noWatermark")]
    no_watermark: Option<String>,
}

#[derive(Deserialize)]
struct TikTokMusicField {
    play_url: Option<String>,
}

#[derive(Deserialize)]
struct TikTokAuthorField {
    unique_id: Option<String>,
}

#[derive(Deserialize)]
struct InstagramResponse {
    download_url: Option<String>,
    thumbnail: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct FacebookResponse {
    hd: Option<String>,
    sd: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct SpotifyResponse {
    link: Option<String>,
    title: Option<String>,
    artist: Option<String>,
}

impl Services {
    pub async fn tiktok(&self, url: &str) -> Result<TikTokVideo, SelinaError> {
        let req = self
            .client
            .get(&self.config.tiktok_url)
            .query(&[("url", url)])
            .timeout(self.lookup_timeout());
        let parsed: TikTokResponse = get_json(req, "tiktok").await?;
        let video = parsed
            .video
            .and_then(|v| v.no_watermark)
            .ok_or_else(|| SelinaError::Service("tiktok: no video in response".into()))?;
        Ok(TikTokVideo {
            video,
            music: parsed.music.and_then(|m| m.play_url),
            title: parsed.title,
            author: parsed.author.and_then(|a| a.unique_id),
        })
    }

    pub async fn instagram(&self, url: &str) -> Result<InstagramMedia, SelinaError> {
        let req = self
            .client
            .get(&self.config.instagram_url)
            .query(&[("url", url)])
            .timeout(self.lookup_timeout());
        let parsed: InstagramResponse = get_json(req, "instagram").await?;
        let url = parsed
            .download_url
            .ok_or_else(|| SelinaError::Service("instagram: no media in response".into()))?;
        Ok(InstagramMedia {
            url,
            thumbnail: parsed.thumbnail,
            title: parsed.title,
        })
    }

    pub async fn facebook(&self, url: &str) -> Result<FacebookLinks, SelinaError> {
        let req = self
            .client
            .get(&self.config.facebook_url)
            .query(&[("url", url)])
            .timeout(self.lookup_timeout());
        let parsed: FacebookResponse = get_json(req, "facebook").await?;
        if parsed.hd.is_none() && parsed.sd.is_none() {
            return Err(SelinaError::Service("facebook: no links in response".into()));
        }
        Ok(FacebookLinks {
            hd: parsed.hd,
            sd: parsed.sd,
            title: parsed.title,
        })
    }

    pub async fn spotify(&self, url: &str) -> Result<SpotifyTrack, SelinaError> {
        let endpoint = format!(
            "{}/{}",
            self.config.spotify_url.trim_end_matches('/'),
            urlencoding::encode(url)
        );
        let req = self.client.get(endpoint).timeout(self.lookup_timeout());
        let parsed: SpotifyResponse = get_json(req, "spotify").await?;
        let link = parsed
            .link
            .ok_or_else(|| SelinaError::Service("spotify: no link in response".into()))?;
        Ok(SpotifyTrack {
            link,
            title: parsed.title,
            artist: parsed.artist,
        })
    }

    /// First APKPure search hit for an app name.
    pub async fn apk(&self, app_name: &str) -> Result<ApkHit, SelinaError> {
        let base = self.config.apkpure_url.trim_end_matches('/');
        let req = self
            .client
            .get(format!("{base}/search"))
            .query(&[("q", app_name)])
            .timeout(self.search_timeout());
        let html = get_text(req, "apkpure").await?;
        parse_apk_search(&html, base, app_name)?
            .ok_or_else(|| SelinaError::Service(format!("apkpure: {app_name} not found")))
    }

    /// Resolve a MediaFire share page to its direct link.
    pub async fn mediafire(&self, url: &str) -> Result<MediaFireFile, SelinaError> {
        let req = self.client.get(url).timeout(self.search_timeout());
        let html = get_text(req, "mediafire").await?;
        parse_mediafire_page(&html)?
            .ok_or_else(|| SelinaError::Service("mediafire: no download button".into()))
    }
}

pub fn parse_apk_search(
    html: &str,
    base: &str,
    app_name: &str,
) -> Result<Option<ApkHit>, SelinaError> {
    let document = Html::parse_document(html);
    let first = selector(".first a")?;
    let href = document
        .select(&first)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(str::to_string);

    Ok(href.map(|href| ApkHit {
        name: app_name.to_string(),
        url: if href.starts_with("http") {
            href
        } else {
            format!("{base}{href}")
        },
    }))
}

pub fn parse_mediafire_page(html: &str) -> Result<Option<MediaFireFile>, SelinaError> {
    let document = Html::parse_document(html);
    let button = selector("#downloadButton")?;
    let filename = selector(".filename")?;
    let details = selector(".details li")?;

    let Some(download) = document
        .select(&button)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(str::to_string)
    else {
        return Ok(None);
    };

    let text_of = |sel: &scraper::Selector| {
        document
            .select(sel)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    };

    Ok(Some(MediaFireFile {
        download,
        filename: text_of(&filename),
        size: text_of(&details),
    }))
}
