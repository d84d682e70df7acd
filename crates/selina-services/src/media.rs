//! Text-to-image and movie lookups on the Infinity API.

use selina_core::error::SelinaError;
use serde::Deserialize;

use crate::http::{get_json, send, Services};

const MAX_MOVIES: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct YtsMovie {
    pub title: String,
    #[serde(default)]
    pub year: Option<serde_json::Value>,
    #[serde(default)]
    pub rating: Option<serde_json::Value>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieInfo {
    pub title: Option<String>,
    pub year: Option<serde_json::Value>,
    pub genre: Option<String>,
    pub rating: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct YtsResponse {
    #[serde(default)]
    data: Vec<YtsMovie>,
}

impl Services {
    fn infinity(&self, path: &str) -> String {
        format!("{}/{path}", self.config.infinity_url.trim_end_matches('/'))
    }

    /// Render text to an image.
    pub async fn text_to_image(&self, text: &str) -> Result<Vec<u8>, SelinaError> {
        let req = self
            .with_infinity_auth(self.client.get(self.infinity("c2i")))
            .query(&[("text", text), ("color", "red")])
            .timeout(self.image_timeout());
        let bytes = send(req, "c2i")
            .await?
            .bytes()
            .await
            .map_err(|e| SelinaError::Service(format!("c2i: failed to read body: {e}")))?;
        if bytes.is_empty() {
            return Err(SelinaError::Service("c2i: empty image".into()));
        }
        Ok(bytes.to_vec())
    }

    /// Up to five YTS movies matching the query.
    pub async fn yts_search(&self, query: &str) -> Result<Vec<YtsMovie>, SelinaError> {
        let req = self
            .with_infinity_auth(self.client.get(self.infinity("ytssearch")))
            .query(&[("q", query)])
            .timeout(self.lookup_timeout());
        let parsed: YtsResponse = get_json(req, "yts").await?;
        Ok(parsed.data.into_iter().take(MAX_MOVIES).collect())
    }

    pub async fn movie_info(&self, url: &str) -> Result<MovieInfo, SelinaError> {
        let req = self
            .with_infinity_auth(self.client.get(self.infinity("cine-minfo")))
            .query(&[("url", url)])
            .timeout(self.lookup_timeout());
        get_json(req, "movie").await
    }
}
