//! Weather, jokes, quotes and translation.

use selina_core::error::SelinaError;
use serde::Deserialize;
use serde_json::Value;

use crate::http::{get_json, Services};

#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub temp_c: String,
    pub feels_like_c: String,
    pub humidity: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Joke {
    pub setup: String,
    pub punchline: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    pub content: String,
    pub author: String,
}

#[derive(Deserialize)]
struct WttrResponse {
    current_condition: Vec<WttrCondition>,
}

#[derive(Deserialize)]
struct WttrCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    humidity: String,
}

impl Services {
    /// Current conditions from wttr.in.
    pub async fn weather(&self, city: &str) -> Result<Weather, SelinaError> {
        let url = format!(
            "{}/{}",
            self.config.weather_url.trim_end_matches('/'),
            urlencoding::encode(city)
        );
        let req = self
            .client
            .get(url)
            .query(&[("format", "j1")])
            .timeout(self.search_timeout());
        let parsed: WttrResponse = get_json(req, "weather").await?;
        let current = parsed
            .current_condition
            .into_iter()
            .next()
            .ok_or_else(|| SelinaError::Service("weather: no current condition".into()))?;
        Ok(Weather {
            temp_c: current.temp_c,
            feels_like_c: current.feels_like_c,
            humidity: current.humidity,
        })
    }

    pub async fn joke(&self) -> Result<Joke, SelinaError> {
        let req = self
            .client
            .get(&self.config.joke_url)
            .timeout(self.search_timeout());
        get_json(req, "joke").await
    }

    pub async fn quote(&self) -> Result<Quote, SelinaError> {
        let req = self
            .client
            .get(&self.config.quote_url)
            .timeout(self.search_timeout());
        get_json(req, "quote").await
    }

    /// Translate `text` into the language code `target`, auto-detecting the source.
    pub async fn translate(&self, target: &str, text: &str) -> Result<String, SelinaError> {
        let req = self
            .client
            .get(&self.config.translate_url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .timeout(self.search_timeout());
        let raw: Value = get_json(req, "translate").await?;
        parse_translation(&raw)
            .ok_or_else(|| SelinaError::Service("translate: unexpected response shape".into()))
    }
}

/// Join the translated segments of a `translate_a/single` response.
pub fn parse_translation(raw: &Value) -> Option<String> {
    let segments = raw.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
